use std::collections::{BTreeMap, BTreeSet};

use crate::instance::TaskId;

/// Task-level dependency graph for traversal and analysis.
///
/// An edge `a -> b` means task `b` needs `a` to finish first, either because
/// it consumes data `a` produces or because it waits on `a`.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Adjacency list: task -> downstream tasks.
  adjacency: BTreeMap<TaskId, Vec<TaskId>>,
  /// Reverse adjacency: task -> upstream tasks.
  reverse_adjacency: BTreeMap<TaskId, Vec<TaskId>>,
  /// Tasks with no incoming edges.
  entry_points: Vec<TaskId>,
  /// Tasks with multiple incoming edges.
  join_points: BTreeSet<TaskId>,
}

impl Graph {
  /// Build a graph from task ids and dependency edges. Duplicate edges are
  /// collapsed.
  pub fn new(tasks: impl IntoIterator<Item = TaskId>, edges: &[(TaskId, TaskId)]) -> Self {
    let mut adjacency: BTreeMap<TaskId, Vec<TaskId>> = BTreeMap::new();
    let mut reverse_adjacency: BTreeMap<TaskId, Vec<TaskId>> = BTreeMap::new();

    for task in tasks {
      adjacency.entry(task).or_default();
      reverse_adjacency.entry(task).or_default();
    }

    for &(from, to) in edges {
      let downstream = adjacency.entry(from).or_default();
      if !downstream.contains(&to) {
        downstream.push(to);
        reverse_adjacency.entry(to).or_default().push(from);
      }
    }

    let entry_points: Vec<TaskId> = reverse_adjacency
      .iter()
      .filter(|(_, incoming)| incoming.is_empty())
      .map(|(task, _)| *task)
      .collect();

    let join_points: BTreeSet<TaskId> = reverse_adjacency
      .iter()
      .filter(|(_, incoming)| incoming.len() > 1)
      .map(|(task, _)| *task)
      .collect();

    Self {
      adjacency,
      reverse_adjacency,
      entry_points,
      join_points,
    }
  }

  /// Tasks with no incoming edges.
  pub fn entry_points(&self) -> &[TaskId] {
    &self.entry_points
  }

  pub fn downstream(&self, task: TaskId) -> &[TaskId] {
    self
      .adjacency
      .get(&task)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  pub fn upstream(&self, task: TaskId) -> &[TaskId] {
    self
      .reverse_adjacency
      .get(&task)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Check if a task has multiple upstream tasks.
  pub fn is_join_point(&self, task: TaskId) -> bool {
    self.join_points.contains(&task)
  }

  /// Find a task that lies on a cycle, if any.
  ///
  /// Iterative DFS with coloring: white = unvisited, gray = on the current
  /// path, black = done. Reaching a gray task closes a cycle.
  pub fn find_cycle(&self) -> Option<TaskId> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
      White,
      Gray,
      Black,
    }

    let mut color: BTreeMap<TaskId, Color> =
      self.adjacency.keys().map(|task| (*task, Color::White)).collect();

    for &root in self.adjacency.keys() {
      if color.get(&root) != Some(&Color::White) {
        continue;
      }
      color.insert(root, Color::Gray);
      let mut stack: Vec<(TaskId, usize)> = vec![(root, 0)];

      while let Some((task, next)) = stack.pop() {
        let neighbors = self.downstream(task);
        if next < neighbors.len() {
          stack.push((task, next + 1));
          let neighbor = neighbors[next];
          match color.get(&neighbor) {
            Some(Color::Gray) => return Some(neighbor),
            Some(Color::White) | None => {
              color.insert(neighbor, Color::Gray);
              stack.push((neighbor, 0));
            }
            Some(Color::Black) => {}
          }
        } else {
          color.insert(task, Color::Black);
        }
      }
    }

    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ids(n: usize) -> Vec<TaskId> {
    (0..n).map(TaskId::new).collect()
  }

  #[test]
  fn test_entry_and_join_points() {
    let t = ids(3);
    let graph = Graph::new(t.clone(), &[(t[0], t[2]), (t[1], t[2]), (t[0], t[2])]);

    assert_eq!(graph.entry_points(), &[t[0], t[1]]);
    assert_eq!(graph.downstream(t[0]), &[t[2]]);
    assert_eq!(graph.upstream(t[2]), &[t[0], t[1]]);
    assert!(graph.is_join_point(t[2]));
    assert!(!graph.is_join_point(t[0]));
    assert_eq!(graph.find_cycle(), None);
  }

  #[test]
  fn test_find_cycle() {
    let t = ids(3);
    let graph = Graph::new(t.clone(), &[(t[0], t[1]), (t[1], t[2]), (t[2], t[1])]);

    let on_cycle = graph.find_cycle().unwrap();
    assert!(on_cycle == t[1] || on_cycle == t[2]);
    assert!(graph.entry_points().contains(&t[0]));
  }

  #[test]
  fn test_self_loop_is_a_cycle() {
    let t = ids(1);
    let graph = Graph::new(t.clone(), &[(t[0], t[0])]);
    assert_eq!(graph.find_cycle(), Some(t[0]));
  }
}
