use std::collections::HashMap;

use rota_config::ParameterSpace;

use crate::coordinates::{Coordinates, InstanceKey};
use crate::error::WorkflowError;
use crate::graph::Graph;
use crate::instance::{DataId, DataInstance, Edge, TaskId, TaskInstance};

/// An unrolled workflow: every task and data instance with resolved bindings.
///
/// Built once by the resolver and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Workflow {
  name: String,
  parameters: ParameterSpace,
  tasks: Vec<TaskInstance>,
  data: Vec<DataInstance>,
  edges: Vec<Edge>,
  task_index: HashMap<InstanceKey, TaskId>,
  data_index: HashMap<InstanceKey, DataId>,
}

impl Workflow {
  /// Assemble a workflow from its instances.
  ///
  /// Checks that every instance sits at the index of its id, that no
  /// identity or label occurs twice among tasks or among data, and that all
  /// edges reference existing instances.
  pub fn from_parts(
    name: impl Into<String>,
    parameters: ParameterSpace,
    tasks: Vec<TaskInstance>,
    data: Vec<DataInstance>,
    edges: Vec<Edge>,
  ) -> Result<Self, WorkflowError> {
    let task_index = index_instances(
      tasks
        .iter()
        .map(|t| (t.id.index(), t.key(), t.label.as_str())),
      TaskId::new,
    )?;
    let data_index = index_instances(
      data
        .iter()
        .map(|d| (d.id.index(), d.key(), d.label.as_str())),
      DataId::new,
    )?;

    let task_exists = |id: TaskId| id.index() < tasks.len();
    let data_exists = |id: DataId| id.index() < data.len();
    for edge in &edges {
      let valid = match edge {
        Edge::Output { task, data } | Edge::Input { data, task, .. } => {
          task_exists(*task) && data_exists(*data)
        }
        Edge::WaitOn { task, waits_for } => task_exists(*task) && task_exists(*waits_for),
      };
      if !valid {
        return Err(WorkflowError::InvalidEdge(format!("{edge:?}")));
      }
    }

    Ok(Self {
      name: name.into(),
      parameters,
      tasks,
      data,
      edges,
      task_index,
      data_index,
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn parameters(&self) -> &ParameterSpace {
    &self.parameters
  }

  /// All task instances in creation order.
  pub fn tasks(&self) -> &[TaskInstance] {
    &self.tasks
  }

  /// All data instances in creation order.
  pub fn data(&self) -> &[DataInstance] {
    &self.data
  }

  pub fn edges(&self) -> &[Edge] {
    &self.edges
  }

  pub fn task(&self, id: TaskId) -> Option<&TaskInstance> {
    self.tasks.get(id.index())
  }

  pub fn data_instance(&self, id: DataId) -> Option<&DataInstance> {
    self.data.get(id.index())
  }

  pub fn find_task(&self, name: &str, coordinates: &Coordinates) -> Option<&TaskInstance> {
    self
      .task_index
      .get(&InstanceKey::new(name, coordinates.clone()))
      .and_then(|id| self.task(*id))
  }

  pub fn find_data(&self, name: &str, coordinates: &Coordinates) -> Option<&DataInstance> {
    self
      .data_index
      .get(&InstanceKey::new(name, coordinates.clone()))
      .and_then(|id| self.data_instance(*id))
  }

  /// Ports of a task in declaration order, without duplicates.
  pub fn ports(&self, task: TaskId) -> Vec<&str> {
    let mut ports: Vec<&str> = Vec::new();
    if let Some(task) = self.task(task) {
      for binding in &task.inputs {
        if !ports.contains(&binding.port.as_str()) {
          ports.push(&binding.port);
        }
      }
    }
    ports
  }

  /// Data instances bound to a port. `None` if the task has no such port;
  /// an empty list if the port exists but nothing was bound.
  pub fn bound(&self, task: TaskId, port: &str) -> Option<Vec<DataId>> {
    let task = self.task(task)?;
    let mut found = false;
    let mut bound = Vec::new();
    for binding in task.inputs.iter().filter(|b| b.port == port) {
      found = true;
      bound.extend(binding.instances.iter().copied());
    }
    found.then_some(bound)
  }

  /// Filename a consuming task sees for one of its bound data instances.
  ///
  /// When the task has more than one distinct instance of the same data
  /// template bound (across all ports), each is shown under its canonical
  /// label; otherwise under the basename of its source.
  pub fn display_filename(&self, task: TaskId, data: DataId) -> Option<String> {
    let task = self.task(task)?;
    let instance = self.data_instance(data)?;
    let bound = task.bound_data();
    if !bound.contains(&data) {
      return None;
    }

    let same_name = bound
      .iter()
      .filter_map(|id| self.data_instance(*id))
      .filter(|other| other.name == instance.name)
      .count();

    if same_name > 1 {
      Some(instance.label.clone())
    } else {
      Some(
        instance
          .basename()
          .unwrap_or_else(|| instance.label.clone()),
      )
    }
  }

  /// Display filenames for every instance bound to a port, in binding order.
  pub fn display_filenames(&self, task: TaskId, port: &str) -> Vec<(DataId, String)> {
    self
      .bound(task, port)
      .unwrap_or_default()
      .into_iter()
      .filter_map(|data| {
        self
          .display_filename(task, data)
          .map(|filename| (data, filename))
      })
      .collect()
  }

  /// Build the task-level dependency graph.
  pub fn graph(&self) -> Graph {
    let mut edges = Vec::new();
    for edge in &self.edges {
      match edge {
        Edge::Input { data, task, .. } => {
          if let Some(producer) = self.data_instance(*data).and_then(|d| d.producer) {
            edges.push((producer, *task));
          }
        }
        Edge::WaitOn { task, waits_for } => edges.push((*waits_for, *task)),
        Edge::Output { .. } => {}
      }
    }
    Graph::new(self.tasks.iter().map(|t| t.id), &edges)
  }
}

fn index_instances<'a, Id: Copy>(
  instances: impl Iterator<Item = (usize, InstanceKey, &'a str)>,
  make_id: impl Fn(usize) -> Id,
) -> Result<HashMap<InstanceKey, Id>, WorkflowError> {
  let mut index = HashMap::new();
  let mut labels: HashMap<&'a str, InstanceKey> = HashMap::new();

  for (position, (id, key, label)) in instances.enumerate() {
    if id != position {
      return Err(WorkflowError::InvalidId {
        label: label.to_string(),
        index: position,
        id,
      });
    }
    if let Some(previous) = labels.get(label) {
      if *previous == key {
        return Err(WorkflowError::DuplicateInstance {
          label: label.to_string(),
        });
      }
      return Err(WorkflowError::LabelCollision {
        label: label.to_string(),
        first: previous.to_string(),
        second: key.to_string(),
      });
    }
    labels.insert(label, key.clone());
    if index.insert(key, make_id(id)).is_some() {
      return Err(WorkflowError::DuplicateInstance {
        label: label.to_string(),
      });
    }
  }

  Ok(index)
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use rota_config::{DataType, ParamValue, ShellTask, TaskKind};

  use super::*;
  use crate::instance::PortBinding;
  use crate::label::canonical_label;

  fn space() -> ParameterSpace {
    ParameterSpace::new().with("param", vec![ParamValue::Int(1), ParamValue::Int(2)])
  }

  fn task(id: usize, name: &str, inputs: Vec<PortBinding>) -> TaskInstance {
    let coordinates = Coordinates::new();
    TaskInstance {
      id: TaskId::new(id),
      name: name.to_string(),
      cycle: "main".to_string(),
      label: canonical_label(name, &coordinates, &space()),
      coordinates,
      computer: None,
      kind: TaskKind::Shell(ShellTask {
        command: "true".to_string(),
        path: None,
        env_source_files: Vec::new(),
      }),
      inputs,
      outputs: Vec::new(),
      wait_on: Vec::new(),
    }
  }

  fn data(id: usize, name: &str, coordinates: Coordinates, producer: Option<usize>) -> DataInstance {
    DataInstance {
      id: DataId::new(id),
      name: name.to_string(),
      label: canonical_label(name, &coordinates, &space()),
      coordinates,
      data_type: DataType::File,
      src: PathBuf::from(format!("out/{name}.nc")),
      computer: None,
      producer: producer.map(TaskId::new),
      consumers: Vec::new(),
    }
  }

  fn binding(port: &str, data: &str, ids: &[usize]) -> PortBinding {
    PortBinding {
      port: port.to_string(),
      data: data.to_string(),
      instances: ids.iter().copied().map(DataId::new).collect(),
    }
  }

  #[test]
  fn test_single_instance_uses_basename() {
    let workflow = Workflow::from_parts(
      "wf",
      space(),
      vec![task(0, "consumer", vec![binding("grid", "grid", &[0])])],
      vec![data(0, "grid", Coordinates::new(), None)],
      vec![Edge::Input {
        data: DataId::new(0),
        task: TaskId::new(0),
        port: "grid".to_string(),
      }],
    )
    .unwrap();

    assert_eq!(
      workflow.display_filename(TaskId::new(0), DataId::new(0)),
      Some("grid.nc".to_string())
    );
    assert_eq!(workflow.bound(TaskId::new(0), "grid"), Some(vec![DataId::new(0)]));
    assert_eq!(workflow.bound(TaskId::new(0), "other"), None);
  }

  #[test]
  fn test_conflicting_names_use_labels_per_consumer() {
    let p1 = Coordinates::new().with("param", 1);
    let p2 = Coordinates::new().with("param", 2);
    let workflow = Workflow::from_parts(
      "wf",
      space(),
      vec![
        task(0, "producer", vec![]),
        // sees both instances of "field": labels
        task(1, "gather", vec![binding("fields", "field", &[0, 1])]),
        // sees one instance: basename
        task(2, "single", vec![binding("field", "field", &[1])]),
      ],
      vec![
        data(0, "field", p1, Some(0)),
        data(1, "field", p2, Some(0)),
      ],
      vec![],
    )
    .unwrap();

    assert_eq!(
      workflow.display_filenames(TaskId::new(1), "fields"),
      vec![
        (DataId::new(0), "field_param_1".to_string()),
        (DataId::new(1), "field_param_2".to_string()),
      ]
    );
    assert_eq!(
      workflow.display_filename(TaskId::new(2), DataId::new(1)),
      Some("field.nc".to_string())
    );
    assert_eq!(workflow.display_filename(TaskId::new(2), DataId::new(0)), None);
  }

  #[test]
  fn test_same_instance_on_two_ports_counts_once() {
    let workflow = Workflow::from_parts(
      "wf",
      space(),
      vec![task(
        0,
        "consumer",
        vec![binding("a", "grid", &[0]), binding("b", "grid", &[0])],
      )],
      vec![data(0, "grid", Coordinates::new(), None)],
      vec![],
    )
    .unwrap();

    assert_eq!(workflow.ports(TaskId::new(0)), vec!["a", "b"]);
    assert_eq!(
      workflow.display_filename(TaskId::new(0), DataId::new(0)),
      Some("grid.nc".to_string())
    );
  }

  #[test]
  fn test_rejects_duplicate_identity() {
    let result = Workflow::from_parts(
      "wf",
      space(),
      vec![],
      vec![
        data(0, "grid", Coordinates::new(), None),
        data(1, "grid", Coordinates::new(), None),
      ],
      vec![],
    );
    assert!(matches!(result, Err(WorkflowError::DuplicateInstance { .. })));
  }

  #[test]
  fn test_rejects_label_collision() {
    let space = ParameterSpace::new().with(
      "mode",
      vec![ParamValue::from("a.b"), ParamValue::from("a_b")],
    );
    let mut first = data(0, "out", Coordinates::new().with("mode", "a.b"), None);
    let mut second = data(1, "out", Coordinates::new().with("mode", "a_b"), None);
    first.label = canonical_label("out", &first.coordinates, &space);
    second.label = canonical_label("out", &second.coordinates, &space);

    let result = Workflow::from_parts("wf", space, vec![], vec![first, second], vec![]);
    assert!(matches!(result, Err(WorkflowError::LabelCollision { .. })));
  }

  #[test]
  fn test_rejects_dangling_edge() {
    let result = Workflow::from_parts(
      "wf",
      space(),
      vec![task(0, "t", vec![])],
      vec![],
      vec![Edge::Output {
        task: TaskId::new(0),
        data: DataId::new(3),
      }],
    );
    assert!(matches!(result, Err(WorkflowError::InvalidEdge(_))));
  }

  #[test]
  fn test_find_by_identity() {
    let coords = Coordinates::new().with("param", 2);
    let workflow = Workflow::from_parts(
      "wf",
      space(),
      vec![],
      vec![data(0, "field", coords.clone(), None)],
      vec![],
    )
    .unwrap();

    let found = workflow.find_data("field", &coords).unwrap();
    assert_eq!(found.id, DataId::new(0));
    assert!(workflow
      .find_data("field", &Coordinates::new().with("param", 1))
      .is_none());
  }
}
