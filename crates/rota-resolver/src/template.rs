//! Name lookups and graph-level checks over a workflow template.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use rota_config::{
  AvailableDataDef, CycleDef, CycleTaskDef, GeneratedDataDef, ParameterSpace, TaskDef, WorkflowDef,
};

use crate::cycle::CycleSpec;
use crate::error::UnrollError;

/// Where a task template is placed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Placement<'a> {
  pub cycle: &'a CycleDef,
  pub task: &'a CycleTaskDef,
}

impl Placement<'_> {
  pub fn dated(&self) -> bool {
    self.cycle.cycling.is_some()
  }
}

/// What a dependency points at.
#[derive(Debug, Clone, Copy)]
pub(crate) enum TargetKind<'a> {
  Available(&'a AvailableDataDef),
  Generated,
  Task,
}

/// Axes of a dependency target.
#[derive(Debug, Clone)]
pub(crate) struct TargetShape<'a> {
  pub name: &'a str,
  pub kind: TargetKind<'a>,
  /// Parameter axes in the target's declared order
  pub axes: &'a [String],
  /// Cycling of the producing cycle; `None` for undated targets
  pub cycling: Option<CycleSpec>,
}

impl TargetShape<'_> {
  pub fn has_axis(&self, axis: &str) -> bool {
    self.axes.iter().any(|a| a == axis)
  }

  pub fn dated(&self) -> bool {
    self.cycling.is_some()
  }

  /// Whether `date` falls inside the target's cycling range.
  pub fn covers(&self, date: NaiveDateTime) -> bool {
    self.cycling.is_some_and(|spec| spec.covers(date))
  }
}

/// Indexed view of a [`WorkflowDef`].
pub(crate) struct Templates<'a> {
  tasks: HashMap<&'a str, &'a TaskDef>,
  available: HashMap<&'a str, &'a AvailableDataDef>,
  generated: HashMap<&'a str, &'a GeneratedDataDef>,
  /// generated data name -> producing task name
  producers: HashMap<&'a str, &'a str>,
  placements: HashMap<&'a str, Placement<'a>>,
  /// cycle name -> parsed cycling, for dated cycles
  cycling: HashMap<&'a str, CycleSpec>,
}

impl<'a> Templates<'a> {
  /// Index the template and reject graph-level inconsistencies: duplicate
  /// names, unknown references, unknown parameters, misplaced outputs.
  pub fn index(def: &'a WorkflowDef) -> Result<Self, UnrollError> {
    let space = &def.parameters;

    let mut tasks = HashMap::new();
    for task in &def.tasks {
      if tasks.insert(task.name.as_str(), task).is_some() {
        return Err(duplicate("task", &task.name));
      }
      check_axes(&task.name, &task.parameters, space)?;
    }

    let mut available = HashMap::new();
    let mut generated = HashMap::new();
    for data in &def.data.available {
      if available.insert(data.name.as_str(), data).is_some() {
        return Err(duplicate("data", &data.name));
      }
      check_axes(&data.name, &data.parameters, space)?;
    }
    for data in &def.data.generated {
      if available.contains_key(data.name.as_str())
        || generated.insert(data.name.as_str(), data).is_some()
      {
        return Err(duplicate("data", &data.name));
      }
    }

    let mut cycling = HashMap::new();
    let mut cycle_names = HashMap::new();
    let mut placements: HashMap<&'a str, Placement<'a>> = HashMap::new();
    let mut producers: HashMap<&'a str, &'a str> = HashMap::new();
    for cycle in &def.cycles {
      if cycle_names.insert(cycle.name.as_str(), ()).is_some() {
        return Err(duplicate("cycle", &cycle.name));
      }
      if let Some(section) = &cycle.cycling {
        cycling.insert(cycle.name.as_str(), CycleSpec::parse(&cycle.name, section)?);
      }
      for cycle_task in &cycle.tasks {
        if !tasks.contains_key(cycle_task.name.as_str()) {
          return Err(UnrollError::UnknownTask {
            cycle: cycle.name.clone(),
            task: cycle_task.name.clone(),
          });
        }
        if let Some(previous) = placements.insert(
          cycle_task.name.as_str(),
          Placement {
            cycle,
            task: cycle_task,
          },
        ) {
          return Err(UnrollError::TaskInMultipleCycles {
            task: cycle_task.name.clone(),
            first: previous.cycle.name.clone(),
            second: cycle.name.clone(),
          });
        }

        for output in &cycle_task.outputs {
          if available.contains_key(output.as_str()) {
            return Err(UnrollError::InvalidOutput {
              task: cycle_task.name.clone(),
              data: output.clone(),
            });
          }
          if !generated.contains_key(output.as_str()) {
            return Err(UnrollError::UnknownData {
              task: cycle_task.name.clone(),
              data: output.clone(),
            });
          }
          if let Some(first) = producers.insert(output.as_str(), cycle_task.name.as_str()) {
            return Err(UnrollError::DuplicateProducer {
              data: output.clone(),
              first: first.to_string(),
              second: cycle_task.name.clone(),
            });
          }
        }
      }
    }

    Ok(Self {
      tasks,
      available,
      generated,
      producers,
      placements,
      cycling,
    })
  }

  pub fn task(&self, name: &str) -> Option<&'a TaskDef> {
    self.tasks.get(name).copied()
  }

  pub fn generated(&self, name: &str) -> Option<&'a GeneratedDataDef> {
    self.generated.get(name).copied()
  }

  pub fn cycling(&self, cycle: &str) -> Option<CycleSpec> {
    self.cycling.get(cycle).copied()
  }

  /// Shape of a data template consumed by `consumer`.
  pub fn data_shape(&self, consumer: &str, data: &'a str) -> Result<TargetShape<'a>, UnrollError> {
    if let Some(&def) = self.available.get(data) {
      return Ok(TargetShape {
        name: data,
        kind: TargetKind::Available(def),
        axes: &def.parameters,
        cycling: None,
      });
    }

    if !self.generated.contains_key(data) {
      return Err(UnrollError::UnknownData {
        task: consumer.to_string(),
        data: data.to_string(),
      });
    }
    let producer = self
      .producers
      .get(data)
      .ok_or_else(|| UnrollError::NoProducer {
        task: consumer.to_string(),
        data: data.to_string(),
      })?;
    let placement = self.placements[producer];
    let task: &'a TaskDef = self.tasks[producer];
    Ok(TargetShape {
      name: data,
      kind: TargetKind::Generated,
      axes: &task.parameters,
      cycling: self.cycling(&placement.cycle.name),
    })
  }

  /// Shape of a task template waited on by `consumer`.
  pub fn task_shape(
    &self,
    consumer: &Placement<'a>,
    task: &'a str,
  ) -> Result<TargetShape<'a>, UnrollError> {
    let unknown = || UnrollError::UnknownTask {
      cycle: consumer.cycle.name.clone(),
      task: task.to_string(),
    };
    let def = self.tasks.get(task).copied().ok_or_else(unknown)?;
    let placement = self.placements.get(task).ok_or_else(unknown)?;
    Ok(TargetShape {
      name: task,
      kind: TargetKind::Task,
      axes: &def.parameters,
      cycling: self.cycling(&placement.cycle.name),
    })
  }
}

fn duplicate(kind: &'static str, name: &str) -> UnrollError {
  UnrollError::DuplicateName {
    kind,
    name: name.to_string(),
  }
}

fn check_axes(template: &str, axes: &[String], space: &ParameterSpace) -> Result<(), UnrollError> {
  for (i, axis) in axes.iter().enumerate() {
    if !space.contains(axis) || axis == rota_workflow::DATE_AXIS {
      return Err(UnrollError::UnknownParameter {
        template: template.to_string(),
        axis: axis.clone(),
      });
    }
    if axes[..i].contains(axis) {
      return Err(UnrollError::DuplicateAxis {
        template: template.to_string(),
        axis: axis.clone(),
      });
    }
  }
  Ok(())
}
