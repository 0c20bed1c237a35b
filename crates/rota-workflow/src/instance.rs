use std::fmt;
use std::path::PathBuf;

use rota_config::{DataType, TaskKind};
use serde::Serialize;

use crate::coordinates::{Coordinates, InstanceKey};

/// Index of a task instance in its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(usize);

/// Index of a data instance in its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DataId(usize);

impl TaskId {
  pub const fn new(index: usize) -> Self {
    Self(index)
  }

  pub const fn index(self) -> usize {
    self.0
  }
}

impl DataId {
  pub const fn new(index: usize) -> Self {
    Self(index)
  }

  pub const fn index(self) -> usize {
    self.0
  }
}

impl fmt::Display for TaskId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "task#{}", self.0)
  }
}

impl fmt::Display for DataId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "data#{}", self.0)
  }
}

/// Data instances bound to one input spec of a task instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortBinding {
  pub port: String,
  /// Name of the bound data template
  pub data: String,
  /// Bound instances in deterministic order; may be empty
  pub instances: Vec<DataId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskInstance {
  pub id: TaskId,
  pub name: String,
  /// Cycle the task template is placed in
  pub cycle: String,
  pub coordinates: Coordinates,
  pub label: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub computer: Option<String>,
  /// Execution payload with local paths resolved against the root directory
  pub kind: TaskKind,
  pub inputs: Vec<PortBinding>,
  pub outputs: Vec<DataId>,
  pub wait_on: Vec<TaskId>,
}

impl TaskInstance {
  pub fn key(&self) -> InstanceKey {
    InstanceKey::new(self.name.clone(), self.coordinates.clone())
  }

  /// Every bound data instance across all ports, without duplicates, in
  /// port order.
  pub fn bound_data(&self) -> Vec<DataId> {
    let mut seen = Vec::new();
    for binding in &self.inputs {
      for id in &binding.instances {
        if !seen.contains(id) {
          seen.push(*id);
        }
      }
    }
    seen
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataInstance {
  pub id: DataId,
  pub name: String,
  pub coordinates: Coordinates,
  pub label: String,
  pub data_type: DataType,
  /// Source location; for generated data, relative to the producer's
  /// working directory
  pub src: PathBuf,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub computer: Option<String>,
  /// Producing task, `None` for available data
  pub producer: Option<TaskId>,
  pub consumers: Vec<TaskId>,
}

impl DataInstance {
  pub fn key(&self) -> InstanceKey {
    InstanceKey::new(self.name.clone(), self.coordinates.clone())
  }

  pub fn is_available(&self) -> bool {
    self.producer.is_none()
  }

  /// Final path component of the source, used as the display filename.
  pub fn basename(&self) -> Option<String> {
    self
      .src
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
  }
}

/// A directed edge of the instance graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Edge {
  /// A task produces a data instance.
  Output { task: TaskId, data: DataId },
  /// A data instance is bound to a task's port.
  Input {
    data: DataId,
    task: TaskId,
    port: String,
  },
  /// A task waits for another task to finish.
  WaitOn { task: TaskId, waits_for: TaskId },
}
