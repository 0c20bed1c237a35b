//! JSON rendering of an unrolled workflow.

use std::path::Path;

use rota_config::{DataType, TaskKind};
use rota_workflow::{Coordinates, DataId, TaskId, Workflow};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Unrolled<'a> {
  pub name: &'a str,
  pub tasks: Vec<TaskEntry<'a>>,
  pub data: Vec<DataEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct TaskEntry<'a> {
  pub label: &'a str,
  pub name: &'a str,
  pub cycle: &'a str,
  pub coordinates: &'a Coordinates,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub computer: Option<&'a str>,
  pub kind: &'a TaskKind,
  pub inputs: Vec<PortEntry<'a>>,
  pub outputs: Vec<&'a str>,
  pub wait_on: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct PortEntry<'a> {
  pub port: &'a str,
  pub data: &'a str,
  pub bound: Vec<BoundEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct BoundEntry<'a> {
  pub label: &'a str,
  /// Name the consuming task sees the data under
  pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct DataEntry<'a> {
  pub label: &'a str,
  pub name: &'a str,
  pub coordinates: &'a Coordinates,
  #[serde(rename = "type")]
  pub data_type: DataType,
  pub src: &'a Path,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub computer: Option<&'a str>,
  pub producer: Option<&'a str>,
  pub consumers: Vec<&'a str>,
}

impl<'a> Unrolled<'a> {
  pub fn new(workflow: &'a Workflow) -> Self {
    let task_label = move |id: &TaskId| workflow.task(*id).map_or("", |task| task.label.as_str());
    let data_label = move |id: &DataId| {
      workflow
        .data_instance(*id)
        .map_or("", |data| data.label.as_str())
    };

    let tasks = workflow
      .tasks()
      .iter()
      .map(|task| TaskEntry {
        label: &task.label,
        name: &task.name,
        cycle: &task.cycle,
        coordinates: &task.coordinates,
        computer: task.computer.as_deref(),
        kind: &task.kind,
        inputs: task
          .inputs
          .iter()
          .map(|binding| PortEntry {
            port: &binding.port,
            data: &binding.data,
            bound: binding
              .instances
              .iter()
              .map(|id| BoundEntry {
                label: data_label(id),
                filename: workflow
                  .display_filename(task.id, *id)
                  .unwrap_or_default(),
              })
              .collect(),
          })
          .collect(),
        outputs: task.outputs.iter().map(data_label).collect(),
        wait_on: task.wait_on.iter().map(task_label).collect(),
      })
      .collect();

    let data = workflow
      .data()
      .iter()
      .map(|data| DataEntry {
        label: &data.label,
        name: &data.name,
        coordinates: &data.coordinates,
        data_type: data.data_type,
        src: &data.src,
        computer: data.computer.as_deref(),
        producer: data.producer.as_ref().map(task_label),
        consumers: data.consumers.iter().map(task_label).collect(),
      })
      .collect();

    Self {
      name: workflow.name(),
      tasks,
      data,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_document_lists_bindings_by_label() {
    let root = tempfile::tempdir().unwrap();
    let mut def: rota_config::WorkflowDef = serde_json::from_str(
      r#"{
        "name": "ensemble",
        "parameters": { "member": [1, 2] },
        "cycles": [
          {
            "name": "members",
            "tasks": [
              { "name": "sim", "outputs": ["result"] },
              { "name": "merge", "inputs": [{ "name": "result", "parameters": { "member": "all" } }] }
            ]
          }
        ],
        "tasks": [
          { "name": "sim", "plugin": "shell", "command": "sim", "parameters": ["member"] },
          { "name": "merge", "plugin": "shell", "command": "merge" }
        ],
        "data": { "generated": [{ "name": "result", "type": "file", "src": "result.nc" }] }
      }"#,
    )
    .unwrap();
    def.rootdir = root.path().to_path_buf();

    let workflow = rota_resolver::build(&def).unwrap();
    let value = serde_json::to_value(Unrolled::new(&workflow)).unwrap();

    let merge = &value["tasks"][2];
    assert_eq!(merge["label"], "merge");
    assert_eq!(merge["inputs"][0]["port"], "result");
    assert_eq!(merge["inputs"][0]["bound"][1]["label"], "result_member_2");
    assert_eq!(merge["inputs"][0]["bound"][1]["filename"], "result_member_2");

    let result = &value["data"][0];
    assert_eq!(result["producer"], "sim_member_1");
    assert_eq!(result["consumers"][0], "merge");
    assert_eq!(result["coordinates"]["member"], 1);
  }
}
