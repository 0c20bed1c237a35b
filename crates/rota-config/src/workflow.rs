use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cycle::CycleDef;
use crate::data::DataDefs;
use crate::parameters::ParameterSpace;
use crate::task::TaskDef;

/// A complete workflow template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub name: String,
  /// Directory relative paths are resolved against. Left empty, the loader
  /// fills in the directory of the workflow file.
  #[serde(default)]
  pub rootdir: PathBuf,
  pub cycles: Vec<CycleDef>,
  pub tasks: Vec<TaskDef>,
  #[serde(default)]
  pub data: DataDefs,
  #[serde(default)]
  pub parameters: ParameterSpace,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{AxisMode, TaskKind, TargetCycleDef};

  #[test]
  fn test_deserialize_workflow() {
    let def: WorkflowDef = serde_json::from_str(
      r#"{
        "name": "climate",
        "cycles": [
          {
            "name": "bimonthly",
            "cycling": { "start_date": "2026-01-01", "stop_date": "2028-01-01", "period": "P6M" },
            "tasks": [
              {
                "name": "icon",
                "inputs": [
                  { "name": "grid" },
                  {
                    "name": "icon_restart",
                    "parameters": { "foo": "single", "bar": "single" },
                    "target_cycle": { "lag": "-P6M" }
                  }
                ],
                "outputs": ["icon_restart"]
              }
            ]
          }
        ],
        "tasks": [
          { "name": "icon", "plugin": "icon", "bin": "/opt/icon", "parameters": ["foo", "bar"] }
        ],
        "data": {
          "available": [ { "name": "grid", "type": "file", "src": "grid.nc" } ],
          "generated": [ { "name": "icon_restart", "type": "file", "src": "restart.nc" } ]
        },
        "parameters": { "foo": [0, 1], "bar": [3.0] }
      }"#,
    )
    .unwrap();

    assert_eq!(def.rootdir, PathBuf::new());
    assert_eq!(def.cycles[0].tasks[0].inputs.len(), 2);
    let restart = &def.cycles[0].tasks[0].inputs[1];
    assert_eq!(restart.parameters.get("foo"), Some(&AxisMode::Single));
    assert!(matches!(restart.target_cycle, Some(TargetCycleDef::Lag(_))));
    assert!(matches!(def.tasks[0].kind, TaskKind::Icon(_)));
    assert_eq!(def.parameters.names().collect::<Vec<_>>(), vec!["foo", "bar"]);
  }
}
