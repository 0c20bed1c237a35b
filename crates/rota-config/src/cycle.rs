use serde::{Deserialize, Serialize};

use crate::input::{InputDef, WaitOnDef};

/// A block of tasks repeated over a date range.
///
/// A cycle without `cycling` is undated: its tasks run once per parameter
/// combination and carry no `date` axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleDef {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cycling: Option<CyclingDef>,
  pub tasks: Vec<CycleTaskDef>,
}

/// Date range of a cycle: `start_date`, `start_date + period`, ... up to and
/// including `stop_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CyclingDef {
  /// ISO 8601 date, e.g. "2026-01-01"
  pub start_date: String,
  /// ISO 8601 date, inclusive upper bound
  pub stop_date: String,
  /// ISO 8601 duration, e.g. "P6M"
  pub period: String,
}

/// A task placed in a cycle, together with its dependencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleTaskDef {
  /// Name of a root task definition
  pub name: String,
  #[serde(default)]
  pub inputs: Vec<InputDef>,
  /// Names of generated data this task produces
  #[serde(default)]
  pub outputs: Vec<String>,
  #[serde(default)]
  pub wait_on: Vec<WaitOnDef>,
}
