//! Dependency specifications of a cycle task.
//!
//! An input binds a task to instances of a data template, a `wait_on` entry
//! orders a task after instances of another task. Both select their targets
//! the same way:
//!
//! ```json
//! {
//!   "name": "icon_restart",
//!   "port": "restart",
//!   "parameters": { "foo": "single", "bar": "all" },
//!   "target_cycle": { "lag": ["-P6M", "-P12M"] }
//! }
//! ```
//!
//! - `parameters` sets the binding mode per parameter axis. Axes left out
//!   join against the consumer's own value.
//! - `when` keeps the dependency only for consumer dates matching the filter.
//! - `target_cycle` selects producer dates relative to (`lag`) or
//!   independently of (`date`) the consumer date. It cannot be combined
//!   with `when`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How a consumer binds to a producer along one parameter axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisMode {
  /// Join on the consumer's own value.
  Single,
  /// Gather every declared value of the axis.
  All,
}

/// A single value or a list of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
  One(T),
  Many(Vec<T>),
}

impl<T> OneOrMany<T> {
  pub fn as_slice(&self) -> &[T] {
    match self {
      OneOrMany::One(value) => std::slice::from_ref(value),
      OneOrMany::Many(values) => values,
    }
  }
}

/// Filter on the consumer's cycle date. Every given bound must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhenDef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub at: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub before: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub after: Option<String>,
}

/// Selection of producer dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetCycleDef {
  /// Offsets added to the consumer date, e.g. "-P6M".
  Lag(OneOrMany<String>),
  /// Absolute producer dates.
  Date(OneOrMany<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDef {
  /// Name of the data template
  pub name: String,
  /// Port the bound data is attached to; defaults to the data name
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub port: Option<String>,
  #[serde(default)]
  pub parameters: BTreeMap<String, AxisMode>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub when: Option<WhenDef>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub target_cycle: Option<TargetCycleDef>,
}

impl InputDef {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      port: None,
      parameters: BTreeMap::new(),
      when: None,
      target_cycle: None,
    }
  }

  pub fn port_name(&self) -> &str {
    self.port.as_deref().unwrap_or(&self.name)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitOnDef {
  /// Name of the task template to wait for
  pub name: String,
  #[serde(default)]
  pub parameters: BTreeMap<String, AxisMode>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub when: Option<WhenDef>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub target_cycle: Option<TargetCycleDef>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_deserialize_input_with_lag_list() {
    let input: InputDef = serde_json::from_str(
      r#"{
        "name": "icon_restart",
        "parameters": { "foo": "single", "bar": "all" },
        "target_cycle": { "lag": ["-P6M", "-P12M"] }
      }"#,
    )
    .unwrap();

    assert_eq!(input.port_name(), "icon_restart");
    assert_eq!(input.parameters.get("bar"), Some(&AxisMode::All));
    match input.target_cycle {
      Some(TargetCycleDef::Lag(lags)) => assert_eq!(lags.as_slice(), ["-P6M", "-P12M"]),
      other => panic!("expected lag, got {other:?}"),
    }
  }

  #[test]
  fn test_deserialize_single_lag_and_when() {
    let input: InputDef = serde_json::from_str(
      r#"{ "name": "forcing", "port": "bc", "when": { "after": "2026-01-01" } }"#,
    )
    .unwrap();
    assert_eq!(input.port_name(), "bc");
    assert_eq!(
      input.when.unwrap().after.as_deref(),
      Some("2026-01-01")
    );

    let target: TargetCycleDef = serde_json::from_str(r#"{ "lag": "-P1D" }"#).unwrap();
    assert_eq!(target, TargetCycleDef::Lag(OneOrMany::One("-P1D".to_string())));
  }
}
