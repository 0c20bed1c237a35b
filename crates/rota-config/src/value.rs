use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// One allowed value of a parameter.
///
/// Floats compare and hash by their bit pattern so that values can be used
/// as part of an instance identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
  Int(i64),
  Float(f64),
  Text(String),
}

impl ParamValue {
  fn rank(&self) -> u8 {
    match self {
      ParamValue::Int(_) => 0,
      ParamValue::Float(_) => 1,
      ParamValue::Text(_) => 2,
    }
  }
}

impl PartialEq for ParamValue {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (ParamValue::Int(a), ParamValue::Int(b)) => a == b,
      (ParamValue::Float(a), ParamValue::Float(b)) => a.to_bits() == b.to_bits(),
      (ParamValue::Text(a), ParamValue::Text(b)) => a == b,
      _ => false,
    }
  }
}

impl Eq for ParamValue {}

impl Hash for ParamValue {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.rank().hash(state);
    match self {
      ParamValue::Int(v) => v.hash(state),
      ParamValue::Float(v) => v.to_bits().hash(state),
      ParamValue::Text(v) => v.hash(state),
    }
  }
}

impl PartialOrd for ParamValue {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for ParamValue {
  fn cmp(&self, other: &Self) -> Ordering {
    match (self, other) {
      (ParamValue::Int(a), ParamValue::Int(b)) => a.cmp(b),
      (ParamValue::Float(a), ParamValue::Float(b)) => a.total_cmp(b),
      (ParamValue::Text(a), ParamValue::Text(b)) => a.cmp(b),
      _ => self.rank().cmp(&other.rank()),
    }
  }
}

impl fmt::Display for ParamValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ParamValue::Int(v) => write!(f, "{v}"),
      // Debug keeps the decimal point on integral floats ("3.0", not "3").
      ParamValue::Float(v) => write!(f, "{v:?}"),
      ParamValue::Text(v) => f.write_str(v),
    }
  }
}

impl From<i64> for ParamValue {
  fn from(value: i64) -> Self {
    ParamValue::Int(value)
  }
}

impl From<i32> for ParamValue {
  fn from(value: i32) -> Self {
    ParamValue::Int(i64::from(value))
  }
}

impl From<f64> for ParamValue {
  fn from(value: f64) -> Self {
    ParamValue::Float(value)
  }
}

impl From<&str> for ParamValue {
  fn from(value: &str) -> Self {
    ParamValue::Text(value.to_string())
  }
}
