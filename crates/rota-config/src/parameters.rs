use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value::ParamValue;

/// The global parameter catalogue.
///
/// Maps each parameter name to its ordered list of allowed values. Both the
/// parameter order and the value order are kept exactly as declared in the
/// source document; expansion and label rendering depend on it.
///
/// ```json
/// { "foo": [0, 1], "bar": [3.0] }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSpace {
  axes: Vec<(String, Vec<ParamValue>)>,
}

impl ParameterSpace {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append a parameter, replacing the values of an existing one in place.
  pub fn with(mut self, name: impl Into<String>, values: Vec<ParamValue>) -> Self {
    self.insert(name, values);
    self
  }

  pub fn insert(&mut self, name: impl Into<String>, values: Vec<ParamValue>) {
    let name = name.into();
    match self.axes.iter_mut().find(|(axis, _)| *axis == name) {
      Some((_, existing)) => *existing = values,
      None => self.axes.push((name, values)),
    }
  }

  /// Declared values of a parameter.
  pub fn values(&self, name: &str) -> Option<&[ParamValue]> {
    self
      .axes
      .iter()
      .find(|(axis, _)| axis == name)
      .map(|(_, values)| values.as_slice())
  }

  pub fn contains(&self, name: &str) -> bool {
    self.values(name).is_some()
  }

  /// Declaration index of a parameter.
  pub fn position(&self, name: &str) -> Option<usize> {
    self.axes.iter().position(|(axis, _)| axis == name)
  }

  /// Parameter names in declaration order.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.axes.iter().map(|(axis, _)| axis.as_str())
  }
}

impl Serialize for ParameterSpace {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.axes.len()))?;
    for (name, values) in &self.axes {
      map.serialize_entry(name, values)?;
    }
    map.end()
  }
}

impl<'de> Deserialize<'de> for ParameterSpace {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    struct SpaceVisitor;

    impl<'de> Visitor<'de> for SpaceVisitor {
      type Value = ParameterSpace;

      fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of parameter names to value lists")
      }

      fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut space = ParameterSpace::new();
        while let Some((name, values)) = access.next_entry::<String, Vec<ParamValue>>()? {
          if space.contains(&name) {
            return Err(serde::de::Error::custom(format!(
              "duplicate parameter '{name}'"
            )));
          }
          space.insert(name, values);
        }
        Ok(space)
      }
    }

    deserializer.deserialize_map(SpaceVisitor)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_deserialize_keeps_document_order() {
    let space: ParameterSpace =
      serde_json::from_str(r#"{ "zeta": [2, 1], "alpha": ["b", "a"] }"#).unwrap();

    assert_eq!(space.names().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
    assert_eq!(
      space.values("zeta").unwrap(),
      &[ParamValue::Int(2), ParamValue::Int(1)]
    );
    assert_eq!(space.position("alpha"), Some(1));
    assert_eq!(space.values("alpha").map(<[ParamValue]>::len), Some(2));
    assert_eq!(space.values("missing"), None);
  }

  #[test]
  fn test_deserialize_rejects_duplicates() {
    let result: Result<ParameterSpace, _> = serde_json::from_str(r#"{ "a": [1], "a": [2] }"#);
    assert!(result.is_err());
  }

  #[test]
  fn test_serialize_round_trips_order() {
    let space = ParameterSpace::new()
      .with("foo", vec![ParamValue::Int(0), ParamValue::Int(1)])
      .with("bar", vec![ParamValue::Float(3.0)]);

    let json = serde_json::to_string(&space).unwrap();
    assert_eq!(json, r#"{"foo":[0,1],"bar":[3.0]}"#);
  }
}
