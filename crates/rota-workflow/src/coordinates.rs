use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use rota_config::ParamValue;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Reserved axis name for the cycle date.
pub const DATE_AXIS: &str = "date";

/// Position of an instance in the unrolled workflow.
///
/// Parameter values are kept in a sorted map, so two coordinates built in a
/// different axis order are equal and hash the same.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Coordinates {
  params: BTreeMap<String, ParamValue>,
  date: Option<NaiveDateTime>,
}

impl Coordinates {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, axis: impl Into<String>, value: impl Into<ParamValue>) -> Self {
    self.insert(axis, value);
    self
  }

  pub fn with_date(mut self, date: NaiveDateTime) -> Self {
    self.date = Some(date);
    self
  }

  pub fn insert(&mut self, axis: impl Into<String>, value: impl Into<ParamValue>) {
    self.params.insert(axis.into(), value.into());
  }

  pub fn set_date(&mut self, date: Option<NaiveDateTime>) {
    self.date = date;
  }

  /// Value on a parameter axis.
  pub fn get(&self, axis: &str) -> Option<&ParamValue> {
    self.params.get(axis)
  }

  pub fn date(&self) -> Option<NaiveDateTime> {
    self.date
  }

  /// Parameter axes and values, sorted by axis name.
  pub fn params(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
    self.params.iter().map(|(axis, value)| (axis.as_str(), value))
  }

}

impl FromIterator<(String, ParamValue)> for Coordinates {
  fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
    Self {
      params: iter.into_iter().collect(),
      date: None,
    }
  }
}

impl fmt::Display for Coordinates {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("{")?;
    let mut first = true;
    for (axis, value) in &self.params {
      if !first {
        f.write_str(", ")?;
      }
      write!(f, "{axis}: {value}")?;
      first = false;
    }
    if let Some(date) = self.date {
      if !first {
        f.write_str(", ")?;
      }
      write!(f, "{DATE_AXIS}: {}", date.format("%Y-%m-%dT%H:%M:%S"))?;
    }
    f.write_str("}")
  }
}

impl Serialize for Coordinates {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let len = self.params.len() + usize::from(self.date.is_some());
    let mut map = serializer.serialize_map(Some(len))?;
    for (axis, value) in &self.params {
      map.serialize_entry(axis, value)?;
    }
    if let Some(date) = self.date {
      map.serialize_entry(DATE_AXIS, &date.format("%Y-%m-%dT%H:%M:%S").to_string())?;
    }
    map.end()
  }
}

/// Identity of an instance: template name plus coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceKey {
  pub name: String,
  pub coordinates: Coordinates,
}

impl InstanceKey {
  pub fn new(name: impl Into<String>, coordinates: Coordinates) -> Self {
    Self {
      name: name.into(),
      coordinates,
    }
  }
}

impl fmt::Display for InstanceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.name, self.coordinates)
  }
}
