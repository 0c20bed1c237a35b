use rota_config::{ParamValue, ParameterSpace};
use rota_workflow::{Coordinates, DATE_AXIS};

use crate::error::UnrollError;

/// Cartesian product of parameter values over a list of axes.
///
/// Yields coordinates in declared axis order, with the last axis varying
/// fastest and values in declared order. Never includes the date axis.
pub fn expand<'a>(
  template: &str,
  axes: &'a [String],
  space: &'a ParameterSpace,
) -> Result<ParameterProduct<'a>, UnrollError> {
  let mut resolved: Vec<(&'a str, &'a [ParamValue])> = Vec::with_capacity(axes.len());
  for axis in axes {
    if resolved.iter().any(|(name, _)| *name == axis.as_str()) {
      return Err(UnrollError::DuplicateAxis {
        template: template.to_string(),
        axis: axis.clone(),
      });
    }
    let values = space
      .values(axis)
      .filter(|_| axis != DATE_AXIS)
      .ok_or_else(|| UnrollError::UnknownParameter {
        template: template.to_string(),
        axis: axis.clone(),
      })?;
    resolved.push((axis.as_str(), values));
  }
  Ok(ParameterProduct::from_axes(resolved))
}

/// Lazy odometer over the value lists of several axes.
#[derive(Debug, Clone)]
pub struct ParameterProduct<'a> {
  axes: Vec<(&'a str, &'a [ParamValue])>,
  indices: Vec<usize>,
  done: bool,
}

impl<'a> ParameterProduct<'a> {
  pub(crate) fn from_axes(axes: Vec<(&'a str, &'a [ParamValue])>) -> Self {
    let done = axes.iter().any(|(_, values)| values.is_empty());
    Self {
      indices: vec![0; axes.len()],
      axes,
      done,
    }
  }
}

impl Iterator for ParameterProduct<'_> {
  type Item = Coordinates;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done {
      return None;
    }

    let item: Coordinates = self
      .axes
      .iter()
      .zip(&self.indices)
      .map(|((axis, values), index)| (axis.to_string(), values[*index].clone()))
      .collect();

    // advance, last axis fastest
    let mut position = self.axes.len();
    loop {
      if position == 0 {
        self.done = true;
        break;
      }
      position -= 1;
      self.indices[position] += 1;
      if self.indices[position] < self.axes[position].1.len() {
        break;
      }
      self.indices[position] = 0;
    }

    Some(item)
  }
}

impl std::iter::FusedIterator for ParameterProduct<'_> {}
