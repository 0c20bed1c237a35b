//! Canonical instance labels.
//!
//! A label is the template name followed by one `_<axis>_<value>` piece per
//! axis, pieces joined with `__`. Parameter axes come in declaration order,
//! the date axis last:
//!
//! ```text
//! icon_restart_foo_0___bar_3_0___date_2026_07_01_00_00_00
//! ```
//!
//! Values are sanitized by replacing every character that is not an ASCII
//! letter or digit with `_`. Sanitization is not injective ("a.b" and "a_b"
//! render the same); the workflow rejects such collisions instead of
//! renaming.

use rota_config::ParameterSpace;

use crate::coordinates::{Coordinates, DATE_AXIS};

const DATE_LABEL_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// Replace every non-alphanumeric ASCII character with an underscore.
pub fn sanitize(value: &str) -> String {
  value
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
    .collect()
}

/// Render the canonical label of an instance.
///
/// Axes missing from `space` (which the resolver never produces) are placed
/// after the declared ones, sorted by name.
pub fn canonical_label(name: &str, coordinates: &Coordinates, space: &ParameterSpace) -> String {
  let mut axes: Vec<(&str, String)> = coordinates
    .params()
    .map(|(axis, value)| (axis, sanitize(&value.to_string())))
    .collect();
  axes.sort_by_key(|(axis, _)| (space.position(axis).unwrap_or(usize::MAX), *axis));

  let mut pieces: Vec<String> = axes
    .into_iter()
    .map(|(axis, value)| format!("_{axis}_{value}"))
    .collect();
  if let Some(date) = coordinates.date() {
    pieces.push(format!("_{DATE_AXIS}_{}", date.format(DATE_LABEL_FORMAT)));
  }

  let mut label = name.to_string();
  label.push_str(&pieces.join("__"));
  label
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use rota_config::ParamValue;

  use super::*;

  fn space() -> ParameterSpace {
    ParameterSpace::new()
      .with("foo", vec![ParamValue::Int(0), ParamValue::Int(1)])
      .with("bar", vec![ParamValue::Float(3.0)])
  }

  #[test]
  fn test_label_follows_declared_order_with_date_last() {
    let date = NaiveDate::from_ymd_opt(2026, 7, 1)
      .unwrap()
      .and_hms_opt(0, 0, 0)
      .unwrap();
    let coords = Coordinates::new()
      .with_date(date)
      .with("bar", 3.0)
      .with("foo", 1);

    assert_eq!(
      canonical_label("icon_restart", &coords, &space()),
      "icon_restart_foo_1___bar_3_0___date_2026_07_01_00_00_00"
    );
  }

  #[test]
  fn test_label_without_coordinates_is_the_name() {
    assert_eq!(canonical_label("grid", &Coordinates::new(), &space()), "grid");
  }

  #[test]
  fn test_label_single_axis() {
    let coords = Coordinates::new().with("foo", 0);
    assert_eq!(canonical_label("task", &coords, &space()), "task_foo_0");
  }

  #[test]
  fn test_sanitize() {
    assert_eq!(sanitize("a-b.c d:e"), "a_b_c_d_e");
    assert_eq!(sanitize("abc123"), "abc123");
  }

  #[test]
  fn test_sanitize_is_not_injective() {
    let dotted = Coordinates::new().with("mode", "a.b");
    let underscored = Coordinates::new().with("mode", "a_b");
    let space = ParameterSpace::new().with(
      "mode",
      vec![ParamValue::from("a.b"), ParamValue::from("a_b")],
    );

    assert_ne!(dotted, underscored);
    assert_eq!(
      canonical_label("t", &dotted, &space),
      canonical_label("t", &underscored, &space)
    );
  }
}
