use chrono::NaiveDateTime;
use rota_config::{CyclingDef, Period, parse_date};

use crate::error::UnrollError;

/// Validated date range of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSpec {
  start: NaiveDateTime,
  stop: NaiveDateTime,
  period: Period,
}

impl CycleSpec {
  /// Create a cycle spec. Fails if `start > stop` or the period does not move
  /// forward in time.
  pub fn new(
    cycle: &str,
    start: NaiveDateTime,
    stop: NaiveDateTime,
    period: Period,
  ) -> Result<Self, UnrollError> {
    if start > stop {
      return Err(UnrollError::InvalidCycling {
        cycle: cycle.to_string(),
        message: format!("start date {start} is after stop date {stop}"),
      });
    }
    if !period.is_positive() {
      return Err(UnrollError::InvalidCycling {
        cycle: cycle.to_string(),
        message: format!("period {period} must be positive"),
      });
    }
    Ok(Self {
      start,
      stop,
      period,
    })
  }

  /// Parse and validate the cycling section of a cycle.
  pub fn parse(cycle: &str, def: &CyclingDef) -> Result<Self, UnrollError> {
    let invalid = |source| UnrollError::InvalidExpression {
      template: cycle.to_string(),
      source,
    };
    let start = parse_date(&def.start_date).map_err(invalid)?;
    let stop = parse_date(&def.stop_date).map_err(invalid)?;
    let period: Period = def.period.parse().map_err(invalid)?;
    Self::new(cycle, start, stop, period)
  }

  pub fn start(&self) -> NaiveDateTime {
    self.start
  }

  pub fn stop(&self) -> NaiveDateTime {
    self.stop
  }

  pub fn period(&self) -> Period {
    self.period
  }

  /// The cycle dates: `start + k * period` for k = 0, 1, ... while not after
  /// `stop`. Each call starts over.
  pub fn dates(&self) -> CycleDates {
    CycleDates {
      spec: *self,
      step: 0,
      done: false,
    }
  }

  /// Whether `date` lies between the start and stop dates, inclusive.
  pub fn covers(&self, date: NaiveDateTime) -> bool {
    self.start <= date && date <= self.stop
  }

  /// Whether `date` is one of the cycle dates.
  pub fn contains(&self, date: NaiveDateTime) -> bool {
    if !self.covers(date) {
      return false;
    }
    self.dates().take_while(|d| *d <= date).any(|d| d == date)
  }
}

impl IntoIterator for &CycleSpec {
  type Item = NaiveDateTime;
  type IntoIter = CycleDates;

  fn into_iter(self) -> Self::IntoIter {
    self.dates()
  }
}

/// Lazy iterator over the dates of a [`CycleSpec`].
#[derive(Debug, Clone)]
pub struct CycleDates {
  spec: CycleSpec,
  step: i64,
  done: bool,
}

impl Iterator for CycleDates {
  type Item = NaiveDateTime;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done {
      return None;
    }
    // Offsets are taken from the start date so month-end clamping never
    // accumulates across steps.
    let date = self
      .spec
      .period
      .checked_mul(self.step)
      .and_then(|offset| offset.add_to(self.spec.start));
    match date {
      Some(date) if date <= self.spec.stop => {
        self.step += 1;
        Some(date)
      }
      _ => {
        self.done = true;
        None
      }
    }
  }
}

impl std::iter::FusedIterator for CycleDates {}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeDelta};
  use proptest::prelude::*;

  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
      .unwrap()
      .and_hms_opt(0, 0, 0)
      .unwrap()
  }

  #[test]
  fn test_six_monthly_dates() {
    let spec = CycleSpec::new(
      "bimonthly",
      date(2026, 1, 1),
      date(2028, 1, 1),
      Period::from_months(6),
    )
    .unwrap();

    let dates: Vec<_> = spec.dates().collect();
    assert_eq!(
      dates,
      vec![
        date(2026, 1, 1),
        date(2026, 7, 1),
        date(2027, 1, 1),
        date(2027, 7, 1),
        date(2028, 1, 1),
      ]
    );
    // restartable
    assert_eq!(spec.dates().count(), 5);
    assert!(spec.contains(date(2027, 7, 1)));
    assert!(!spec.contains(date(2025, 7, 1)));
    assert!(!spec.contains(date(2027, 8, 1)));
    assert!(spec.covers(date(2027, 8, 1)));
    assert!(!spec.covers(date(2028, 1, 2)));
  }

  #[test]
  fn test_single_date_when_start_equals_stop() {
    let spec = CycleSpec::new("once", date(2026, 1, 1), date(2026, 1, 1), Period::from_months(1))
      .unwrap();
    assert_eq!(spec.dates().collect::<Vec<_>>(), vec![date(2026, 1, 1)]);
  }

  #[test]
  fn test_month_end_does_not_drift() {
    let spec = CycleSpec::new("monthly", date(2026, 1, 31), date(2026, 4, 30), Period::from_months(1))
      .unwrap();
    assert_eq!(
      spec.dates().collect::<Vec<_>>(),
      vec![
        date(2026, 1, 31),
        date(2026, 2, 28),
        date(2026, 3, 31),
        date(2026, 4, 30),
      ]
    );
  }

  #[test]
  fn test_rejects_start_after_stop() {
    let err = CycleSpec::new("bad", date(2027, 1, 1), date(2026, 1, 1), Period::from_months(1))
      .unwrap_err();
    assert!(matches!(err, UnrollError::InvalidCycling { .. }));
  }

  #[test]
  fn test_rejects_non_positive_period() {
    for period in [Period::from_months(0), Period::from_months(-1)] {
      let err = CycleSpec::new("bad", date(2026, 1, 1), date(2027, 1, 1), period).unwrap_err();
      assert!(matches!(err, UnrollError::InvalidCycling { .. }));
    }
  }

  #[test]
  fn test_parse_rejects_malformed_period() {
    let def = CyclingDef {
      start_date: "2026-01-01".to_string(),
      stop_date: "2027-01-01".to_string(),
      period: "six months".to_string(),
    };
    let err = CycleSpec::parse("bad", &def).unwrap_err();
    assert!(matches!(err, UnrollError::InvalidExpression { .. }));
  }

  proptest! {
    #[test]
    fn dates_follow_period(period_hours in 1i64..200, span_hours in 0i64..5_000) {
      let start = date(2026, 1, 1);
      let stop = start + TimeDelta::try_hours(span_hours).unwrap();
      let period = Period::from_seconds(period_hours * 3_600);
      let spec = CycleSpec::new("prop", start, stop, period).unwrap();

      let dates: Vec<_> = spec.dates().collect();
      prop_assert_eq!(dates.len() as i64, span_hours / period_hours + 1);
      prop_assert_eq!(dates[0], start);
      for pair in dates.windows(2) {
        prop_assert_eq!(pair[1] - pair[0], TimeDelta::try_hours(period_hours).unwrap());
      }
      prop_assert!(dates.iter().all(|d| *d <= stop));
    }

    #[test]
    fn monthly_dates_count(period_months in 1i64..24, span_months in 0u32..240) {
      let start = date(2026, 1, 1);
      let stop = start.checked_add_months(chrono::Months::new(span_months)).unwrap();
      let spec = CycleSpec::new("prop", start, stop, Period::from_months(period_months)).unwrap();

      prop_assert_eq!(spec.dates().count() as i64, i64::from(span_months) / period_months + 1);
    }
  }
}
