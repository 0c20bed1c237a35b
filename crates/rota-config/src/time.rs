//! Date and duration expressions.
//!
//! Dates are naive ISO 8601 dates or date-times. Durations are ISO 8601
//! durations with an optional leading sign, e.g. `P6M`, `-P1Y`, `P2W`,
//! `PT12H` or `P1DT6H30M`.
//!
//! A duration keeps calendar months apart from the fixed-length part: years
//! become 12 months, weeks become 7 days and days are 86400 seconds.

use std::fmt;
use std::str::FromStr;

use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::error::ConfigError;

const DATE_TIME_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M:%S",
  "%Y-%m-%d %H:%M",
];

/// Parse an ISO 8601 date (`2026-01-01`) or date-time (`2026-01-01T06:00`).
pub fn parse_date(value: &str) -> Result<NaiveDateTime, ConfigError> {
  let trimmed = value.trim();
  for format in DATE_TIME_FORMATS {
    if let Ok(date) = NaiveDateTime::parse_from_str(trimmed, format) {
      return Ok(date);
    }
  }
  NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
    .map(|date| date.and_time(NaiveTime::MIN))
    .map_err(|_| ConfigError::InvalidDate {
      value: value.to_string(),
    })
}

/// A signed calendar duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
  months: i64,
  seconds: i64,
}

impl Period {
  pub const fn new(months: i64, seconds: i64) -> Self {
    Self { months, seconds }
  }

  pub const fn from_months(months: i64) -> Self {
    Self::new(months, 0)
  }

  pub const fn from_seconds(seconds: i64) -> Self {
    Self::new(0, seconds)
  }

  pub fn months(&self) -> i64 {
    self.months
  }

  pub fn seconds(&self) -> i64 {
    self.seconds
  }

  /// True when the period moves strictly forward in time.
  pub fn is_positive(&self) -> bool {
    self.months >= 0 && self.seconds >= 0 && (self.months > 0 || self.seconds > 0)
  }

  pub fn checked_mul(self, factor: i64) -> Option<Self> {
    Some(Self {
      months: self.months.checked_mul(factor)?,
      seconds: self.seconds.checked_mul(factor)?,
    })
  }

  /// Shift a date by this period: calendar months first, then the fixed part.
  ///
  /// Month arithmetic clamps to the end of the month (Jan 31 + 1 month is
  /// Feb 28/29). Returns `None` when the result is out of range.
  pub fn add_to(&self, date: NaiveDateTime) -> Option<NaiveDateTime> {
    let magnitude = Months::new(u32::try_from(self.months.unsigned_abs()).ok()?);
    let shifted = if self.months >= 0 {
      date.checked_add_months(magnitude)?
    } else {
      date.checked_sub_months(magnitude)?
    };
    shifted.checked_add_signed(TimeDelta::try_seconds(self.seconds)?)
  }
}

impl FromStr for Period {
  type Err = ConfigError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    let invalid = |reason: &str| ConfigError::InvalidDuration {
      value: value.to_string(),
      reason: reason.to_string(),
    };

    let trimmed = value.trim();
    let (negative, rest) = match trimmed.as_bytes().first() {
      Some(b'-') => (true, &trimmed[1..]),
      Some(b'+') => (false, &trimmed[1..]),
      _ => (false, trimmed),
    };
    let body = rest
      .strip_prefix('P')
      .ok_or_else(|| invalid("must start with 'P'"))?;

    let (date_part, time_part) = match body.split_once('T') {
      Some((date, time)) => {
        if time.is_empty() {
          return Err(invalid("empty time part after 'T'"));
        }
        (date, Some(time))
      }
      None => (body, None),
    };

    let mut months: i64 = 0;
    let mut seconds: i64 = 0;
    let mut seen_any = false;

    let date_units: &[(char, i64, bool)] = &[
      ('Y', 12, true),
      ('M', 1, true),
      ('W', 7 * 86_400, false),
      ('D', 86_400, false),
    ];
    let time_units: &[(char, i64, bool)] = &[('H', 3_600, false), ('M', 60, false), ('S', 1, false)];

    for (part, units) in [(Some(date_part), date_units), (time_part, time_units)] {
      let Some(part) = part else { continue };
      let mut remaining = part;
      let mut next_unit = 0;
      while !remaining.is_empty() {
        let digits_end = remaining
          .find(|c: char| !c.is_ascii_digit())
          .ok_or_else(|| invalid("number without a unit"))?;
        if digits_end == 0 {
          return Err(invalid("expected a number"));
        }
        let amount: i64 = remaining[..digits_end]
          .parse()
          .map_err(|_| invalid("number out of range"))?;
        let unit = remaining[digits_end..]
          .chars()
          .next()
          .ok_or_else(|| invalid("number without a unit"))?;
        if unit == '.' || unit == ',' {
          return Err(invalid("fractional components are not supported"));
        }
        let offset = units[next_unit..]
          .iter()
          .position(|(symbol, _, _)| *symbol == unit)
          .ok_or_else(|| invalid("unknown or out-of-order unit"))?;
        let (_, scale, calendar) = units[next_unit + offset];
        next_unit += offset + 1;

        let scaled = amount
          .checked_mul(scale)
          .ok_or_else(|| invalid("duration out of range"))?;
        let target = if calendar { &mut months } else { &mut seconds };
        *target = target
          .checked_add(scaled)
          .ok_or_else(|| invalid("duration out of range"))?;
        seen_any = true;
        remaining = &remaining[digits_end + unit.len_utf8()..];
      }
    }

    if !seen_any {
      return Err(invalid("no components"));
    }

    if negative {
      months = -months;
      seconds = -seconds;
    }
    Ok(Self { months, seconds })
  }
}

impl fmt::Display for Period {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let negative = self.months < 0 || self.seconds < 0;
    if negative {
      f.write_str("-")?;
    }
    f.write_str("P")?;
    if self.months != 0 {
      write!(f, "{}M", self.months.unsigned_abs())?;
    }
    if self.seconds != 0 || self.months == 0 {
      write!(f, "T{}S", self.seconds.unsigned_abs())?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
      .unwrap()
      .and_time(NaiveTime::MIN)
  }

  #[test]
  fn test_parse_date_variants() {
    assert_eq!(parse_date("2026-01-01").unwrap(), date(2026, 1, 1));
    assert_eq!(
      parse_date("2026-01-01T06:30").unwrap(),
      date(2026, 1, 1) + TimeDelta::try_minutes(390).unwrap()
    );
    assert_eq!(
      parse_date("2026-01-01T00:00:10").unwrap(),
      date(2026, 1, 1) + TimeDelta::try_seconds(10).unwrap()
    );
    assert!(matches!(
      parse_date("01/01/2026"),
      Err(ConfigError::InvalidDate { .. })
    ));
  }

  #[test]
  fn test_parse_period_components() {
    assert_eq!("P6M".parse::<Period>().unwrap(), Period::from_months(6));
    assert_eq!("P1Y".parse::<Period>().unwrap(), Period::from_months(12));
    assert_eq!("-P6M".parse::<Period>().unwrap(), Period::from_months(-6));
    assert_eq!(
      "P2W".parse::<Period>().unwrap(),
      Period::from_seconds(14 * 86_400)
    );
    assert_eq!(
      "P1Y2M3DT4H5M6S".parse::<Period>().unwrap(),
      Period::new(14, 3 * 86_400 + 4 * 3_600 + 5 * 60 + 6)
    );
    assert_eq!(
      "PT12H".parse::<Period>().unwrap(),
      Period::from_seconds(12 * 3_600)
    );
  }

  #[test]
  fn test_parse_period_rejects_malformed() {
    for bad in ["", "6M", "P", "PT", "P1.5M", "PM", "P1M1Y", "P1X", "P1", "PT1D"] {
      assert!(
        bad.parse::<Period>().is_err(),
        "expected '{bad}' to be rejected"
      );
    }
  }

  #[test]
  fn test_is_positive() {
    assert!(Period::from_months(1).is_positive());
    assert!(!Period::from_months(-1).is_positive());
    assert!(!Period::new(0, 0).is_positive());
  }

  #[test]
  fn test_add_to_clamps_month_end() {
    let jan31 = date(2026, 1, 31);
    assert_eq!(
      Period::from_months(1).add_to(jan31).unwrap(),
      date(2026, 2, 28)
    );
    assert_eq!(
      Period::from_months(-6).add_to(date(2026, 7, 1)).unwrap(),
      date(2026, 1, 1)
    );
  }

  #[test]
  fn test_display() {
    assert_eq!(Period::from_months(-6).to_string(), "-P6M");
    assert_eq!(Period::new(1, 60).to_string(), "P1MT60S");
  }
}
