//! Compiled dependencies and producer selection.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use rota_config::{
  AxisMode, InputDef, ParamValue, ParameterSpace, Period, TargetCycleDef, WaitOnDef, WhenDef,
  parse_date,
};
use rota_workflow::{Coordinates, DATE_AXIS};

use crate::error::UnrollError;
use crate::parameters::ParameterProduct;
use crate::template::{Placement, TargetShape};

/// The selection fields shared by inputs and `wait_on` entries.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Dependency<'a> {
  pub parameters: &'a BTreeMap<String, AxisMode>,
  pub when: Option<&'a WhenDef>,
  pub target_cycle: Option<&'a TargetCycleDef>,
}

impl<'a> From<&'a InputDef> for Dependency<'a> {
  fn from(input: &'a InputDef) -> Self {
    Self {
      parameters: &input.parameters,
      when: input.when.as_ref(),
      target_cycle: input.target_cycle.as_ref(),
    }
  }
}

impl<'a> From<&'a WaitOnDef> for Dependency<'a> {
  fn from(wait_on: &'a WaitOnDef) -> Self {
    Self {
      parameters: &wait_on.parameters,
      when: wait_on.when.as_ref(),
      target_cycle: wait_on.target_cycle.as_ref(),
    }
  }
}

/// Filter on the consumer date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct WhenFilter {
  at: Option<NaiveDateTime>,
  before: Option<NaiveDateTime>,
  after: Option<NaiveDateTime>,
}

impl WhenFilter {
  pub fn accepts(&self, date: NaiveDateTime) -> bool {
    self.at.is_none_or(|at| date == at)
      && self.before.is_none_or(|before| date < before)
      && self.after.is_none_or(|after| date > after)
  }
}

/// How producer dates follow from the consumer date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DateRule {
  /// The consumer's own date, or no date for an undated target.
  Same,
  /// Same, but only for consumer dates passing the filter.
  When(WhenFilter),
  /// Consumer date plus each offset. Dates outside the target's cycling
  /// range are dropped.
  Lag(Vec<Period>),
  /// Fixed producer dates, dropped the same way.
  Absolute(Vec<NaiveDateTime>),
}

/// A dependency checked against its consumer and target.
#[derive(Debug, Clone)]
pub(crate) struct Binding<'a> {
  pub target: TargetShape<'a>,
  modes: &'a BTreeMap<String, AxisMode>,
  dates: DateRule,
}

/// Check a dependency of `consumer` on `target` and parse its date rule.
pub(crate) fn compile<'a>(
  consumer: &Placement<'a>,
  dependency: Dependency<'a>,
  target: TargetShape<'a>,
) -> Result<Binding<'a>, UnrollError> {
  let task = consumer.task.name.as_str();
  let invalid = |message: &str| UnrollError::InvalidDependency {
    task: task.to_string(),
    target: target.name.to_string(),
    message: message.to_string(),
  };
  let parse = |value: &String| {
    parse_date(value).map_err(|source| UnrollError::InvalidExpression {
      template: task.to_string(),
      source,
    })
  };

  for axis in dependency.parameters.keys() {
    if axis == DATE_AXIS {
      return Err(invalid("a binding mode cannot be set on the 'date' axis"));
    }
    if !target.has_axis(axis) {
      return Err(UnrollError::UnknownAxisMode {
        task: task.to_string(),
        target: target.name.to_string(),
        axis: axis.clone(),
      });
    }
  }

  let dates = match (dependency.when, dependency.target_cycle) {
    (Some(_), Some(_)) => return Err(invalid("'when' cannot be combined with 'target_cycle'")),
    (None, None) => DateRule::Same,
    (Some(when), None) => {
      if !consumer.dated() {
        return Err(invalid("'when' requires a consumer in a dated cycle"));
      }
      DateRule::When(WhenFilter {
        at: when.at.as_ref().map(parse).transpose()?,
        before: when.before.as_ref().map(parse).transpose()?,
        after: when.after.as_ref().map(parse).transpose()?,
      })
    }
    (None, Some(target_cycle)) => {
      if !target.dated() {
        return Err(invalid("'target_cycle' requires a target in a dated cycle"));
      }
      match target_cycle {
        TargetCycleDef::Lag(lags) => {
          if !consumer.dated() {
            return Err(invalid("'lag' requires a consumer in a dated cycle"));
          }
          let offsets = lags
            .as_slice()
            .iter()
            .map(|lag| {
              lag
                .parse::<Period>()
                .map_err(|source| UnrollError::InvalidExpression {
                  template: task.to_string(),
                  source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
          DateRule::Lag(offsets)
        }
        TargetCycleDef::Date(dates) => DateRule::Absolute(
          dates
            .as_slice()
            .iter()
            .map(parse)
            .collect::<Result<Vec<_>, _>>()?,
        ),
      }
    }
  };

  Ok(Binding {
    target,
    modes: dependency.parameters,
    dates,
  })
}

impl Binding<'_> {
  /// Producer coordinates bound by the consumer instance `task` at
  /// `coordinates`, dates first, then the axis product.
  ///
  /// Every returned candidate is expected to exist: a candidate inside the
  /// target's cycling range that was never instantiated is an error for the
  /// caller to report.
  pub fn select(
    &self,
    task: &str,
    coordinates: &Coordinates,
    space: &ParameterSpace,
  ) -> Result<Vec<Coordinates>, UnrollError> {
    let dates: Vec<Option<NaiveDateTime>> = match &self.dates {
      DateRule::When(filter) => match coordinates.date() {
        Some(date) if !filter.accepts(date) => return Ok(Vec::new()),
        _ => self.same_date(task, coordinates)?,
      },
      DateRule::Same => self.same_date(task, coordinates)?,
      DateRule::Lag(offsets) => offsets
        .iter()
        .filter_map(|offset| coordinates.date().and_then(|date| offset.add_to(date)))
        .filter(|date| self.target.covers(*date))
        .map(Some)
        .collect(),
      DateRule::Absolute(dates) => dates
        .iter()
        .copied()
        .filter(|date| self.target.covers(*date))
        .map(Some)
        .collect(),
    };

    let mut axes: Vec<(&str, &[ParamValue])> = Vec::with_capacity(self.target.axes.len());
    for axis in self.target.axes {
      let declared = space
        .values(axis)
        .ok_or_else(|| UnrollError::UnknownParameter {
          template: self.target.name.to_string(),
          axis: axis.clone(),
        })?;
      let values = match (self.modes.get(axis), coordinates.get(axis)) {
        (Some(AxisMode::All), _) => declared,
        (_, Some(own)) => std::slice::from_ref(own),
        (_, None) if declared.len() == 1 => declared,
        (_, None) => {
          return Err(UnrollError::AmbiguousBinding {
            task: task.to_string(),
            coordinates: coordinates.to_string(),
            target: self.target.name.to_string(),
            axis: axis.clone(),
            cardinality: declared.len(),
          });
        }
      };
      axes.push((axis.as_str(), values));
    }

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for date in dates {
      for mut candidate in ParameterProduct::from_axes(axes.clone()) {
        candidate.set_date(date);
        if seen.insert(candidate.clone()) {
          candidates.push(candidate);
        }
      }
    }

    Ok(candidates)
  }

  fn same_date(
    &self,
    task: &str,
    coordinates: &Coordinates,
  ) -> Result<Vec<Option<NaiveDateTime>>, UnrollError> {
    if !self.target.dated() {
      return Ok(vec![None]);
    }
    match coordinates.date() {
      Some(date) => Ok(vec![Some(date)]),
      None => Err(UnrollError::AmbiguousDate {
        task: task.to_string(),
        coordinates: coordinates.to_string(),
        target: self.target.name.to_string(),
      }),
    }
  }
}
