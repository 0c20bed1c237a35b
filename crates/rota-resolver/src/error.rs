use std::path::PathBuf;

use rota_config::ConfigError;
use rota_workflow::WorkflowError;
use thiserror::Error;

use crate::probe::PathKind;

/// Broad classification of unrolling failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The template is inconsistent or malformed.
  Config,
  /// A dependency does not say how to bind along an axis with several values.
  BindingAmbiguity,
  /// A declared local path is missing or of the wrong kind.
  MissingResource,
  /// The unroller broke one of its own invariants.
  InternalInvariant,
}

/// Errors that can occur while unrolling a workflow template.
#[derive(Debug, Error)]
pub enum UnrollError {
  /// Start after stop, or a period that does not move forward.
  #[error("invalid cycling in cycle '{cycle}': {message}")]
  InvalidCycling { cycle: String, message: String },

  /// Malformed date or duration expression.
  #[error("invalid expression in '{template}'")]
  InvalidExpression {
    template: String,
    #[source]
    source: ConfigError,
  },

  /// Two templates of the same kind share a name.
  #[error("duplicate {kind} name: {name}")]
  DuplicateName { kind: &'static str, name: String },

  #[error("cycle '{cycle}' references unknown task '{task}'")]
  UnknownTask { cycle: String, task: String },

  #[error("task '{task}' references unknown data '{data}'")]
  UnknownData { task: String, data: String },

  #[error("'{template}' references unknown parameter '{axis}'")]
  UnknownParameter { template: String, axis: String },

  #[error("'{template}' lists parameter '{axis}' more than once")]
  DuplicateAxis { template: String, axis: String },

  /// A binding mode names an axis the target does not vary over.
  #[error("task '{task}' sets a mode for axis '{axis}' which '{target}' does not have")]
  UnknownAxisMode {
    task: String,
    target: String,
    axis: String,
  },

  #[error("task '{task}' is placed in both cycle '{first}' and cycle '{second}'")]
  TaskInMultipleCycles {
    task: String,
    first: String,
    second: String,
  },

  #[error("data '{data}' is produced by both '{first}' and '{second}'")]
  DuplicateProducer {
    data: String,
    first: String,
    second: String,
  },

  #[error("task '{task}' declares output '{data}' which is not generated data")]
  InvalidOutput { task: String, data: String },

  #[error("generated data '{data}' is consumed by '{task}' but no task produces it")]
  NoProducer { task: String, data: String },

  /// Date selection that cannot apply to this consumer or target.
  #[error("task '{task}' dependency on '{target}': {message}")]
  InvalidDependency {
    task: String,
    target: String,
    message: String,
  },

  /// A required producer instance does not exist.
  #[error("task '{task}' {coordinates} depends on '{target}' {missing}, which is never instantiated")]
  MissingInstance {
    task: String,
    coordinates: String,
    target: String,
    missing: String,
  },

  /// The consumer has no value on an axis with several declared values.
  #[error(
    "ambiguous binding of '{target}' for task '{task}' {coordinates}: axis '{axis}' has {cardinality} values, set its mode to 'all' or replicate the task over it"
  )]
  AmbiguousBinding {
    task: String,
    coordinates: String,
    target: String,
    axis: String,
    cardinality: usize,
  },

  /// A dated target consumed from an undated cycle without a target cycle.
  #[error(
    "ambiguous binding of '{target}' for task '{task}' {coordinates}: target varies over 'date' but the consumer has no date"
  )]
  AmbiguousDate {
    task: String,
    coordinates: String,
    target: String,
  },

  #[error("task '{task}': path {} must be relative to the root directory", .path.display())]
  AbsolutePath { task: String, path: PathBuf },

  #[error("'{template}': path {} does not exist", .path.display())]
  MissingPath { template: String, path: PathBuf },

  #[error("'{template}': path {} is a {found}, expected a {expected}", .path.display())]
  WrongPathKind {
    template: String,
    path: PathBuf,
    expected: PathKind,
    found: PathKind,
  },

  #[error("dependency cycle through task instance '{label}'")]
  CycleDetected { label: String },

  #[error("workflow invariant violated")]
  Invariant(#[from] WorkflowError),
}

impl UnrollError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      UnrollError::AmbiguousBinding { .. } | UnrollError::AmbiguousDate { .. } => {
        ErrorKind::BindingAmbiguity
      }
      UnrollError::MissingPath { .. } | UnrollError::WrongPathKind { .. } => {
        ErrorKind::MissingResource
      }
      UnrollError::Invariant(_) => ErrorKind::InternalInvariant,
      _ => ErrorKind::Config,
    }
  }
}
