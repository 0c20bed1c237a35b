//! Rota Resolver
//!
//! Unrolls a [`rota_config::WorkflowDef`] into a [`rota_workflow::Workflow`].
//!
//! Cycles are expanded into their dates, tasks into one instance per date
//! and parameter combination, and every input or `wait_on` entry is bound to
//! the concrete instances it selects. Instances are memoized by name and
//! coordinates, so the same producer is always the same instance.

mod binding;
mod cycle;
mod error;
mod parameters;
mod probe;
mod template;
mod unroller;

pub use cycle::{CycleDates, CycleSpec};
pub use error::{ErrorKind, UnrollError};
pub use parameters::{ParameterProduct, expand};
pub use probe::{LocalFs, PathKind, PathProbe};
pub use unroller::{StandardUnroller, Unroll, build};
