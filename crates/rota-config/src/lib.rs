//! Rota Config
//!
//! This crate contains the serializable template types for rota. A template
//! describes a recurring workflow once: cycles over date ranges, the tasks
//! placed in each cycle, the data they exchange and the parameter space the
//! tasks are replicated over.
//!
//! Templates are loaded from JSON (via the CLI) and handed to the resolver,
//! which unrolls them into a concrete instance graph.
//!
//! Date and duration expressions are kept as strings here. They are parsed
//! with [`parse_date`] and [`Period`] while unrolling, so a malformed
//! expression is reported together with the template that declared it.

mod cycle;
mod data;
mod error;
mod input;
mod parameters;
mod task;
mod time;
mod value;
mod workflow;

pub use cycle::{CycleDef, CycleTaskDef, CyclingDef};
pub use data::{AvailableDataDef, DataDefs, DataType, GeneratedDataDef};
pub use error::ConfigError;
pub use input::{AxisMode, InputDef, OneOrMany, TargetCycleDef, WaitOnDef, WhenDef};
pub use parameters::ParameterSpace;
pub use task::{IconTask, ShellTask, TaskDef, TaskKind};
pub use time::{Period, parse_date};
pub use value::ParamValue;
pub use workflow::WorkflowDef;
