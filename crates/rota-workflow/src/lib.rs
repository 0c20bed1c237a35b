//! Rota Workflow
//!
//! This crate provides the unrolled representation of a rota workflow: every
//! task and data instance produced by expanding cycles and parameters, with
//! their bindings resolved.
//!
//! Key differences from `rota-config`:
//! - Every instance is identified by a template name plus [`Coordinates`]
//! - Inputs are bound to concrete data instances per port
//! - Instances carry a canonical label that is unique within the workflow
//! - The graph is validated (known ids, unique identities, unique labels)
//!
//! A [`Workflow`] is immutable once built and only exposes read access.

mod coordinates;
mod error;
mod graph;
mod instance;
mod label;
mod workflow;

pub use coordinates::{Coordinates, DATE_AXIS, InstanceKey};
pub use error::WorkflowError;
pub use graph::Graph;
pub use instance::{DataId, DataInstance, Edge, PortBinding, TaskId, TaskInstance};
pub use label::{canonical_label, sanitize};
pub use workflow::Workflow;
