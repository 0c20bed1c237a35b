use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("instance '{label}' is stored at index {index} but carries id {id}")]
  InvalidId {
    label: String,
    index: usize,
    id: usize,
  },

  #[error("instance identity created twice: {label}")]
  DuplicateInstance { label: String },

  #[error("distinct instances share the label '{label}': {first} and {second}")]
  LabelCollision {
    label: String,
    first: String,
    second: String,
  },

  #[error("edge references unknown instance: {0}")]
  InvalidEdge(String),
}
