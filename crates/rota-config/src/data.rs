use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
  File,
  Dir,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataDefs {
  #[serde(default)]
  pub available: Vec<AvailableDataDef>,
  #[serde(default)]
  pub generated: Vec<GeneratedDataDef>,
}

/// Data that exists before the workflow runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableDataDef {
  pub name: String,
  #[serde(rename = "type")]
  pub data_type: DataType,
  /// Location of the data. Relative paths are resolved against the root
  /// directory.
  pub src: PathBuf,
  /// Computer holding the data. Data without a computer lives on the local
  /// filesystem and is checked while unrolling.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub computer: Option<String>,
  /// Parameter axes the data varies over, usually none
  #[serde(default)]
  pub parameters: Vec<String>,
}

/// Data produced by a task. Its axes are the producer's axes, plus `date`
/// when the producer sits in a dated cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedDataDef {
  pub name: String,
  #[serde(rename = "type")]
  pub data_type: DataType,
  /// Path of the output relative to the producer's working directory
  pub src: PathBuf,
}

impl AvailableDataDef {
  pub fn is_local(&self) -> bool {
    self.computer.is_none()
  }

  pub fn resolved_src(&self, rootdir: &Path) -> PathBuf {
    rootdir.join(&self.src)
  }
}
