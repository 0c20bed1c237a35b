use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root task definition.
///
/// The execution payload is a closed set of kinds. Unrolling only looks at
/// the name and the parameter axes; the payload is carried through to the
/// task instances with its local paths resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDef {
  pub name: String,
  /// Parameter axes the task is replicated over
  #[serde(default)]
  pub parameters: Vec<String>,
  /// Computer the task runs on
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub computer: Option<String>,
  #[serde(flatten)]
  pub kind: TaskKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "plugin", rename_all = "snake_case")]
pub enum TaskKind {
  Shell(ShellTask),
  Icon(IconTask),
}

/// A shell command, optionally backed by a script shipped with the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellTask {
  pub command: String,
  /// Script path relative to the workflow root directory
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path: Option<PathBuf>,
  /// Files sourced before running the command, relative to the root directory
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub env_source_files: Vec<PathBuf>,
}

/// An ICON model run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconTask {
  /// Executable on the target computer; not checked locally
  pub bin: PathBuf,
  /// Namelist files relative to the root directory
  #[serde(default)]
  pub namelists: Vec<PathBuf>,
}

impl TaskKind {
  /// Paths that must exist locally as regular files, relative to the root
  /// directory.
  pub fn local_files(&self) -> Vec<&PathBuf> {
    match self {
      TaskKind::Shell(shell) => shell
        .path
        .iter()
        .chain(shell.env_source_files.iter())
        .collect(),
      TaskKind::Icon(icon) => icon.namelists.iter().collect(),
    }
  }

  /// Same kind with every local path rewritten by `resolve`.
  pub fn map_local_files(&self, mut resolve: impl FnMut(&PathBuf) -> PathBuf) -> Self {
    match self {
      TaskKind::Shell(shell) => TaskKind::Shell(ShellTask {
        command: shell.command.clone(),
        path: shell.path.as_ref().map(&mut resolve),
        env_source_files: shell.env_source_files.iter().map(&mut resolve).collect(),
      }),
      TaskKind::Icon(icon) => TaskKind::Icon(IconTask {
        bin: icon.bin.clone(),
        namelists: icon.namelists.iter().map(&mut resolve).collect(),
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_deserialize_shell_task() {
    let task: TaskDef = serde_json::from_str(
      r#"{
        "name": "cleanup",
        "plugin": "shell",
        "command": "./cleanup.sh",
        "path": "scripts/cleanup.sh",
        "parameters": ["foo"]
      }"#,
    )
    .unwrap();

    assert_eq!(task.parameters, vec!["foo".to_string()]);
    match &task.kind {
      TaskKind::Shell(shell) => {
        assert_eq!(shell.command, "./cleanup.sh");
        assert_eq!(shell.path, Some(PathBuf::from("scripts/cleanup.sh")));
      }
      other => panic!("expected shell task, got {other:?}"),
    }
    assert_eq!(task.kind.local_files().len(), 1);
  }

  #[test]
  fn test_map_local_files_leaves_bin_alone() {
    let kind = TaskKind::Icon(IconTask {
      bin: PathBuf::from("/opt/icon/bin/icon"),
      namelists: vec![PathBuf::from("nml/atm.nml")],
    });

    let mapped = kind.map_local_files(|path| PathBuf::from("/root").join(path));
    match mapped {
      TaskKind::Icon(icon) => {
        assert_eq!(icon.bin, PathBuf::from("/opt/icon/bin/icon"));
        assert_eq!(icon.namelists, vec![PathBuf::from("/root/nml/atm.nml")]);
      }
      other => panic!("expected icon task, got {other:?}"),
    }
  }
}
