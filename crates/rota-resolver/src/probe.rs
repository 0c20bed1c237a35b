use std::fmt;
use std::path::Path;

use rota_config::DataType;

use crate::error::UnrollError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
  File,
  Dir,
  /// Exists but is neither a regular file nor a directory.
  Other,
}

impl fmt::Display for PathKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      PathKind::File => "file",
      PathKind::Dir => "directory",
      PathKind::Other => "special file",
    })
  }
}

impl From<DataType> for PathKind {
  fn from(data_type: DataType) -> Self {
    match data_type {
      DataType::File => PathKind::File,
      DataType::Dir => PathKind::Dir,
    }
  }
}

/// Existence check for declared local paths.
pub trait PathProbe {
  /// Kind of the entry at `path`, or `None` if nothing exists there.
  fn probe(&self, path: &Path) -> Option<PathKind>;
}

impl<P: PathProbe + ?Sized> PathProbe for &P {
  fn probe(&self, path: &Path) -> Option<PathKind> {
    (**self).probe(path)
  }
}

/// Probe backed by the local filesystem. Symlinks are followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl PathProbe for LocalFs {
  fn probe(&self, path: &Path) -> Option<PathKind> {
    let metadata = std::fs::metadata(path).ok()?;
    Some(if metadata.is_file() {
      PathKind::File
    } else if metadata.is_dir() {
      PathKind::Dir
    } else {
      PathKind::Other
    })
  }
}

/// Require `path` to exist with the expected kind.
pub(crate) fn require(
  probe: &impl PathProbe,
  template: &str,
  path: &Path,
  expected: PathKind,
) -> Result<(), UnrollError> {
  match probe.probe(path) {
    Some(found) if found == expected => Ok(()),
    Some(found) => Err(UnrollError::WrongPathKind {
      template: template.to_string(),
      path: path.to_path_buf(),
      expected,
      found,
    }),
    None => Err(UnrollError::MissingPath {
      template: template.to_string(),
      path: path.to_path_buf(),
    }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_local_fs_kinds() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("script.sh");
    std::fs::write(&file, "#!/bin/sh\n").unwrap();

    assert_eq!(LocalFs.probe(&file), Some(PathKind::File));
    assert_eq!(LocalFs.probe(dir.path()), Some(PathKind::Dir));
    assert_eq!(LocalFs.probe(&dir.path().join("missing")), None);
  }

  #[test]
  fn test_require_reports_wrong_kind() {
    let dir = tempfile::tempdir().unwrap();

    let err = require(&LocalFs, "grid", dir.path(), PathKind::File).unwrap_err();
    assert!(matches!(
      err,
      UnrollError::WrongPathKind {
        found: PathKind::Dir,
        ..
      }
    ));

    let err = require(&LocalFs, "grid", &dir.path().join("nope"), PathKind::Dir).unwrap_err();
    assert!(matches!(err, UnrollError::MissingPath { .. }));
  }
}
