use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use log::{debug, info};

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl ArtifactError {
    fn io(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }

    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied)
    }
}

/// Move the freshly built binary into place. Copies then deletes, since
/// the target usually sits on another filesystem.
///
/// # Errors
/// Returns an error if the copy or the removal of the source fails.
pub fn install_binary(built: &Path, target: &Path) -> Result<(), ArtifactError> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(ArtifactError::io("create", parent))?;
    }
    std::fs::copy(built, target).map_err(ArtifactError::io("copy", built))?;
    std::fs::remove_file(built).map_err(ArtifactError::io("remove", built))?;
    info!("Installed {} to {}", built.display(), target.display());
    Ok(())
}

/// Replace `target` with a copy of the directory tree at `source`.
///
/// # Errors
/// Returns an error if the old tree cannot be removed or any entry fails to
/// copy.
pub fn replace_tree(source: &Path, target: &Path) -> Result<usize, ArtifactError> {
    if target.exists() {
        std::fs::remove_dir_all(target).map_err(ArtifactError::io("remove", target))?;
    }
    std::fs::create_dir_all(target).map_err(ArtifactError::io("create", target))?;

    let mut copied = 0;
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|source_err| ArtifactError::Walk {
            root: source.to_path_buf(),
            source: source_err,
        })?;
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&destination)
                .map_err(ArtifactError::io("create", &destination))?;
        } else {
            std::fs::copy(entry.path(), &destination)
                .map_err(ArtifactError::io("copy", entry.path()))?;
            copied += 1;
        }
    }

    debug!(
        "Copied {copied} files from {} to {}",
        source.display(),
        target.display()
    );
    Ok(copied)
}
