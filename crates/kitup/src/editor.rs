use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

use log::{info, warn};

use crate::steps::{StepError, StepRunner};

const EXTENSION_ID: &str = "kitlang.kitlang";
const CODE_RUNNER_EXECUTOR: &str = "kitc --run";

#[derive(Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    Step(#[from] StepError),

    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("vsce did not produce a .vsix package in {0}")]
    NoPackage(PathBuf),

    #[error("Invalid extension manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} has no code-runner.executorMap defaults")]
    MissingExecutorMap(PathBuf),
}

fn io_error(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> EditorError {
    let path = path.to_path_buf();
    move |source| EditorError::Io {
        action,
        path,
        source,
    }
}

fn vsix_files(dir: &Path) -> Result<Vec<PathBuf>, EditorError> {
    let entries = std::fs::read_dir(dir).map_err(io_error("read", dir))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "vsix"))
        .collect();
    files.sort();
    Ok(files)
}

fn remove_all(files: &[PathBuf]) -> Result<(), EditorError> {
    for file in files {
        std::fs::remove_file(file).map_err(io_error("remove", file))?;
    }
    Ok(())
}

/// Package the Kit extension from `extension_dir` with `vsce` and install it
/// into VS Code, replacing any previous version.
///
/// # Errors
/// Returns an error if a tool fails or no package is produced.
pub async fn install_vscode_extension(
    runner: &StepRunner,
    extension_dir: &Path,
) -> Result<PathBuf, EditorError> {
    runner.run("npm", &["install", "-g", "vsce"], None).await?;

    remove_all(&vsix_files(extension_dir)?)?;
    runner.run("vsce", &["package"], Some(extension_dir)).await?;

    let packages = vsix_files(extension_dir)?;
    let Some(package) = packages.first().cloned() else {
        return Err(EditorError::NoPackage(extension_dir.to_path_buf()));
    };

    // Nothing to uninstall on a first install.
    if let Err(e) = runner
        .run("code", &["--uninstall-extension", EXTENSION_ID], None)
        .await
    {
        warn!("Uninstalling the previous extension failed: {e}");
    }

    let package_arg = package.to_string_lossy().into_owned();
    runner
        .run("code", &["--install-extension", &package_arg], None)
        .await?;
    remove_all(&packages)?;

    info!("Installed VS Code extension from {}", package.display());
    Ok(package)
}

/// Point Code Runner's `kit` executor at `kitc --run`.
///
/// # Errors
/// Returns an error if the manifest has no executor map defaults.
pub fn set_kit_executor(manifest: &mut Value, path: &Path) -> Result<(), EditorError> {
    let defaults = manifest
        .pointer_mut("/contributes/configuration/properties/code-runner.executorMap/default")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| EditorError::MissingExecutorMap(path.to_path_buf()))?;

    defaults.insert(
        "kit".to_string(),
        Value::String(CODE_RUNNER_EXECUTOR.to_string()),
    );
    Ok(())
}

/// Patch every installed Code Runner extension under `extensions_dir`.
/// Returns the manifests that were rewritten.
///
/// # Errors
/// Returns an error if a manifest cannot be read, parsed or written.
pub fn patch_code_runner(extensions_dir: &Path) -> Result<Vec<PathBuf>, EditorError> {
    let entries = std::fs::read_dir(extensions_dir).map_err(io_error("read", extensions_dir))?;
    let mut patched = Vec::new();

    for entry in entries.filter_map(Result::ok) {
        let dir = entry.path();
        if !dir.is_dir() || !entry.file_name().to_string_lossy().contains("code-runner") {
            continue;
        }

        let manifest_path = dir.join("package.json");
        let content =
            std::fs::read_to_string(&manifest_path).map_err(io_error("read", &manifest_path))?;
        let mut manifest: Value =
            serde_json::from_str(&content).map_err(|source| EditorError::Manifest {
                path: manifest_path.clone(),
                source,
            })?;

        set_kit_executor(&mut manifest, &manifest_path)?;

        let updated =
            serde_json::to_string_pretty(&manifest).map_err(|source| EditorError::Manifest {
                path: manifest_path.clone(),
                source,
            })?;
        std::fs::write(&manifest_path, updated).map_err(io_error("write", &manifest_path))?;

        info!("Patched {}", manifest_path.display());
        patched.push(manifest_path);
    }

    Ok(patched)
}
