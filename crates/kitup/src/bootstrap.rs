use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use log::{debug, info, warn};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

const STACK_ZIP_X86_64: &str = "https://get.haskellstack.org/stable/windows-x86_64.zip";
const STACK_ZIP_I386: &str = "https://get.haskellstack.org/stable/windows-i386.zip";

/// Installs scoop for the current user.
pub const SCOOP_BOOTSTRAP: &str = "Set-ExecutionPolicy RemoteSigned -Scope CurrentUser -Force; \
     iex (new-object net.webclient).downloadstring('https://get.scoop.sh')";

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Failed to build download client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to download {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Download of {url} failed with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid archive {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("{0} does not contain stack.exe")]
    MissingStack(PathBuf),
}

impl BootstrapError {
    fn io(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }
}

/// The stack release archive for the given CPU architecture.
#[must_use]
pub fn stack_archive_url(arch: &str) -> &'static str {
    if arch == "x86" {
        STACK_ZIP_I386
    } else {
        STACK_ZIP_X86_64
    }
}

/// Where the scoop installer puts its `scoop` shim.
#[must_use]
pub fn scoop_shim(home: &Path) -> PathBuf {
    home.join("scoop").join("shims").join("scoop.cmd")
}

/// PowerShell that appends `dir` to the user `Path` unless it is listed
/// already.
#[must_use]
pub fn user_path_script(dir: &Path) -> String {
    let dir = dir.display().to_string().replace('\'', "''");
    format!(
        "$p = [Environment]::GetEnvironmentVariable('Path', 'User'); \
         if (-not (($p -split ';') -contains '{dir}')) {{ \
         [Environment]::SetEnvironmentVariable('Path', \"$p;{dir}\", 'User') }}"
    )
}

/// Download `url` to `path`.
///
/// # Errors
/// Returns an error if the request fails, the server answers with a
/// non-success status or the file cannot be written.
pub async fn download(url: &str, path: &Path) -> Result<(), BootstrapError> {
    let client = reqwest::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(format!("kitup/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(BootstrapError::Client)?;

    info!("Downloading {url}");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| BootstrapError::Request {
            url: url.to_string(),
            source,
        })?;

    if !response.status().is_success() {
        return Err(BootstrapError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|source| BootstrapError::Request {
            url: url.to_string(),
            source,
        })?;

    tokio::fs::write(path, &bytes)
        .await
        .map_err(BootstrapError::io("write", path))?;
    debug!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Unpack `archive` into `dest` and return the number of files written.
/// Entries that would escape `dest` are skipped.
///
/// # Errors
/// Returns an error if the archive is unreadable or a file cannot be written.
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<usize, BootstrapError> {
    let zip_error = |source| BootstrapError::Zip {
        path: archive.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(archive).map_err(BootstrapError::io("open", archive))?;
    let mut zip = zip::ZipArchive::new(file).map_err(zip_error)?;
    let mut written = 0;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(zip_error)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe entry {} in {}", entry.name(), archive.display());
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&target).map_err(BootstrapError::io("create", &target))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(BootstrapError::io("create", parent))?;
        }
        let mut out = std::fs::File::create(&target).map_err(BootstrapError::io("create", &target))?;
        std::io::copy(&mut entry, &mut out).map_err(BootstrapError::io("extract", &target))?;
        written += 1;
    }

    debug!("Extracted {written} files into {}", dest.display());
    Ok(written)
}

/// Download the stack release for this machine into `tool_dir` and return
/// the path of `stack.exe`.
///
/// # Errors
/// Returns an error if the download or the extraction fails, or the archive
/// has no `stack.exe`.
pub async fn install_stack(tool_dir: &Path) -> Result<PathBuf, BootstrapError> {
    std::fs::create_dir_all(tool_dir).map_err(BootstrapError::io("create", tool_dir))?;

    let archive = tool_dir.join("stack.zip");
    download(stack_archive_url(std::env::consts::ARCH), &archive).await?;
    let extracted = extract_zip(&archive, tool_dir);
    std::fs::remove_file(&archive).map_err(BootstrapError::io("remove", &archive))?;
    extracted?;

    let stack = tool_dir.join("stack.exe");
    if !stack.is_file() {
        return Err(BootstrapError::MissingStack(tool_dir.to_path_buf()));
    }
    info!("Installed stack to {}", stack.display());
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).expect("create archive");
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in entries {
            writer.start_file(*name, options).expect("start entry");
            writer.write_all(content).expect("write entry");
        }
        writer.finish().expect("finish archive");
    }

    #[test]
    fn stack_archive_matches_architecture() {
        assert_eq!(stack_archive_url("x86"), STACK_ZIP_I386);
        assert_eq!(stack_archive_url("x86_64"), STACK_ZIP_X86_64);
        assert_eq!(stack_archive_url("aarch64"), STACK_ZIP_X86_64);
    }

    #[test]
    fn scoop_shim_lives_in_user_scoop_dir() {
        assert_eq!(
            scoop_shim(Path::new("C:/Users/dev")),
            Path::new("C:/Users/dev/scoop/shims/scoop.cmd")
        );
    }

    #[test]
    fn user_path_script_checks_before_appending() {
        let script = user_path_script(Path::new("C:/Users/dev's/AppData/local/bin"));
        assert!(script.contains("-contains 'C:/Users/dev''s/AppData/local/bin'"));
        assert!(script.contains("SetEnvironmentVariable('Path'"));
        assert!(script.contains("'User'"));
    }

    #[test]
    fn extract_zip_writes_nested_files() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let archive = temp_dir.path().join("stack.zip");
        write_archive(
            &archive,
            &[("stack.exe", b"stack"), ("doc/README.md", b"readme")],
        );
        let dest = temp_dir.path().join("bin");

        let written = extract_zip(&archive, &dest).expect("extract archive");

        assert_eq!(written, 2);
        assert_eq!(std::fs::read(dest.join("stack.exe")).expect("read"), b"stack");
        assert_eq!(
            std::fs::read(dest.join("doc/README.md")).expect("read"),
            b"readme"
        );
    }

    #[test]
    fn extract_zip_refuses_to_escape_destination() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let archive = temp_dir.path().join("stack.zip");
        write_archive(&archive, &[("../escape.txt", b"nope"), ("stack.exe", b"ok")]);
        let dest = temp_dir.path().join("bin");

        let written = extract_zip(&archive, &dest).expect("extract archive");

        assert_eq!(written, 1);
        assert!(!temp_dir.path().join("escape.txt").exists());
    }

    #[test]
    fn extract_zip_rejects_garbage() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let archive = temp_dir.path().join("stack.zip");
        std::fs::write(&archive, b"not a zip").expect("write file");

        let error = extract_zip(&archive, temp_dir.path()).unwrap_err();
        assert!(matches!(error, BootstrapError::Zip { .. }));
    }
}
