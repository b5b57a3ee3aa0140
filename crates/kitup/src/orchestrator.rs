use std::path::{Path, PathBuf};

use kitup_platform::{HostOs, InstallLayout};
use kitup_shell::{EnvAssignment, ShellHost, ShellRegistry};
use log::{info, warn};

use crate::artifacts::{self, ArtifactError};
use crate::bootstrap;
use crate::editor;
use crate::environment;
use crate::error::AppError;
use crate::notify::{Notifier, Severity};
use crate::settings::InstallerSettings;
use crate::steps::StepRunner;

const STACK_INSTALLER: &str = "curl -sSL https://get.haskellstack.org/ | sh";
const SCOOP_MANIFEST: &str =
    "https://raw.githubusercontent.com/kitlang/kit/dev/.packages/scoop/kitlang-prerelease.json";
const TOOLCHAIN_COMMENT: &str = "# kitc toolchain path - added by kitup";

/// Choices made on the command line, on top of the settings file.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Always absolute, since it ends up in shell startup files.
    pub checkout_dir: PathBuf,
    /// `None` asks the user.
    pub dev_branch: Option<bool>,
    pub skip_editor: bool,
}

impl InstallOptions {
    /// # Errors
    /// Returns an error if a relative `checkout_dir` cannot be resolved
    /// against the current directory.
    pub fn new(
        checkout_dir: &Path,
        dev_branch: Option<bool>,
        skip_editor: bool,
    ) -> Result<Self, AppError> {
        let checkout_dir =
            std::path::absolute(checkout_dir).map_err(|source| AppError::CheckoutDir {
                path: checkout_dir.to_path_buf(),
                source,
            })?;
        Ok(Self {
            checkout_dir,
            dev_branch,
            skip_editor,
        })
    }
}

pub struct Installer<'a, H: ShellHost> {
    pub settings: &'a InstallerSettings,
    pub notifier: &'a Notifier,
    pub registry: &'a ShellRegistry,
    pub host: &'a H,
    pub runner: StepRunner,
    pub os: HostOs,
    pub options: InstallOptions,
}

impl<H: ShellHost> Installer<'_, H> {
    /// Run every install step in order. Checkout and build failures abort;
    /// later steps only mark the install as incomplete.
    ///
    /// # Errors
    /// Returns an error if the checkout or the build fails.
    pub async fn run(&self) -> Result<bool, AppError> {
        info!("Installing on {}", self.os.display_name());
        self.notifier.notify(
            &format!("Running on {}", self.os.display_name()),
            Severity::Info,
        );

        self.checkout().await?;

        let mut success = true;
        let checkout = &self.options.checkout_dir;

        if self.os.is_windows() {
            self.build_windows().await?;
        } else {
            self.build_with_stack().await?;
            success &= self.export_toolchain_path();
        }

        match InstallLayout::detect(self.os) {
            Ok(layout) => success &= install_artifacts(&layout, checkout, self.notifier),
            Err(e) => {
                self.notifier.notify(&e.to_string(), Severity::Failure);
                success = false;
            }
        }

        if !self.options.skip_editor {
            success &= self.integrate_editor().await;
        }

        Ok(success)
    }

    async fn checkout(&self) -> Result<(), AppError> {
        let dir = &self.options.checkout_dir;
        let dir_arg = dir.to_string_lossy().into_owned();

        if dir.exists() {
            info!("Reusing checkout at {}", dir.display());
        } else {
            self.notifier.notify(
                &format!("Cloning {} into {}", self.settings.repo_url, dir.display()),
                Severity::Info,
            );
            self.runner
                .run(
                    "git",
                    &["clone", self.settings.repo_url.as_str(), dir_arg.as_str()],
                    None,
                )
                .await
                .map_err(|e| AppError::step("Clone", e))?;
        }

        let dev_branch = self.options.dev_branch.unwrap_or_else(|| {
            self.notifier
                .confirm("Use dev branch?", self.settings.use_dev_branch)
        });
        if dev_branch {
            self.git(&["fetch", "origin"]).await?;
            self.git(&["checkout", "dev"]).await?;
        }
        self.git(&["pull"]).await
    }

    async fn git(&self, args: &[&str]) -> Result<(), AppError> {
        self.runner
            .run("git", args, Some(&self.options.checkout_dir))
            .await
            .map_err(|e| AppError::step("Checkout", e))
    }

    async fn build_windows(&self) -> Result<(), AppError> {
        if !self.notifier.confirm("Use new scoop install?", true) {
            return self.build_with_stack().await;
        }

        match self.runner.run("scoop", &["install", SCOOP_MANIFEST], None).await {
            Ok(()) => {}
            Err(e) if e.is_missing_program() => {
                self.notifier
                    .notify("Scoop not found, installing it", Severity::Warning);
                self.runner
                    .run(
                        "powershell",
                        &["-NoProfile", "-Command", bootstrap::SCOOP_BOOTSTRAP],
                        None,
                    )
                    .await
                    .map_err(|e| AppError::step("Scoop installation", e))?;

                let scoop = scoop_program(self.registry.home());
                self.runner
                    .run(&scoop, &["install", SCOOP_MANIFEST], None)
                    .await
                    .map_err(|e| AppError::step("Scoop install", e))?;
            }
            Err(e) => return Err(AppError::step("Scoop install", e)),
        }

        if self.notifier.confirm("Run tests?", false) {
            self.notifier.notify(
                "Running tests is not supported for scoop installs yet.",
                Severity::Failure,
            );
        }
        Ok(())
    }

    async fn build_with_stack(&self) -> Result<(), AppError> {
        let checkout = Some(self.options.checkout_dir.as_path());

        let stack = match self.runner.run("stack", &["upgrade"], checkout).await {
            Ok(()) => "stack".to_string(),
            Err(e) if e.is_missing_program() => {
                self.notifier
                    .notify("Haskell Stack not found, installing it", Severity::Warning);
                self.install_stack().await?
            }
            Err(e) => return Err(AppError::step("Stack upgrade", e)),
        };

        self.runner
            .run(&stack, &["build"], checkout)
            .await
            .map_err(|e| AppError::step("Build", e))?;

        if self.notifier.confirm("Run tests?", false) {
            // A failing test suite still leaves a usable compiler.
            if let Err(e) = self.runner.run(&stack, &["test"], checkout).await {
                warn!("Tests failed: {e}");
                self.notifier.notify(&e.to_string(), Severity::Failure);
            }
        }

        self.runner
            .run(&stack, &["install"], checkout)
            .await
            .map_err(|e| AppError::step("Install", e))
    }

    /// Install stack and return the program name to run it by.
    async fn install_stack(&self) -> Result<String, AppError> {
        if !self.os.is_windows() {
            self.runner
                .run("sh", &["-c", STACK_INSTALLER], None)
                .await
                .map_err(|e| AppError::step("Stack installation", e))?;
            return Ok("stack".to_string());
        }

        let layout = InstallLayout::detect(self.os)?;
        let Some(tool_dir) = layout.tool_dir else {
            return Ok("stack".to_string());
        };
        let stack = bootstrap::install_stack(&tool_dir).await?;

        // Only affects future sessions; this run uses the full path.
        let script = bootstrap::user_path_script(&tool_dir);
        if let Err(e) = self
            .runner
            .run("powershell", &["-NoProfile", "-Command", script.as_str()], None)
            .await
        {
            warn!("Could not add {} to PATH: {e}", tool_dir.display());
            self.notifier.notify(
                &format!("Add {} to your PATH to use stack", tool_dir.display()),
                Severity::Warning,
            );
        }

        Ok(stack.to_string_lossy().into_owned())
    }

    fn export_toolchain_path(&self) -> bool {
        self.notifier.notify(
            "Attempting to add the Kit toolchain path to shell startup files...",
            Severity::Warning,
        );
        let assignment = toolchain_assignment(self.settings, &self.options.checkout_dir);
        let confirmed =
            environment::export_and_verify(self.registry, self.host, self.notifier, &assignment);

        if confirmed {
            self.notifier.notify(
                "Toolchain path added to environment variable successfully",
                Severity::Success,
            );
        } else {
            self.notifier.notify(
                "Toolchain path not added to environment variable",
                Severity::Failure,
            );
        }
        confirmed
    }

    async fn integrate_editor(&self) -> bool {
        if !self
            .notifier
            .confirm("Add Visual Studio Code extension?", true)
        {
            return true;
        }

        let mut success = true;
        let extension_dir = self
            .options
            .checkout_dir
            .join("utils")
            .join("vscode-kitlang");

        match editor::install_vscode_extension(&self.runner, &extension_dir).await {
            Ok(_) => self
                .notifier
                .notify("Visual Studio Code extension installed", Severity::Success),
            Err(e) => {
                warn!("Extension install failed: {e}");
                self.notifier.notify(&e.to_string(), Severity::Failure);
                success = false;
            }
        }

        if self.notifier.confirm("Modify Code Runner extension?", true) {
            success &= patch_code_runner(self.registry.home(), self.notifier);
        }

        self.notifier
            .notify("Please restart Visual Studio Code", Severity::Warning);
        success
    }
}

/// `KIT_TOOLCHAIN_PATH` (or its configured name) pointing into the checkout.
#[must_use]
pub fn toolchain_assignment(settings: &InstallerSettings, checkout: &Path) -> EnvAssignment {
    let toolchains = checkout.join("toolchains");
    EnvAssignment::new(
        settings.toolchain_var.clone(),
        toolchains.to_string_lossy().into_owned(),
        TOOLCHAIN_COMMENT,
    )
}

/// Move the compiler and the standard library into place. Each failure is
/// reported and the remaining copies still run.
pub fn install_artifacts(layout: &InstallLayout, checkout: &Path, notifier: &Notifier) -> bool {
    let mut failures: Vec<ArtifactError> = Vec::new();

    if let (Some(built), Some(target)) = (&layout.built_binary, &layout.binary_target) {
        match artifacts::install_binary(built, target) {
            Ok(()) => notifier.notify(
                &format!("Installed kitc to {}", target.display()),
                Severity::Success,
            ),
            Err(e) => failures.push(e),
        }
    }

    match artifacts::replace_tree(&checkout.join("std"), &layout.std_target) {
        Ok(count) => notifier.notify(
            &format!(
                "Installed standard library ({count} files) to {}",
                layout.std_target.display()
            ),
            Severity::Success,
        ),
        Err(e) => failures.push(e),
    }

    for failure in &failures {
        warn!("{failure}");
        notifier.notify(&failure.to_string(), Severity::Failure);
    }
    if failures.iter().any(ArtifactError::is_permission_denied) {
        notifier.notify(
            "Insufficient permissions to install kitc, try running with sudo.",
            Severity::Failure,
        );
    }
    failures.is_empty()
}

/// `scoop` from `PATH`, or the shim a fresh scoop install leaves in the
/// user's home before `PATH` is reloaded.
fn scoop_program(home: &Path) -> String {
    let shim = bootstrap::scoop_shim(home);
    if which::which("scoop").is_err() && shim.is_file() {
        shim.to_string_lossy().into_owned()
    } else {
        "scoop".to_string()
    }
}

fn patch_code_runner(home: &Path, notifier: &Notifier) -> bool {
    let extensions_dir = home.join(".vscode").join("extensions");
    if !extensions_dir.is_dir() {
        notifier.notify(
            &format!("No VS Code extensions found in {}", extensions_dir.display()),
            Severity::Warning,
        );
        return true;
    }

    match editor::patch_code_runner(&extensions_dir) {
        Ok(patched) if patched.is_empty() => {
            notifier.notify("Code Runner extension is not installed", Severity::Warning);
            true
        }
        Ok(patched) => {
            for manifest in &patched {
                notifier.notify(
                    &format!("Added kit executor to {}", manifest.display()),
                    Severity::Success,
                );
            }
            true
        }
        Err(e) => {
            warn!("Code Runner patch failed: {e}");
            notifier.notify(&e.to_string(), Severity::Failure);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Palette;

    fn notifier() -> Notifier {
        Notifier::new(Palette::plain(), true)
    }

    fn checkout_with_std(root: &Path) -> PathBuf {
        let checkout = root.join("kit");
        std::fs::create_dir_all(checkout.join("std")).expect("create std");
        std::fs::write(checkout.join("std/prelude.kit"), "prelude").expect("write std");
        checkout
    }

    #[test]
    fn toolchain_path_lives_in_checkout() {
        let settings = InstallerSettings::default();
        let assignment = toolchain_assignment(&settings, Path::new("/opt/kit"));

        assert_eq!(assignment.name(), "KIT_TOOLCHAIN_PATH");
        assert_eq!(
            PathBuf::from(assignment.value()),
            Path::new("/opt/kit").join("toolchains")
        );
        assert_eq!(assignment.comment(), "# kitc toolchain path - added by kitup");
    }

    #[test]
    fn artifacts_are_installed_into_layout() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let checkout = checkout_with_std(temp_dir.path());
        let home = temp_dir.path().join("home");
        let built = home.join(".local/bin/kitc");
        std::fs::create_dir_all(built.parent().unwrap()).expect("create bin dir");
        std::fs::write(&built, b"kitc").expect("write binary");

        let layout = InstallLayout {
            built_binary: Some(built.clone()),
            binary_target: Some(temp_dir.path().join("usr/bin/kitc")),
            std_target: temp_dir.path().join("usr/lib/kit"),
            tool_dir: None,
        };

        assert!(install_artifacts(&layout, &checkout, &notifier()));
        assert!(!built.exists());
        assert!(temp_dir.path().join("usr/bin/kitc").exists());
        assert!(temp_dir.path().join("usr/lib/kit/prelude.kit").exists());
    }

    #[test]
    fn missing_binary_does_not_stop_std_copy() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let checkout = checkout_with_std(temp_dir.path());
        let layout = InstallLayout {
            built_binary: Some(temp_dir.path().join("home/.local/bin/kitc")),
            binary_target: Some(temp_dir.path().join("usr/bin/kitc")),
            std_target: temp_dir.path().join("usr/lib/kit"),
            tool_dir: None,
        };

        assert!(!install_artifacts(&layout, &checkout, &notifier()));
        assert!(temp_dir.path().join("usr/lib/kit/prelude.kit").exists());
    }

    #[test]
    fn windows_layout_only_copies_std() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let checkout = checkout_with_std(temp_dir.path());
        let layout = InstallLayout::windows(&temp_dir.path().join("AppData"));

        assert!(install_artifacts(&layout, &checkout, &notifier()));
        assert!(layout.std_target.join("prelude.kit").exists());
    }

    #[test]
    fn relative_checkout_becomes_absolute_toolchain_path() {
        let options = InstallOptions::new(Path::new("kit"), None, false).expect("resolve");

        assert!(options.checkout_dir.is_absolute());
        assert_eq!(
            options.checkout_dir,
            std::env::current_dir().expect("cwd").join("kit")
        );

        let assignment = toolchain_assignment(&InstallerSettings::default(), &options.checkout_dir);
        assert!(Path::new(assignment.value()).is_absolute());
        assert!(assignment.value().ends_with("toolchains"));
    }

    #[test]
    fn absolute_checkout_is_kept() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let options =
            InstallOptions::new(temp_dir.path(), Some(true), true).expect("resolve");
        assert_eq!(options.checkout_dir, temp_dir.path());
        assert_eq!(options.dev_branch, Some(true));
    }

    #[test]
    fn scoop_shim_is_used_only_when_scoop_is_off_path() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        assert_eq!(scoop_program(temp_dir.path()), "scoop");

        let shim = bootstrap::scoop_shim(temp_dir.path());
        std::fs::create_dir_all(shim.parent().unwrap()).expect("create shims dir");
        std::fs::write(&shim, "").expect("write shim");
        if which::which("scoop").is_err() {
            assert_eq!(scoop_program(temp_dir.path()), shim.to_string_lossy());
        }
    }

    #[test]
    fn code_runner_patch_tolerates_missing_vscode() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        assert!(patch_code_runner(temp_dir.path(), &notifier()));
    }
}
