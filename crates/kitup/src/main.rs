mod artifacts;
mod bootstrap;
mod cli;
mod editor;
mod environment;
mod error;
mod logging;
mod notify;
mod orchestrator;
mod settings;
mod steps;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use kitup_platform::{AppPaths, HostOs};
use kitup_shell::{EnvAssignment, QueryEngine, ShellRegistry, SystemShellHost};
use log::{debug, error, info};

use crate::cli::{Cli, Command, EnvCommand, InstallArgs};
use crate::error::AppError;
use crate::notify::{Notifier, Palette, Severity};
use crate::orchestrator::{InstallOptions, Installer};
use crate::settings::InstallerSettings;
use crate::steps::StepRunner;

const DEFAULT_ENV_COMMENT: &str = "# added by kitup";

fn main() -> ExitCode {
    let cli = Cli::parse();
    let palette = Palette::detect();
    let notifier = Notifier::new(palette, cli.yes);

    match run(cli, &notifier, palette) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            notifier.notify(&e.to_string(), Severity::Failure);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, notifier: &Notifier, palette: Palette) -> Result<bool, AppError> {
    let paths = AppPaths::new()?;
    let settings_path = cli.config.clone().unwrap_or_else(|| paths.settings_file());
    let settings = InstallerSettings::load(&settings_path)?;

    // Logging is best effort, so a data directory we cannot create only
    // costs the log file.
    let _ = paths.ensure_dirs();
    logging::init_logging(
        &paths.log_file(),
        cli.verbose || settings.debug_logging,
        settings.max_log_size_bytes,
    );
    info!("kitup {} starting", env!("CARGO_PKG_VERSION"));
    debug!("Console colour depth: {:?}", palette.depth());

    let shells = if cli.shells.is_empty() {
        &settings.shells
    } else {
        &cli.shells
    };
    let mut registry = ShellRegistry::native()?;
    if !shells.is_empty() {
        registry = registry.retain(shells)?;
    }
    let host = SystemShellHost;

    match cli.command {
        None => install(
            &InstallArgs::default(),
            &settings,
            &paths,
            &registry,
            &host,
            notifier,
        ),
        Some(Command::Install(args)) => {
            install(&args, &settings, &paths, &registry, &host, notifier)
        }
        Some(Command::Env {
            action:
                EnvCommand::Set {
                    name,
                    value,
                    comment,
                },
        }) => {
            let assignment = EnvAssignment::new(
                name,
                value,
                comment.unwrap_or_else(|| DEFAULT_ENV_COMMENT.to_string()),
            );
            Ok(environment::export_and_verify(
                &registry,
                &host,
                notifier,
                &assignment,
            ))
        }
        Some(Command::Env {
            action: EnvCommand::Query { name, expected },
        }) => {
            let result = QueryEngine::new(&registry, &host).query_variable(&name, &expected);
            Ok(environment::report_query(notifier, &result))
        }
        Some(Command::Shells) => {
            environment::list_shells(&registry, &host, notifier);
            Ok(true)
        }
    }
}

fn install(
    args: &InstallArgs,
    settings: &InstallerSettings,
    paths: &AppPaths,
    registry: &ShellRegistry,
    host: &SystemShellHost,
    notifier: &Notifier,
) -> Result<bool, AppError> {
    let checkout_dir = args
        .checkout
        .clone()
        .or_else(|| settings.checkout_dir.clone())
        .unwrap_or_else(|| paths.default_checkout_dir());
    let options = InstallOptions::new(&checkout_dir, args.dev_branch(), args.skip_editor)?;

    let installer = Installer {
        settings,
        notifier,
        registry,
        host,
        runner: StepRunner::new(Duration::from_secs(settings.command_timeout_secs)),
        os: HostOs::detect(),
        options,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(AppError::Runtime)?;

    let success = runtime.block_on(installer.run())?;
    if success {
        notifier.notify("Kit is installed", Severity::Success);
    } else {
        notifier.notify("Kit was installed with errors, see above", Severity::Warning);
    }
    Ok(success)
}
