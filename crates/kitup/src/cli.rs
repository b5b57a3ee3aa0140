use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Bootstrap the Kit compiler toolchain and wire it into your shells.
#[derive(Parser, Debug)]
#[command(name = "kitup", version, about)]
pub struct Cli {
    /// Answer every prompt with its default
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Only configure these shells (repeatable)
    #[arg(long = "shell", value_name = "NAME", global = true)]
    pub shells: Vec<String>,

    /// Settings file to use instead of the default one
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Clone, build and install the toolchain (default)
    Install(InstallArgs),

    /// Manage persistent environment variables in shell startup files
    Env {
        #[command(subcommand)]
        action: EnvCommand,
    },

    /// List supported shells and whether they are installed
    Shells,
}

#[derive(Args, Debug, Default)]
pub struct InstallArgs {
    /// Toolchain checkout directory
    #[arg(long, value_name = "DIR")]
    pub checkout: Option<PathBuf>,

    /// Build the dev branch without asking
    #[arg(long, conflicts_with = "no_dev")]
    pub dev: bool,

    /// Build the current branch without asking
    #[arg(long)]
    pub no_dev: bool,

    /// Skip the VS Code integration
    #[arg(long)]
    pub skip_editor: bool,
}

impl InstallArgs {
    /// `None` when the user should be asked.
    #[must_use]
    pub fn dev_branch(&self) -> Option<bool> {
        match (self.dev, self.no_dev) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum EnvCommand {
    /// Export NAME=VALUE from every installed shell's startup files
    Set {
        name: String,
        value: String,

        /// Comment written above the export in new startup files
        #[arg(long)]
        comment: Option<String>,
    },

    /// Show what every installed shell resolves NAME to
    Query { name: String, expected: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_install() {
        let cli = Cli::try_parse_from(["kitup", "-y"]).expect("parse");
        assert!(cli.yes);
        assert!(cli.command.is_none());
    }

    #[test]
    fn install_flags_decide_dev_branch() {
        let cli = Cli::try_parse_from(["kitup", "install", "--no-dev", "--skip-editor"])
            .expect("parse");
        let Some(Command::Install(args)) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(args.dev_branch(), Some(false));
        assert!(args.skip_editor);
        assert_eq!(InstallArgs::default().dev_branch(), None);
    }

    #[test]
    fn dev_and_no_dev_conflict() {
        assert!(Cli::try_parse_from(["kitup", "install", "--dev", "--no-dev"]).is_err());
    }

    #[test]
    fn env_set_takes_name_value_and_comment() {
        let cli = Cli::try_parse_from([
            "kitup",
            "env",
            "set",
            "KIT_TOOLCHAIN_PATH",
            "/opt/kit/toolchains",
            "--comment",
            "# kit toolchain path",
            "--shell",
            "bash",
            "--shell",
            "zsh",
        ])
        .expect("parse");

        assert_eq!(cli.shells, ["bash", "zsh"]);
        let Some(Command::Env {
            action: EnvCommand::Set {
                name,
                value,
                comment,
            },
        }) = cli.command
        else {
            panic!("expected env set");
        };
        assert_eq!(name, "KIT_TOOLCHAIN_PATH");
        assert_eq!(value, "/opt/kit/toolchains");
        assert_eq!(comment.as_deref(), Some("# kit toolchain path"));
    }

    #[test]
    fn env_query_requires_expected_value() {
        assert!(Cli::try_parse_from(["kitup", "env", "query", "X"]).is_err());
        assert!(Cli::try_parse_from(["kitup", "env", "query", "X", "v"]).is_ok());
    }
}
