mod commands;
mod host;
mod paths;

pub use commands::{HideWindow, describe_command};
pub use host::{HostOs, InstallLayout, InstallLayoutError};
pub use paths::{AppPaths, AppPathsError};
