use std::ffi::OsStr;

#[cfg(windows)]
use std::os::windows::process::CommandExt;

/// `CREATE_NO_WINDOW` process creation flag.
#[cfg(windows)]
const NO_CONSOLE_WINDOW: u32 = 0x0800_0000;

/// Suppresses the console window Windows opens for console programs
/// started from kitup. A no-op elsewhere.
pub trait HideWindow {
    fn hide_window(&mut self) -> &mut Self;
}

macro_rules! impl_hide_window {
    ($command:ty) => {
        impl HideWindow for $command {
            fn hide_window(&mut self) -> &mut Self {
                #[cfg(windows)]
                self.creation_flags(NO_CONSOLE_WINDOW);
                self
            }
        }
    };
}

impl_hide_window!(std::process::Command);
impl_hide_window!(tokio::process::Command);

/// Render a program and its arguments as a single line for logs and
/// status messages. Arguments containing whitespace are quoted.
pub fn describe_command<S: AsRef<OsStr>>(program: impl AsRef<OsStr>, args: &[S]) -> String {
    let mut line = program.as_ref().to_string_lossy().into_owned();
    for arg in args {
        let arg = arg.as_ref().to_string_lossy();
        line.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            line.push('"');
            line.push_str(&arg);
            line.push('"');
        } else {
            line.push_str(&arg);
        }
    }
    line
}
