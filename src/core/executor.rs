use crate::core::command::LaunchCommand;
use crate::core::error::LaunchError;
use std::process::{Command, ExitStatus};

/// Runs a [`LaunchCommand`] to completion and reports its exit code.
#[cfg_attr(test, mockall::automock)]
pub trait Executor {
    fn execute(&self, command: &LaunchCommand) -> Result<i32, LaunchError>;
}

/// Spawns the command as a child process sharing this terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn execute(&self, command: &LaunchCommand) -> Result<i32, LaunchError> {
        tracing::info!("Running {command}");

        let status = Command::new(&command.program)
            .args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k, v)))
            .status()
            .map_err(|source| LaunchError::Invocation {
                program: command.program_lossy(),
                source,
            })?;

        let code = exit_code(status);
        tracing::debug!(%status, code, "Launcher exited");
        Ok(code)
    }
}

/// Prints the command instead of running it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunExecutor;

impl Executor for DryRunExecutor {
    fn execute(&self, command: &LaunchCommand) -> Result<i32, LaunchError> {
        println!("{command}");
        Ok(0)
    }
}

/// Exit code of a finished child. A child killed by signal `s` reports
/// `128 + s`, as a POSIX shell would.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
