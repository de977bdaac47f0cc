use crate::cli::TomoLaunch;
use clap::CommandFactory;
use std::io::Write;

const BIN_NAME: &str = "tomo-launch";

/// Completion script for `shell`, written to stdout. A closed pipe
/// (`tomo-launch completion bash | head`) is not an error.
pub fn generate_to_stdout(shell: clap_complete::Shell) -> anyhow::Result<()> {
    match write_completion(shell, &mut std::io::stdout()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn write_completion(shell: clap_complete::Shell, out: &mut impl Write) -> std::io::Result<()> {
    let mut buf = Vec::<u8>::new();
    clap_complete::generate(shell, &mut TomoLaunch::command(), BIN_NAME, &mut buf);
    out.write_all(&buf)
}
