use clap::Parser;
use std::process::ExitCode;
use tomo_launch::core::error::EXIT_SETUP_FAILURE;

mod cli;
mod commands;
mod completion;

fn main() -> ExitCode {
    let args = cli::TomoLaunch::parse();
    let _guard = init_tracing(args.verbosity.tracing_level_filter());

    match commands::handle_commands(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("tomo-launch: {err:?}");
            ExitCode::from(EXIT_SETUP_FAILURE)
        }
    }
}

/// Console (stderr) plus a daily rolling file under the data directory.
/// The file layer is dropped when the log directory cannot be created.
fn init_tracing(
    level: tracing_subscriber::filter::LevelFilter,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let (file_layer, guard) = match open_log_appender() {
        Ok(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("Warning: file logging disabled: {e}");
            (None, None)
        }
    };

    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(level)
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

fn open_log_appender() -> anyhow::Result<tracing_appender::rolling::RollingFileAppender> {
    let log_dir = tomo_launch::core::get_log_dir()?;
    std::fs::create_dir_all(&log_dir)?;

    let appender = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix("launch")
        .filename_suffix("log")
        .max_log_files(7)
        .build(&log_dir)?;
    Ok(appender)
}
