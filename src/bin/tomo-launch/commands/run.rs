use crate::cli::RunArgs;
use std::process::ExitCode;
use tomo_launch::config::Config;
use tomo_launch::core::executor::{DryRunExecutor, Executor, ProcessExecutor};
use tomo_launch::core::job::{JobRequest, JobRequestBuilder};
use tomo_launch::core::probe::ResourceProbe;
use tomo_launch::Launcher;

pub fn handle_run<P: ResourceProbe>(
    config: Config,
    probe: P,
    run_args: RunArgs,
) -> anyhow::Result<ExitCode> {
    let job = job_request(&run_args)?;

    if run_args.dry_run {
        Ok(launch(config, probe, DryRunExecutor, &job, false))
    } else {
        Ok(launch(config, probe, ProcessExecutor, &job, true))
    }
}

/// Splits the positional values into the three paths and the options
/// forwarded to the reconstruction module.
fn job_request(run_args: &RunArgs) -> anyhow::Result<JobRequest> {
    let [data_file, process_file, output_path, options @ ..] = run_args.job.as_slice() else {
        anyhow::bail!("Expected <DATA_FILE> <PROCESS_FILE> <OUTPUT_PATH>");
    };

    let options = options
        .iter()
        .map(|option| {
            option
                .to_str()
                .map(str::to_owned)
                .ok_or_else(|| anyhow::anyhow!("Option {option:?} is not valid UTF-8"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(JobRequestBuilder::new()
        .data_file(data_file)
        .process_file(process_file)
        .output_path(output_path)
        .extra_options(options)
        .build())
}

fn launch<P: ResourceProbe, E: Executor>(
    config: Config,
    probe: P,
    executor: E,
    job: &JobRequest,
    banners: bool,
) -> ExitCode {
    let inherited = std::env::var_os(&config.environment.search_path_var);
    let launcher = Launcher::new(config, probe, executor)
        .inherited_search_path(inherited)
        .banners(banners);

    match launcher.run(job) {
        Ok(outcome) => ExitCode::from(exit_byte(outcome.exit_code)),
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("tomo-launch: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

/// Process exit statuses are a single byte on POSIX hosts.
fn exit_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}
