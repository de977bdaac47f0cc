use crate::cli::{Commands, ResourceArgs, TomoLaunch};
use std::path::PathBuf;
use std::process::ExitCode;
use tomo_launch::config::Config;
use tomo_launch::core::probe::{HostProbe, OverrideProbe};

pub mod info;
pub mod run;

pub fn handle_commands(args: TomoLaunch) -> anyhow::Result<ExitCode> {
    match args.command {
        Some(Commands::Completion { shell }) => {
            crate::completion::generate_to_stdout(shell)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Info { json }) => {
            let config = load_config(&args.config, &args.resources)?;
            let probe = build_probe(&config, &args.resources);
            info::handle_info(config, probe, json)
        }
        None => {
            let config = load_config(&args.config, &args.resources)?;
            let probe = build_probe(&config, &args.resources);
            run::handle_run(config, probe, args.run_args)
        }
    }
}

/// Layered config with command line flags applied on top.
fn load_config(config_path: &Option<PathBuf>, resources: &ResourceArgs) -> anyhow::Result<Config> {
    let mut config = tomo_launch::config::load_config(config_path.as_ref())?;

    // CLI flags override config file
    if let Some(nodes) = resources.nodes {
        config.launcher.nodes = nodes;
    }
    if resources.strict {
        config.probe.strict = true;
    }

    tracing::debug!("{:?}", config);
    Ok(config)
}

fn build_probe(config: &Config, resources: &ResourceArgs) -> OverrideProbe<HostProbe> {
    OverrideProbe::new(
        HostProbe::new(config.probe.gpus),
        resources.cores,
        resources.gpus,
    )
}
