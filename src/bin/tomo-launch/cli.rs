use clap::Parser;
use clap_complete::Shell;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "tomo-launch",
    author,
    version = tomo_launch::core::version(),
    about = "Detects local CPUs and GPUs and launches a tomography reconstruction through mpirun.",
    subcommand_negates_reqs = true
)]
#[command(styles = tomo_launch::utils::STYLES)]
pub struct TomoLaunch {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run_args: RunArgs,

    /// The configuration file to use
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub resources: ResourceArgs,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

#[derive(Debug, Parser)]
pub enum Commands {
    /// Show detected resources and the rank layout
    Info {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completion {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// <DATA_FILE> <PROCESS_FILE> <OUTPUT_PATH> followed by options forwarded
    /// unparsed to the reconstruction module. Everything after the data file
    /// is taken literally, so tomo-launch flags must come first.
    #[arg(
        required = true,
        num_args = 3..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "ARGS",
        value_parser = clap::value_parser!(OsString)
    )]
    pub job: Vec<OsString>,

    /// Print the launcher command instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct ResourceArgs {
    /// Number of nodes in the job (overrides config)
    #[arg(long, global = true, value_name = "N")]
    pub nodes: Option<u32>,

    /// Use this many cores instead of detecting them
    #[arg(long, global = true, value_name = "N")]
    pub cores: Option<u32>,

    /// Use this many GPUs instead of detecting them
    #[arg(long, global = true, value_name = "N")]
    pub gpus: Option<u32>,

    /// Fail instead of assuming 0 when a resource cannot be detected
    #[arg(long, global = true)]
    pub strict: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    fn parse(argv: &[&str]) -> TomoLaunch {
        TomoLaunch::try_parse_from(argv).unwrap()
    }

    fn values_of(args: &TomoLaunch) -> Vec<&str> {
        args.run_args.job.iter().map(|v| v.to_str().unwrap()).collect()
    }

    fn options_of(args: &TomoLaunch) -> Vec<&str> {
        values_of(args).split_off(3)
    }

    #[test]
    fn test_positionals_and_pass_through_options() {
        let args = parse(&[
            "tomo-launch",
            "--nodes",
            "2",
            "/data/scan.nxs",
            "process.nxs",
            "/tmp/out",
            "-d",
            "/tmp/scratch",
            "--stats",
            "-v",
        ]);

        assert!(args.command.is_none());
        assert_eq!(args.resources.nodes, Some(2));

        assert_eq!(values_of(&args)[..3], ["/data/scan.nxs", "process.nxs", "/tmp/out"]);
        assert_eq!(options_of(&args), vec!["-d", "/tmp/scratch", "--stats", "-v"]);
        assert_eq!(args.verbosity.tracing_level_filter(), LevelFilter::WARN);
    }

    #[test]
    fn test_positionals_without_options() {
        let args = parse(&["tomo-launch", "a.nxs", "p.nxs", "out"]);
        assert!(options_of(&args).is_empty());
        assert!(!args.run_args.dry_run);
    }

    #[test]
    fn test_missing_output_path_is_rejected() {
        assert!(TomoLaunch::try_parse_from(["tomo-launch", "a.nxs", "p.nxs"]).is_err());
    }

    #[test]
    fn test_leading_launcher_flags_are_forwarded_verbatim() {
        let cases: &[&[&str]] = &[
            &["-q"],
            &["-v"],
            &["-c", "x"],
            &["--config", "x"],
            &["--dry-run"],
            &["--nodes", "4"],
            &["--strict"],
            &["--help"],
            &["info"],
        ];

        for forwarded in cases {
            let mut argv = vec!["tomo-launch", "a.nxs", "p.nxs", "out"];
            argv.extend_from_slice(forwarded);
            let args = parse(&argv);

            assert!(args.command.is_none(), "{forwarded:?}");
            assert_eq!(options_of(&args), *forwarded, "{forwarded:?}");
            assert_eq!(args.verbosity.tracing_level_filter(), LevelFilter::WARN);
            assert!(args.config.is_none());
            assert!(!args.run_args.dry_run);
            assert!(!args.resources.strict);
            assert_eq!(args.resources.nodes, None);
        }
    }

    #[test]
    fn test_launcher_flags_before_positionals_still_apply() {
        let args = parse(&[
            "tomo-launch",
            "-v",
            "-c",
            "site.toml",
            "--dry-run",
            "a.nxs",
            "p.nxs",
            "out",
            "-q",
        ]);

        assert_eq!(args.verbosity.tracing_level_filter(), LevelFilter::INFO);
        assert_eq!(args.config, Some(PathBuf::from("site.toml")));
        assert!(args.run_args.dry_run);
        assert_eq!(options_of(&args), vec!["-q"]);
    }

    #[test]
    fn test_info_subcommand() {
        let args = parse(&["tomo-launch", "info", "--json"]);
        assert!(matches!(args.command, Some(Commands::Info { json: true })));
    }

    #[test]
    fn test_global_flags_before_subcommand() {
        let args = parse(&["tomo-launch", "--cores", "4", "info"]);
        assert!(matches!(args.command, Some(Commands::Info { json: false })));
        assert_eq!(args.resources.cores, Some(4));

        let args = parse(&["tomo-launch", "-v", "--nodes", "2", "info", "--json"]);
        assert!(matches!(args.command, Some(Commands::Info { json: true })));
        assert_eq!(args.resources.nodes, Some(2));
        assert_eq!(args.verbosity.tracing_level_filter(), LevelFilter::INFO);
    }

    #[test]
    fn test_resource_overrides() {
        let args = parse(&[
            "tomo-launch",
            "--cores",
            "8",
            "--gpus",
            "0",
            "--strict",
            "--dry-run",
            "a.nxs",
            "p.nxs",
            "out",
        ]);
        assert_eq!(args.resources.cores, Some(8));
        assert_eq!(args.resources.gpus, Some(0));
        assert!(args.resources.strict);
        assert!(args.run_args.dry_run);
    }
}
