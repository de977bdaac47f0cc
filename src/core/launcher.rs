use crate::config::Config;
use crate::core::command::{CommandBuilder, LaunchCommand};
use crate::core::error::LaunchError;
use crate::core::executor::Executor;
use crate::core::inventory::ResourceInventory;
use crate::core::job::JobRequest;
use crate::core::planner::{plan, ProcessPlan};
use crate::core::probe::{detect, ResourceProbe};
use crate::utils::format_duration;
use owo_colors::OwoColorize;
use std::ffi::OsString;
use std::time::{Duration, Instant};

const BANNER_RULE: &str = "***********************************************";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub inventory: ResourceInventory,
    pub plan: ProcessPlan,
    pub command: LaunchCommand,
    /// Exit code of the launcher process, unchanged.
    pub exit_code: i32,
    pub elapsed: Duration,
}

/// Detect, plan, build, execute. One shot, no retries.
pub struct Launcher<P, E> {
    config: Config,
    probe: P,
    executor: E,
    inherited_search_path: Option<OsString>,
    banners: bool,
}

impl<P: ResourceProbe, E: Executor> Launcher<P, E> {
    pub fn new(config: Config, probe: P, executor: E) -> Self {
        Self {
            config,
            probe,
            executor,
            inherited_search_path: None,
            banners: true,
        }
    }

    pub fn inherited_search_path(mut self, value: Option<OsString>) -> Self {
        self.inherited_search_path = value;
        self
    }

    pub fn banners(mut self, enabled: bool) -> Self {
        self.banners = enabled;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Detect resources and plan ranks without launching anything.
    pub fn assess(&self) -> Result<(ResourceInventory, ProcessPlan), LaunchError> {
        let inventory = detect(&self.probe, self.config.probe.strict)?;
        let plan = plan(&inventory, self.config.launcher.nodes)?;
        Ok((inventory, plan))
    }

    pub fn build_command(&self, plan: &ProcessPlan, job: &JobRequest) -> LaunchCommand {
        CommandBuilder::new(&self.config)
            .inherited_search_path(self.inherited_search_path.clone())
            .build(plan, job)
    }

    pub fn run(&self, job: &JobRequest) -> Result<LaunchOutcome, LaunchError> {
        let (inventory, plan) = self.assess()?;
        let command = self.build_command(&plan, job);

        if self.banners {
            print_start_banner(&plan);
        }

        let started = Instant::now();
        let exit_code = self.executor.execute(&command)?;
        let elapsed = started.elapsed();

        if exit_code == 0 {
            tracing::info!("Reconstruction finished in {}", format_duration(elapsed));
        } else {
            tracing::error!("Launcher exited with code {exit_code}");
        }
        if self.banners {
            print_end_banner(exit_code, elapsed);
        }

        Ok(LaunchOutcome {
            inventory,
            plan,
            command,
            exit_code,
            elapsed,
        })
    }
}

fn print_start_banner(plan: &ProcessPlan) {
    println!("{BANNER_RULE}");
    println!("\t\t{}", "TOMO-LAUNCH MPI LOCAL RUN".bold());
    println!(
        "\t{} rank(s) on {} node(s): {}",
        plan.process_count, plan.node_count, plan.labels
    );
    println!("{BANNER_RULE}");
}

fn print_end_banner(exit_code: i32, elapsed: Duration) {
    let status = format!("exit code {exit_code}");
    let status = if exit_code == 0 {
        status.green().to_string()
    } else {
        status.red().to_string()
    };
    println!("{BANNER_RULE}");
    println!(
        "\t\t{} ({status}, {})",
        "LOCAL RUN ENDS".bold(),
        format_duration(elapsed)
    );
    println!("{BANNER_RULE}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ProbeError, Resource};
    use crate::core::executor::MockExecutor;
    use crate::core::job::JobRequestBuilder;
    use crate::core::planner::PlanError;
    use crate::core::probe::{FixedProbe, MockResourceProbe};
    use mockall::predicate::function;

    fn job() -> JobRequest {
        JobRequestBuilder::new()
            .data_file("/data/scan.nxs")
            .process_file("/data/process.nxs")
            .output_path("/data/out")
            .extra_option("--stats")
            .build()
    }

    #[test]
    fn test_run_returns_successful_exit_code() {
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .with(function(|c: &LaunchCommand| {
                c.program == "mpirun" && c.args.iter().any(|a| a == "GPU0,GPU1,CPU0,CPU1")
            }))
            .times(1)
            .returning(|_| Ok(0));

        let launcher =
            Launcher::new(Config::default(), FixedProbe::new(4, 2), executor).banners(false);
        let outcome = launcher.run(&job()).unwrap();

        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.plan.process_count, 4);
        assert_eq!(outcome.inventory, ResourceInventory::new(4, 2));
    }

    #[test]
    fn test_run_propagates_failure_exit_code_unchanged() {
        let mut executor = MockExecutor::new();
        executor.expect_execute().times(1).returning(|_| Ok(42));

        let launcher =
            Launcher::new(Config::default(), FixedProbe::new(2, 0), executor).banners(false);

        assert_eq!(launcher.run(&job()).unwrap().exit_code, 42);
    }

    #[test]
    fn test_invocation_failure_is_surfaced() {
        let mut executor = MockExecutor::new();
        executor.expect_execute().times(1).returning(|c| {
            Err(LaunchError::Invocation {
                program: c.program_lossy(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        });

        let launcher =
            Launcher::new(Config::default(), FixedProbe::new(2, 0), executor).banners(false);
        let err = launcher.run(&job()).unwrap_err();

        assert_eq!(err.exit_code(), 127);
    }

    #[test]
    fn test_zero_cores_never_reaches_executor() {
        let mut executor = MockExecutor::new();
        executor.expect_execute().never();

        let launcher =
            Launcher::new(Config::default(), FixedProbe::new(0, 1), executor).banners(false);
        let err = launcher.run(&job()).unwrap_err();

        assert!(matches!(
            err,
            LaunchError::Planning(PlanError::NoProcesses { .. })
        ));
    }

    #[test]
    fn test_missing_gpu_tooling_still_launches() {
        let mut probe = MockResourceProbe::new();
        probe.expect_core_count().returning(|| Ok(2));
        probe
            .expect_gpu_count()
            .returning(|| Err(ProbeError::NoData(Resource::Gpus)));

        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .with(function(|c: &LaunchCommand| {
                c.args.iter().any(|a| a == "CPU0,CPU1")
            }))
            .times(1)
            .returning(|_| Ok(0));

        let launcher = Launcher::new(Config::default(), probe, executor).banners(false);
        assert_eq!(launcher.run(&job()).unwrap().exit_code, 0);
    }

    #[test]
    fn test_strict_mode_refuses_degraded_detection() {
        let mut probe = MockResourceProbe::new();
        probe.expect_core_count().returning(|| Ok(2));
        probe
            .expect_gpu_count()
            .returning(|| Err(ProbeError::NoData(Resource::Gpus)));

        let mut executor = MockExecutor::new();
        executor.expect_execute().never();

        let mut config = Config::default();
        config.probe.strict = true;

        let launcher = Launcher::new(config, probe, executor).banners(false);
        assert!(matches!(
            launcher.run(&job()),
            Err(LaunchError::Detection { .. })
        ));
    }

    #[test]
    fn test_node_count_comes_from_config() {
        let mut config = Config::default();
        config.launcher.nodes = 2;

        let launcher = Launcher::new(config, FixedProbe::new(3, 1), MockExecutor::new());
        let (_, plan) = launcher.assess().unwrap();

        assert_eq!(plan.process_count, 6);
        assert_eq!(plan.labels.to_string(), "GPU0,CPU0,CPU1,CPU2,CPU3,CPU4");
    }
}
