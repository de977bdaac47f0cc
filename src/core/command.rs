use crate::config::Config;
use crate::core::job::JobRequest;
use crate::core::planner::ProcessPlan;
use crate::utils::shell_join;
use std::ffi::{OsStr, OsString};
use std::fmt;

#[cfg(windows)]
const SEARCH_PATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const SEARCH_PATH_SEPARATOR: &str = ":";

/// A fully assembled launcher invocation.
///
/// `env` only applies to the child process; the launcher's own environment
/// is never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub env: Vec<(OsString, OsString)>,
}

impl LaunchCommand {
    pub fn program_lossy(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env = self.env.iter().map(|(key, value)| {
            format!(
                "{}={}",
                key.to_string_lossy(),
                shell_join([value.to_string_lossy()])
            )
        });
        let argv = std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|a| a.to_string_lossy());

        let mut parts: Vec<String> = env.collect();
        parts.push(shell_join(argv));
        write!(f, "{}", parts.join(" "))
    }
}

/// Assembles the `mpirun ... python -m <module> ...` line from configuration,
/// a [`ProcessPlan`] and a [`JobRequest`].
pub struct CommandBuilder<'a> {
    config: &'a Config,
    inherited_search_path: Option<OsString>,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            inherited_search_path: None,
        }
    }

    /// The current value of the search path variable, which the configured
    /// install path is prepended to.
    pub fn inherited_search_path(mut self, value: Option<OsString>) -> Self {
        self.inherited_search_path = value;
        self
    }

    pub fn build(&self, plan: &ProcessPlan, job: &JobRequest) -> LaunchCommand {
        let launcher = &self.config.launcher;
        let recon = &self.config.recon;

        let mut args: Vec<OsString> = vec!["-np".into(), plan.process_count.to_string().into()];
        if !launcher.transports.is_empty() {
            args.push("--mca".into());
            args.push("btl".into());
            args.push(launcher.transports.join(",").into());
        }

        args.push(recon.interpreter.as_str().into());
        args.push("-m".into());
        args.push(recon.module.as_str().into());
        args.extend(recon.mode_args.iter().map(OsString::from));

        args.push(job.data_file.clone().into_os_string());
        args.push(job.process_file.clone().into_os_string());
        args.push(job.output_path.clone().into_os_string());

        args.push("-n".into());
        args.push(plan.labels.to_string().into());
        if recon.verbose {
            args.push("-v".into());
        }
        args.extend(job.extra_options.iter().map(OsString::from));

        LaunchCommand {
            program: launcher.program.as_str().into(),
            args,
            env: self.build_env(),
        }
    }

    fn build_env(&self) -> Vec<(OsString, OsString)> {
        let environment = &self.config.environment;
        let mut env: Vec<(OsString, OsString)> = Vec::with_capacity(environment.vars.len() + 1);

        if let Some(install_path) = &environment.install_path {
            let value = prepend_search_path(
                install_path.as_os_str(),
                self.inherited_search_path.as_deref(),
            );
            env.push((environment.search_path_var.as_str().into(), value));
        }

        env.extend(
            environment
                .vars
                .iter()
                .map(|var| (var.name.as_str().into(), var.value.as_str().into())),
        );
        env
    }
}

fn prepend_search_path(entry: &OsStr, inherited: Option<&OsStr>) -> OsString {
    let mut value = entry.to_os_string();
    if let Some(inherited) = inherited.filter(|v| !v.is_empty()) {
        value.push(SEARCH_PATH_SEPARATOR);
        value.push(inherited);
    }
    value
}
