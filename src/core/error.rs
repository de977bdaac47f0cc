use crate::core::planner::PlanError;
use std::process::ExitStatus;
use strum::Display;
use thiserror::Error;

/// Exit code used when the launcher binary itself cannot be started.
pub const EXIT_INVOCATION_FAILURE: u8 = 127;
/// Exit code used when the run is refused before anything is started.
pub const EXIT_SETUP_FAILURE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Resource {
    #[strum(to_string = "CPU core")]
    Cores,
    #[strum(to_string = "GPU")]
    Gpus,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("`{tool}` could not be run: {source}")]
    ToolMissing {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("`{tool}` exited with {status}")]
    ToolFailed {
        tool: &'static str,
        status: ExitStatus,
    },

    #[error("NVML query failed: {0}")]
    Nvml(#[from] nvml_wrapper::error::NvmlError),

    #[error("the host exposes no {0} information")]
    NoData(Resource),
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{resource} detection failed: {source}")]
    Detection {
        resource: Resource,
        #[source]
        source: ProbeError,
    },

    #[error(transparent)]
    Planning(#[from] PlanError),

    #[error("failed to invoke `{program}`: {source}")]
    Invocation {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl LaunchError {
    pub fn exit_code(&self) -> u8 {
        match self {
            LaunchError::Invocation { .. } => EXIT_INVOCATION_FAILURE,
            LaunchError::Detection { .. } | LaunchError::Planning(_) => EXIT_SETUP_FAILURE,
        }
    }
}
