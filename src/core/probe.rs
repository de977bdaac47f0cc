//! Host resource detection.
//!
//! Probes shell out to the usual host tools (`lscpu`, `nvidia-smi`) or talk
//! to NVML directly. A failing probe never aborts a run on its own: [`detect`]
//! downgrades it to a warning and a count of zero unless strict mode is on.

use crate::core::error::{LaunchError, ProbeError, Resource};
use crate::core::inventory::ResourceInventory;
use nvml_wrapper::Nvml;
use std::collections::HashSet;
use std::process::Command;

const CPUINFO_PATH: &str = "/proc/cpuinfo";

#[cfg_attr(test, mockall::automock)]
pub trait ResourceProbe {
    /// Number of distinct physical cores.
    fn core_count(&self) -> Result<u32, ProbeError>;
    /// Number of GPUs visible to the management interface.
    fn gpu_count(&self) -> Result<u32, ProbeError>;
}

/// Probe backed by the real host.
#[derive(Debug, Clone)]
pub struct HostProbe {
    detect_gpus: bool,
}

impl Default for HostProbe {
    fn default() -> Self {
        Self { detect_gpus: true }
    }
}

impl HostProbe {
    pub fn new(detect_gpus: bool) -> Self {
        Self { detect_gpus }
    }

    fn lscpu_cores() -> Result<u32, ProbeError> {
        let output = run_tool("lscpu", &["--parse=CORE,SOCKET"])?;
        match count_lscpu_cores(&output) {
            0 => Err(ProbeError::NoData(Resource::Cores)),
            n => Ok(n),
        }
    }

    fn cpuinfo_cores() -> Result<u32, ProbeError> {
        let contents =
            std::fs::read_to_string(CPUINFO_PATH).map_err(|source| ProbeError::ToolMissing {
                tool: CPUINFO_PATH,
                source,
            })?;
        match count_cpuinfo_cores(&contents) {
            0 => Err(ProbeError::NoData(Resource::Cores)),
            n => Ok(n),
        }
    }

    fn nvidia_smi_gpus() -> Result<u32, ProbeError> {
        let output = run_tool("nvidia-smi", &["-L"])?;
        Ok(count_listed_gpus(&output))
    }
}

impl ResourceProbe for HostProbe {
    fn core_count(&self) -> Result<u32, ProbeError> {
        Self::lscpu_cores().or_else(|e| {
            tracing::debug!("lscpu probe failed ({e}), reading {CPUINFO_PATH}");
            Self::cpuinfo_cores()
        })
    }

    fn gpu_count(&self) -> Result<u32, ProbeError> {
        if !self.detect_gpus {
            tracing::debug!("GPU detection disabled");
            return Ok(0);
        }

        match Nvml::init() {
            Ok(nvml) => Ok(nvml.device_count()?),
            Err(e) => {
                tracing::debug!("NVML unavailable ({e}), falling back to nvidia-smi");
                Self::nvidia_smi_gpus()
            }
        }
    }
}

/// Probe that reports fixed counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedProbe {
    inventory: ResourceInventory,
}

impl FixedProbe {
    pub fn new(core_count: u32, gpu_count: u32) -> Self {
        Self {
            inventory: ResourceInventory::new(core_count, gpu_count),
        }
    }
}

impl ResourceProbe for FixedProbe {
    fn core_count(&self) -> Result<u32, ProbeError> {
        Ok(self.inventory.core_count)
    }

    fn gpu_count(&self) -> Result<u32, ProbeError> {
        Ok(self.inventory.gpu_count)
    }
}

/// Wraps another probe, replacing whichever counts were given explicitly.
/// The inner probe is not consulted for an overridden resource.
#[derive(Debug, Clone)]
pub struct OverrideProbe<P> {
    inner: P,
    cores: Option<u32>,
    gpus: Option<u32>,
}

impl<P: ResourceProbe> OverrideProbe<P> {
    pub fn new(inner: P, cores: Option<u32>, gpus: Option<u32>) -> Self {
        Self { inner, cores, gpus }
    }
}

impl<P: ResourceProbe> ResourceProbe for OverrideProbe<P> {
    fn core_count(&self) -> Result<u32, ProbeError> {
        match self.cores {
            Some(n) => Ok(n),
            None => self.inner.core_count(),
        }
    }

    fn gpu_count(&self) -> Result<u32, ProbeError> {
        match self.gpus {
            Some(n) => Ok(n),
            None => self.inner.gpu_count(),
        }
    }
}

/// Query `probe` for both counts.
///
/// In permissive mode a failed query is logged and counted as zero. In strict
/// mode it is returned as [`LaunchError::Detection`].
pub fn detect<P>(probe: &P, strict: bool) -> Result<ResourceInventory, LaunchError>
where
    P: ResourceProbe + ?Sized,
{
    let core_count = settle(Resource::Cores, probe.core_count(), strict)?;
    let gpu_count = settle(Resource::Gpus, probe.gpu_count(), strict)?;

    let inventory = ResourceInventory::new(core_count, gpu_count);
    tracing::info!(%inventory, "Detected local resources");
    Ok(inventory)
}

fn settle(
    resource: Resource,
    result: Result<u32, ProbeError>,
    strict: bool,
) -> Result<u32, LaunchError> {
    match result {
        Ok(count) => Ok(count),
        Err(source) if strict => Err(LaunchError::Detection { resource, source }),
        Err(e) => {
            tracing::warn!("{resource} detection degraded, assuming 0: {e}");
            Ok(0)
        }
    }
}

fn run_tool(tool: &'static str, args: &[&str]) -> Result<String, ProbeError> {
    let output = Command::new(tool)
        .args(args)
        .output()
        .map_err(|source| ProbeError::ToolMissing { tool, source })?;

    if !output.status.success() {
        return Err(ProbeError::ToolFailed {
            tool,
            status: output.status,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Count distinct `CORE,SOCKET` rows in `lscpu --parse` output.
///
/// Offline CPUs report an empty core id and are skipped.
pub fn count_lscpu_cores(output: &str) -> u32 {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| line.split(',').next().is_some_and(|core| !core.trim().is_empty()))
        .collect::<HashSet<_>>()
        .len() as u32
}

/// Count distinct `(physical id, core id)` pairs in `/proc/cpuinfo`.
pub fn count_cpuinfo_cores(contents: &str) -> u32 {
    let mut cores = HashSet::new();

    for block in contents.split("\n\n") {
        let mut physical_id = None;
        let mut core_id = None;
        for line in block.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            match key.trim() {
                "physical id" => physical_id = Some(value.trim()),
                "core id" => core_id = Some(value.trim()),
                _ => {}
            }
        }
        if let Some(core_id) = core_id {
            cores.insert((physical_id.unwrap_or("0"), core_id));
        }
    }

    cores.len() as u32
}

/// Count GPUs in `nvidia-smi -L` output (one device per line).
pub fn count_listed_gpus(output: &str) -> u32 {
    output
        .lines()
        .filter(|line| line.trim_start().starts_with("GPU "))
        .count() as u32
}
