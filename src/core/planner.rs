use crate::core::inventory::ResourceInventory;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// A positional hint telling the MPI job which resource a rank should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceLabel {
    Gpu(u32),
    Cpu(u32),
}

impl ResourceLabel {
    pub fn is_gpu(&self) -> bool {
        matches!(self, ResourceLabel::Gpu(_))
    }
}

impl fmt::Display for ResourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceLabel::Gpu(i) => write!(f, "GPU{i}"),
            ResourceLabel::Cpu(i) => write!(f, "CPU{i}"),
        }
    }
}

impl Serialize for ResourceLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Rank-ordered labels: all GPUs first, then CPUs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ResourceLabelList(Vec<ResourceLabel>);

impl ResourceLabelList {
    /// Labels for `process_count` ranks when `gpu_count` GPUs are available.
    ///
    /// GPUs beyond the number of ranks are left unused.
    pub fn for_ranks(process_count: u32, gpu_count: u32) -> Self {
        let gpu_ranks = gpu_count.min(process_count);
        let cpu_ranks = process_count - gpu_ranks;

        let labels = (0..gpu_ranks)
            .map(ResourceLabel::Gpu)
            .chain((0..cpu_ranks).map(ResourceLabel::Cpu))
            .collect();
        Self(labels)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceLabel> {
        self.0.iter()
    }

    pub fn gpu_ranks(&self) -> usize {
        self.0.iter().filter(|l| l.is_gpu()).count()
    }
}

impl fmt::Display for ResourceLabelList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{label}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessPlan {
    pub node_count: u32,
    pub process_count: u32,
    pub labels: ResourceLabelList,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("no processes to start ({node_count} node(s) x {core_count} core(s))")]
    NoProcesses { node_count: u32, core_count: u32 },

    #[error("process count overflows ({node_count} node(s) x {core_count} core(s))")]
    Overflow { node_count: u32, core_count: u32 },
}

/// Work out how many ranks to start and which resource each one binds to.
pub fn plan(inventory: &ResourceInventory, node_count: u32) -> Result<ProcessPlan, PlanError> {
    let core_count = inventory.core_count;
    let process_count = node_count
        .checked_mul(core_count)
        .ok_or(PlanError::Overflow {
            node_count,
            core_count,
        })?;

    if process_count == 0 {
        return Err(PlanError::NoProcesses {
            node_count,
            core_count,
        });
    }

    if inventory.gpu_count > process_count {
        tracing::info!(
            "{} GPU(s) available but only {process_count} rank(s); extra GPUs stay idle",
            inventory.gpu_count
        );
    }

    let labels = ResourceLabelList::for_ranks(process_count, inventory.gpu_count);
    tracing::debug!(%labels, process_count, "Planned ranks");

    Ok(ProcessPlan {
        node_count,
        process_count,
        labels,
    })
}
