use serde::Serialize;
use std::fmt;

/// Resources found on the local host. Collected once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ResourceInventory {
    pub core_count: u32,
    pub gpu_count: u32,
}

impl ResourceInventory {
    pub fn new(core_count: u32, gpu_count: u32) -> Self {
        Self {
            core_count,
            gpu_count,
        }
    }
}

impl fmt::Display for ResourceInventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} core(s), {} GPU(s)", self.core_count, self.gpu_count)
    }
}
