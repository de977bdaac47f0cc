pub mod config;
pub mod core;
pub mod utils;

pub use crate::core::launcher::{LaunchOutcome, Launcher};
