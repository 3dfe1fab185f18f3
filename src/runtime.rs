//! Runtime glue that wires sweep configuration, telemetry, the worker pool,
//! and runner orchestration.

pub mod config;
pub mod runner;
pub mod sweep;
pub mod telemetry;
