//! Application layer - the monitor service driving the domain

pub mod mining_monitor;

pub use mining_monitor::{
    classify_failure, FailureKind, MiningMonitor, MonitorConfig, MonitorStats, ShutdownSignal,
};
