//! Rigmint - autonomous mint acquisition bot
//! Custodial guard controller driven by a polling monitor

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod report;
pub mod shared;

// Re-export main types for convenience
pub use application::{MiningMonitor, MonitorConfig};
pub use domain::controller::{MintController, MiningConfig};
pub use domain::rig::Rig;
pub use infrastructure::rig::{RpcRig, SimulatedRig};
