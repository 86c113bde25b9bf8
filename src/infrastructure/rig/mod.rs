//! Rig adapters - simulated and RPC-backed implementations of the boundary

pub mod rpc;
pub mod simulated;

pub use rpc::RpcRig;
pub use simulated::{SimulatedRig, SimulatedRigConfig};
