//! Common types used across the application

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// Amount representation in lamports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Amount {
    pub lamports: u64,
}

impl Amount {
    pub fn new(lamports: u64) -> Self {
        Self { lamports }
    }

    pub fn from_sol(value: f64) -> Self {
        Self {
            lamports: (value * 1_000_000_000.0) as u64,
        }
    }

    pub fn to_sol(&self) -> f64 {
        self.lamports as f64 / 1_000_000_000.0
    }

    pub fn is_zero(&self) -> bool {
        self.lamports == 0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6} SOL", self.to_sol())
    }
}

/// Per-call environment for controller mutations.
///
/// Assembled by the transport layer from the submitted call: the signer, the
/// effective gas price attached to the call and the current block timestamp.
/// The controller trusts these the way a program trusts its runtime.
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    pub caller: Pubkey,
    /// Effective gas price in microlamports
    pub gas_price: u64,
    /// Unix timestamp in seconds
    pub timestamp: i64,
}

impl CallContext {
    pub fn new(caller: Pubkey, gas_price: u64, timestamp: i64) -> Self {
        Self {
            caller,
            gas_price,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_sol_conversion() {
        assert_eq!(Amount::from_sol(0.0005).lamports, 500_000);
        assert_eq!(Amount::new(5_000_000).to_sol(), 0.005);
    }

    #[test]
    fn test_amount_zero() {
        assert!(Amount::default().is_zero());
        assert!(!Amount::new(1).is_zero());
    }
}
