//! Controller configuration snapshot

use serde::{Deserialize, Serialize};

use crate::shared::errors::ControllerError;
use crate::shared::types::Amount;

/// Longest cooldown an owner may configure
pub const MAX_COOLDOWN_SECS: i64 = 86_400;

/// Controller configuration.
///
/// Replaced wholesale under the controller's mutation lock, never mutated
/// field by field, so readers always observe a consistent snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Highest acceptable price per unit
    pub max_price_per_unit: Amount,
    /// Informational margin in basis points; not consulted by any decision
    pub min_profit_margin_bps: u32,
    pub max_mint_amount: u64,
    pub min_mint_amount: u64,
    pub auto_mining_enabled: bool,
    pub cooldown_secs: i64,
    /// Highest acceptable effective gas price, in microlamports
    pub max_gas_price: u64,
}

impl MiningConfig {
    pub fn validate(&self) -> Result<(), ControllerError> {
        if self.max_mint_amount < self.min_mint_amount {
            return Err(ControllerError::Validation(format!(
                "max_mint_amount {} below min_mint_amount {}",
                self.max_mint_amount, self.min_mint_amount
            )));
        }
        if self.cooldown_secs < 0 || self.cooldown_secs > MAX_COOLDOWN_SECS {
            return Err(ControllerError::Validation(format!(
                "cooldown_secs {} outside [0, {}]",
                self.cooldown_secs, MAX_COOLDOWN_SECS
            )));
        }
        if self.max_gas_price == 0 {
            return Err(ControllerError::Validation(
                "max_gas_price must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            max_price_per_unit: Amount::from_sol(0.001),
            min_profit_margin_bps: 500,
            max_mint_amount: 100,
            min_mint_amount: 1,
            auto_mining_enabled: true,
            cooldown_secs: 300,
            max_gas_price: 1_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(MiningConfig::default().validate().is_ok());
    }

    #[test]
    fn test_amount_bounds_invariant() {
        let config = MiningConfig {
            max_mint_amount: 5,
            min_mint_amount: 10,
            ..MiningConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ControllerError::Validation(_))
        ));
    }

    #[test]
    fn test_cooldown_invariant() {
        let config = MiningConfig {
            cooldown_secs: MAX_COOLDOWN_SECS + 1,
            ..MiningConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MiningConfig {
            cooldown_secs: MAX_COOLDOWN_SECS,
            ..MiningConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gas_price_invariant() {
        let config = MiningConfig {
            max_gas_price: 0,
            ..MiningConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
