// src/report.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::controller::{MiningConfig, MiningStatus, ProfitabilityCheck};

/// One-shot read-only status report
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusReport {
    pub enabled: bool,
    pub can_mint_now: bool,
    pub current_price_sol: f64,
    pub next_eligible_mint_time: i64,
    pub available_balance_sol: f64,
    pub current_epoch: u64,

    pub is_profitable: bool,
    pub recommended_amount: u64,

    pub config: MiningConfig,
    pub timestamp: DateTime<Utc>,
}

impl StatusReport {
    pub fn new(status: &MiningStatus, check: &ProfitabilityCheck, config: MiningConfig) -> Self {
        Self {
            enabled: status.enabled,
            can_mint_now: status.can_mint_now,
            current_price_sol: status.current_price.to_sol(),
            next_eligible_mint_time: status.next_eligible_mint_time,
            available_balance_sol: status.available_balance.to_sol(),
            current_epoch: status.current_epoch,
            is_profitable: check.is_profitable,
            recommended_amount: check.recommended_amount,
            config,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::Amount;

    #[test]
    fn test_status_report_creation() {
        let status = MiningStatus {
            enabled: true,
            can_mint_now: true,
            current_price: Amount::new(500_000),
            next_eligible_mint_time: 300,
            available_balance: Amount::from_sol(1.0),
            current_epoch: 1,
        };
        let check = ProfitabilityCheck {
            is_profitable: true,
            current_price: Amount::new(500_000),
            recommended_amount: 100,
        };
        let report = StatusReport::new(&status, &check, MiningConfig::default());

        assert!(report.enabled);
        assert_eq!(report.current_price_sol, 0.0005);
        assert_eq!(report.recommended_amount, 100);
        assert!(report.to_json().unwrap().contains("\"can_mint_now\": true"));
    }
}
