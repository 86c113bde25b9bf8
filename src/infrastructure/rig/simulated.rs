//! In-memory rig used for tests and simulate-only runs

use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::domain::rig::Rig;
use crate::shared::errors::RigError;
use crate::shared::types::Amount;

/// Simulated rig parameters
#[derive(Debug, Clone)]
pub struct SimulatedRigConfig {
    pub initial_price: Amount,
    /// Random walk step per price query, in basis points. 0 keeps the
    /// price fixed.
    pub jitter_bps: u32,
    /// Wall-clock length of one pricing epoch
    pub epoch_secs: u64,
}

impl Default for SimulatedRigConfig {
    fn default() -> Self {
        Self {
            initial_price: Amount::from_sol(0.0005),
            jitter_bps: 200,
            epoch_secs: 3_600,
        }
    }
}

struct SimState {
    price: u64,
    rng: StdRng,
    total_minted: u64,
}

/// Deterministic-enough rig stand-in: linear quotes over a random-walk spot
/// price, epochs advancing on wall-clock time, mints accepted whenever the
/// payment covers the current quote.
pub struct SimulatedRig {
    config: SimulatedRigConfig,
    state: Mutex<SimState>,
    started: Instant,
}

impl SimulatedRig {
    pub fn new(config: SimulatedRigConfig, seed: u64) -> Self {
        let price = config.initial_price.lamports.max(1);
        Self {
            config,
            state: Mutex::new(SimState {
                price,
                rng: StdRng::seed_from_u64(seed),
                total_minted: 0,
            }),
            started: Instant::now(),
        }
    }

    /// A rig whose price never moves; used by tests
    pub fn steady(price: Amount) -> Self {
        Self::new(
            SimulatedRigConfig {
                initial_price: price,
                jitter_bps: 0,
                epoch_secs: u64::MAX,
            },
            0,
        )
    }

    pub fn total_minted(&self) -> u64 {
        self.state.lock().unwrap().total_minted
    }

    fn walk_price(&self, state: &mut SimState) -> u64 {
        if self.config.jitter_bps > 0 {
            let step = state.rng.gen_range(-(self.config.jitter_bps as i64)..=self.config.jitter_bps as i64);
            let delta = state.price as i128 * step as i128 / 10_000;
            state.price = (state.price as i128 + delta).max(1) as u64;
        }
        state.price
    }
}

#[async_trait]
impl Rig for SimulatedRig {
    async fn spot_price(&self) -> Result<Amount, RigError> {
        let mut state = self.state.lock().unwrap();
        Ok(Amount::new(self.walk_price(&mut state)))
    }

    async fn quote(&self, amount: u64) -> Result<Amount, RigError> {
        let price = self.state.lock().unwrap().price;
        let cost = price.checked_mul(amount).ok_or_else(|| {
            RigError::InvalidState(format!("quote overflow for {} units", amount))
        })?;
        Ok(Amount::new(cost))
    }

    async fn current_epoch(&self) -> Result<u64, RigError> {
        if self.config.epoch_secs == u64::MAX {
            return Ok(1);
        }
        Ok(self.started.elapsed().as_secs() / self.config.epoch_secs + 1)
    }

    async fn mint(
        &self,
        recipient: Pubkey,
        amount: u64,
        payment: Amount,
    ) -> Result<(), RigError> {
        let mut state = self.state.lock().unwrap();
        let cost = state.price.saturating_mul(amount);
        if payment.lamports < cost {
            return Err(RigError::MintRejected(format!(
                "payment {} below cost {}",
                payment.lamports, cost
            )));
        }
        state.total_minted += amount;
        debug!("Simulated mint of {} units to {}", amount, recipient);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_steady_rig_keeps_price_fixed() {
        let rig = SimulatedRig::steady(Amount::new(500_000));
        for _ in 0..5 {
            assert_eq!(rig.spot_price().await.unwrap(), Amount::new(500_000));
        }
        assert_eq!(rig.current_epoch().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_quote_is_linear_in_amount() {
        let rig = SimulatedRig::steady(Amount::new(500_000));
        assert_eq!(rig.quote(10).await.unwrap(), Amount::new(5_000_000));
        assert_eq!(rig.quote(100).await.unwrap(), Amount::new(50_000_000));
    }

    #[tokio::test]
    async fn test_mint_rejects_underpayment() {
        let rig = SimulatedRig::steady(Amount::new(500_000));
        let err = rig
            .mint(Pubkey::new_unique(), 10, Amount::new(4_999_999))
            .await
            .unwrap_err();
        assert!(matches!(err, RigError::MintRejected(_)));
        assert_eq!(rig.total_minted(), 0);

        rig.mint(Pubkey::new_unique(), 10, Amount::new(5_000_000))
            .await
            .unwrap();
        assert_eq!(rig.total_minted(), 10);
    }

    #[tokio::test]
    async fn test_price_walk_stays_positive() {
        let rig = SimulatedRig::new(
            SimulatedRigConfig {
                initial_price: Amount::new(10),
                jitter_bps: 9_999,
                epoch_secs: 3_600,
            },
            42,
        );
        for _ in 0..200 {
            assert!(rig.spot_price().await.unwrap().lamports >= 1);
        }
    }
}
