//! Rig interface trait

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;

use crate::shared::errors::RigError;
use crate::shared::types::Amount;

/// Common interface to the rig being monitored.
///
/// The rig is a black box: the spot price and a quote are only eventually
/// consistent with what a later mint call observes, so callers must recheck
/// cost at execution time.
#[async_trait]
pub trait Rig: Send + Sync {
    /// Current spot price per unit, in lamports
    async fn spot_price(&self) -> Result<Amount, RigError>;

    /// Cost to mint `amount` units at the current price
    async fn quote(&self, amount: u64) -> Result<Amount, RigError>;

    /// Current pricing epoch
    async fn current_epoch(&self) -> Result<u64, RigError>;

    /// Mint `amount` units to `recipient`, paying exactly `payment`
    async fn mint(&self, recipient: Pubkey, amount: u64, payment: Amount)
        -> Result<(), RigError>;
}
