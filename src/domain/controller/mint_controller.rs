//! Guarded custodial state machine in front of the rig

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::config::MiningConfig;
use super::events::{CallReceipt, ControllerEvent};
use crate::domain::rig::Rig;
use crate::shared::errors::{ControllerError, GuardViolation, Role};
use crate::shared::types::{Amount, CallContext};

/// Aggregated mining status view
#[derive(Debug, Clone)]
pub struct MiningStatus {
    pub enabled: bool,
    pub can_mint_now: bool,
    pub current_price: Amount,
    pub next_eligible_mint_time: i64,
    pub available_balance: Amount,
    pub current_epoch: u64,
}

/// Advisory profitability check result.
///
/// Off-chain callers use this to avoid wasted mint attempts; the guards
/// inside `execute_mint` recheck everything and are the binding copy.
#[derive(Debug, Clone)]
pub struct ProfitabilityCheck {
    pub is_profitable: bool,
    pub current_price: Amount,
    pub recommended_amount: u64,
}

struct ControllerState {
    config: MiningConfig,
    owners: HashSet<Pubkey>,
    managers: HashSet<Pubkey>,
    balance: u64,
    asset_balances: HashMap<Pubkey, u64>,
    /// 0 means never minted
    last_mint_timestamp: i64,
}

/// Custodial controller in front of the rig.
///
/// Holds funds and configuration, and enforces every mint precondition
/// itself regardless of who calls it. Two gates compose into mint
/// eligibility: the enable switch (owner-toggled) and the cooldown timer
/// (advanced only by a successful mint). Every other check is stateless
/// given current inputs.
pub struct MintController {
    rig: Arc<dyn Rig>,
    rig_address: Pubkey,
    state: RwLock<ControllerState>,
    /// Serializes every mutating operation; held across the rig call so a
    /// mint, a config update and a withdrawal can never interleave.
    mutation_lock: Mutex<()>,
}

impl MintController {
    pub fn new(
        rig: Arc<dyn Rig>,
        rig_address: Pubkey,
        config: MiningConfig,
        owners: HashSet<Pubkey>,
        managers: HashSet<Pubkey>,
    ) -> Result<Self, ControllerError> {
        config.validate()?;
        Ok(Self {
            rig,
            rig_address,
            state: RwLock::new(ControllerState {
                config,
                owners,
                managers,
                balance: 0,
                asset_balances: HashMap::new(),
                last_mint_timestamp: 0,
            }),
            mutation_lock: Mutex::new(()),
        })
    }

    fn require(
        state: &ControllerState,
        ctx: &CallContext,
        role: Role,
    ) -> Result<(), ControllerError> {
        let authorized = match role {
            Role::Owner => state.owners.contains(&ctx.caller),
            Role::Manager => state.managers.contains(&ctx.caller),
        };
        if authorized {
            Ok(())
        } else {
            Err(ControllerError::Unauthorized {
                caller: ctx.caller,
                role,
            })
        }
    }

    /// Execute a guarded mint. Manager capability required.
    ///
    /// Preconditions are checked in a fixed order, each producing a distinct
    /// failure. A rig failure aborts the whole call: the balance and the
    /// cooldown timer only change after the rig accepted the payment.
    pub async fn execute_mint(
        &self,
        ctx: CallContext,
        recipient: Pubkey,
        amount: u64,
    ) -> Result<CallReceipt, ControllerError> {
        let _guard = self.mutation_lock.lock().await;

        let (config, last_mint, balance) = {
            let state = self.state.read().await;
            Self::require(&state, &ctx, Role::Manager)?;
            (state.config.clone(), state.last_mint_timestamp, state.balance)
        };

        if !config.auto_mining_enabled {
            return Err(GuardViolation::MiningDisabled.into());
        }
        if amount == 0 || amount < config.min_mint_amount || amount > config.max_mint_amount {
            return Err(GuardViolation::AmountOutOfRange {
                amount,
                min: config.min_mint_amount,
                max: config.max_mint_amount,
            }
            .into());
        }
        let eligible_at = last_mint + config.cooldown_secs;
        if ctx.timestamp < eligible_at {
            return Err(GuardViolation::CooldownActive {
                remaining_secs: eligible_at - ctx.timestamp,
            }
            .into());
        }
        if ctx.gas_price > config.max_gas_price {
            return Err(GuardViolation::GasPriceTooHigh {
                gas_price: ctx.gas_price,
                max_gas_price: config.max_gas_price,
            }
            .into());
        }

        // Fresh quote at execution time; any spot price a caller saw earlier
        // is not binding.
        let cost = self.rig.quote(amount).await?;
        if cost.lamports > balance {
            return Err(GuardViolation::InsufficientBalance {
                cost: cost.lamports,
                balance,
            }
            .into());
        }
        // Implied per-unit price rounds up so a fractional overage rejects
        let unit_price = cost.lamports.div_ceil(amount);
        if unit_price > config.max_price_per_unit.lamports {
            return Err(GuardViolation::PriceAboveCeiling {
                unit_price,
                max_price: config.max_price_per_unit.lamports,
            }
            .into());
        }

        let epoch = self.rig.current_epoch().await?;

        self.rig.mint(recipient, amount, cost).await?;

        {
            let mut state = self.state.write().await;
            state.balance -= cost.lamports;
            state.last_mint_timestamp = ctx.timestamp;
        }

        info!(
            "⛏️ Minted {} units to {} for {} (epoch {})",
            amount, recipient, cost, epoch
        );

        Ok(CallReceipt::single(ControllerEvent::MintCompleted {
            recipient,
            amount,
            cost,
            epoch,
        }))
    }

    /// Replace the whole configuration snapshot. Owner capability required.
    pub async fn update_config(
        &self,
        ctx: CallContext,
        new_config: MiningConfig,
    ) -> Result<CallReceipt, ControllerError> {
        let _guard = self.mutation_lock.lock().await;
        let mut state = self.state.write().await;
        Self::require(&state, &ctx, Role::Owner)?;
        new_config.validate()?;
        state.config = new_config.clone();
        info!("🔧 Configuration replaced: {:?}", new_config);
        Ok(CallReceipt::single(ControllerEvent::ConfigUpdated {
            config: new_config,
        }))
    }

    /// Idempotently disable auto-mining. Owner capability required.
    pub async fn emergency_stop(&self, ctx: CallContext) -> Result<CallReceipt, ControllerError> {
        let _guard = self.mutation_lock.lock().await;
        let mut state = self.state.write().await;
        Self::require(&state, &ctx, Role::Owner)?;
        let mut config = state.config.clone();
        config.auto_mining_enabled = false;
        state.config = config;
        info!("🛑 Emergency stop by {}", ctx.caller);
        Ok(CallReceipt::single(ControllerEvent::EmergencyStopped {
            initiator: ctx.caller,
        }))
    }

    /// Withdraw native funds. Owner capability required; `amount == 0`
    /// withdraws the entire available balance.
    pub async fn withdraw_funds(
        &self,
        ctx: CallContext,
        to: Pubkey,
        amount: u64,
    ) -> Result<CallReceipt, ControllerError> {
        let _guard = self.mutation_lock.lock().await;
        let mut state = self.state.write().await;
        Self::require(&state, &ctx, Role::Owner)?;
        if to == Pubkey::default() {
            return Err(ControllerError::Withdrawal("recipient is unset".to_string()));
        }
        let resolved = if amount == 0 { state.balance } else { amount };
        if resolved == 0 {
            return Err(ControllerError::Withdrawal("nothing to withdraw".to_string()));
        }
        if resolved > state.balance {
            return Err(ControllerError::Withdrawal(format!(
                "amount {} exceeds balance {}",
                resolved, state.balance
            )));
        }
        state.balance -= resolved;
        info!("💸 Withdrew {} to {}", Amount::new(resolved), to);
        Ok(CallReceipt::single(ControllerEvent::FundsWithdrawn {
            to,
            amount: Amount::new(resolved),
        }))
    }

    /// Withdraw a held asset. Same contract as `withdraw_funds`.
    pub async fn withdraw_asset(
        &self,
        ctx: CallContext,
        asset: Pubkey,
        to: Pubkey,
        amount: u64,
    ) -> Result<CallReceipt, ControllerError> {
        let _guard = self.mutation_lock.lock().await;
        let mut state = self.state.write().await;
        Self::require(&state, &ctx, Role::Owner)?;
        if to == Pubkey::default() {
            return Err(ControllerError::Withdrawal("recipient is unset".to_string()));
        }
        let held = state.asset_balances.get(&asset).copied().unwrap_or(0);
        let resolved = if amount == 0 { held } else { amount };
        if resolved == 0 {
            return Err(ControllerError::Withdrawal("nothing to withdraw".to_string()));
        }
        if resolved > held {
            return Err(ControllerError::Withdrawal(format!(
                "amount {} exceeds asset balance {}",
                resolved, held
            )));
        }
        state.asset_balances.insert(asset, held - resolved);
        info!("💸 Withdrew {} of asset {} to {}", resolved, asset, to);
        Ok(CallReceipt::single(ControllerEvent::AssetWithdrawn {
            asset,
            to,
            amount: resolved,
        }))
    }

    /// Add a caller to the manager set. Owner capability required.
    pub async fn grant_manager(
        &self,
        ctx: CallContext,
        who: Pubkey,
    ) -> Result<CallReceipt, ControllerError> {
        let _guard = self.mutation_lock.lock().await;
        let mut state = self.state.write().await;
        Self::require(&state, &ctx, Role::Owner)?;
        state.managers.insert(who);
        Ok(CallReceipt::single(ControllerEvent::ManagerGranted { who }))
    }

    /// Remove a caller from the manager set. Owner capability required.
    pub async fn revoke_manager(
        &self,
        ctx: CallContext,
        who: Pubkey,
    ) -> Result<CallReceipt, ControllerError> {
        let _guard = self.mutation_lock.lock().await;
        let mut state = self.state.write().await;
        Self::require(&state, &ctx, Role::Owner)?;
        state.managers.remove(&who);
        Ok(CallReceipt::single(ControllerEvent::ManagerRevoked { who }))
    }

    /// Fund the custody ledger. Anyone may deposit; only an owner withdraws.
    pub async fn deposit(&self, amount: Amount) {
        let _guard = self.mutation_lock.lock().await;
        let mut state = self.state.write().await;
        state.balance += amount.lamports;
        debug!("Deposit of {} accepted", amount);
    }

    pub async fn deposit_asset(&self, asset: Pubkey, amount: u64) {
        let _guard = self.mutation_lock.lock().await;
        let mut state = self.state.write().await;
        *state.asset_balances.entry(asset).or_insert(0) += amount;
    }

    /// Advisory profitability check against the live spot price.
    /// Safe to call unauthenticated, at any frequency.
    pub async fn check_profitability(&self) -> Result<ProfitabilityCheck, ControllerError> {
        let config = self.state.read().await.config.clone();
        let current_price = self.rig.spot_price().await?;
        let is_profitable = current_price.lamports <= config.max_price_per_unit.lamports;
        let recommended_amount = if is_profitable { config.max_mint_amount } else { 0 };
        Ok(ProfitabilityCheck {
            is_profitable,
            current_price,
            recommended_amount,
        })
    }

    /// Aggregated status view; mirrors but does not replace the mint guards.
    pub async fn get_mining_status(&self, now: i64) -> Result<MiningStatus, ControllerError> {
        let (config, last_mint, balance) = {
            let state = self.state.read().await;
            (state.config.clone(), state.last_mint_timestamp, state.balance)
        };
        let current_price = self.rig.spot_price().await?;
        let current_epoch = self.rig.current_epoch().await?;
        let next_eligible_mint_time = last_mint + config.cooldown_secs;
        let can_mint_now = current_price.lamports <= config.max_price_per_unit.lamports
            && now >= next_eligible_mint_time;
        Ok(MiningStatus {
            enabled: config.auto_mining_enabled,
            can_mint_now,
            current_price,
            next_eligible_mint_time,
            available_balance: Amount::new(balance),
            current_epoch,
        })
    }

    pub async fn config(&self) -> MiningConfig {
        self.state.read().await.config.clone()
    }

    pub async fn last_mint_timestamp(&self) -> i64 {
        self.state.read().await.last_mint_timestamp
    }

    pub fn rig_address(&self) -> Pubkey {
        self.rig_address
    }

    pub async fn balance(&self) -> Amount {
        Amount::new(self.state.read().await.balance)
    }

    pub async fn asset_balance(&self, asset: Pubkey) -> u64 {
        self.state
            .read()
            .await
            .asset_balances
            .get(&asset)
            .copied()
            .unwrap_or(0)
    }

    pub async fn is_owner(&self, who: Pubkey) -> bool {
        self.state.read().await.owners.contains(&who)
    }

    pub async fn is_manager(&self, who: Pubkey) -> bool {
        self.state.read().await.managers.contains(&who)
    }
}
