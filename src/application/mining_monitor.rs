//! Mining monitor - the polling decision loop driving the controller

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use solana_sdk::pubkey::Pubkey;
use tokio::sync::{Notify, RwLock};
use tracing::{error, info, warn};

use crate::domain::controller::MintController;
use crate::shared::errors::{ControllerError, RigError};
use crate::shared::types::{Amount, CallContext};

/// Ticks between statistics reports
const STATS_REPORT_TICKS: u64 = 10;

/// Fixed gas-limit bound attached to every submitted mint call. A submission
/// safety bound on the monitor's side; the controller enforces its own
/// configured gas-price ceiling independently.
pub const MINT_GAS_LIMIT: u64 = 500_000;

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    /// Where minted units are delivered
    pub recipient: Pubkey,
    /// Effective gas price attached to mint submissions, in microlamports
    pub gas_price: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            recipient: Pubkey::default(),
            gas_price: 100,
        }
    }
}

/// Process-lifetime statistics. Observability state, not a source of truth;
/// discarded on restart.
#[derive(Debug, Clone)]
pub struct MonitorStats {
    pub start_time: Instant,
    pub checks_performed: u64,
    pub mints_executed: u64,
    pub total_units_minted: u64,
    pub total_spent: Amount,
    pub errors: u64,
    pub last_mint_time: Option<DateTime<Utc>>,
}

impl MonitorStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            checks_performed: 0,
            mints_executed: 0,
            total_units_minted: 0,
            total_spent: Amount::default(),
            errors: 0,
            last_mint_time: None,
        }
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for MonitorStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Cooperative shutdown flag observed between ticks
pub struct ShutdownSignal {
    flag: AtomicBool,
    notify: Notify,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        if !self.is_triggered() {
            self.notify.notified().await;
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// How the monitor classifies a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Caller lacks capability; never retried
    Authorization,
    /// Expected steady-state outcome; wait for the next tick
    GuardNotYet,
    /// RPC or confirmation failure; retried naturally next tick
    Transport,
    /// Anything unrecognized
    Unclassified,
}

pub fn classify_failure(err: &ControllerError) -> FailureKind {
    match err {
        ControllerError::Unauthorized { .. } => FailureKind::Authorization,
        ControllerError::Guard(_) => FailureKind::GuardNotYet,
        ControllerError::Rig(RigError::Transport(_)) => FailureKind::Transport,
        _ => FailureKind::Unclassified,
    }
}

/// Single long-lived driver of the controller. One logical thread of
/// control; never two controller-mutating calls in flight.
pub struct MiningMonitor {
    controller: Arc<MintController>,
    config: MonitorConfig,
    operator: Pubkey,
    stats: Arc<RwLock<MonitorStats>>,
    shutdown: Arc<ShutdownSignal>,
}

impl MiningMonitor {
    pub fn new(controller: Arc<MintController>, operator: Pubkey, config: MonitorConfig) -> Self {
        Self {
            controller,
            config,
            operator,
            stats: Arc::new(RwLock::new(MonitorStats::new())),
            shutdown: Arc::new(ShutdownSignal::new()),
        }
    }

    pub fn shutdown_signal(&self) -> Arc<ShutdownSignal> {
        self.shutdown.clone()
    }

    pub async fn stats(&self) -> MonitorStats {
        self.stats.read().await.clone()
    }

    /// Run the polling loop until the shutdown signal fires
    pub async fn run(&self) {
        info!(
            "🚀 Mining monitor started: poll every {}s, recipient {}",
            self.config.poll_interval.as_secs(),
            self.config.recipient
        );

        let mut interval = tokio::time::interval(self.config.poll_interval);
        let mut ticks: u64 = 0;

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = self.shutdown.wait() => break,
            }
            if self.shutdown.is_triggered() {
                break;
            }

            self.tick().await;

            ticks += 1;
            if ticks % STATS_REPORT_TICKS == 0 {
                self.print_stats().await;
            }
        }

        info!("🛑 Mining monitor stopping");
        self.print_stats().await;
    }

    /// One poll cycle: status read, advisory profitability check, guarded
    /// mint submission. A failed tick never terminates the loop.
    pub async fn tick(&self) {
        let now = Utc::now().timestamp();
        {
            let mut stats = self.stats.write().await;
            stats.checks_performed += 1;
        }

        let status = match self.controller.get_mining_status(now).await {
            Ok(status) => status,
            Err(e) => {
                self.record_failure(&e, "status read").await;
                return;
            }
        };
        if !status.enabled {
            info!("⏸️ Auto-mining disabled, skipping tick");
            return;
        }
        if !status.can_mint_now {
            let wait = (status.next_eligible_mint_time - now).max(0);
            if wait > 0 {
                info!("⏳ Cooldown active: {}s until next eligible mint", wait);
            } else {
                info!(
                    "💤 Price {} above ceiling, waiting for a better epoch",
                    status.current_price
                );
            }
            return;
        }

        // Advisory only: avoids a wasted submission, the controller rechecks
        let check = match self.controller.check_profitability().await {
            Ok(check) => check,
            Err(e) => {
                self.record_failure(&e, "profitability check").await;
                return;
            }
        };
        if !check.is_profitable || check.recommended_amount == 0 {
            info!("📉 Not profitable at {} per unit", check.current_price);
            return;
        }

        info!(
            "🎯 Favorable price {} — submitting mint of {} units (gas limit {})",
            check.current_price, check.recommended_amount, MINT_GAS_LIMIT
        );
        let ctx = CallContext::new(self.operator, self.config.gas_price, now);
        match self
            .controller
            .execute_mint(ctx, self.config.recipient, check.recommended_amount)
            .await
        {
            Ok(receipt) => match receipt.mint_completed() {
                Some((recipient, amount, cost, epoch)) => {
                    info!(
                        "✅ Mint confirmed: {} units to {} for {} (epoch {})",
                        amount, recipient, cost, epoch
                    );
                    let mut stats = self.stats.write().await;
                    stats.mints_executed += 1;
                    stats.total_units_minted += amount;
                    stats.total_spent.lamports += cost.lamports;
                    stats.last_mint_time = Some(Utc::now());
                }
                None => {
                    warn!("⚠️ Mint call confirmed without a mint-completed event");
                }
            },
            Err(e) => self.record_failure(&e, "mint submission").await,
        }
    }

    async fn record_failure(&self, err: &ControllerError, during: &str) {
        match classify_failure(err) {
            FailureKind::GuardNotYet => {
                info!("⏳ Not yet ({}): {}", during, err);
            }
            FailureKind::Authorization => {
                error!("🔒 Authorization failure during {}: {}", during, err);
                self.stats.write().await.errors += 1;
            }
            FailureKind::Transport => {
                warn!("🌐 Transport failure during {}: {}", during, err);
                self.stats.write().await.errors += 1;
            }
            FailureKind::Unclassified => {
                error!("❓ Unclassified failure during {}: {:?}", during, err);
                self.stats.write().await.errors += 1;
            }
        }
    }

    async fn print_stats(&self) {
        let stats = self.stats.read().await;
        info!("📊 Monitor statistics:");
        info!(
            "   Uptime: {:.1} min",
            stats.uptime().as_secs_f64() / 60.0
        );
        info!("   Checks performed: {}", stats.checks_performed);
        if stats.mints_executed > 0 {
            info!("   Mints executed: {}", stats.mints_executed);
            info!("   Units minted: {}", stats.total_units_minted);
            info!("   Total spent: {}", stats.total_spent);
        }
        if let Some(last) = stats.last_mint_time {
            info!("   Last mint: {}", last.to_rfc3339());
        }
        if stats.errors > 0 {
            info!("   Errors: {}", stats.errors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::controller::MiningConfig;
    use crate::domain::rig::Rig;
    use crate::infrastructure::rig::SimulatedRig;
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct OfflineRig;

    #[async_trait]
    impl Rig for OfflineRig {
        async fn spot_price(&self) -> Result<Amount, RigError> {
            Err(RigError::Transport("connection refused".to_string()))
        }

        async fn quote(&self, _amount: u64) -> Result<Amount, RigError> {
            Err(RigError::Transport("connection refused".to_string()))
        }

        async fn current_epoch(&self) -> Result<u64, RigError> {
            Err(RigError::Transport("connection refused".to_string()))
        }

        async fn mint(
            &self,
            _recipient: Pubkey,
            _amount: u64,
            _payment: Amount,
        ) -> Result<(), RigError> {
            Err(RigError::Transport("connection refused".to_string()))
        }
    }

    fn monitor_with_rig(rig: Arc<dyn Rig>) -> (Arc<MintController>, MiningMonitor, Pubkey) {
        let owner = Pubkey::new_unique();
        let operator = Pubkey::new_unique();
        let controller = Arc::new(
            MintController::new(
                rig,
                Pubkey::new_unique(),
                MiningConfig::default(),
                HashSet::from([owner]),
                HashSet::from([operator]),
            )
            .unwrap(),
        );
        let monitor = MiningMonitor::new(
            controller.clone(),
            operator,
            MonitorConfig {
                poll_interval: Duration::from_millis(10),
                recipient: Pubkey::new_unique(),
                gas_price: 100,
            },
        );
        (controller, monitor, owner)
    }

    fn steady_rig(price: u64) -> Arc<SimulatedRig> {
        Arc::new(SimulatedRig::steady(Amount::new(price)))
    }

    #[tokio::test]
    async fn test_profitable_tick_executes_mint_once() {
        let rig = steady_rig(500_000);
        let (controller, monitor, _) = monitor_with_rig(rig);
        controller.deposit(Amount::from_sol(1.0)).await;

        monitor.tick().await;

        let stats = monitor.stats().await;
        assert_eq!(stats.checks_performed, 1);
        assert_eq!(stats.mints_executed, 1);
        assert_eq!(stats.total_units_minted, 100);
        assert_eq!(stats.total_spent, Amount::new(100 * 500_000));
        assert_eq!(stats.errors, 0);
        assert!(stats.last_mint_time.is_some());
    }

    #[tokio::test]
    async fn test_cooldown_tick_is_not_an_error() {
        let rig = steady_rig(500_000);
        let (controller, monitor, _) = monitor_with_rig(rig);
        controller.deposit(Amount::from_sol(1.0)).await;

        monitor.tick().await;
        // Second tick lands inside the cooldown window and simply waits
        monitor.tick().await;

        let stats = monitor.stats().await;
        assert_eq!(stats.checks_performed, 2);
        assert_eq!(stats.mints_executed, 1);
        assert_eq!(stats.errors, 0);
    }

    #[tokio::test]
    async fn test_unprofitable_tick_skips_submission() {
        let rig = steady_rig(5_000_000);
        let (controller, monitor, _) = monitor_with_rig(rig.clone());
        controller.deposit(Amount::from_sol(1.0)).await;

        monitor.tick().await;

        let stats = monitor.stats().await;
        assert_eq!(stats.mints_executed, 0);
        assert_eq!(stats.errors, 0);
        assert_eq!(rig.total_minted(), 0);
    }

    #[tokio::test]
    async fn test_disabled_controller_skips_tick() {
        let rig = steady_rig(500_000);
        let (controller, monitor, owner) = monitor_with_rig(rig.clone());
        controller.deposit(Amount::from_sol(1.0)).await;
        controller
            .emergency_stop(CallContext::new(owner, 100, 0))
            .await
            .unwrap();

        monitor.tick().await;

        let stats = monitor.stats().await;
        assert_eq!(stats.mints_executed, 0);
        assert_eq!(stats.errors, 0);
        assert_eq!(rig.total_minted(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_counts_as_error() {
        let (controller, monitor, _) = monitor_with_rig(Arc::new(OfflineRig));
        controller.deposit(Amount::from_sol(1.0)).await;

        monitor.tick().await;

        let stats = monitor.stats().await;
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.mints_executed, 0);
    }

    #[test]
    fn test_failure_classification() {
        let auth = ControllerError::Unauthorized {
            caller: Pubkey::new_unique(),
            role: crate::shared::errors::Role::Manager,
        };
        assert_eq!(classify_failure(&auth), FailureKind::Authorization);

        let guard: ControllerError =
            crate::shared::errors::GuardViolation::MiningDisabled.into();
        assert_eq!(classify_failure(&guard), FailureKind::GuardNotYet);

        let transport: ControllerError =
            RigError::Transport("timeout".to_string()).into();
        assert_eq!(classify_failure(&transport), FailureKind::Transport);

        let validation = ControllerError::Validation("bad".to_string());
        assert_eq!(classify_failure(&validation), FailureKind::Unclassified);
    }

    #[tokio::test]
    async fn test_shutdown_signal_stops_run() {
        let rig = steady_rig(5_000_000);
        let (_, monitor, _) = monitor_with_rig(rig);
        let shutdown = monitor.shutdown_signal();

        let handle = tokio::spawn(async move { monitor.run().await });
        tokio::time::sleep(Duration::from_millis(30)).await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor did not stop after shutdown signal")
            .unwrap();
    }
}
