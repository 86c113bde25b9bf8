use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use tracing::{error, info, warn};

use rigmint::application::{MiningMonitor, MonitorConfig};
use rigmint::domain::controller::{MiningConfig, MintController};
use rigmint::domain::rig::Rig;
use rigmint::infrastructure::rig::{RpcRig, SimulatedRig, SimulatedRigConfig};
use rigmint::report::StatusReport;
use rigmint::shared::config::{load_operator_keypair, Config, MonitorSettings};
use rigmint::shared::types::Amount;

#[derive(Parser, Debug)]
#[command(version, about = "Autonomous rig mint bot with a custodial guard controller")]
struct Args {
    /// RPC endpoint URL
    #[arg(long)]
    rpc_url: Option<String>,

    /// Path to operator keypair file
    #[arg(long)]
    keypair: Option<String>,

    /// Rig state account address (required in live mode)
    #[arg(long)]
    rig_address: Option<String>,

    /// Rig program ID (required in live mode)
    #[arg(long)]
    rig_program: Option<String>,

    /// Owner address; defaults to the operator itself
    #[arg(long)]
    owner: Option<String>,

    /// Mint recipient address; defaults to the owner address
    #[arg(long)]
    recipient: Option<String>,

    /// Poll interval in seconds
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Gas price attached to mint submissions, in microlamports
    #[arg(long, default_value = "100")]
    gas_price: u64,

    /// Highest acceptable price per unit, in SOL
    #[arg(long, default_value = "0.001")]
    max_price: f64,

    /// Informational profit margin in basis points
    #[arg(long, default_value = "500")]
    min_profit_margin_bps: u32,

    /// Smallest mint amount per call
    #[arg(long, default_value = "1")]
    min_mint: u64,

    /// Largest mint amount per call
    #[arg(long, default_value = "100")]
    max_mint: u64,

    /// Minimum seconds between successful mints
    #[arg(long, default_value = "300")]
    cooldown_secs: i64,

    /// Highest acceptable effective gas price, in microlamports
    #[arg(long, default_value = "1000")]
    max_gas_price: u64,

    /// Initial custody deposit, in SOL
    #[arg(long, default_value = "1.0")]
    deposit: f64,

    /// Run against an in-memory simulated rig instead of RPC
    #[arg(long)]
    simulate_only: bool,

    /// Print a one-shot status report as JSON and exit
    #[arg(long)]
    status: bool,

    /// Path to config file (optional)
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    // Settings priority: CLI args > environment > config file > defaults
    let mut settings = MonitorSettings::from_env();
    if let Some(config_path) = &args.config {
        settings = settings.merge_file(Config::from_file(config_path)?);
    }
    if let Some(rpc_url) = &args.rpc_url {
        settings.rpc_url = rpc_url.clone();
    }
    if let Some(keypair) = &args.keypair {
        settings.keypair_path = Some(keypair.clone());
    }
    if let Some(rig_address) = &args.rig_address {
        settings.controller_address = Some(rig_address.clone());
    }
    if let Some(poll_interval) = args.poll_interval {
        settings.poll_interval_secs = poll_interval;
    }
    if let Some(recipient) = &args.recipient {
        settings.recipient = Some(recipient.clone());
    }

    run(args, settings).await
}

async fn run(args: Args, settings: MonitorSettings) -> Result<()> {
    let operator = load_operator_keypair(settings.keypair_path.as_deref())?;
    let operator_pubkey = operator.pubkey();
    info!("🔑 Operator: {}", operator_pubkey);

    let owner: Pubkey = match &args.owner {
        Some(address) => address
            .parse()
            .map_err(|e| anyhow!("Invalid owner address {}: {}", address, e))?,
        None => operator_pubkey,
    };
    let recipient: Pubkey = match &settings.recipient {
        Some(address) => address
            .parse()
            .map_err(|e| anyhow!("Invalid recipient address {}: {}", address, e))?,
        None => owner,
    };

    let mining_config = MiningConfig {
        max_price_per_unit: Amount::from_sol(args.max_price),
        min_profit_margin_bps: args.min_profit_margin_bps,
        max_mint_amount: args.max_mint,
        min_mint_amount: args.min_mint,
        auto_mining_enabled: true,
        cooldown_secs: args.cooldown_secs,
        max_gas_price: args.max_gas_price,
    };

    let (rig, rig_address): (Arc<dyn Rig>, Pubkey) = if args.simulate_only {
        info!("🧪 Simulation mode - using in-memory rig");
        let rig = SimulatedRig::new(SimulatedRigConfig::default(), rand::random());
        (Arc::new(rig), Pubkey::new_unique())
    } else {
        let rig_address: Pubkey = settings
            .controller_address
            .as_deref()
            .ok_or_else(|| anyhow!("rig address missing: set CONTROLLER_ADDRESS or --rig-address"))?
            .parse()
            .map_err(|e| anyhow!("Invalid rig address: {}", e))?;
        let rig_program: Pubkey = args
            .rig_program
            .as_deref()
            .ok_or_else(|| anyhow!("rig program missing: set --rig-program"))?
            .parse()
            .map_err(|e| anyhow!("Invalid rig program ID: {}", e))?;
        info!("📡 RPC: {}", settings.rpc_url);
        info!("⚙️ Rig state account: {}", rig_address);
        let rig = RpcRig::new(settings.rpc_url.clone(), rig_program, rig_address, operator);
        (Arc::new(rig), rig_address)
    };

    let controller = Arc::new(
        MintController::new(
            rig,
            rig_address,
            mining_config,
            HashSet::from([owner]),
            HashSet::from([operator_pubkey]),
        )
        .map_err(|e| anyhow!("Failed to create controller: {}", e))?,
    );

    if args.deposit > 0.0 {
        controller.deposit(Amount::from_sol(args.deposit)).await;
        info!("💰 Custody funded with {}", Amount::from_sol(args.deposit));
    } else {
        warn!("⚠️ Custody balance is zero; mints will fail until funds arrive");
    }

    if args.status {
        let now = chrono::Utc::now().timestamp();
        let status = controller
            .get_mining_status(now)
            .await
            .map_err(|e| anyhow!("Status read failed: {}", e))?;
        let check = controller
            .check_profitability()
            .await
            .map_err(|e| anyhow!("Profitability check failed: {}", e))?;
        let report = StatusReport::new(&status, &check, controller.config().await);
        println!("{}", report.to_json()?);
        return Ok(());
    }

    let monitor = MiningMonitor::new(
        controller,
        operator_pubkey,
        MonitorConfig {
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
            recipient,
            gas_price: args.gas_price,
        },
    );

    let shutdown = monitor.shutdown_signal();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("🛑 Shutdown signal received");
        shutdown.trigger();
    });

    monitor.run().await;
    Ok(())
}
