//! Monitor process configuration

use serde::Deserialize;
use solana_sdk::signature::{read_keypair_file, Keypair};
use std::{env, fs, path::Path};

use crate::shared::errors::AppError;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct RpcCfg {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletCfg {
    pub keypair: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorCfg {
    pub poll_interval_secs: Option<u64>,
    pub recipient: Option<String>,
    pub controller_address: Option<String>,
}

/// File-based configuration (optional, sits below environment variables)
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub rpc: RpcCfg,
    pub wallet: Option<WalletCfg>,
    pub monitor: Option<MonitorCfg>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let s = fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config file: {}", e)))?;
        toml::from_str(&s)
            .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))
    }
}

/// Resolved monitor settings with priority: CLI args > environment > file > defaults.
/// CLI overlay happens in main; this type handles the env and file layers.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub rpc_url: String,
    pub keypair_path: Option<String>,
    pub controller_address: Option<String>,
    pub poll_interval_secs: u64,
    pub recipient: Option<String>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            keypair_path: None,
            controller_address: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            recipient: None,
        }
    }
}

impl MonitorSettings {
    /// Read the environment-recognized settings on top of the defaults
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(url) = env::var("RPC_URL") {
            settings.rpc_url = url;
        }
        if let Ok(path) = env::var("OPERATOR_KEYPAIR") {
            settings.keypair_path = Some(path);
        }
        if let Ok(addr) = env::var("CONTROLLER_ADDRESS") {
            settings.controller_address = Some(addr);
        }
        if let Ok(interval) = env::var("POLL_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse() {
                settings.poll_interval_secs = secs;
            }
        }
        if let Ok(recipient) = env::var("MINT_RECIPIENT") {
            settings.recipient = Some(recipient);
        }
        settings
    }

    /// Fill unset fields from a config file
    pub fn merge_file(mut self, cfg: Config) -> Self {
        if env::var("RPC_URL").is_err() {
            self.rpc_url = cfg.rpc.url;
        }
        if self.keypair_path.is_none() {
            self.keypair_path = cfg.wallet.map(|w| w.keypair);
        }
        if let Some(monitor) = cfg.monitor {
            if self.controller_address.is_none() {
                self.controller_address = monitor.controller_address;
            }
            if env::var("POLL_INTERVAL_SECS").is_err() {
                if let Some(secs) = monitor.poll_interval_secs {
                    self.poll_interval_secs = secs;
                }
            }
            if self.recipient.is_none() {
                self.recipient = monitor.recipient;
            }
        }
        self
    }
}

/// Load the operator keypair from `OPERATOR_KEYPAIR_B58` or from a file path
pub fn load_operator_keypair(path: Option<&str>) -> Result<Keypair, AppError> {
    if let Ok(keypair_b58) = env::var("OPERATOR_KEYPAIR_B58") {
        let bytes = bs58::decode(&keypair_b58)
            .into_vec()
            .map_err(|e| AppError::Config(format!("Failed to decode base58 keypair: {}", e)))?;
        return Keypair::from_bytes(&bytes)
            .map_err(|e| AppError::Config(format!("Failed to create keypair from bytes: {}", e)));
    }

    let path = path.ok_or_else(|| {
        AppError::Config("operator credential missing: set OPERATOR_KEYPAIR or OPERATOR_KEYPAIR_B58".to_string())
    })?;
    read_keypair_file(path)
        .map_err(|e| AppError::Config(format!("Failed to read keypair file '{}': {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_poll_interval() {
        let settings = MonitorSettings::default();
        assert_eq!(settings.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
        assert!(settings.recipient.is_none());
    }

    #[test]
    fn test_merge_file_fills_gaps() {
        let settings = MonitorSettings {
            keypair_path: Some("/tmp/op.json".to_string()),
            ..MonitorSettings::default()
        };
        let cfg = Config {
            rpc: RpcCfg {
                url: "http://localhost:8899".to_string(),
            },
            wallet: Some(WalletCfg {
                keypair: "/tmp/other.json".to_string(),
            }),
            monitor: Some(MonitorCfg {
                poll_interval_secs: Some(15),
                recipient: Some("recipient".to_string()),
                controller_address: None,
            }),
        };
        let merged = settings.merge_file(cfg);
        // env keypair wins over file
        assert_eq!(merged.keypair_path.as_deref(), Some("/tmp/op.json"));
        assert_eq!(merged.recipient.as_deref(), Some("recipient"));
    }

    #[test]
    fn test_missing_credential_is_config_error() {
        std::env::remove_var("OPERATOR_KEYPAIR_B58");
        let err = load_operator_keypair(None).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
