//! Error handling for the application

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// A mint precondition that did not hold.
///
/// These are expected steady-state outcomes, not exceptional conditions: the
/// monitor treats each as "not yet" and waits for the next tick. Every
/// violation aborts the whole call with no partial effect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardViolation {
    #[error("auto-mining is disabled")]
    MiningDisabled,

    #[error("mint amount {amount} outside [{min}, {max}]")]
    AmountOutOfRange { amount: u64, min: u64, max: u64 },

    #[error("cooldown active: {remaining_secs}s remaining")]
    CooldownActive { remaining_secs: i64 },

    #[error("gas price {gas_price} exceeds ceiling {max_gas_price}")]
    GasPriceTooHigh { gas_price: u64, max_gas_price: u64 },

    #[error("quoted cost {cost} lamports exceeds balance {balance}")]
    InsufficientBalance { cost: u64, balance: u64 },

    #[error("implied unit price {unit_price} exceeds ceiling {max_price}")]
    PriceAboveCeiling { unit_price: u64, max_price: u64 },
}

/// Controller-level errors
#[derive(Error, Debug, Clone)]
pub enum ControllerError {
    #[error("caller {caller} lacks {role} capability")]
    Unauthorized { caller: Pubkey, role: Role },

    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("guard failure: {0}")]
    Guard(#[from] GuardViolation),

    #[error("invalid withdrawal: {0}")]
    Withdrawal(String),

    #[error("rig error: {0}")]
    Rig(#[from] RigError),
}

/// Authorization roles recognized by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Manager,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Manager => write!(f, "manager"),
        }
    }
}

/// Rig boundary errors
#[derive(Error, Debug, Clone)]
pub enum RigError {
    #[error("rig transport error: {0}")]
    Transport(String),

    #[error("rig rejected mint: {0}")]
    MintRejected(String),

    #[error("invalid rig state data: {0}")]
    InvalidState(String),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("controller error: {0}")]
    Controller(String),

    #[error("rig error: {0}")]
    Rig(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl From<ControllerError> for AppError {
    fn from(err: ControllerError) -> Self {
        AppError::Controller(err.to_string())
    }
}

impl From<RigError> for AppError {
    fn from(err: RigError) -> Self {
        AppError::Rig(err.to_string())
    }
}
