//! Domain events emitted by the controller

use solana_sdk::pubkey::Pubkey;

use super::config::MiningConfig;
use crate::shared::types::Amount;

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    ConfigUpdated {
        config: MiningConfig,
    },
    MintCompleted {
        recipient: Pubkey,
        amount: u64,
        cost: Amount,
        epoch: u64,
    },
    FundsWithdrawn {
        to: Pubkey,
        amount: Amount,
    },
    AssetWithdrawn {
        asset: Pubkey,
        to: Pubkey,
        amount: u64,
    },
    EmergencyStopped {
        initiator: Pubkey,
    },
    ManagerGranted {
        who: Pubkey,
    },
    ManagerRevoked {
        who: Pubkey,
    },
}

/// Receipt returned by every mutating controller call
#[derive(Debug, Clone, Default)]
pub struct CallReceipt {
    pub events: Vec<ControllerEvent>,
}

impl CallReceipt {
    pub fn single(event: ControllerEvent) -> Self {
        Self {
            events: vec![event],
        }
    }

    /// The mint-completed event in this receipt, if any
    pub fn mint_completed(&self) -> Option<(Pubkey, u64, Amount, u64)> {
        self.events.iter().find_map(|event| match event {
            ControllerEvent::MintCompleted {
                recipient,
                amount,
                cost,
                epoch,
            } => Some((*recipient, *amount, *cost, *epoch)),
            _ => None,
        })
    }
}
