//! RPC-backed rig adapter for live mode

use async_trait::async_trait;
use solana_client::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::Transaction;
use tracing::info;

use crate::domain::rig::Rig;
use crate::shared::errors::RigError;
use crate::shared::types::Amount;

// Rig state account layout: 8-byte discriminator, then spot price and
// epoch as little-endian u64s. Quotes are linear in the spot price within
// an epoch.
const SPOT_PRICE_OFFSET: usize = 8;
const EPOCH_OFFSET: usize = 16;

/// Instruction tag of the rig's payable mint entrypoint
const MINT_IX_TAG: u8 = 2;

fn read_u64(data: &[u8], offset: usize) -> Result<u64, RigError> {
    let end = offset + 8;
    let bytes: [u8; 8] = data
        .get(offset..end)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| {
            RigError::InvalidState(format!("rig state shorter than {} bytes", end))
        })?;
    Ok(u64::from_le_bytes(bytes))
}

/// Live rig boundary over JSON-RPC. Confirmation waits are bounded by the
/// RPC client's own timeout; no additional deadline is imposed here.
pub struct RpcRig {
    client: RpcClient,
    program_id: Pubkey,
    state_address: Pubkey,
    payer: Keypair,
}

impl RpcRig {
    pub fn new(
        rpc_url: String,
        program_id: Pubkey,
        state_address: Pubkey,
        payer: Keypair,
    ) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed()),
            program_id,
            state_address,
            payer,
        }
    }

    fn fetch_state(&self) -> Result<(u64, u64), RigError> {
        let data = self
            .client
            .get_account_data(&self.state_address)
            .map_err(|e| RigError::Transport(format!("Failed to fetch rig state: {}", e)))?;
        let price = read_u64(&data, SPOT_PRICE_OFFSET)?;
        let epoch = read_u64(&data, EPOCH_OFFSET)?;
        Ok((price, epoch))
    }

    fn mint_instruction(&self, recipient: Pubkey, amount: u64, payment: Amount) -> Instruction {
        let mut data = Vec::with_capacity(17);
        data.push(MINT_IX_TAG);
        data.extend_from_slice(&amount.to_le_bytes());
        data.extend_from_slice(&payment.lamports.to_le_bytes());
        Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new(self.state_address, false),
                AccountMeta::new(self.payer.pubkey(), true),
                AccountMeta::new(recipient, false),
            ],
            data,
        }
    }
}

#[async_trait]
impl Rig for RpcRig {
    async fn spot_price(&self) -> Result<Amount, RigError> {
        let (price, _) = self.fetch_state()?;
        Ok(Amount::new(price))
    }

    async fn quote(&self, amount: u64) -> Result<Amount, RigError> {
        let (price, _) = self.fetch_state()?;
        let cost = price.checked_mul(amount).ok_or_else(|| {
            RigError::InvalidState(format!("quote overflow for {} units", amount))
        })?;
        Ok(Amount::new(cost))
    }

    async fn current_epoch(&self) -> Result<u64, RigError> {
        let (_, epoch) = self.fetch_state()?;
        Ok(epoch)
    }

    async fn mint(
        &self,
        recipient: Pubkey,
        amount: u64,
        payment: Amount,
    ) -> Result<(), RigError> {
        let instruction = self.mint_instruction(recipient, amount, payment);

        let blockhash = self
            .client
            .get_latest_blockhash()
            .map_err(|e| RigError::Transport(format!("Failed to get blockhash: {}", e)))?;
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&self.payer.pubkey()),
            &[&self.payer],
            blockhash,
        );

        let signature = self
            .client
            .send_and_confirm_transaction(&transaction)
            .map_err(|e| RigError::MintRejected(format!("Mint transaction failed: {}", e)))?;
        info!("✅ Mint transaction confirmed: {}", signature);
        Ok(())
    }
}
