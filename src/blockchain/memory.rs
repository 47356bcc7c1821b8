//! In-process ledger used for offline runs and tests.
//!
//! Keeps balances, issued block hashes and signature statuses in memory.
//! Submitted transactions are decoded and their signatures verified, so a
//! transaction missing a signer is refused exactly like the real network
//! would refuse it.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use crate::blockchain::client::LedgerClient;
use crate::blockchain::types::{LatestBlockhash, LedgerError, LedgerResult};

/// Blocks a hash stays valid for after it is issued.
pub const BLOCKHASH_VALIDITY_BLOCKS: u64 = 150;

/// Fee charged to the fee payer per signature.
pub const LAMPORTS_PER_SIGNATURE: u64 = 5_000;

/// System program transfer instruction discriminant.
const SYSTEM_TRANSFER_TAG: u32 = 2;

/// One recorded call, in the order it reached the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    Balance(Pubkey),
    LatestBlockhash(Hash),
    Airdrop(Pubkey, u64),
    Confirm(Signature),
    SubmitRaw(Signature),
}

/// Failures to inject into the next calls of each kind.
#[derive(Debug, Clone, Default)]
pub struct FailurePlan {
    pub balance: bool,
    pub airdrop: bool,
    pub submit: bool,
    /// Confirmation fails as if the block hash expired.
    pub confirm_stale: bool,
}

#[derive(Debug, Default)]
struct LedgerState {
    block_height: u64,
    balances: HashMap<Pubkey, u64>,
    issued: HashMap<Hash, u64>,
    landed: HashSet<Signature>,
    calls: Vec<LedgerCall>,
    failures: FailurePlan,
    next_signature: u64,
}

impl LedgerState {
    fn fresh_signature(&mut self) -> Signature {
        self.next_signature += 1;
        let mut bytes = [0u8; 64];
        bytes[..8].copy_from_slice(&self.next_signature.to_le_bytes());
        bytes[63] = 0xA1;
        Signature::from(bytes)
    }

    fn debit(&mut self, account: &Pubkey, lamports: u64) -> LedgerResult<()> {
        let balance = self.balances.entry(*account).or_insert(0);
        *balance = balance.checked_sub(lamports).ok_or_else(|| {
            LedgerError::Rejected(format!("insufficient funds for {}", account))
        })?;
        Ok(())
    }

    fn credit(&mut self, account: &Pubkey, lamports: u64) {
        *self.balances.entry(*account).or_insert(0) += lamports;
    }
}

/// In-memory ledger with real signature checks and block hash expiry.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        // State stays consistent across a panicked test; keep using it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Credit an account directly, bypassing the faucet.
    pub fn fund(&self, account: &Pubkey, lamports: u64) {
        self.state().credit(account, lamports);
    }

    /// Current balance without recording a call.
    pub fn balance_of(&self, account: &Pubkey) -> u64 {
        self.state().balances.get(account).copied().unwrap_or(0)
    }

    /// Replace the failure plan.
    pub fn inject(&self, failures: FailurePlan) {
        self.state().failures = failures;
    }

    /// Advance the chain by `blocks`, expiring old block hashes.
    pub fn advance(&self, blocks: u64) {
        self.state().block_height += blocks;
    }

    /// All calls received so far.
    pub fn calls(&self) -> Vec<LedgerCall> {
        self.state().calls.clone()
    }

    /// Number of transactions accepted through `submit_raw`.
    pub fn submitted(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, LedgerCall::SubmitRaw(_)))
            .count()
    }

    fn apply(state: &mut LedgerState, tx: &Transaction) -> LedgerResult<()> {
        let message = &tx.message;
        let fee_payer = message
            .account_keys
            .first()
            .ok_or_else(|| LedgerError::InvalidTransaction("no accounts".into()))?;
        let fee = LAMPORTS_PER_SIGNATURE * tx.signatures.len() as u64;
        state.debit(fee_payer, fee)?;

        for ix in &message.instructions {
            let data = &ix.data;
            if data.len() != 12 || data[..4] != SYSTEM_TRANSFER_TAG.to_le_bytes() {
                return Err(LedgerError::InvalidTransaction(
                    "only system transfers are supported".into(),
                ));
            }
            let mut amount = [0u8; 8];
            amount.copy_from_slice(&data[4..12]);
            let lamports = u64::from_le_bytes(amount);

            let key = |pos: usize| -> LedgerResult<Pubkey> {
                ix.accounts
                    .get(pos)
                    .and_then(|idx| message.account_keys.get(*idx as usize))
                    .copied()
                    .ok_or_else(|| LedgerError::InvalidTransaction("bad account index".into()))
            };
            let from = key(0)?;
            let to = key(1)?;
            state.debit(&from, lamports)?;
            state.credit(&to, lamports);
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn get_balance(&self, account: &Pubkey) -> LedgerResult<u64> {
        let mut state = self.state();
        state.calls.push(LedgerCall::Balance(*account));
        if state.failures.balance {
            return Err(LedgerError::Rpc("balance query failed".into()));
        }
        Ok(state.balances.get(account).copied().unwrap_or(0))
    }

    async fn get_latest_blockhash(&self) -> LedgerResult<LatestBlockhash> {
        let mut state = self.state();
        state.block_height += 1;
        let height = state.block_height;

        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&height.to_le_bytes());
        bytes[31] = 0xB1;
        let hash = Hash::new_from_array(bytes);

        let last_valid_block_height = height + BLOCKHASH_VALIDITY_BLOCKS;
        state.issued.insert(hash, last_valid_block_height);
        state.calls.push(LedgerCall::LatestBlockhash(hash));

        Ok(LatestBlockhash {
            hash,
            last_valid_block_height,
        })
    }

    async fn request_airdrop(&self, account: &Pubkey, lamports: u64) -> LedgerResult<Signature> {
        let mut state = self.state();
        state.calls.push(LedgerCall::Airdrop(*account, lamports));
        if state.failures.airdrop {
            return Err(LedgerError::Airdrop("faucet has run dry".into()));
        }
        state.credit(account, lamports);
        let signature = state.fresh_signature();
        state.landed.insert(signature);
        Ok(signature)
    }

    async fn confirm(&self, signature: &Signature) -> LedgerResult<()> {
        let mut state = self.state();
        state.calls.push(LedgerCall::Confirm(*signature));
        if state.failures.confirm_stale {
            return Err(LedgerError::Stale {
                last_valid_block_height: state.block_height,
            });
        }
        if !state.landed.contains(signature) {
            return Err(LedgerError::Rejected(format!("unknown signature {}", signature)));
        }
        state.block_height += 1;
        Ok(())
    }

    async fn submit_raw(&self, bytes: &[u8]) -> LedgerResult<Signature> {
        let tx: Transaction = bincode::deserialize(bytes)
            .map_err(|e| LedgerError::InvalidTransaction(e.to_string()))?;
        let signature = tx.signatures.first().copied().unwrap_or_default();

        let mut state = self.state();
        state.calls.push(LedgerCall::SubmitRaw(signature));
        if state.failures.submit {
            return Err(LedgerError::Rpc("node is behind".into()));
        }

        match state.issued.get(&tx.message.recent_blockhash) {
            Some(&last_valid) if last_valid >= state.block_height => {}
            Some(&last_valid) => {
                return Err(LedgerError::Stale {
                    last_valid_block_height: last_valid,
                })
            }
            None => return Err(LedgerError::BlockhashNotFound),
        }

        tx.verify()
            .map_err(|e| LedgerError::Rejected(e.to_string()))?;
        if !tx.is_signed() {
            return Err(LedgerError::Rejected("missing signatures".into()));
        }

        Self::apply(&mut state, &tx)?;
        state.landed.insert(signature);
        Ok(signature)
    }

    fn endpoint(&self) -> &str {
        "memory://ledger"
    }
}
