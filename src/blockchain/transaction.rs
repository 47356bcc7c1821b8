//! Transfer transaction building and signature inspection.
//!
//! # Responsibilities
//! - Build the single-instruction transfer with the destination paying fees
//! - Stamp every build with a freshly fetched block hash
//! - Locate and inspect signer slots

use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use solana_system_interface::instruction as system_instruction;

use crate::blockchain::client::LedgerClient;
use crate::blockchain::types::LedgerResult;

/// Amount moved by every transfer.
pub const TRANSFER_LAMPORTS: u64 = 2 * LAMPORTS_PER_SOL;

/// Build an unsigned transfer of `lamports` from `from` to `to`.
///
/// `to` is the fee payer. The block hash is fetched here on every call and
/// never reused from an earlier operation.
pub async fn build_transfer_transaction(
    ledger: &dyn LedgerClient,
    from: &Pubkey,
    to: &Pubkey,
    lamports: u64,
) -> LedgerResult<Transaction> {
    tracing::info!(from = %from, to = %to, lamports, "Building transaction");

    let ix = system_instruction::transfer(from, to, lamports);
    let mut tx = Transaction::new_with_payer(&[ix], Some(to));

    let latest = ledger.get_latest_blockhash().await?;
    tx.message.recent_blockhash = latest.hash;

    tracing::debug!(
        blockhash = %latest.hash,
        last_valid_block_height = latest.last_valid_block_height,
        "Transaction stamped"
    );

    Ok(tx)
}

/// Index of `signer` among the transaction's required signers.
pub fn signer_slot(tx: &Transaction, signer: &Pubkey) -> Option<usize> {
    let required = tx.message.header.num_required_signatures as usize;
    tx.message
        .account_keys
        .iter()
        .take(required)
        .position(|key| key == signer)
}

/// Whether `signer` has a non-empty signature on the transaction.
pub fn has_signature_from(tx: &Transaction, signer: &Pubkey) -> bool {
    signer_slot(tx, signer)
        .and_then(|slot| tx.signatures.get(slot))
        .is_some_and(|sig| *sig != Signature::default())
}

/// Number of non-empty signatures on the transaction.
pub fn signature_count(tx: &Transaction) -> usize {
    tx.signatures
        .iter()
        .filter(|sig| **sig != Signature::default())
        .count()
}

/// The fee payer, which is always the first account key.
pub fn fee_payer(tx: &Transaction) -> Option<&Pubkey> {
    tx.message.account_keys.first()
}
