//! Final signing, submission and confirmation of a wallet-signed transfer.

use solana_sdk::signature::{Signature, Signer};
use solana_sdk::transaction::Transaction;

use crate::blockchain::transaction::{fee_payer, has_signature_from};
use crate::blockchain::LedgerError;
use crate::error::{FlowError, FlowResult};
use crate::services::session::Session;

/// Add the sender signature to `tx`, submit it and wait for confirmation.
///
/// `tx` must already carry the fee payer's signature. Nothing is submitted
/// unless every required signature is present and valid.
pub async fn settle(session: &Session, mut tx: Transaction) -> FlowResult<Signature> {
    let sender = session.sender()?;

    let payer = fee_payer(&tx)
        .copied()
        .ok_or_else(|| FlowError::Signing("transaction has no fee payer".into()))?;
    if !has_signature_from(&tx, &payer) {
        return Err(FlowError::MissingSignature(payer));
    }

    tracing::info!(sender = %sender.pubkey(), "Processing transaction");
    let blockhash = tx.message.recent_blockhash;
    tx.try_partial_sign(&[sender], blockhash)
        .map_err(|e| FlowError::Signing(e.to_string()))?;

    if !has_signature_from(&tx, &sender.pubkey()) {
        return Err(FlowError::MissingSignature(sender.pubkey()));
    }
    tx.verify()
        .map_err(|e| FlowError::Signing(format!("signature verification failed: {}", e)))?;

    let bytes =
        bincode::serialize(&tx).map_err(|e| LedgerError::InvalidTransaction(e.to_string()))?;
    let signature = session.ledger().submit_raw(&bytes).await?;
    tracing::info!(signature = %signature, "Transaction submitted");

    session.ledger().confirm(&signature).await?;
    tracing::info!(signature = %signature, "Transfer confirmed");

    Ok(signature)
}
