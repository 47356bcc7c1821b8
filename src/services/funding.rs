//! Ephemeral sender creation and faucet funding.

use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::signature::{Keypair, Signature};

use crate::blockchain::types::lamports_to_sol;
use crate::error::FlowResult;
use crate::services::session::Session;

/// Amount requested from the faucet for each new sender.
pub const AIRDROP_LAMPORTS: u64 = 2 * LAMPORTS_PER_SOL;

/// Generate a new sender, airdrop [`AIRDROP_LAMPORTS`] to it and wait for confirmation.
///
/// Any previous sender is discarded first, even when the airdrop then fails.
pub async fn create_funded_account(session: &mut Session) -> FlowResult<Signature> {
    let sender = session.replace_sender(Keypair::new());

    tracing::info!(
        sender = %sender,
        sol = lamports_to_sol(AIRDROP_LAMPORTS),
        "Airdropping to sender account"
    );
    let signature = session
        .ledger()
        .request_airdrop(&sender, AIRDROP_LAMPORTS)
        .await?;

    session.ledger().confirm(&signature).await?;
    tracing::info!(sender = %sender, signature = %signature, "Airdrop confirmed");

    Ok(signature)
}

/// Balance of the current sender; 0 when there is none or the query fails.
pub async fn sender_balance(session: &Session) -> u64 {
    let Some(sender) = session.sender_pubkey() else {
        return 0;
    };

    match session.ledger().get_balance(&sender).await {
        Ok(lamports) => {
            tracing::info!(sender = %sender, sol = lamports_to_sol(lamports), "Sender balance");
            lamports
        }
        Err(e) => {
            tracing::warn!(sender = %sender, error = %e, "Balance query failed, showing 0");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::memory::{FailurePlan, InMemoryLedger, LedgerCall};
    use crate::error::ErrorKind;
    use std::sync::Arc;

    fn session() -> (Arc<InMemoryLedger>, Session) {
        let ledger = Arc::new(InMemoryLedger::new());
        (ledger.clone(), Session::new(ledger))
    }

    #[tokio::test]
    async fn test_funding_confirms_airdrop() {
        let (ledger, mut session) = session();

        let signature = create_funded_account(&mut session).await.unwrap();
        let sender = session.sender_pubkey().unwrap();

        assert_eq!(
            ledger.calls(),
            vec![
                LedgerCall::Airdrop(sender, AIRDROP_LAMPORTS),
                LedgerCall::Confirm(signature),
            ]
        );
        assert_eq!(sender_balance(&session).await, AIRDROP_LAMPORTS);
    }

    #[tokio::test]
    async fn test_balance_without_sender_is_zero() {
        let (ledger, session) = session();
        assert_eq!(sender_balance(&session).await, 0);
        assert!(ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_balance_failure_is_zero() {
        let (ledger, mut session) = session();
        create_funded_account(&mut session).await.unwrap();

        ledger.inject(FailurePlan {
            balance: true,
            ..Default::default()
        });
        assert_eq!(sender_balance(&session).await, 0);
    }

    #[tokio::test]
    async fn test_balance_reads_are_idempotent() {
        let (_, mut session) = session();
        create_funded_account(&mut session).await.unwrap();

        let first = sender_balance(&session).await;
        let second = sender_balance(&session).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_each_call_replaces_sender() {
        let (_, mut session) = session();
        create_funded_account(&mut session).await.unwrap();
        let first = session.sender_pubkey();
        create_funded_account(&mut session).await.unwrap();
        assert_ne!(first, session.sender_pubkey());
    }

    #[tokio::test]
    async fn test_stale_confirmation() {
        let (ledger, mut session) = session();
        ledger.inject(FailurePlan {
            confirm_stale: true,
            ..Default::default()
        });

        let err = create_funded_account(&mut session).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Stale);
    }
}
