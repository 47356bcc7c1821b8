//! Per-run context shared by the services.

use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};

use crate::blockchain::LedgerClient;
use crate::error::{FlowError, FlowResult};

/// Ledger handle plus the ephemeral sender account, held in memory only.
pub struct Session {
    ledger: Arc<dyn LedgerClient>,
    sender: Option<Keypair>,
}

impl Session {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            ledger,
            sender: None,
        }
    }

    pub fn ledger(&self) -> &dyn LedgerClient {
        self.ledger.as_ref()
    }

    /// The current sender keypair.
    pub fn sender(&self) -> FlowResult<&Keypair> {
        self.sender.as_ref().ok_or(FlowError::NoSender)
    }

    pub fn sender_pubkey(&self) -> Option<Pubkey> {
        self.sender.as_ref().map(|k| k.pubkey())
    }

    /// Install a new sender, discarding the previous one.
    pub(crate) fn replace_sender(&mut self, sender: Keypair) -> Pubkey {
        let key = sender.pubkey();
        if let Some(previous) = self.sender.replace(sender) {
            tracing::debug!(previous = %previous.pubkey(), "Discarding previous sender account");
        }
        key
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.ledger.endpoint())
            .field("sender", &self.sender_pubkey())
            .finish()
    }
}
