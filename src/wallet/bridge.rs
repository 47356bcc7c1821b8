//! Bridge between the flow and an injected wallet provider.

use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::Transaction;

use crate::blockchain::transaction::{fee_payer, has_signature_from, signature_count};
use crate::error::{FlowError, FlowResult};
use crate::wallet::events::Subscription;
use crate::wallet::provider::{ConnectOpts, WalletProvider};

/// Outcome of provider detection. Absence is a normal state.
#[derive(Clone)]
pub enum ProviderState {
    Absent,
    Present(Arc<dyn WalletProvider>),
}

impl std::fmt::Debug for ProviderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderState::Absent => write!(f, "Absent"),
            ProviderState::Present(p) => f
                .debug_struct("Present")
                .field("connected", &p.is_connected())
                .finish(),
        }
    }
}

/// Detects a provider and forwards connect and sign requests to it.
#[derive(Debug, Clone)]
pub struct WalletBridge {
    state: ProviderState,
    install_url: String,
}

impl WalletBridge {
    /// Detect a provider among the injected candidate.
    ///
    /// A candidate that does not speak the expected contract counts as absent.
    pub fn detect(candidate: Option<Arc<dyn WalletProvider>>, install_url: impl Into<String>) -> Self {
        let state = match candidate {
            Some(provider) if provider.is_phantom() => ProviderState::Present(provider),
            Some(_) => {
                tracing::warn!("Injected provider is not compatible, ignoring it");
                ProviderState::Absent
            }
            None => ProviderState::Absent,
        };
        tracing::info!(present = matches!(state, ProviderState::Present(_)), "Wallet provider detection");

        Self {
            state,
            install_url: install_url.into(),
        }
    }

    pub fn state(&self) -> &ProviderState {
        &self.state
    }

    pub fn is_present(&self) -> bool {
        matches!(self.state, ProviderState::Present(_))
    }

    /// Where to send the user when no provider is installed.
    pub fn install_url(&self) -> &str {
        &self.install_url
    }

    fn provider(&self) -> FlowResult<&Arc<dyn WalletProvider>> {
        match &self.state {
            ProviderState::Present(provider) => Ok(provider),
            ProviderState::Absent => Err(FlowError::NoProvider),
        }
    }

    /// Ask the user to approve a connection.
    pub async fn connect(&self) -> FlowResult<Pubkey> {
        let provider = self.provider()?;
        let public_key = provider.connect(ConnectOpts::default()).await?;
        tracing::info!(wallet = %public_key, "Wallet connected");
        Ok(public_key)
    }

    /// Ask the user to sign `tx` as fee payer.
    ///
    /// The returned transaction carries exactly one signature, the fee payer's.
    pub async fn sign_transaction(&self, tx: Transaction) -> FlowResult<Transaction> {
        let provider = self.provider()?;
        let payer = fee_payer(&tx)
            .copied()
            .ok_or_else(|| FlowError::Signing("transaction has no fee payer".into()))?;

        let signed = provider.sign_transaction(tx).await?;

        let found = signature_count(&signed);
        if found != 1 {
            return Err(FlowError::UnexpectedSignatures { expected: 1, found });
        }
        if !has_signature_from(&signed, &payer) {
            return Err(FlowError::MissingSignature(payer));
        }
        Ok(signed)
    }

    /// Subscribe to provider events, if a provider is present.
    pub fn subscribe(&self) -> Option<Subscription> {
        match &self.state {
            ProviderState::Present(provider) => Some(provider.subscribe()),
            ProviderState::Absent => None,
        }
    }
}
