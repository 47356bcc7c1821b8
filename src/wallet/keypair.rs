//! Wallet provider backed by a local keypair.
//!
//! # Security
//! - The secret key never leaves this type and is never logged
//! - Every connect and signature request passes through an [`Approver`]

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;

use crate::blockchain::transaction::fee_payer;
use crate::wallet::events::{EventHub, Subscription, WalletEvent};
use crate::wallet::provider::{
    ConnectOpts, DisplayEncoding, WalletError, WalletProvider, WalletResult,
};

/// What the user is being asked to approve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalRequest {
    Connect { public_key: Pubkey },
    SignTransactions { count: usize, fee_payer: Option<Pubkey> },
    SignMessage { preview: String },
}

impl std::fmt::Display for ApprovalRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalRequest::Connect { public_key } => {
                write!(f, "Connect wallet {}?", public_key)
            }
            ApprovalRequest::SignTransactions { count, fee_payer } => {
                write!(f, "Sign {} transaction(s)", count)?;
                if let Some(payer) = fee_payer {
                    write!(f, ", fees paid by {}", payer)?;
                }
                write!(f, "?")
            }
            ApprovalRequest::SignMessage { preview } => write!(f, "Sign message \"{}\"?", preview),
        }
    }
}

/// Decides on approval prompts. May suspend until a human answers.
#[async_trait]
pub trait Approver: Send + Sync {
    async fn approve(&self, request: &ApprovalRequest) -> bool;
}

/// Approver that always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct AutoApprover {
    approve: bool,
}

impl AutoApprover {
    pub fn always() -> Self {
        Self { approve: true }
    }

    pub fn never() -> Self {
        Self { approve: false }
    }
}

#[async_trait]
impl Approver for AutoApprover {
    async fn approve(&self, request: &ApprovalRequest) -> bool {
        tracing::debug!(request = %request, approved = self.approve, "Auto approval");
        self.approve
    }
}

/// Local keypair exposed through the provider contract.
pub struct KeypairWallet {
    keypair: Mutex<Keypair>,
    approver: Arc<dyn Approver>,
    connected: AtomicBool,
    /// Accounts the user has approved a connection for.
    trusted: Mutex<HashSet<Pubkey>>,
    events: EventHub,
}

impl KeypairWallet {
    /// Wrap an existing keypair.
    pub fn new(keypair: Keypair, approver: Arc<dyn Approver>) -> Self {
        tracing::info!(public_key = %keypair.pubkey(), "Keypair wallet loaded");
        Self {
            keypair: Mutex::new(keypair),
            approver,
            connected: AtomicBool::new(false),
            trusted: Mutex::new(HashSet::new()),
            events: EventHub::new(),
        }
    }

    /// Load the keypair from a JSON keypair file (the Solana CLI format).
    pub fn from_file(path: &Path, approver: Arc<dyn Approver>) -> WalletResult<Self> {
        let keypair = read_keypair_file(path).map_err(|e| {
            WalletError::Provider(format!("Cannot read keypair {}: {}", path.display(), e))
        })?;
        Ok(Self::new(keypair, approver))
    }

    fn keypair(&self) -> MutexGuard<'_, Keypair> {
        self.keypair
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Public key of the held keypair, connected or not.
    pub fn address(&self) -> Pubkey {
        self.keypair().pubkey()
    }

    fn is_trusted(&self, key: &Pubkey) -> bool {
        self.trusted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(key)
    }

    fn trust(&self, key: Pubkey) {
        self.trusted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key);
    }

    /// Switch to another account.
    ///
    /// A connected wallet stays connected and announces the new key only if
    /// that account was approved before. Otherwise the connection drops and
    /// the event carries no key.
    pub fn change_account(&self, keypair: Keypair) {
        let key = keypair.pubkey();
        *self.keypair() = keypair;

        let event_key = if self.is_connected() && self.is_trusted(&key) {
            Some(key)
        } else {
            self.connected.store(false, Ordering::SeqCst);
            None
        };
        tracing::info!(public_key = %key, announced = event_key.is_some(), "Wallet account changed");
        self.events.emit(WalletEvent::AccountChanged(event_key));
    }

    fn require_connected(&self) -> WalletResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(WalletError::NotConnected)
        }
    }

    fn sign_in_place(&self, tx: &mut Transaction) -> WalletResult<()> {
        let keypair = self.keypair();
        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&[&*keypair], blockhash)
            .map_err(|e| WalletError::Provider(format!("Signing failed: {}", e)))
    }
}

#[async_trait]
impl WalletProvider for KeypairWallet {
    fn is_phantom(&self) -> bool {
        true
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.is_connected().then(|| self.address())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self, opts: ConnectOpts) -> WalletResult<Pubkey> {
        let public_key = self.address();

        if !self.is_trusted(&public_key) {
            if opts.only_if_trusted {
                return Err(WalletError::Rejected);
            }
            let request = ApprovalRequest::Connect { public_key };
            if !self.approver.approve(&request).await {
                tracing::info!("Connect request rejected");
                return Err(WalletError::Rejected);
            }
            self.trust(public_key);
        }

        self.connected.store(true, Ordering::SeqCst);
        self.events.emit(WalletEvent::Connect(public_key));
        Ok(public_key)
    }

    async fn disconnect(&self) -> WalletResult<()> {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.events.emit(WalletEvent::Disconnect);
        }
        Ok(())
    }

    async fn sign_transaction(&self, tx: Transaction) -> WalletResult<Transaction> {
        let mut signed = self.sign_all_transactions(vec![tx]).await?;
        signed
            .pop()
            .ok_or_else(|| WalletError::Provider("no transaction signed".into()))
    }

    async fn sign_all_transactions(
        &self,
        mut txs: Vec<Transaction>,
    ) -> WalletResult<Vec<Transaction>> {
        self.require_connected()?;

        let request = ApprovalRequest::SignTransactions {
            count: txs.len(),
            fee_payer: txs.first().and_then(fee_payer).copied(),
        };
        if !self.approver.approve(&request).await {
            tracing::info!("Sign request rejected");
            return Err(WalletError::Rejected);
        }

        for tx in &mut txs {
            self.sign_in_place(tx)?;
        }
        Ok(txs)
    }

    async fn sign_message(
        &self,
        message: &[u8],
        display: DisplayEncoding,
    ) -> WalletResult<Signature> {
        self.require_connected()?;

        let preview = match display {
            DisplayEncoding::Utf8 => String::from_utf8_lossy(message).into_owned(),
            DisplayEncoding::Hex => hex::encode(message),
        };
        if !self
            .approver
            .approve(&ApprovalRequest::SignMessage { preview })
            .await
        {
            return Err(WalletError::Rejected);
        }

        Ok(self.keypair().sign_message(message))
    }

    fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }
}

impl std::fmt::Debug for KeypairWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeypairWallet")
            .field("public_key", &self.address())
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use solana_sdk::hash::Hash;
    use solana_system_interface::instruction as system_instruction;
    use std::io::Write;

    fn approving() -> KeypairWallet {
        KeypairWallet::new(Keypair::new(), Arc::new(AutoApprover::always()))
    }

    fn transfer_paid_by(payer: &Pubkey) -> Transaction {
        let ix = system_instruction::transfer(&Pubkey::new_unique(), payer, 10);
        let mut tx = Transaction::new_with_payer(&[ix], Some(payer));
        tx.message.recent_blockhash = Hash::new_from_array([7; 32]);
        tx
    }

    #[tokio::test]
    async fn test_connect_exposes_public_key() {
        let wallet = approving();
        assert_eq!(wallet.public_key(), None);

        let key = wallet.connect(ConnectOpts::default()).await.unwrap();
        assert_eq!(wallet.public_key(), Some(key));
        assert!(wallet.is_connected());
    }

    #[tokio::test]
    async fn test_rejected_connect() {
        let wallet = KeypairWallet::new(Keypair::new(), Arc::new(AutoApprover::never()));
        let err = wallet.connect(ConnectOpts::default()).await.unwrap_err();
        assert!(matches!(err, WalletError::Rejected));
        assert!(!wallet.is_connected());
    }

    #[tokio::test]
    async fn test_only_if_trusted() {
        let wallet = approving();
        let silent = ConnectOpts {
            only_if_trusted: true,
        };
        assert!(wallet.connect(silent).await.is_err());

        wallet.connect(ConnectOpts::default()).await.unwrap();
        wallet.disconnect().await.unwrap();
        assert!(wallet.connect(silent).await.is_ok());
    }

    #[tokio::test]
    async fn test_sign_requires_connection() {
        let wallet = approving();
        let tx = transfer_paid_by(&wallet.address());
        let err = wallet.sign_transaction(tx).await.unwrap_err();
        assert!(matches!(err, WalletError::NotConnected));
    }

    #[tokio::test]
    async fn test_sign_adds_only_the_wallet_signature() {
        let wallet = approving();
        wallet.connect(ConnectOpts::default()).await.unwrap();

        let tx = transfer_paid_by(&wallet.address());
        let signed = wallet.sign_transaction(tx).await.unwrap();

        assert_ne!(signed.signatures[0], Signature::default());
        assert_eq!(signed.signatures[1], Signature::default());
    }

    #[tokio::test]
    async fn test_sign_message_verifies() {
        let wallet = approving();
        wallet.connect(ConnectOpts::default()).await.unwrap();

        let sig = wallet
            .sign_message(b"hello", DisplayEncoding::Utf8)
            .await
            .unwrap();
        assert!(sig.verify(wallet.address().as_ref(), b"hello"));
    }

    #[tokio::test]
    async fn test_events() {
        let wallet = approving();
        let mut events = wallet.subscribe();

        let key = wallet.connect(ConnectOpts::default()).await.unwrap();
        wallet.change_account(Keypair::new());

        assert_eq!(events.recv().await, Some(WalletEvent::Connect(key)));
        assert_eq!(events.recv().await, Some(WalletEvent::AccountChanged(None)));
        assert!(!wallet.is_connected());
    }

    #[tokio::test]
    async fn test_account_change_while_disconnected_hides_key() {
        let wallet = approving();
        let mut events = wallet.subscribe();

        wallet.change_account(Keypair::new());

        assert_eq!(events.recv().await, Some(WalletEvent::AccountChanged(None)));
        assert!(!wallet.is_connected());
        assert_eq!(wallet.public_key(), None);
    }

    #[tokio::test]
    async fn test_switch_to_trusted_account_keeps_connection() {
        let first = Keypair::new();
        let first_key = first.pubkey();
        let first_copy = first.insecure_clone();
        let wallet = KeypairWallet::new(first, Arc::new(AutoApprover::always()));
        wallet.connect(ConnectOpts::default()).await.unwrap();

        // Approve a second account, then switch back to the first one.
        wallet.change_account(Keypair::new());
        wallet.connect(ConnectOpts::default()).await.unwrap();
        let mut events = wallet.subscribe();
        wallet.change_account(first_copy);

        assert_eq!(
            events.recv().await,
            Some(WalletEvent::AccountChanged(Some(first_key)))
        );
        assert!(wallet.is_connected());
        assert_eq!(wallet.public_key(), Some(first_key));
    }

    #[tokio::test]
    async fn test_request_dispatch() {
        let wallet = approving();

        let response = wallet.request("connect", json!(null)).await.unwrap();
        assert_eq!(response["publicKey"], wallet.address().to_string());

        let response = wallet
            .request("signMessage", json!({ "message": "68656c6c6f", "display": "hex" }))
            .await
            .unwrap();
        let sig: Signature = response["signature"].as_str().unwrap().parse().unwrap();
        assert!(sig.verify(wallet.address().as_ref(), b"hello"));

        wallet.request("disconnect", json!(null)).await.unwrap();
        assert!(!wallet.is_connected());

        assert!(matches!(
            wallet.request("signIn", json!(null)).await,
            Err(WalletError::UnsupportedMethod(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let keypair = Keypair::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{:?}", keypair.to_bytes().to_vec()).unwrap();

        let wallet = KeypairWallet::from_file(file.path(), Arc::new(AutoApprover::always())).unwrap();
        assert_eq!(wallet.address(), keypair.pubkey());
    }

    #[test]
    fn test_missing_file() {
        let result = KeypairWallet::from_file(
            Path::new("/nonexistent/id.json"),
            Arc::new(AutoApprover::always()),
        );
        assert!(matches!(result, Err(WalletError::Provider(_))));
    }
}
