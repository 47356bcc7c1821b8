//! Flow controller sequencing funding, wallet connection and transfer.
//!
//! Every action takes `&mut self`, so only one can be in flight at a time.
//! The loading flag is raised when an action starts and dropped on the next
//! observation of balance, provider or connection state.

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;

use crate::blockchain::transaction::{build_transfer_transaction, TRANSFER_LAMPORTS};
use crate::error::{ErrorKind, FlowError, FlowResult};
use crate::flow::state::{Action, Stage, View};
use crate::services::{self, Session};
use crate::wallet::{Subscription, WalletBridge, WalletError, WalletEvent};

/// Status lines shown under the action button.
pub mod status {
    pub const START: &str = "Create sender account to start";
    pub const GENERATING: &str = "Generating sender account";
    pub const AIRDROPPED: &str = "Sender account airdropped 2 $SOL";
    pub const FUNDING_FAILED: &str = "Error Occurred";
    pub const APPROVE_CONNECT: &str = "Please approve to connect your wallet";
    pub const CONNECTED: &str = "Wallet connected, ready for transfer";
    pub const CONNECT_FAILED: &str = "Error Occurred / User rejected the connect request";
    pub const WALLET_DISCONNECTED: &str = "Wallet disconnected";
    pub const APPROVE_TRANSFER: &str = "Please approve to transfer $SOL to your wallet";
    pub const TRANSFERRED: &str = "Transfer successful, sender account has no balance";
    pub const TRANSFER_FAILED: &str = "Error Occurred / User rejected the transfer request";
}

/// Drives the four-stage flow and owns the session.
#[derive(Debug)]
pub struct FlowController {
    session: Session,
    bridge: WalletBridge,
    loading: bool,
    status: String,
    balance: Option<u64>,
    wallet_key: Option<Pubkey>,
    spent: bool,
    last_error: Option<ErrorKind>,
}

impl FlowController {
    pub fn new(session: Session, bridge: WalletBridge) -> Self {
        let mut controller = Self {
            session,
            bridge,
            loading: false,
            status: status::START.to_string(),
            balance: None,
            wallet_key: None,
            spent: false,
            last_error: None,
        };
        controller.observe();
        controller
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Last observed sender balance in lamports.
    pub fn balance(&self) -> Option<u64> {
        self.balance
    }

    /// Connected wallet key, the transfer destination.
    pub fn wallet_key(&self) -> Option<Pubkey> {
        self.wallet_key
    }

    /// Category of the most recent failure, cleared when an action starts.
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn bridge(&self) -> &WalletBridge {
        &self.bridge
    }

    /// Subscribe to events of the detected provider.
    pub fn subscribe(&self) -> Option<Subscription> {
        self.bridge.subscribe()
    }

    pub fn stage(&self) -> Stage {
        Stage::derive(
            self.balance,
            self.spent,
            self.bridge.is_present(),
            self.wallet_key.is_some(),
        )
    }

    pub fn view(&self) -> View {
        View::render(self.loading, self.stage(), self.bridge.install_url())
    }

    /// Press the one enabled button. Does nothing while loading or when no
    /// action is offered.
    pub async fn click(&mut self) -> Option<Action> {
        let action = self.view().action()?;
        match action {
            Action::CreateAccount => self.init_sender().await,
            Action::ConnectWallet => self.connect_wallet().await,
            Action::Transfer => self.transfer_sol().await,
        }
        Some(action)
    }

    /// Create a new sender account and airdrop to it.
    pub async fn init_sender(&mut self) {
        self.begin(status::GENERATING);

        match services::create_funded_account(&mut self.session).await {
            Ok(_) => {
                self.spent = false;
                self.status = status::AIRDROPPED.to_string();
            }
            Err(e) => self.fail(status::FUNDING_FAILED, e),
        }

        let balance = services::sender_balance(&self.session).await;
        self.set_balance(balance);
    }

    /// Ask the provider to connect.
    pub async fn connect_wallet(&mut self) {
        if !self.bridge.is_present() {
            return;
        }
        self.begin(status::APPROVE_CONNECT);

        match self.bridge.connect().await {
            Ok(key) => {
                self.status = status::CONNECTED.to_string();
                self.set_wallet_key(Some(key));
            }
            Err(e) => {
                self.fail(status::CONNECT_FAILED, e);
                self.loading = false;
            }
        }
    }

    /// Build, wallet-sign, settle, then re-read the sender balance.
    pub async fn transfer_sol(&mut self) {
        self.begin(status::APPROVE_TRANSFER);

        match self.run_transfer().await {
            Ok(()) => {
                self.spent = true;
                self.status = status::TRANSFERRED.to_string();
                let balance = services::sender_balance(&self.session).await;
                self.set_balance(balance);
            }
            Err(e) => {
                self.fail(status::TRANSFER_FAILED, e);
                self.loading = false;
            }
        }
    }

    async fn run_transfer(&mut self) -> FlowResult<()> {
        let destination = self
            .wallet_key
            .ok_or(WalletError::NotConnected)?;
        let sender = self.session.sender()?.pubkey();

        let tx = build_transfer_transaction(
            self.session.ledger(),
            &sender,
            &destination,
            TRANSFER_LAMPORTS,
        )
        .await?;
        let signed = self.bridge.sign_transaction(tx).await?;
        services::settle(&self.session, signed).await?;
        Ok(())
    }

    /// React to a provider event.
    ///
    /// An account switch only retargets an existing connection; it never
    /// connects on its own.
    pub fn handle_wallet_event(&mut self, event: WalletEvent) {
        match event {
            WalletEvent::Connect(key) => self.set_wallet_key(Some(key)),
            WalletEvent::AccountChanged(Some(key)) => {
                if self.wallet_key.is_none() {
                    tracing::debug!(wallet = %key, "Account switch without a connection, ignored");
                    return;
                }
                tracing::info!(wallet = %key, "Wallet account switched");
                self.set_wallet_key(Some(key));
            }
            WalletEvent::AccountChanged(None) | WalletEvent::Disconnect => {
                if self.wallet_key.is_some() {
                    self.status = status::WALLET_DISCONNECTED.to_string();
                }
                self.set_wallet_key(None);
            }
        }
    }

    fn begin(&mut self, status: &str) {
        self.status = status.to_string();
        self.loading = true;
        self.last_error = None;
    }

    fn fail(&mut self, status: &str, err: FlowError) {
        tracing::warn!(error = %err, kind = ?err.kind(), "{}", status);
        self.status = status.to_string();
        self.last_error = Some(err.kind());
    }

    fn set_balance(&mut self, balance: u64) {
        self.balance = Some(balance);
        self.observe();
    }

    fn set_wallet_key(&mut self, key: Option<Pubkey>) {
        self.wallet_key = key;
        self.observe();
    }

    /// Observation tick: any balance, provider or connection update lands here.
    fn observe(&mut self) {
        self.loading = false;
        tracing::debug!(stage = ?self.stage(), status = %self.status, "Flow state");
    }
}
