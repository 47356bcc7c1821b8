//! Shared fixtures for flow integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::signature::Keypair;

use airdrop_transfer::blockchain::InMemoryLedger;
use airdrop_transfer::flow::FlowController;
use airdrop_transfer::services::Session;
use airdrop_transfer::wallet::{
    ApprovalRequest, Approver, KeypairWallet, WalletBridge, WalletProvider,
};

pub const INSTALL_URL: &str = "https://phantom.app/";

/// Approver answering from a script, then rejecting once the script runs out.
#[derive(Default)]
pub struct ScriptedApprover {
    answers: Mutex<VecDeque<bool>>,
    seen: Mutex<Vec<ApprovalRequest>>,
}

impl ScriptedApprover {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Requests shown so far.
    #[allow(dead_code)]
    pub fn seen(&self) -> Vec<ApprovalRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Approver for ScriptedApprover {
    async fn approve(&self, request: &ApprovalRequest) -> bool {
        self.seen.lock().unwrap().push(request.clone());
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }
}

/// A controller wired to an in-memory ledger and, optionally, a keypair wallet.
pub struct Harness {
    pub ledger: Arc<InMemoryLedger>,
    pub wallet: Option<Arc<KeypairWallet>>,
    pub approver: Arc<ScriptedApprover>,
    pub controller: FlowController,
}

/// Build a harness. The wallet, when present, holds 1 SOL for fees.
pub fn harness(with_wallet: bool, answers: &[bool]) -> Harness {
    let ledger = Arc::new(InMemoryLedger::new());
    let approver = Arc::new(ScriptedApprover::new(answers));

    let wallet = with_wallet.then(|| {
        let wallet = Arc::new(KeypairWallet::new(Keypair::new(), approver.clone()));
        ledger.fund(&wallet.address(), LAMPORTS_PER_SOL);
        wallet
    });

    let bridge = WalletBridge::detect(
        wallet.clone().map(|w| w as Arc<dyn WalletProvider>),
        INSTALL_URL,
    );
    let controller = FlowController::new(Session::new(ledger.clone()), bridge);

    Harness {
        ledger,
        wallet,
        approver,
        controller,
    }
}
