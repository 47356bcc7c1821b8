//! Airdrop & transfer demo (terminal front end).
//!
//! ```text
//!   Enter ──▶ FlowController::click()
//!                 │
//!                 ├─ create account ──▶ funding ──▶ ledger (airdrop, confirm)
//!                 ├─ connect wallet ──▶ bridge  ──▶ provider (approval prompt)
//!                 └─ transfer ────────▶ builder ──▶ provider (sign) ──▶ settlement ──▶ ledger
//! ```
//!
//! The status line and the single button label are printed after every step.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::signature::Keypair;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use airdrop_transfer::blockchain::types::lamports_to_sol;
use airdrop_transfer::blockchain::{InMemoryLedger, LedgerClient, RpcLedgerClient};
use airdrop_transfer::config::loader::{resolve_config, ConfigError, ConfigOverrides};
use airdrop_transfer::config::DemoConfig;
use airdrop_transfer::flow::{FlowController, View};
use airdrop_transfer::observability::init_logging;
use airdrop_transfer::services::Session;
use airdrop_transfer::wallet::{
    ApprovalRequest, Approver, AutoApprover, KeypairWallet, WalletBridge, WalletProvider,
};

#[derive(Parser)]
#[command(name = "airdrop-transfer")]
#[command(about = "Airdrop test SOL to a fresh account and transfer it to your wallet", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the RPC endpoint.
    #[arg(long)]
    rpc_url: Option<String>,

    /// Keypair file backing the wallet provider.
    #[arg(short, long)]
    wallet_keypair: Option<PathBuf>,

    /// Run against an in-memory ledger with a generated, pre-funded wallet.
    #[arg(long)]
    offline: bool,

    /// Approve every wallet prompt without asking.
    #[arg(short, long)]
    yes: bool,
}

type StdinLines = Lines<BufReader<Stdin>>;

/// Shared line reader so the button loop and approval prompts never race on stdin.
#[derive(Clone)]
struct Terminal {
    lines: Arc<Mutex<StdinLines>>,
}

impl Terminal {
    fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
        }
    }

    /// Next trimmed line; `None` at end of input.
    async fn read_line(&self) -> Option<String> {
        let mut lines = self.lines.lock().await;
        match lines.next_line().await {
            Ok(Some(line)) => Some(line.trim().to_string()),
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read stdin");
                None
            }
        }
    }
}

#[async_trait]
impl Approver for Terminal {
    async fn approve(&self, request: &ApprovalRequest) -> bool {
        println!("  wallet> {} [y/N]", request);
        matches!(self.read_line().await.as_deref(), Some("y") | Some("Y") | Some("yes"))
    }
}

fn build_config(cli: &Cli) -> Result<DemoConfig, ConfigError> {
    let overrides = ConfigOverrides {
        rpc_url: cli.rpc_url.clone(),
        wallet_keypair: cli
            .wallet_keypair
            .as_ref()
            .map(|path| path.display().to_string()),
    };
    resolve_config(cli.config.as_deref(), &overrides)
}

fn render(controller: &FlowController) {
    println!();
    println!("  {}", controller.view());
    println!("  {}", controller.status());
    if let Some(balance) = controller.balance() {
        println!("  sender balance: {} SOL", lamports_to_sol(balance));
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    init_logging(&config.observability)?;
    tracing::info!("airdrop-transfer v0.1.0 starting");

    let terminal = Terminal::new();
    let approver: Arc<dyn Approver> = if cli.yes {
        Arc::new(AutoApprover::always())
    } else {
        Arc::new(terminal.clone())
    };

    let ledger: Arc<dyn LedgerClient>;
    let mut wallet: Option<Arc<dyn WalletProvider>> = None;

    if cli.offline {
        let memory = Arc::new(InMemoryLedger::new());
        let local = match &config.wallet.keypair_path {
            Some(path) => KeypairWallet::from_file(Path::new(path), approver)?,
            None => KeypairWallet::new(Keypair::new(), approver),
        };
        // The wallet pays the transfer fee.
        memory.fund(&local.address(), LAMPORTS_PER_SOL);
        wallet = Some(Arc::new(local) as Arc<dyn WalletProvider>);
        ledger = memory as Arc<dyn LedgerClient>;
    } else {
        ledger = Arc::new(RpcLedgerClient::new(config.ledger.clone())?) as Arc<dyn LedgerClient>;
        if let Some(path) = &config.wallet.keypair_path {
            let local = KeypairWallet::from_file(Path::new(path), approver)?;
            wallet = Some(Arc::new(local) as Arc<dyn WalletProvider>);
        }
    }

    tracing::info!(
        endpoint = ledger.endpoint(),
        wallet = wallet.is_some(),
        "Session configured"
    );

    let bridge = WalletBridge::detect(wallet, config.wallet.install_url.clone());
    let mut controller = FlowController::new(Session::new(ledger), bridge);
    let mut events = controller.subscribe();

    loop {
        if let Some(events) = events.as_mut() {
            while let Some(event) = events.try_recv() {
                controller.handle_wallet_event(event);
            }
        }

        render(&controller);

        let view = controller.view();
        if let View::InstallPrompt { .. } = view {
            break;
        }

        println!("  press Enter to continue, q to quit");
        match terminal.read_line().await.as_deref() {
            None | Some("q") => break,
            Some(_) => {}
        }

        if let Some(action) = controller.click().await {
            tracing::debug!(action = ?action, "Action finished");
        }
    }

    if let Some(key) = controller.wallet_key() {
        tracing::info!(wallet = %key, "Wallet used for this session");
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
