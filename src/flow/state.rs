//! Stage derivation and render decision.

use solana_sdk::native_token::LAMPORTS_PER_SOL;

/// Minimum sender balance for the flow to count as funded.
pub const FUNDED_THRESHOLD_LAMPORTS: u64 = 2 * LAMPORTS_PER_SOL;

/// Where the flow is, derived from observed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// No sender, or a sender below the funding threshold.
    Uninitialized,
    /// The sender's funds were transferred out; a new account is needed.
    Spent,
    /// Funded, but no wallet provider is installed.
    FundedNoProvider,
    /// Funded, provider present, not connected.
    FundedNotConnected,
    /// Funded and connected.
    ReadyToTransfer,
}

impl Stage {
    pub fn derive(balance: Option<u64>, spent: bool, provider: bool, connected: bool) -> Self {
        match balance {
            Some(b) if b >= FUNDED_THRESHOLD_LAMPORTS => {
                if !provider {
                    Stage::FundedNoProvider
                } else if !connected {
                    Stage::FundedNotConnected
                } else {
                    Stage::ReadyToTransfer
                }
            }
            _ if spent => Stage::Spent,
            _ => Stage::Uninitialized,
        }
    }
}

/// The single action the primary button triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateAccount,
    ConnectWallet,
    Transfer,
}

/// What the UI shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Loading,
    Button { action: Action, label: &'static str },
    /// Terminal for the session: no button, the user installs and reloads.
    InstallPrompt { url: String },
}

impl View {
    /// Render decision, strict precedence: loading first, then by stage.
    pub fn render(loading: bool, stage: Stage, install_url: &str) -> Self {
        if loading {
            return View::Loading;
        }
        match stage {
            Stage::Uninitialized => View::Button {
                action: Action::CreateAccount,
                label: "Create a new Solana account",
            },
            Stage::Spent => View::Button {
                action: Action::CreateAccount,
                label: "Start over with a new Solana account",
            },
            Stage::FundedNoProvider => View::InstallPrompt {
                url: install_url.to_string(),
            },
            Stage::FundedNotConnected => View::Button {
                action: Action::ConnectWallet,
                label: "Connect to Phantom Wallet",
            },
            Stage::ReadyToTransfer => View::Button {
                action: Action::Transfer,
                label: "Transfer to new wallet",
            },
        }
    }

    /// The enabled action, if any.
    pub fn action(&self) -> Option<Action> {
        match self {
            View::Button { action, .. } => Some(*action),
            _ => None,
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::Loading => write!(f, "Working..."),
            View::Button { label, .. } => write!(f, "[ {} ]", label),
            View::InstallPrompt { url } => {
                write!(f, "No provider found. Install Phantom Browser extension: {}", url)
            }
        }
    }
}
