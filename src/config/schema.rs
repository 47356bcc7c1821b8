//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the demo.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DemoConfig {
    /// Ledger RPC settings.
    pub ledger: LedgerConfig,

    /// Wallet provider settings.
    pub wallet: WalletConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Ledger RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Commitment level for reads and confirmation ("processed", "confirmed", "finalized").
    pub commitment: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Delay between signature status polls while confirming.
    pub poll_interval_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.devnet.solana.com".to_string(),
            commitment: "confirmed".to_string(),
            rpc_timeout_secs: 30,
            poll_interval_ms: 500,
        }
    }
}

/// Wallet provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Keypair file backing the local wallet provider. No provider when unset.
    pub keypair_path: Option<String>,

    /// Page shown to the user when no provider is installed.
    pub install_url: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            keypair_path: None,
            install_url: "https://phantom.app/".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive, overridden by `RUST_LOG`.
    pub log_filter: String,

    /// Include the event target in log lines.
    pub log_targets: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "airdrop_transfer=info".to_string(),
            log_targets: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: DemoConfig = toml::from_str(
            r#"
            [ledger]
            rpc_url = "http://127.0.0.1:8899"
            "#,
        )
        .unwrap();

        assert_eq!(config.ledger.rpc_url, "http://127.0.0.1:8899");
        assert_eq!(config.ledger.commitment, "confirmed");
        assert!(config.wallet.keypair_path.is_none());
        assert_eq!(config.wallet.install_url, "https://phantom.app/");
    }
}
