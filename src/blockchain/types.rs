//! Ledger-specific types and error definitions.

use solana_sdk::hash::Hash;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use thiserror::Error;

use crate::error::ErrorKind;

// Re-export LedgerConfig from config module to avoid duplication
pub use crate::config::schema::LedgerConfig;

/// A recent block hash together with the last block height at which
/// transactions stamped with it are still accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub hash: Hash,
    pub last_valid_block_height: u64,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The block hash the transaction was stamped with has expired.
    #[error("Block hash expired at height {last_valid_block_height}")]
    Stale { last_valid_block_height: u64 },

    /// The network does not know the block hash, usually because it expired.
    #[error("Block hash not found")]
    BlockhashNotFound,

    /// The network executed or pre-flighted the transaction and refused it.
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// Submitted bytes could not be decoded or encoded.
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// The faucet refused the airdrop.
    #[error("Airdrop failed: {0}")]
    Airdrop(String),
}

impl LedgerError {
    /// Failure category used by the flow controller.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Rpc(_) | LedgerError::Timeout(_) | LedgerError::Airdrop(_) => {
                ErrorKind::Transport
            }
            LedgerError::Stale { .. } | LedgerError::BlockhashNotFound => ErrorKind::Stale,
            LedgerError::Rejected(_) | LedgerError::InvalidTransaction(_) => ErrorKind::Unknown,
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Render a lamport amount as SOL for log output.
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.rpc_url, "https://api.devnet.solana.com");
        assert_eq!(config.commitment, "confirmed");
        assert_eq!(config.rpc_timeout_secs, 30);
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = LedgerError::Stale {
            last_valid_block_height: 600,
        };
        assert!(err.to_string().contains("600"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(LedgerError::Rpc("down".into()).kind(), ErrorKind::Transport);
        assert_eq!(LedgerError::Timeout(5).kind(), ErrorKind::Transport);
        assert_eq!(
            LedgerError::Stale {
                last_valid_block_height: 1
            }
            .kind(),
            ErrorKind::Stale
        );
        assert_eq!(LedgerError::BlockhashNotFound.kind(), ErrorKind::Stale);
        assert_eq!(LedgerError::Rejected("x".into()).kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_lamports_to_sol() {
        assert_eq!(lamports_to_sol(2 * LAMPORTS_PER_SOL), 2.0);
        assert_eq!(lamports_to_sol(0), 0.0);
    }
}
