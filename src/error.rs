//! Crate-wide error type and failure categories.

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::blockchain::LedgerError;
use crate::wallet::WalletError;

/// Closed set of failure categories surfaced to the flow controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network unreachable, endpoint error or RPC timeout.
    Transport,
    /// The user declined a wallet prompt.
    Rejected,
    /// Block hash or confirmation window expired.
    Stale,
    /// Anything else.
    Unknown,
}

/// Errors produced by the funding, transfer and settlement steps.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// No ephemeral sender exists in the session yet.
    #[error("Sender account has not been created")]
    NoSender,

    /// No wallet provider was detected.
    #[error("No wallet provider found")]
    NoProvider,

    /// A transaction lacks a signature that must be present at this step.
    #[error("Transaction is missing the signature of {0}")]
    MissingSignature(Pubkey),

    /// The provider returned a different set of signatures than requested.
    #[error("Provider returned {found} signatures, expected {expected}")]
    UnexpectedSignatures { expected: usize, found: usize },

    /// Local signing or signature verification failed.
    #[error("Signing failed: {0}")]
    Signing(String),
}

impl FlowError {
    /// Failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlowError::Ledger(e) => e.kind(),
            FlowError::Wallet(e) => e.kind(),
            _ => ErrorKind::Unknown,
        }
    }
}

/// Result type for flow operations.
pub type FlowResult<T> = Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_passes_through_wrapped_errors() {
        let err = FlowError::from(LedgerError::Rpc("connection refused".into()));
        assert_eq!(err.kind(), ErrorKind::Transport);

        let err = FlowError::from(WalletError::Rejected);
        assert_eq!(err.kind(), ErrorKind::Rejected);

        assert_eq!(FlowError::NoSender.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_error_display() {
        let err = FlowError::UnexpectedSignatures {
            expected: 1,
            found: 2,
        };
        assert_eq!(err.to_string(), "Provider returned 2 signatures, expected 1");
    }
}
