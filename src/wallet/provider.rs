//! Wallet provider contract.
//!
//! Mirrors the injected-provider surface browser wallets expose: a public
//! key, a connection flag, connect/disconnect, transaction and message
//! signing, event subscription and a generic `request` entry point.

use std::str::FromStr;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::wallet::events::Subscription;

/// Errors reported by a wallet provider.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The user declined the prompt.
    #[error("User rejected the request")]
    Rejected,

    /// The operation needs a connected wallet.
    #[error("Wallet is not connected")]
    NotConnected,

    /// `request` was called with an unknown method name.
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// `request` params could not be decoded.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Any other provider-side failure.
    #[error("Provider error: {0}")]
    Provider(String),
}

impl WalletError {
    /// Failure category used by the flow controller.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::Rejected => ErrorKind::Rejected,
            _ => ErrorKind::Unknown,
        }
    }
}

/// Result type for provider operations.
pub type WalletResult<T> = Result<T, WalletError>;

/// Options for [`WalletProvider::connect`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectOpts {
    /// Connect silently if the site is already trusted, otherwise fail without prompting.
    pub only_if_trusted: bool,
}

/// How a message is shown to the user before signing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayEncoding {
    #[default]
    Utf8,
    Hex,
}

/// Method names accepted by [`WalletProvider::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Connect,
    Disconnect,
    SignTransaction,
    SignAllTransactions,
    SignMessage,
}

impl FromStr for RequestMethod {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connect" => Ok(RequestMethod::Connect),
            "disconnect" => Ok(RequestMethod::Disconnect),
            "signTransaction" => Ok(RequestMethod::SignTransaction),
            "signAllTransactions" => Ok(RequestMethod::SignAllTransactions),
            "signMessage" => Ok(RequestMethod::SignMessage),
            other => Err(WalletError::UnsupportedMethod(other.to_string())),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignMessageParams {
    message: String,
    #[serde(default)]
    display: DisplayEncoding,
}

/// A wallet that holds a user-controlled key.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Whether this provider speaks the Phantom-compatible contract.
    fn is_phantom(&self) -> bool;

    /// Connected public key, if any.
    fn public_key(&self) -> Option<Pubkey>;

    fn is_connected(&self) -> bool;

    /// Ask the user to connect. Suspends until they answer.
    async fn connect(&self, opts: ConnectOpts) -> WalletResult<Pubkey>;

    async fn disconnect(&self) -> WalletResult<()>;

    /// Add the wallet's signature. Never broadcasts.
    async fn sign_transaction(&self, tx: Transaction) -> WalletResult<Transaction>;

    /// Sign several transactions behind a single prompt.
    async fn sign_all_transactions(&self, txs: Vec<Transaction>) -> WalletResult<Vec<Transaction>>;

    async fn sign_message(&self, message: &[u8], display: DisplayEncoding)
        -> WalletResult<Signature>;

    /// Subscribe to connect, disconnect and account change events.
    fn subscribe(&self) -> Subscription;

    /// Generic entry point dispatching on a method name with JSON params.
    async fn request(&self, method: &str, params: Value) -> WalletResult<Value> {
        match method.parse::<RequestMethod>()? {
            RequestMethod::Connect => {
                let opts: ConnectOpts = if params.is_null() {
                    ConnectOpts::default()
                } else {
                    serde_json::from_value(params)
                        .map_err(|e| WalletError::InvalidParams(e.to_string()))?
                };
                let key = self.connect(opts).await?;
                Ok(json!({ "publicKey": key.to_string() }))
            }
            RequestMethod::Disconnect => {
                self.disconnect().await?;
                Ok(Value::Null)
            }
            RequestMethod::SignTransaction => {
                let tx = decode_transaction(&params["transaction"])?;
                let signed = self.sign_transaction(tx).await?;
                Ok(json!({ "transaction": encode_transaction(&signed)? }))
            }
            RequestMethod::SignAllTransactions => {
                let txs = params["transactions"]
                    .as_array()
                    .ok_or_else(|| WalletError::InvalidParams("missing transactions".into()))?
                    .iter()
                    .map(decode_transaction)
                    .collect::<WalletResult<Vec<_>>>()?;
                let signed = self.sign_all_transactions(txs).await?;
                let encoded = signed
                    .iter()
                    .map(encode_transaction)
                    .collect::<WalletResult<Vec<_>>>()?;
                Ok(json!({ "transactions": encoded }))
            }
            RequestMethod::SignMessage => {
                let params: SignMessageParams = serde_json::from_value(params)
                    .map_err(|e| WalletError::InvalidParams(e.to_string()))?;
                let bytes = match params.display {
                    DisplayEncoding::Utf8 => params.message.into_bytes(),
                    DisplayEncoding::Hex => hex::decode(&params.message)
                        .map_err(|e| WalletError::InvalidParams(e.to_string()))?,
                };
                let signature = self.sign_message(&bytes, params.display).await?;
                let public_key = self.public_key().map(|k| k.to_string());
                Ok(json!({ "signature": signature.to_string(), "publicKey": public_key }))
            }
        }
    }
}

fn decode_transaction(value: &Value) -> WalletResult<Transaction> {
    let encoded = value
        .as_str()
        .ok_or_else(|| WalletError::InvalidParams("transaction must be a base64 string".into()))?;
    let bytes = BASE64_STANDARD
        .decode(encoded)
        .map_err(|e| WalletError::InvalidParams(e.to_string()))?;
    bincode::deserialize(&bytes).map_err(|e| WalletError::InvalidParams(e.to_string()))
}

fn encode_transaction(tx: &Transaction) -> WalletResult<String> {
    let bytes = bincode::serialize(tx).map_err(|e| WalletError::Provider(e.to_string()))?;
    Ok(BASE64_STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(
            "signAllTransactions".parse::<RequestMethod>().unwrap(),
            RequestMethod::SignAllTransactions
        );
        let err = "signIn".parse::<RequestMethod>().unwrap_err();
        assert!(err.to_string().contains("signIn"));
    }

    #[test]
    fn test_connect_opts_json() {
        let opts: ConnectOpts = serde_json::from_value(json!({ "onlyIfTrusted": true })).unwrap();
        assert!(opts.only_if_trusted);

        let opts: ConnectOpts = serde_json::from_value(json!({})).unwrap();
        assert!(!opts.only_if_trusted);
    }

    #[test]
    fn test_rejection_kind() {
        assert_eq!(WalletError::Rejected.kind(), ErrorKind::Rejected);
        assert_eq!(WalletError::NotConnected.kind(), ErrorKind::Unknown);
    }
}
