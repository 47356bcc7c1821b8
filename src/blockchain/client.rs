//! Ledger RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to a single JSON-RPC endpoint for the process lifetime
//! - Query chain state (balances, latest block hash, signature status)
//! - Request faucet airdrops and submit signed transaction bytes
//! - Wait for confirmation bounded by the block hash expiry height

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::client_error::Error as ClientError;
use solana_rpc_client_api::request::RpcRequest;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::TransactionError;
use tokio::time::{interval, timeout};

use crate::blockchain::types::{
    lamports_to_sol, LatestBlockhash, LedgerConfig, LedgerError, LedgerResult,
};

/// Operations the flow needs from a ledger.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Current balance of `account` in lamports.
    async fn get_balance(&self, account: &Pubkey) -> LedgerResult<u64>;

    /// Fetch a fresh block hash and its expiry height.
    async fn get_latest_blockhash(&self) -> LedgerResult<LatestBlockhash>;

    /// Ask the faucet to credit `lamports` to `account`.
    async fn request_airdrop(&self, account: &Pubkey, lamports: u64) -> LedgerResult<Signature>;

    /// Wait until `signature` reaches the configured commitment.
    async fn confirm(&self, signature: &Signature) -> LedgerResult<()>;

    /// Submit an already serialized, fully signed transaction.
    async fn submit_raw(&self, bytes: &[u8]) -> LedgerResult<Signature>;

    /// Endpoint this client is bound to, for logging.
    fn endpoint(&self) -> &str;
}

/// Ledger client backed by the Solana JSON-RPC API.
pub struct RpcLedgerClient {
    rpc: RpcClient,
    config: LedgerConfig,
    commitment: CommitmentConfig,
    timeout_duration: Duration,
}

impl RpcLedgerClient {
    /// Create a new client bound to `config.rpc_url`.
    ///
    /// No request is made here; an unreachable endpoint surfaces on first use.
    pub fn new(config: LedgerConfig) -> LedgerResult<Self> {
        let url: url::Url = config.rpc_url.parse().map_err(|e| {
            LedgerError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        let commitment = CommitmentConfig::from_str(&config.commitment).map_err(|e| {
            LedgerError::Rpc(format!("Invalid commitment '{}': {}", config.commitment, e))
        })?;
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);

        let rpc = RpcClient::new_with_timeout_and_commitment(
            url.to_string(),
            timeout_duration,
            commitment,
        );

        tracing::info!(
            rpc_url = %config.rpc_url,
            commitment = %config.commitment,
            "Ledger client initialized"
        );

        Ok(Self::with_rpc(rpc, config, commitment))
    }

    fn with_rpc(rpc: RpcClient, config: LedgerConfig, commitment: CommitmentConfig) -> Self {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        Self {
            rpc,
            config,
            commitment,
            timeout_duration,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    async fn call<T, F>(&self, fut: F) -> LedgerResult<T>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(map_client_error(e)),
            Err(_) => Err(LedgerError::Timeout(self.config.rpc_timeout_secs)),
        }
    }
}

fn map_client_error(err: ClientError) -> LedgerError {
    match err.get_transaction_error() {
        Some(TransactionError::BlockhashNotFound) => LedgerError::BlockhashNotFound,
        Some(tx_err) => LedgerError::Rejected(tx_err.to_string()),
        None => LedgerError::Rpc(err.to_string()),
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn get_balance(&self, account: &Pubkey) -> LedgerResult<u64> {
        let lamports = self.call(self.rpc.get_balance(account)).await?;
        tracing::debug!(
            account = %account,
            sol = lamports_to_sol(lamports),
            "Balance fetched"
        );
        Ok(lamports)
    }

    async fn get_latest_blockhash(&self) -> LedgerResult<LatestBlockhash> {
        let (hash, last_valid_block_height) = self
            .call(self.rpc.get_latest_blockhash_with_commitment(self.commitment))
            .await?;
        Ok(LatestBlockhash {
            hash,
            last_valid_block_height,
        })
    }

    async fn request_airdrop(&self, account: &Pubkey, lamports: u64) -> LedgerResult<Signature> {
        self.call(self.rpc.request_airdrop(account, lamports))
            .await
            .map_err(|e| match e {
                LedgerError::Rpc(msg) => LedgerError::Airdrop(msg),
                other => other,
            })
    }

    async fn confirm(&self, signature: &Signature) -> LedgerResult<()> {
        let latest = self.get_latest_blockhash().await?;
        let mut ticker = interval(Duration::from_millis(self.config.poll_interval_ms));

        loop {
            ticker.tick().await;

            let status = self
                .call(
                    self.rpc
                        .get_signature_status_with_commitment(signature, self.commitment),
                )
                .await?;

            match status {
                Some(Ok(())) => {
                    tracing::debug!(signature = %signature, "Transaction confirmed");
                    return Ok(());
                }
                Some(Err(e)) => return Err(LedgerError::Rejected(e.to_string())),
                None => {}
            }

            let height = self
                .call(self.rpc.get_block_height_with_commitment(self.commitment))
                .await?;
            if height > latest.last_valid_block_height {
                return Err(LedgerError::Stale {
                    last_valid_block_height: latest.last_valid_block_height,
                });
            }

            tracing::debug!(
                signature = %signature,
                block_height = height,
                expires_at = latest.last_valid_block_height,
                "Waiting for confirmation"
            );
        }
    }

    async fn submit_raw(&self, bytes: &[u8]) -> LedgerResult<Signature> {
        let params = serde_json::json!([
            BASE64_STANDARD.encode(bytes),
            {
                "encoding": "base64",
                "preflightCommitment": self.config.commitment,
            }
        ]);
        let signature: String = self
            .call(self.rpc.send(RpcRequest::SendTransaction, params))
            .await?;

        Signature::from_str(&signature).map_err(|e| {
            LedgerError::Rpc(format!("Malformed signature '{}' in response: {}", signature, e))
        })
    }

    fn endpoint(&self) -> &str {
        &self.config.rpc_url
    }
}

impl std::fmt::Debug for RpcLedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcLedgerClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("commitment", &self.config.commitment)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use solana_rpc_client::mock_sender::Mocks;
    use solana_sdk::hash::Hash;

    fn test_config() -> LedgerConfig {
        LedgerConfig {
            // Nothing listens here; requests fail fast.
            rpc_url: "http://127.0.0.1:1".to_string(),
            commitment: "confirmed".to_string(),
            rpc_timeout_secs: 5,
            poll_interval_ms: 10,
        }
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = RpcLedgerClient::new(test_config()).unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:1");
    }

    #[test]
    fn test_invalid_url() {
        let mut config = test_config();
        config.rpc_url = "not a url".to_string();
        let err = RpcLedgerClient::new(config).unwrap_err();
        assert!(err.to_string().contains("Invalid RPC URL"));
    }

    #[test]
    fn test_invalid_commitment() {
        let mut config = test_config();
        config.commitment = "someday".to_string();
        assert!(RpcLedgerClient::new(config).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let client = RpcLedgerClient::new(test_config()).unwrap();
        let err = client.get_balance(&Pubkey::new_unique()).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Transport);
    }

    /// Client over the mock sender. Each mocked response is served once,
    /// after which the sender falls back to its canned successes.
    fn mocked(mocks: Mocks) -> RpcLedgerClient {
        let rpc = RpcClient::new_mock_with_mocks("succeeds".to_string(), mocks);
        RpcLedgerClient::with_rpc(rpc, test_config(), CommitmentConfig::confirmed())
    }

    fn context(value: serde_json::Value) -> serde_json::Value {
        json!({ "context": { "slot": 1 }, "value": value })
    }

    fn blockhash_expiring_at(height: u64) -> serde_json::Value {
        context(json!({
            "blockhash": Hash::new_unique().to_string(),
            "lastValidBlockHeight": height,
        }))
    }

    #[tokio::test]
    async fn test_latest_blockhash_carries_expiry() {
        let mut mocks = Mocks::default();
        mocks.insert(RpcRequest::GetLatestBlockhash, blockhash_expiring_at(777));
        let client = mocked(mocks);

        let latest = client.get_latest_blockhash().await.unwrap();
        assert_eq!(latest.last_valid_block_height, 777);
    }

    #[tokio::test]
    async fn test_confirm_polls_until_landed() {
        let mut mocks = Mocks::default();
        mocks.insert(RpcRequest::GetLatestBlockhash, blockhash_expiring_at(500));
        // First poll: not seen yet, chain still below the expiry height.
        mocks.insert(RpcRequest::GetSignatureStatuses, context(json!([null])));
        mocks.insert(RpcRequest::GetBlockHeight, json!(100));
        let client = mocked(mocks);

        client.confirm(&Signature::new_unique()).await.unwrap();
    }

    #[tokio::test]
    async fn test_confirm_fails_stale_past_expiry_height() {
        let mut mocks = Mocks::default();
        mocks.insert(RpcRequest::GetLatestBlockhash, blockhash_expiring_at(500));
        mocks.insert(RpcRequest::GetSignatureStatuses, context(json!([null])));
        mocks.insert(RpcRequest::GetBlockHeight, json!(501));
        let client = mocked(mocks);

        let err = client.confirm(&Signature::new_unique()).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Stale {
                last_valid_block_height: 500
            }
        ));
        assert_eq!(err.kind(), crate::error::ErrorKind::Stale);
    }

    #[tokio::test]
    async fn test_confirm_reports_failed_transaction() {
        let mut mocks = Mocks::default();
        mocks.insert(
            RpcRequest::GetSignatureStatuses,
            context(json!([{
                "slot": 1,
                "confirmations": null,
                "status": { "Err": "AccountInUse" },
                "err": "AccountInUse",
                "confirmationStatus": "finalized",
            }])),
        );
        let client = mocked(mocks);

        let err = client.confirm(&Signature::new_unique()).await.unwrap_err();
        assert!(matches!(err, LedgerError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_submit_raw_parses_signature() {
        let expected = Signature::new_unique();
        let mut mocks = Mocks::default();
        mocks.insert(RpcRequest::SendTransaction, json!(expected.to_string()));
        let client = mocked(mocks);

        let signature = client.submit_raw(&[1, 2, 3]).await.unwrap();
        assert_eq!(signature, expected);
    }

    #[tokio::test]
    async fn test_submit_raw_malformed_signature() {
        let mut mocks = Mocks::default();
        mocks.insert(RpcRequest::SendTransaction, json!("not-a-signature"));
        let client = mocked(mocks);

        let err = client.submit_raw(&[1, 2, 3]).await.unwrap_err();
        assert!(err.to_string().contains("Malformed signature"));
    }

    #[test]
    fn test_blockhash_not_found_is_stale() {
        let err = map_client_error(ClientError::from(TransactionError::BlockhashNotFound));
        assert!(matches!(err, LedgerError::BlockhashNotFound));
        assert_eq!(err.kind(), crate::error::ErrorKind::Stale);
        assert!(!err.to_string().contains("height 0"));
    }

    #[test]
    fn test_other_transaction_errors_are_rejections() {
        let err = map_client_error(ClientError::from(TransactionError::AccountInUse));
        assert!(matches!(err, LedgerError::Rejected(_)));
    }
}
