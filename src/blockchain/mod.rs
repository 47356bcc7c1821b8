//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! LedgerConfig (RPC URL, commitment, timeouts)
//!     → client.rs (RPC connection with timeouts, confirmation polling)
//!     → transaction.rs (build transfer, stamp fresh block hash)
//!     → memory.rs (offline ledger with the same contract)
//! ```
//!
//! # Constraints
//! - One endpoint per process; no failover, no reconnection
//! - All RPC calls have configurable timeouts
//! - Signing and encoding are left to the Solana crates

pub mod client;
pub mod memory;
pub mod transaction;
pub mod types;

pub use client::{LedgerClient, RpcLedgerClient};
pub use memory::InMemoryLedger;
pub use types::{LatestBlockhash, LedgerConfig, LedgerError, LedgerResult};
