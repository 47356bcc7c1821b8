//! Airdrop & transfer demo library.
//!
//! Funds an ephemeral account from a test-network faucet, connects a wallet
//! provider and moves the funds to the wallet in a transaction signed by both.

pub mod blockchain;
pub mod config;
pub mod error;
pub mod flow;
pub mod observability;
pub mod services;
pub mod wallet;

pub use config::schema::DemoConfig;
pub use error::{ErrorKind, FlowError, FlowResult};
pub use flow::FlowController;
