//! Funding and settlement services.
//!
//! # Data Flow
//! ```text
//! Session (ledger handle + ephemeral sender)
//!     → funding.rs (new keypair → airdrop → confirm)
//!     → settlement.rs (wallet-signed tx → sender signs → submit → confirm)
//! ```
//!
//! Neither service is reentrant; callers run one operation at a time.

pub mod funding;
pub mod session;
pub mod settlement;

pub use funding::{create_funded_account, sender_balance, AIRDROP_LAMPORTS};
pub use session::Session;
pub use settlement::settle;
