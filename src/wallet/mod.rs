//! Wallet provider subsystem.
//!
//! # Data Flow
//! ```text
//! candidate provider (or none)
//!     → bridge.rs (detection → ProviderState, connect, sign)
//!     → provider.rs (provider contract: connect/sign/request)
//!     → events.rs (connect / disconnect / account change subscription)
//!     → keypair.rs (provider backed by a local keypair + approval prompts)
//! ```
//!
//! # Security Constraints
//! - The provider never exposes its secret key
//! - Every connect and sign goes through an approval prompt
//! - Secret keys are never logged

pub mod bridge;
pub mod events;
pub mod keypair;
pub mod provider;

pub use bridge::{ProviderState, WalletBridge};
pub use events::{EventHub, Subscription, WalletEvent};
pub use keypair::{ApprovalRequest, Approver, AutoApprover, KeypairWallet};
pub use provider::{
    ConnectOpts, DisplayEncoding, RequestMethod, WalletError, WalletProvider, WalletResult,
};
