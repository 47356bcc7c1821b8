//! Flow controller subsystem.
//!
//! # States
//! ```text
//! funding:  Uninitialized → Funding (loading) → Funded → Spent
//! wallet:   NoProvider | ProviderFound → Connected
//! ```
//!
//! # Render precedence
//! ```text
//! loading → create account → install prompt → connect wallet → transfer
//! ```

pub mod controller;
pub mod state;

pub use controller::{status, FlowController};
pub use state::{Action, Stage, View, FUNDED_THRESHOLD_LAMPORTS};
