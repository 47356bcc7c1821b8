//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → ConfigOverrides (command-line values)
//!     → validation.rs (semantic checks, once, on the merged result)
//!     → DemoConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; the RPC endpoint is fixed for the process
//! - All fields have defaults so the demo runs without a file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::DemoConfig;
pub use schema::LedgerConfig;
pub use schema::ObservabilityConfig;
pub use schema::WalletConfig;
