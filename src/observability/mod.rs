//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (account, signature, stage)
//!
//! Consumers:
//!     → logging.rs (fmt subscriber on stderr, EnvFilter)
//! ```

pub mod logging;

pub use logging::init_logging;
