//! SqlGate Core - Foundation crate for the SqlGate connection broker.
//!
//! This crate provides the shared vocabulary, error handling, and
//! configuration management that all other SqlGate crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared domain types (`StoredSecret`, `TempCredential`,
//!   `SecretRef`, `ConnectionTarget`)
//!
//! # Example
//!
//! ```rust
//! use sqlgate_core::{ConnectionTarget, GateConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GateConfig::default();
//! let target = ConnectionTarget::parse(r"db.example.com\reporting,1533")?;
//! assert_eq!(target.port, 1533);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{GateConfig, PolicyConfig, SessionConfig};
pub use error::{ConfigError, ConfigResult, GateError, Result};
pub use types::{
    ConnectionTarget, CredentialKind, SecretRef, StoredSecret, TempCredential,
};
