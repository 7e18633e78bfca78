//! SqlGate Policy - Network-destination policy enforcement.
//!
//! Decides whether the broker may open a connection toward a caller-supplied
//! server address. The validator resolves the address, discards unusable
//! candidates, and applies either an explicit allow-list or the
//! loopback/private-network toggles via the reserved-range classifier.
//!
//! # Two-tier policy
//!
//! When an allow-list is configured (non-empty) it is the sole authority:
//! the loopback and private-network toggles are ignored entirely, not
//! combined with it.
//!
//! # Example
//!
//! ```rust
//! use sqlgate_policy::{AddressSpec, NetworkClass, classify};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let spec = AddressSpec::parse("192.168.1.0/255.255.255.0")?;
//! assert_eq!(spec, AddressSpec::parse("192.168.1.0/24")?);
//! assert!(spec.contains("192.168.1.42".parse()?));
//! assert_eq!(classify("127.0.0.1".parse()?), NetworkClass::Loopback);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod range;
pub mod reserved;
pub mod resolve;
pub mod validator;

pub use range::AddressSpec;
pub use reserved::{classify, NetworkClass};
pub use resolve::resolve_target;
pub use validator::{PolicyRejection, PolicyRules, PolicyValidator, ValidationRequest};

use thiserror::Error;

/// Errors raised while parsing address specifications or building policy
/// rules from configuration.
///
/// These are operator-input format errors and fail fast at load time,
/// unlike [`PolicyRejection`] which represents expected per-request
/// outcomes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The text is not an IP address, CIDR range, or masked range
    #[error("invalid IP address or range: {0}")]
    InvalidAddressSpec(String),

    /// The prefix length is out of range for the address family
    #[error("invalid prefix length in: {0}")]
    InvalidPrefixLength(String),

    /// The dotted subnet mask is not a contiguous run of set bits
    #[error("invalid subnet mask: {0}")]
    InvalidSubnetMask(String),

    /// The configured revalidation cadence is out of range
    #[error("invalid revalidation cadence: {0} minutes")]
    InvalidCadence(u64),
}

/// Result type for policy parsing and rule construction.
pub type Result<T> = std::result::Result<T, PolicyError>;
