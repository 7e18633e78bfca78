//! Authorization sessions for sqlgate.
//!
//! This crate ties the policy validator, the database-name filter, and
//! the secret stores together into the complete authorization flow. The
//! heart of it is [`Authenticator`], which drives a request through the
//! [`SessionState`] machine: policy validation, a caller-injected
//! connection test behind the [`TryConnect`] seam, secret storage, and
//! inline revalidation of standing sessions once their deadline passes.
//!
//! The flow always resolves to authenticated or rejected-with-reason;
//! every rejection is an [`AuthRejection`] variant with a displayable
//! message, never a panic.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod authenticator;
mod connect;
mod state;

pub use authenticator::{AuthOutcome, AuthRejection, Authenticator, SignInRequest};
pub use connect::{ConnectError, ConnectionParams, TryConnect};
pub use state::{AuthorizationSession, InvalidTransition, SessionState};
