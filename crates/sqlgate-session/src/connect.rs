//! The connection-test collaborator seam.
//!
//! The database wire protocol is outside this system: callers inject a
//! [`TryConnect`] implementation that attempts a real connection and
//! reports a server version string, or lists the database names visible
//! to the credential. Both calls are cancellable network operations whose
//! failures surface as rejections, never as panics.

use async_trait::async_trait;
use sqlgate_core::{ConnectionTarget, StoredSecret};
use std::fmt;
use thiserror::Error;

/// A connection attempt failed.
///
/// The message is preserved verbatim so the caller can display the
/// underlying driver error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ConnectError(pub String);

/// Everything a connector needs to reach the target server.
#[derive(Clone)]
pub struct ConnectionParams {
    /// Parsed connection target
    pub target: ConnectionTarget,
    /// Login user name
    pub user: String,
    /// The secret backing the connection (password, trust flag, bound
    /// database)
    pub secret: StoredSecret,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("target", &self.target)
            .field("user", &self.user)
            .field("secret", &self.secret)
            .finish()
    }
}

/// Injected collaborator that performs the opaque connection test.
#[async_trait]
pub trait TryConnect: Send + Sync {
    /// Attempt a connection and return the server's version string.
    ///
    /// # Errors
    /// Returns `ConnectError` carrying the driver's message verbatim.
    async fn try_connect(&self, params: &ConnectionParams) -> Result<String, ConnectError>;

    /// List the database names visible to the credential.
    ///
    /// # Errors
    /// Returns `ConnectError` carrying the driver's message verbatim.
    async fn list_databases(&self, params: &ConnectionParams) -> Result<Vec<String>, ConnectError>;
}
