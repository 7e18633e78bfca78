//! SqlGate Secrets - Server-side secret lifecycle stores.
//!
//! Two logical stores back the authorization flow:
//!
//! - **Durable store**: keyed stored secrets with a sliding expiration of
//!   about three hours; any read resets the clock. The key is the opaque
//!   [`SecretRef`] handed to the client in place of the credential.
//! - **Temporary store**: short-lived credentials disclosed during the
//!   two-step hand-off (enter password, then pick a database). Entries
//!   live about ten minutes, can be `peek`ed repeatedly while the caller
//!   is choosing, and are consumed by a single `take` on finalization to
//!   prevent replay.
//!
//! Secrets never leave this process: only keys do.
//!
//! # Example
//!
//! ```rust
//! use sqlgate_core::{CredentialKind, StoredSecret};
//! use sqlgate_secrets::SecretStore;
//!
//! let store = SecretStore::new();
//! let key = store.store(StoredSecret::new("pwd", CredentialKind::Password, false, None, None));
//! assert!(store.retrieve(&key).is_some());
//! store.remove(&key);
//! assert!(store.retrieve(&key).is_none());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cache;
pub mod token;

pub use cache::ExpiringCache;
pub use token::{url_safe_token, TOKEN_BYTES};

use sqlgate_core::config::SessionConfig;
use sqlgate_core::{SecretRef, StoredSecret, TempCredential};
use std::time::Duration;
use uuid::Uuid;

/// Prefix distinguishing durable secret keys in logs and debugging.
const DURABLE_KEY_PREFIX: &str = "sqlgate-";

/// Default sliding lifetime of durable stored secrets.
const DEFAULT_SECRET_TTL: Duration = Duration::from_secs(3 * 60 * 60);

/// Default sliding lifetime of temporary credentials.
const DEFAULT_TEMP_TTL: Duration = Duration::from_secs(10 * 60);

/// The shared secret store: durable session secrets plus temporary
/// hand-off credentials.
///
/// Safe for concurrent, unordered access from many in-flight requests.
pub struct SecretStore {
    durable: ExpiringCache<StoredSecret>,
    temporary: ExpiringCache<TempCredential>,
}

impl Default for SecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore {
    /// Create a store with the default lifetimes (3 h durable, 10 min
    /// temporary).
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttls(DEFAULT_SECRET_TTL, DEFAULT_TEMP_TTL)
    }

    /// Create a store with explicit sliding lifetimes.
    #[must_use]
    pub fn with_ttls(secret_ttl: Duration, temp_ttl: Duration) -> Self {
        Self {
            durable: ExpiringCache::new(secret_ttl),
            temporary: ExpiringCache::new(temp_ttl),
        }
    }

    /// Create a store from the session section of the configuration.
    #[must_use]
    pub fn from_config(session: &SessionConfig) -> Self {
        Self::with_ttls(
            Duration::from_secs(session.secret_ttl_hours * 60 * 60),
            Duration::from_secs(session.temp_ttl_minutes * 60),
        )
    }

    /// Store a secret and return the opaque reference for it.
    #[must_use]
    pub fn store(&self, secret: StoredSecret) -> SecretRef {
        let key = SecretRef::new(format!("{DURABLE_KEY_PREFIX}{}", Uuid::new_v4()));
        self.durable.insert(key.as_str(), secret);
        tracing::debug!("Stored secret under {key}");
        key
    }

    /// Replace the secret under an existing reference, resetting its
    /// expiration. Used by revalidation, which swaps the secret wholesale.
    pub fn renew(&self, key: &SecretRef, secret: StoredSecret) {
        self.durable.insert(key.as_str(), secret);
        tracing::debug!("Renewed secret under {key}");
    }

    /// Retrieve the secret for a reference, sliding its expiration.
    #[must_use]
    pub fn retrieve(&self, key: &SecretRef) -> Option<StoredSecret> {
        self.durable.get(key.as_str())
    }

    /// Remove the secret for a reference (sign-out, failed revalidation).
    pub fn remove(&self, key: &SecretRef) {
        self.durable.remove(key.as_str());
        tracing::debug!("Removed secret under {key}");
    }

    /// Store a temporary credential for the database-selection hand-off.
    ///
    /// Returns a crypto-random, URL-safe key. The user and server names
    /// identify the hand-off in logs only; the credential itself carries
    /// no identity.
    #[must_use]
    pub fn set_temp(&self, user: &str, server: &str, credential: TempCredential) -> String {
        let key = url_safe_token(TOKEN_BYTES);
        self.temporary.insert(key.clone(), credential);
        tracing::debug!("Stored temporary credential for {user}@{server}");
        key
    }

    /// Destructively take a temporary credential: a second take of the
    /// same key returns `None`. Used to finalize the hand-off.
    #[must_use]
    pub fn take_temp(&self, key: &str) -> Option<TempCredential> {
        self.temporary.take(key)
    }

    /// Read a temporary credential without consuming it, sliding its
    /// expiration. Used while the caller is still choosing a database.
    #[must_use]
    pub fn peek_temp(&self, key: &str) -> Option<TempCredential> {
        self.temporary.get(key)
    }
}
