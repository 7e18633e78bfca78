//! Shared types used across the SqlGate broker.
//!
//! This module defines the domain vocabulary: the secret shapes held
//! server-side, the opaque reference handed to clients, and the parsed
//! connection target.

use crate::error::GateError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Default port used when a data source does not specify one.
pub const DEFAULT_PORT: u16 = 1433;

/// The kind of credential a caller presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialKind {
    /// Name-and-password authentication against the database server.
    Password,
    /// Integrated/OS authentication (no password disclosed to the broker).
    Integrated,
}

/// A credential disclosed during the two-step hand-off, before a database
/// has been selected.
///
/// Held only in the temporary secret store, keyed by a crypto-random
/// URL-safe token. The password is zeroized when the handle is dropped.
#[derive(Clone)]
pub struct TempCredential {
    password: Zeroizing<String>,
    /// Whether the caller asked to trust the server certificate.
    pub trust_server_certificate: bool,
}

impl TempCredential {
    /// Create a new temporary credential.
    #[must_use]
    pub fn new(password: impl Into<String>, trust_server_certificate: bool) -> Self {
        Self {
            password: Zeroizing::new(password.into()),
            trust_server_certificate,
        }
    }

    /// The disclosed password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for TempCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TempCredential")
            .field("password", &"<redacted>")
            .field("trust_server_certificate", &self.trust_server_certificate)
            .finish()
    }
}

/// The durable server-side secret backing an authorized session.
///
/// Created only by a successful policy validation; replaced wholesale on
/// revalidation, never partially mutated; destroyed on sign-out or when the
/// store's sliding expiration evicts it. The password is zeroized on drop.
#[derive(Clone)]
pub struct StoredSecret {
    password: Zeroizing<String>,
    /// Kind of credential the session was created with. Revalidation
    /// re-applies the policy to the same kind.
    pub kind: CredentialKind,
    /// Whether the connection should trust the server certificate.
    pub trust_server_certificate: bool,
    /// UTC time after which the authorization must be re-checked against
    /// current policy, or `None` if no re-check is scheduled.
    pub revalidate_after: Option<DateTime<Utc>>,
    /// Database name the session is bound to, if one was selected.
    pub database: Option<String>,
}

impl StoredSecret {
    /// Create a new stored secret.
    #[must_use]
    pub fn new(
        password: impl Into<String>,
        kind: CredentialKind,
        trust_server_certificate: bool,
        revalidate_after: Option<DateTime<Utc>>,
        database: Option<String>,
    ) -> Self {
        Self {
            password: Zeroizing::new(password.into()),
            kind,
            trust_server_certificate,
            revalidate_after,
            database,
        }
    }

    /// Promote a temporary credential into a stored secret.
    ///
    /// This is the explicit conversion used when the caller finalizes the
    /// database selection step.
    #[must_use]
    pub fn from_temp(
        temp: &TempCredential,
        kind: CredentialKind,
        revalidate_after: Option<DateTime<Utc>>,
        database: Option<String>,
    ) -> Self {
        Self::new(
            temp.password(),
            kind,
            temp.trust_server_certificate,
            revalidate_after,
            database,
        )
    }

    /// The stored password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Whether the revalidation deadline has passed at `now`.
    #[must_use]
    pub fn needs_revalidation(&self, now: DateTime<Utc>) -> bool {
        self.revalidate_after.is_some_and(|after| after < now)
    }
}

impl fmt::Debug for StoredSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredSecret")
            .field("password", &"<redacted>")
            .field("kind", &self.kind)
            .field("trust_server_certificate", &self.trust_server_certificate)
            .field("revalidate_after", &self.revalidate_after)
            .field("database", &self.database)
            .finish()
    }
}

/// Opaque reference to a durable stored secret.
///
/// This is the only thing a client ever holds; it carries no meaning beyond
/// being a lookup key on the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretRef(String);

impl SecretRef {
    /// Wrap an existing key string.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the inner key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A parsed connection target: host, optional named instance, and port.
///
/// Parsed from the data-source syntax `host[\instance][,port]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    /// Server host name, IP address, or `.` for the local machine.
    pub host: String,
    /// Named instance, if the data source specified one.
    pub instance: Option<String>,
    /// TCP port, defaulting to [`DEFAULT_PORT`] when unspecified.
    pub port: u16,
}

impl ConnectionTarget {
    /// Parse a data-source string of the form `host[\instance][,port]`.
    ///
    /// # Errors
    /// Returns `GateError::Validation` if the data source is empty.
    pub fn parse(data_source: &str) -> Result<Self, GateError> {
        let trimmed = data_source.trim();
        if trimmed.is_empty() {
            return Err(GateError::Validation(
                "data source must not be empty".to_string(),
            ));
        }

        // Strip the port suffix first, then split off the instance name.
        // A trailing segment that does not parse as a port is ignored.
        let (before_port, port) = match trimmed.split_once(',') {
            Some((head, tail)) => (
                head,
                tail.rsplit(',')
                    .next()
                    .and_then(|t| t.trim().parse::<u16>().ok())
                    .unwrap_or(DEFAULT_PORT),
            ),
            None => (trimmed, DEFAULT_PORT),
        };

        let (host, instance) = match before_port.split_once('\\') {
            Some((host, instance)) => (host, Some(instance.trim().to_string())),
            None => (before_port, None),
        };

        Ok(Self {
            host: host.trim().to_string(),
            instance: instance.filter(|i| !i.is_empty()),
            port,
        })
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.host)?;
        if let Some(instance) = &self.instance {
            write!(f, "\\{instance}")?;
        }
        if self.port != DEFAULT_PORT {
            write!(f, ",{}", self.port)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_parse_bare_host() {
        let target = ConnectionTarget::parse("db.example.com").expect("parse");
        assert_eq!(target.host, "db.example.com");
        assert_eq!(target.instance, None);
        assert_eq!(target.port, DEFAULT_PORT);
    }

    #[test]
    fn test_parse_host_instance_port() {
        let target = ConnectionTarget::parse(r"db.example.com\reporting,1533").expect("parse");
        assert_eq!(target.host, "db.example.com");
        assert_eq!(target.instance.as_deref(), Some("reporting"));
        assert_eq!(target.port, 1533);
    }

    #[test]
    fn test_parse_host_port_only() {
        let target = ConnectionTarget::parse("10.1.2.3,1434").expect("parse");
        assert_eq!(target.host, "10.1.2.3");
        assert_eq!(target.instance, None);
        assert_eq!(target.port, 1434);
    }

    #[test]
    fn test_parse_local_shortcut() {
        let target = ConnectionTarget::parse(" . ").expect("parse");
        assert_eq!(target.host, ".");
    }

    #[test]
    fn test_parse_empty_rejected() {
        assert!(ConnectionTarget::parse("   ").is_err());
    }

    #[test]
    fn test_parse_bad_port_falls_back_to_default() {
        let target = ConnectionTarget::parse("db.example.com,notaport").expect("parse");
        assert_eq!(target.host, "db.example.com");
        assert_eq!(target.port, DEFAULT_PORT);
    }

    #[test]
    fn test_display_round_trip() {
        let text = r"db.example.com\reporting,1533";
        let target = ConnectionTarget::parse(text).expect("parse");
        assert_eq!(target.to_string(), text);
    }

    #[test]
    fn test_stored_secret_debug_redacts_password() {
        let secret = StoredSecret::new("hunter2", CredentialKind::Password, false, None, None);
        let debug = format!("{secret:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_temp_credential_debug_redacts_password() {
        let temp = TempCredential::new("hunter2", true);
        let debug = format!("{temp:?}");
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_from_temp_preserves_fields() {
        let temp = TempCredential::new("pwd", true);
        let after = Utc::now() + Duration::minutes(5);
        let secret = StoredSecret::from_temp(
            &temp,
            CredentialKind::Integrated,
            Some(after),
            Some("sales".to_string()),
        );
        assert_eq!(secret.password(), "pwd");
        assert_eq!(secret.kind, CredentialKind::Integrated);
        assert!(secret.trust_server_certificate);
        assert_eq!(secret.database.as_deref(), Some("sales"));
        assert_eq!(secret.revalidate_after, Some(after));
    }

    #[test]
    fn test_needs_revalidation() {
        let now = Utc::now();
        let kind = CredentialKind::Password;
        let fresh = StoredSecret::new("pwd", kind, false, Some(now + Duration::minutes(5)), None);
        assert!(!fresh.needs_revalidation(now));

        let stale = StoredSecret::new("pwd", kind, false, Some(now - Duration::minutes(1)), None);
        assert!(stale.needs_revalidation(now));

        let never = StoredSecret::new("pwd", kind, false, None, None);
        assert!(!never.needs_revalidation(now));
    }
}
