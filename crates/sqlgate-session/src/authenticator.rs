//! End-to-end authorization orchestration.
//!
//! [`Authenticator`] drives the full flow: policy validation, the
//! injected connection test, secret storage, the two-step
//! database-selection hand-off, and inline revalidation of standing
//! sessions. All context travels by parameter; nothing is ambient.

use crate::connect::{ConnectionParams, TryConnect};
use crate::state::{AuthorizationSession, InvalidTransition, SessionState};
use chrono::Utc;
use sqlgate_core::{
    ConnectionTarget, CredentialKind, GateConfig, GateError, SecretRef, StoredSecret,
    TempCredential,
};
use sqlgate_filter::DatabaseNameFilter;
use sqlgate_policy::{PolicyRejection, PolicyRules, PolicyValidator, ValidationRequest};
use sqlgate_secrets::SecretStore;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// An expected, recoverable rejection of an authorization attempt.
///
/// Every variant carries a single human-readable message; the flow
/// always resolves to authenticated or rejected-with-reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// The network policy rejected the target
    #[error(transparent)]
    Policy(#[from] PolicyRejection),

    /// The requested or bound database name is not permitted
    #[error("database name not allowed: {0}")]
    ResourceNameNotAllowed(String),

    /// The temporary credential key is unknown, expired, or already used
    #[error("temporary credential not found")]
    TemporarySecretNotFound,

    /// The session reference no longer resolves to a stored secret
    #[error("session expired or signed out")]
    SessionExpired,

    /// The connection test failed; the driver message is preserved
    /// verbatim
    #[error("connection test failed: {0}")]
    ConnectionTestFailed(String),

    /// A flow bug drove the session through an illegal transition
    #[error("internal session error: {0}")]
    Internal(String),
}

impl From<InvalidTransition> for AuthRejection {
    fn from(err: InvalidTransition) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Credentials submitted for direct sign-in.
#[derive(Clone)]
pub struct SignInRequest {
    /// Data-source text: `host[\instance][,port]` or `.`
    pub server: String,
    /// Login user name
    pub user: String,
    /// Kind of credential presented
    pub kind: CredentialKind,
    /// The disclosed password
    pub password: String,
    /// Whether to trust the server certificate
    pub trust_server_certificate: bool,
    /// Database to bind the session to, if already chosen
    pub database: Option<String>,
}

impl fmt::Debug for SignInRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInRequest")
            .field("server", &self.server)
            .field("user", &self.user)
            .field("kind", &self.kind)
            .field("password", &"<redacted>")
            .field("trust_server_certificate", &self.trust_server_certificate)
            .field("database", &self.database)
            .finish()
    }
}

/// A successful authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    /// Opaque reference to the stored secret; the only thing the client
    /// keeps
    pub reference: SecretRef,
    /// Server version string reported by the connection test
    pub server_version: Option<String>,
}

/// Orchestrates policy validation, connection testing, and the secret
/// lifecycle.
pub struct Authenticator<C> {
    validator: PolicyValidator,
    filter: DatabaseNameFilter,
    store: Arc<SecretStore>,
    connector: C,
}

impl<C: TryConnect> Authenticator<C> {
    /// Assemble an authenticator from its parts.
    pub fn new(
        validator: PolicyValidator,
        filter: DatabaseNameFilter,
        store: Arc<SecretStore>,
        connector: C,
    ) -> Self {
        Self {
            validator,
            filter,
            store,
            connector,
        }
    }

    /// Build an authenticator from configuration, failing fast on
    /// malformed allow-list entries or wildcard patterns.
    ///
    /// # Errors
    /// Returns a format error naming the offending token.
    pub fn from_config(config: &GateConfig, connector: C) -> Result<Self, GateError> {
        let rules = PolicyRules::from_config(&config.policy, &config.session)
            .map_err(|e| GateError::Policy(e.to_string()))?;
        let filter = DatabaseNameFilter::from_config(&config.policy)
            .map_err(|e| GateError::Filter(e.to_string()))?;
        let store = Arc::new(SecretStore::from_config(&config.session));

        Ok(Self::new(PolicyValidator::new(rules), filter, store, connector))
    }

    /// The shared secret store.
    #[must_use]
    pub fn store(&self) -> &SecretStore {
        &self.store
    }

    /// Run the full sign-in flow: policy validation, connection test,
    /// secret storage.
    ///
    /// # Errors
    /// Returns the specific rejection; on success the caller receives the
    /// opaque reference to hold in its session token.
    pub async fn authenticate(
        &self,
        request: &SignInRequest,
    ) -> Result<AuthOutcome, AuthRejection> {
        let mut session = AuthorizationSession::new();
        session.advance(SessionState::PendingPolicyCheck)?;

        if let Some(database) = &request.database {
            if !self.filter.is_allowed(database) {
                session.advance(SessionState::Rejected)?;
                return Err(AuthRejection::ResourceNameNotAllowed(database.clone()));
            }
        }

        let credential =
            TempCredential::new(request.password.clone(), request.trust_server_certificate);
        let (target, secret) = match self
            .run_policy_check(&request.server, request.kind, credential, request.database.clone())
            .await
        {
            Ok(accepted) => accepted,
            Err(rejection) => {
                session.advance(SessionState::Rejected)?;
                tracing::info!(
                    "Sign-in rejected for {}@{}: {rejection}",
                    request.user,
                    request.server
                );
                return Err(rejection);
            }
        };

        session.advance(SessionState::ConnectionTestPending)?;
        let params = ConnectionParams {
            target,
            user: request.user.clone(),
            secret: secret.clone(),
        };

        let version = match self.connector.try_connect(&params).await {
            Ok(version) => version,
            Err(err) => {
                session.advance(SessionState::Rejected)?;
                tracing::info!(
                    "Connection test failed for {}@{}: {err}",
                    request.user,
                    request.server
                );
                return Err(AuthRejection::ConnectionTestFailed(err.0));
            }
        };

        session.advance(SessionState::Authenticated)?;
        let reference = self.store.store(secret);
        tracing::info!("Authenticated {}@{}", request.user, request.server);

        Ok(AuthOutcome {
            reference,
            server_version: Some(version),
        })
    }

    /// Park a disclosed credential for the database-selection step and
    /// return the single-use key for it.
    #[must_use]
    pub fn begin_database_selection(
        &self,
        user: &str,
        server: &str,
        password: &str,
        trust_server_certificate: bool,
    ) -> String {
        self.store
            .set_temp(user, server, TempCredential::new(password, trust_server_certificate))
    }

    /// Test a parked credential without signing in or consuming it.
    ///
    /// # Errors
    /// Returns the policy or connection rejection; the parked credential
    /// survives for further attempts.
    pub async fn test_credential(
        &self,
        server: &str,
        user: &str,
        temp_key: &str,
        database: Option<&str>,
    ) -> Result<String, AuthRejection> {
        let credential = self
            .store
            .peek_temp(temp_key)
            .ok_or(AuthRejection::TemporarySecretNotFound)?;

        if let Some(database) = database {
            if !self.filter.is_allowed(database) {
                return Err(AuthRejection::ResourceNameNotAllowed(database.to_string()));
            }
        }

        let (target, secret) = self
            .run_policy_check(
                server,
                CredentialKind::Password,
                credential,
                database.map(ToString::to_string),
            )
            .await?;

        let params = ConnectionParams {
            target,
            user: user.to_string(),
            secret,
        };
        self.connector
            .try_connect(&params)
            .await
            .map_err(|e| AuthRejection::ConnectionTestFailed(e.0))
    }

    /// List the databases visible to a parked credential, filtered by the
    /// configured name rules. Input order from the server is preserved.
    ///
    /// # Errors
    /// Returns the policy or connection rejection.
    pub async fn list_databases(
        &self,
        server: &str,
        user: &str,
        temp_key: &str,
    ) -> Result<Vec<String>, AuthRejection> {
        let credential = self
            .store
            .peek_temp(temp_key)
            .ok_or(AuthRejection::TemporarySecretNotFound)?;

        let (target, secret) = self
            .run_policy_check(server, CredentialKind::Password, credential, None)
            .await?;

        let params = ConnectionParams {
            target,
            user: user.to_string(),
            secret,
        };
        let names = self
            .connector
            .list_databases(&params)
            .await
            .map_err(|e| AuthRejection::ConnectionTestFailed(e.0))?;

        Ok(self.filter.list_allowed(names))
    }

    /// Finalize the hand-off: consume the parked credential, bind the
    /// chosen database, and sign in.
    ///
    /// The take is destructive; replaying the same key is rejected with
    /// `TemporarySecretNotFound` even if this attempt fails afterwards.
    ///
    /// # Errors
    /// Returns the specific rejection.
    pub async fn finalize_database_selection(
        &self,
        server: &str,
        user: &str,
        temp_key: &str,
        database: &str,
    ) -> Result<AuthOutcome, AuthRejection> {
        let credential = self
            .store
            .take_temp(temp_key)
            .ok_or(AuthRejection::TemporarySecretNotFound)?;

        let request = SignInRequest {
            server: server.to_string(),
            user: user.to_string(),
            kind: CredentialKind::Password,
            password: credential.password().to_string(),
            trust_server_certificate: credential.trust_server_certificate,
            database: Some(database.to_string()),
        };

        self.authenticate(&request).await
    }

    /// Resolve a session reference on an authorized request, revalidating
    /// inline if the deadline has passed.
    ///
    /// On successful revalidation the stored secret is replaced under the
    /// same key with a fresh deadline; on failure it is discarded and the
    /// rejection is returned.
    ///
    /// # Errors
    /// Returns `SessionExpired` for unknown references, the bound-name
    /// rejection if the database filter no longer permits the session,
    /// or the policy rejection from a failed revalidation.
    pub async fn validate_session(
        &self,
        server: &str,
        reference: &SecretRef,
    ) -> Result<StoredSecret, AuthRejection> {
        let mut session = AuthorizationSession::resumed();

        let Some(secret) = self.store.retrieve(reference) else {
            return Err(AuthRejection::SessionExpired);
        };

        if let Some(database) = &secret.database {
            if !self.filter.is_allowed(database) {
                session.advance(SessionState::Rejected)?;
                return Err(AuthRejection::ResourceNameNotAllowed(database.clone()));
            }
        }

        if !secret.needs_revalidation(Utc::now()) {
            return Ok(secret);
        }

        session.advance(SessionState::NeedsRevalidation)?;
        tracing::debug!("Revalidating session {reference}");

        let credential =
            TempCredential::new(secret.password(), secret.trust_server_certificate);
        match self
            .run_policy_check(server, secret.kind, credential, secret.database.clone())
            .await
        {
            Ok((_, fresh)) => {
                self.store.renew(reference, fresh.clone());
                session.advance(SessionState::Authenticated)?;
                Ok(fresh)
            }
            Err(rejection) => {
                self.store.remove(reference);
                session.advance(SessionState::Rejected)?;
                tracing::info!("Revalidation failed for session {reference}: {rejection}");
                Err(rejection)
            }
        }
    }

    /// Sign out: destroy the durable secret behind the reference.
    pub fn sign_out(&self, reference: &SecretRef) {
        self.store.remove(reference);
        tracing::info!("Signed out session {reference}");
    }

    /// Parse the target and run the policy validator.
    async fn run_policy_check(
        &self,
        server: &str,
        kind: CredentialKind,
        credential: TempCredential,
        database: Option<String>,
    ) -> Result<(ConnectionTarget, StoredSecret), AuthRejection> {
        let target = ConnectionTarget::parse(server)
            .map_err(|_| AuthRejection::Policy(PolicyRejection::UnresolvableAddress))?;

        let request = ValidationRequest {
            target: target.clone(),
            kind,
            credential,
            database,
        };

        let secret = self.validator.validate(&request).await?;
        Ok((target, secret))
    }
}
