//! Connection policy validation.
//!
//! [`PolicyValidator`] decides whether the broker may open a connection
//! toward a caller-supplied target. Checks run in a fixed order and
//! short-circuit on the first rejection; acceptance produces the
//! [`StoredSecret`] that backs the authorized session, stamped with the
//! next revalidation deadline.

use crate::range::AddressSpec;
use crate::reserved::{classify, NetworkClass};
use crate::resolve::resolve_target;
use crate::{PolicyError, Result};
use chrono::{Duration, Utc};
use sqlgate_core::config::{PolicyConfig, SessionConfig};
use sqlgate_core::{ConnectionTarget, CredentialKind, StoredSecret, TempCredential};
use std::net::IpAddr;
use thiserror::Error;

/// An expected, recoverable policy rejection.
///
/// Every variant maps to a single human-readable message surfaced to the
/// caller; none are process-fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyRejection {
    /// Integrated/OS authentication requested but disallowed by policy
    #[error("integrated authentication not allowed")]
    IntegratedAuthNotAllowed,

    /// Trusting the server certificate requested but disallowed by policy
    #[error("trusting the server certificate not allowed")]
    TrustServerCertNotAllowed,

    /// The target host name could not be resolved
    #[error("unable to resolve server address")]
    UnresolvableAddress,

    /// Resolution produced no usable (non-unspecified) address
    #[error("no IP address found for server")]
    NoUsableAddress,

    /// No resolved address is contained in the configured allow-list
    #[error("address not allowed by allow-list ({0})")]
    AddressNotInAllowList(String),

    /// A resolved address is loopback and loopback is disallowed
    #[error("loopback connections not allowed")]
    LoopbackNotAllowed,

    /// A resolved address is in a reserved range and private-network
    /// access is disallowed
    #[error("private network connections not allowed")]
    PrivateNetworkNotAllowed,
}

/// Immutable per-request snapshot of the network policy.
///
/// When `allow_list` is non-empty it is the sole authority and the
/// loopback/private toggles are ignored entirely.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct PolicyRules {
    /// Allow integrated/OS authentication
    pub allow_integrated_auth: bool,
    /// Allow callers to request trusting the server certificate
    pub allow_trust_server_certificate: bool,
    /// Allow loopback targets (ignored when `allow_list` is non-empty)
    pub allow_loopback: bool,
    /// Allow private/reserved-network targets (ignored when `allow_list`
    /// is non-empty)
    pub allow_private_network: bool,
    /// Explicit allow-list; non-empty means it replaces the toggles
    pub allow_list: Vec<AddressSpec>,
    /// How long an accepted authorization stands before the policy is
    /// re-checked
    pub revalidate_cadence: Duration,
}

impl Default for PolicyRules {
    fn default() -> Self {
        Self {
            allow_integrated_auth: false,
            allow_trust_server_certificate: false,
            allow_loopback: false,
            allow_private_network: false,
            allow_list: Vec::new(),
            revalidate_cadence: Duration::minutes(5),
        }
    }
}

impl PolicyRules {
    /// Build validated rules from raw configuration.
    ///
    /// # Errors
    /// Fails fast with a format error naming the offending token when any
    /// allow-list entry is not a valid address, CIDR range, or subnet mask.
    pub fn from_config(policy: &PolicyConfig, session: &SessionConfig) -> Result<Self> {
        let mut allow_list = Vec::with_capacity(policy.allowed_addresses.len());
        for entry in &policy.allowed_addresses {
            if entry.trim().is_empty() {
                continue;
            }
            allow_list.push(AddressSpec::parse(entry)?);
        }

        let minutes = i64::try_from(session.revalidate_minutes)
            .ok()
            .filter(|m| Duration::try_minutes(*m).is_some())
            .ok_or(PolicyError::InvalidCadence(session.revalidate_minutes))?;

        Ok(Self {
            allow_integrated_auth: policy.allow_integrated_auth,
            allow_trust_server_certificate: policy.allow_trust_server_certificate,
            allow_loopback: policy.allow_loopback,
            allow_private_network: policy.allow_private_network,
            allow_list,
            revalidate_cadence: Duration::minutes(minutes),
        })
    }
}

/// A request to validate a connection attempt against policy.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    /// Parsed connection target
    pub target: ConnectionTarget,
    /// Kind of credential the caller presents
    pub kind: CredentialKind,
    /// The disclosed credential (password and trust flag)
    pub credential: TempCredential,
    /// Database name to bind the session to, if one was selected
    pub database: Option<String>,
}

/// Validates connection attempts against an immutable policy snapshot.
#[derive(Debug, Clone)]
pub struct PolicyValidator {
    rules: PolicyRules,
}

impl PolicyValidator {
    /// Create a validator over the given rules.
    #[must_use]
    pub fn new(rules: PolicyRules) -> Self {
        Self { rules }
    }

    /// The rules this validator enforces.
    #[must_use]
    pub fn rules(&self) -> &PolicyRules {
        &self.rules
    }

    /// Validate a connection attempt.
    ///
    /// Checks run in order and short-circuit on the first rejection:
    /// credential kind, trust flag, resolution, unspecified-address
    /// filtering, then either the allow-list (sole authority when
    /// configured) or the loopback/private toggles per classified address.
    ///
    /// # Errors
    /// Returns the specific [`PolicyRejection`]; acceptance yields a
    /// [`StoredSecret`] with `revalidate_after` set to now plus the
    /// configured cadence.
    pub async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> std::result::Result<StoredSecret, PolicyRejection> {
        let rules = &self.rules;

        if request.kind == CredentialKind::Integrated && !rules.allow_integrated_auth {
            tracing::debug!("Rejecting {}: integrated auth disallowed", request.target);
            return Err(PolicyRejection::IntegratedAuthNotAllowed);
        }

        if request.credential.trust_server_certificate && !rules.allow_trust_server_certificate {
            tracing::debug!("Rejecting {}: trust-server-cert disallowed", request.target);
            return Err(PolicyRejection::TrustServerCertNotAllowed);
        }

        let resolved = resolve_target(&request.target).await.map_err(|e| {
            tracing::debug!("Failed to resolve {}: {e}", request.target);
            PolicyRejection::UnresolvableAddress
        })?;

        let ips: Vec<IpAddr> = resolved
            .into_iter()
            .filter(|ip| !ip.is_unspecified())
            .collect();

        if ips.is_empty() {
            return Err(PolicyRejection::NoUsableAddress);
        }

        if rules.allow_list.is_empty() {
            self.check_reserved_ranges(&ips)?;
        } else {
            self.check_allow_list(&ips)?;
        }

        tracing::debug!("Accepted target {} ({} address(es))", request.target, ips.len());

        Ok(StoredSecret::from_temp(
            &request.credential,
            request.kind,
            Some(Utc::now() + rules.revalidate_cadence),
            request.database.clone(),
        ))
    }

    /// Allow-list tier: accept iff at least one resolved address is
    /// contained in at least one allow-list range.
    fn check_allow_list(&self, ips: &[IpAddr]) -> std::result::Result<(), PolicyRejection> {
        let allowed = ips
            .iter()
            .any(|ip| self.rules.allow_list.iter().any(|spec| spec.contains(*ip)));

        if allowed {
            Ok(())
        } else {
            let joined = ips
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            Err(PolicyRejection::AddressNotInAllowList(joined))
        }
    }

    /// Toggle tier: every resolved address must pass the loopback and
    /// private-network toggles.
    fn check_reserved_ranges(&self, ips: &[IpAddr]) -> std::result::Result<(), PolicyRejection> {
        let rules = &self.rules;
        if rules.allow_loopback && rules.allow_private_network {
            return Ok(());
        }

        for ip in ips {
            let class = classify(*ip);
            if class == NetworkClass::Loopback && !rules.allow_loopback {
                return Err(PolicyRejection::LoopbackNotAllowed);
            } else if class != NetworkClass::Public && !rules.allow_private_network {
                return Err(PolicyRejection::PrivateNetworkNotAllowed);
            }
        }

        Ok(())
    }
}
