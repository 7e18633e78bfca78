//! The authorization session state machine.
//!
//! Every request-scoped flow drives a session through these states; the
//! machine always resolves to either `Authenticated` or `Rejected`, and
//! illegal transitions are programming errors surfaced as typed errors
//! rather than silent state corruption.

use thiserror::Error;

/// The lifecycle states of an authorization session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No credentials submitted yet
    Unauthenticated,
    /// Credentials submitted, policy validation in progress
    PendingPolicyCheck,
    /// Policy accepted, connection test in progress
    ConnectionTestPending,
    /// Standing authorization; the session remains here until the
    /// revalidation deadline passes
    Authenticated,
    /// Revalidation deadline passed, re-check in progress
    NeedsRevalidation,
    /// Terminal: the caller must re-enter credentials
    Rejected,
}

/// An illegal state transition was attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid session transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    /// State the session was in
    pub from: SessionState,
    /// State that was requested
    pub to: SessionState,
}

/// A request-scoped authorization session.
#[derive(Debug, Clone)]
pub struct AuthorizationSession {
    state: SessionState,
}

impl Default for AuthorizationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorizationSession {
    /// Start a fresh, unauthenticated session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::Unauthenticated,
        }
    }

    /// Resume a session whose reference resolved to a stored secret.
    #[must_use]
    pub fn resumed() -> Self {
        Self {
            state: SessionState::Authenticated,
        }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session is in a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            SessionState::Authenticated | SessionState::Rejected
        )
    }

    /// Advance to `next`, enforcing the transition table.
    ///
    /// # Errors
    /// Returns [`InvalidTransition`] when the edge is not allowed; the
    /// session state is left unchanged.
    pub fn advance(&mut self, next: SessionState) -> Result<(), InvalidTransition> {
        if !transition_allowed(self.state, next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::trace!("Session {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }
}

/// The transition table.
fn transition_allowed(from: SessionState, to: SessionState) -> bool {
    use SessionState::{
        Authenticated, ConnectionTestPending, NeedsRevalidation, PendingPolicyCheck, Rejected,
        Unauthenticated,
    };

    matches!(
        (from, to),
        (Unauthenticated, PendingPolicyCheck)
            | (PendingPolicyCheck, ConnectionTestPending | Rejected)
            | (ConnectionTestPending, Authenticated | Rejected)
            | (Authenticated, NeedsRevalidation | Rejected)
            | (NeedsRevalidation, Authenticated | Rejected)
    )
}
