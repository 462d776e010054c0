//! Session state types.
//!
//! # States
//! - Disconnected: no account resolved (initial)
//! - Connecting: a connect attempt is in flight
//! - Connected: an account has been refreshed successfully
//!
//! # State Transitions
//! ```text
//! Disconnected → Connecting: connect()
//! Connecting → Connected: accounts granted and first refresh applied
//! Connecting → Disconnected: rejected, no provider, or no accounts
//! Connected → Disconnected: accounts cleared, chain changed (reset policy), reset()
//! ```

use serde::Serialize;

use crate::chain::registry::NetworkInfo;
use crate::chain::units::EMPTY_BALANCE;
use crate::provider::types::ProviderError;

/// The synchronized account view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    /// Connected account. Empty when disconnected.
    pub address: String,
    /// Native balance, 4 decimals, or "0.00" when disconnected.
    pub balance: String,
    /// A connect attempt is in flight.
    pub connecting: bool,
}

impl Session {
    pub fn is_active(&self) -> bool {
        !self.address.is_empty()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            address: String::new(),
            balance: EMPTY_BALANCE.to_string(),
            connecting: false,
        }
    }
}

/// Derived lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Disconnected,
    Connecting,
    Connected,
}

/// Everything a renderer needs, published as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SessionSnapshot {
    pub session: Session,
    pub network: NetworkInfo,
    /// Last connect attempt found no wallet provider.
    pub install_required: bool,
    /// Token of the last accepted write. Only grows.
    pub revision: u64,
}

impl SessionSnapshot {
    pub fn phase(&self) -> SessionPhase {
        if self.session.connecting {
            SessionPhase::Connecting
        } else if self.session.is_active() {
            SessionPhase::Connected
        } else {
            SessionPhase::Disconnected
        }
    }
}

/// Result of a refresh attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New values were published.
    Applied,
    /// A newer write landed first; these values were discarded.
    Stale,
    /// A provider query failed; state was left as it was.
    Failed(ProviderError),
    /// Nothing to refresh (empty address).
    Skipped,
    /// The session was reset to `Disconnected` instead of refreshed.
    Reset,
}

impl RefreshOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RefreshOutcome::Applied => "applied",
            RefreshOutcome::Stale => "stale",
            RefreshOutcome::Failed(_) => "failed",
            RefreshOutcome::Skipped => "skipped",
            RefreshOutcome::Reset => "reset",
        }
    }
}

/// Result of a connect attempt. Never an error: failures are recoverable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The wallet granted `address`; `refresh` tells whether it was published.
    Connected { address: String, refresh: RefreshOutcome },
    /// Another connect was already in flight; nothing was requested.
    AlreadyConnecting,
    /// The wallet granted an empty account list.
    NoAccounts,
    /// The user declined or the prompt failed.
    Rejected,
    /// No wallet provider is installed.
    ProviderMissing,
}

impl ConnectOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectOutcome::Connected { .. } => "connected",
            ConnectOutcome::AlreadyConnecting => "already_connecting",
            ConnectOutcome::NoAccounts => "no_accounts",
            ConnectOutcome::Rejected => "rejected",
            ConnectOutcome::ProviderMissing => "provider_missing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot() {
        let snapshot = SessionSnapshot::default();
        assert_eq!(snapshot.session.address, "");
        assert_eq!(snapshot.session.balance, "0.00");
        assert!(!snapshot.session.connecting);
        assert_eq!(snapshot.network.name, "Checking...");
        assert_eq!(snapshot.revision, 0);
        assert_eq!(snapshot.phase(), SessionPhase::Disconnected);
    }

    #[test]
    fn test_phase_derivation() {
        let mut snapshot = SessionSnapshot::default();
        snapshot.session.connecting = true;
        assert_eq!(snapshot.phase(), SessionPhase::Connecting);

        snapshot.session.connecting = false;
        snapshot.session.address = "0xabc".to_string();
        assert_eq!(snapshot.phase(), SessionPhase::Connected);
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_value(SessionSnapshot::default()).unwrap();
        assert_eq!(json["session"]["balance"], "0.00");
        assert_eq!(json["network"]["name"], "Checking...");
    }
}
