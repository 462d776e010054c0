//! Provider-facing types and error definitions.

use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors that can occur while talking to the wallet provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// No wallet provider is present in this environment.
    #[error("No wallet provider available; install a wallet to continue")]
    Unavailable,

    /// The user declined the connection prompt, or the prompt failed.
    #[error("Connection rejected: {0}")]
    UserRejected(String),

    /// A chain or balance query failed after connection.
    #[error("Provider query failed: {0}")]
    QueryFailed(String),
}

impl ProviderError {
    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Unavailable => "unavailable",
            ProviderError::UserRejected(_) => "rejected",
            ProviderError::QueryFailed(_) => "query_failed",
        }
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Notification pushed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The set of exposed accounts changed. Empty means fully disconnected.
    AccountsChanged(Vec<String>),
    /// The selected chain changed. Carries the raw chain id as pushed.
    ChainChanged(String),
}

impl ProviderEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderEvent::AccountsChanged(_) => "accounts_changed",
            ProviderEvent::ChainChanged(_) => "chain_changed",
        }
    }
}

type Teardown = Box<dyn FnOnce() + Send>;

/// Handle to an active provider event subscription.
///
/// Tears down every listener it registered exactly once, either on the
/// first `unsubscribe()` call or on drop.
pub struct Subscription {
    teardown: Mutex<Option<Teardown>>,
}

impl Subscription {
    /// Wrap a teardown callback.
    pub fn new<F>(teardown: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            teardown: Mutex::new(Some(Box::new(teardown))),
        }
    }

    /// Remove the listeners. Returns `false` if already removed.
    pub fn unsubscribe(&self) -> bool {
        let teardown = self
            .teardown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match teardown {
            Some(f) => {
                f();
                true
            }
            None => false,
        }
    }

    /// Whether the listeners are still registered.
    pub fn is_active(&self) -> bool {
        self.teardown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
