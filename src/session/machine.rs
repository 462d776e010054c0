//! Session state machine.
//!
//! # Responsibilities
//! - Own the canonical `SessionSnapshot`
//! - Run the connect handshake (optional chain switch, account request)
//! - Refresh chain and balance for an address and publish atomically
//! - Apply provider events (accounts changed, chain changed)
//!
//! # Ordering
//! Every refresh and reset takes a token from a monotonic counter at the
//! moment it is *issued*, and in the same step records the address the
//! session is now converging on (the *target*). A write is accepted only if
//! its token is newer than the snapshot's `revision` and its address is still
//! the target, both checked under the channel lock. Responses that arrive out
//! of order, or for an account the wallet has since left, are discarded.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use crate::chain::{format_balance, ChainRegistry, NetworkInfo};
use crate::config::{ChainChangePolicy, SessionConfig};
use crate::observability::metrics;
use crate::provider::{ProviderError, ProviderGateway};
use crate::session::state::{ConnectOutcome, RefreshOutcome, Session, SessionPhase, SessionSnapshot};

/// Address the session is converging on, and the newest token issued.
#[derive(Debug, Default)]
struct Target {
    address: String,
    token: u64,
}

struct Inner {
    gateway: ProviderGateway,
    registry: ChainRegistry,
    preferred_chain_id: Option<String>,
    state: watch::Sender<SessionSnapshot>,
    target: Mutex<Target>,
    connecting: AtomicBool,
}

/// Owner of the session snapshot and its transition rules.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionStateMachine {
    inner: Arc<Inner>,
}

impl SessionStateMachine {
    /// Create a machine in the `Disconnected` state.
    pub fn new(gateway: ProviderGateway, registry: ChainRegistry, config: &SessionConfig) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                gateway,
                registry,
                preferred_chain_id: config.preferred_chain_id.clone(),
                state,
                target: Mutex::new(Target::default()),
                connecting: AtomicBool::new(false),
            }),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.inner.state.borrow().phase()
    }

    /// Read-only feed of snapshot changes for renderers.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn gateway(&self) -> &ProviderGateway {
        &self.inner.gateway
    }

    /// Connect to the wallet.
    ///
    /// No-op returning `AlreadyConnecting` while another connect is in flight.
    /// Failures leave the session as it was.
    pub async fn connect(&self) -> ConnectOutcome {
        if self
            .inner
            .connecting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Connect already in progress, ignoring");
            metrics::record_connect(ConnectOutcome::AlreadyConnecting.label());
            return ConnectOutcome::AlreadyConnecting;
        }

        let _connecting = ConnectingGuard::engage(self);
        let outcome = self.handshake().await;
        metrics::record_connect(outcome.label());
        outcome
    }

    async fn handshake(&self) -> ConnectOutcome {
        let gateway = &self.inner.gateway;

        if let Some(chain_id) = &self.inner.preferred_chain_id {
            if let Err(e) = gateway.switch_chain(chain_id).await {
                return self.connect_failed(e);
            }
            tracing::debug!(chain_id = %chain_id, "Wallet switched to preferred chain");
        }

        let accounts = match gateway.request_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => return self.connect_failed(e),
        };

        let Some(address) = accounts.into_iter().next() else {
            tracing::info!("Wallet returned no accounts");
            return ConnectOutcome::NoAccounts;
        };

        tracing::info!(address = %address, "Wallet connected");
        let refresh = self.refresh(&address).await;
        ConnectOutcome::Connected { address, refresh }
    }

    fn connect_failed(&self, error: ProviderError) -> ConnectOutcome {
        match error {
            ProviderError::Unavailable => {
                tracing::warn!("No wallet provider found; install required");
                self.publish(|snap| {
                    let changed = !snap.install_required;
                    snap.install_required = true;
                    changed
                });
                ConnectOutcome::ProviderMissing
            }
            other => {
                tracing::info!(error = %other, "User rejected or switch failed");
                ConnectOutcome::Rejected
            }
        }
    }

    /// Refresh chain and balance for `address` and publish them together.
    ///
    /// The ordering token is taken when this is called, not when the returned
    /// future is first polled, so issue order is call order. `address` becomes
    /// the session's target; writes for any other address are dropped.
    pub fn refresh(&self, address: &str) -> impl Future<Output = RefreshOutcome> + Send + 'static {
        let token = (!address.is_empty()).then(|| self.retarget(address));
        self.pending_refresh(address.to_string(), token)
    }

    /// Refresh the address the session is converging on.
    ///
    /// This is the wallet's most recently reported account, which may not be
    /// published yet.
    pub fn refresh_current(&self) -> impl Future<Output = RefreshOutcome> + Send + 'static {
        let (address, token) = {
            let mut target = self.lock_target();
            if target.address.is_empty() {
                (String::new(), None)
            } else {
                target.token += 1;
                (target.address.clone(), Some(target.token))
            }
        };
        self.pending_refresh(address, token)
    }

    fn pending_refresh(
        &self,
        address: String,
        token: Option<u64>,
    ) -> impl Future<Output = RefreshOutcome> + Send + 'static {
        let machine = self.clone();
        async move {
            match token {
                Some(token) => machine.refresh_with_token(&address, token).await,
                None => RefreshOutcome::Skipped,
            }
        }
    }

    async fn refresh_with_token(&self, address: &str, token: u64) -> RefreshOutcome {
        let gateway = &self.inner.gateway;

        let chain_id = match gateway.chain_id().await {
            Ok(id) => id,
            Err(e) => return self.refresh_failed(address, e),
        };
        let network = self.inner.registry.lookup(&chain_id);

        let wei = match gateway.balance(address).await {
            Ok(wei) => wei,
            Err(e) => return self.refresh_failed(address, e),
        };
        let balance = format_balance(wei);

        let log_balance = balance.clone();
        let log_network = network.name.clone();
        let applied = self.publish(move |snap| {
            if token <= snap.revision || !self.is_target(address) {
                return false;
            }
            snap.revision = token;
            snap.session.address = address.to_string();
            snap.session.balance = balance;
            snap.network = network;
            snap.install_required = false;
            true
        });

        if applied {
            tracing::debug!(
                address = %address,
                network = %log_network,
                balance = %log_balance,
                token,
                "Session refreshed"
            );
            metrics::record_refresh(RefreshOutcome::Applied.label());
            RefreshOutcome::Applied
        } else {
            tracing::debug!(address = %address, token, "Discarding stale refresh");
            metrics::record_refresh(RefreshOutcome::Stale.label());
            RefreshOutcome::Stale
        }
    }

    fn refresh_failed(&self, address: &str, error: ProviderError) -> RefreshOutcome {
        tracing::warn!(address = %address, error = %error, "Auto-sync error; keeping last known state");
        metrics::record_refresh("failed");
        RefreshOutcome::Failed(error)
    }

    /// Apply an `accountsChanged` notification.
    ///
    /// An empty list resets the session immediately; otherwise the first
    /// account is refreshed.
    pub fn on_accounts_changed(
        &self,
        accounts: &[String],
    ) -> impl Future<Output = RefreshOutcome> + Send + 'static {
        let pending = match accounts.first() {
            Some(address) => Some(self.refresh(address)),
            None => {
                tracing::info!("Wallet disconnected all accounts");
                self.reset();
                None
            }
        };

        async move {
            match pending {
                Some(refresh) => refresh.await,
                None => RefreshOutcome::Reset,
            }
        }
    }

    /// Apply a `chainChanged` notification according to `policy`.
    ///
    /// `Reset` drops the session back to `Disconnected` synchronously; any
    /// refresh still in flight is discarded when it completes.
    pub fn on_chain_changed(
        &self,
        chain_id: &str,
        policy: ChainChangePolicy,
    ) -> impl Future<Output = RefreshOutcome> + Send + 'static {
        tracing::info!(chain_id = %chain_id, ?policy, "Wallet chain changed");

        let pending = match policy {
            ChainChangePolicy::Reset => {
                self.reset();
                None
            }
            ChainChangePolicy::Resync => Some(self.refresh_current()),
        };

        async move {
            match pending {
                Some(refresh) => refresh.await,
                None => RefreshOutcome::Reset,
            }
        }
    }

    /// Return to `Disconnected`, discarding every write issued before now.
    ///
    /// An in-flight connect keeps its `connecting` flag.
    pub fn reset(&self) -> bool {
        let token = self.retarget("");
        let reset = self.publish(|snap| {
            if token <= snap.revision {
                return false;
            }
            *snap = SessionSnapshot {
                session: Session {
                    connecting: snap.session.connecting,
                    ..Session::default()
                },
                network: NetworkInfo::pending(),
                install_required: snap.install_required,
                revision: token,
            };
            true
        });

        if reset {
            tracing::info!(token, "Session reset to disconnected");
        }
        reset
    }

    fn lock_target(&self) -> MutexGuard<'_, Target> {
        self.inner.target.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Point the session at `address` and take the next token in one step.
    fn retarget(&self, address: &str) -> u64 {
        let mut target = self.lock_target();
        target.address = address.to_string();
        target.token += 1;
        target.token
    }

    fn is_target(&self, address: &str) -> bool {
        self.lock_target().address == address
    }

    /// Single write path for the snapshot.
    fn publish<F>(&self, modify: F) -> bool
    where
        F: FnOnce(&mut SessionSnapshot) -> bool,
    {
        self.inner.state.send_if_modified(modify)
    }

    fn set_connecting(&self, connecting: bool) {
        self.publish(|snap| {
            let changed = snap.session.connecting != connecting;
            snap.session.connecting = connecting;
            changed
        });
    }
}

impl std::fmt::Debug for SessionStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStateMachine")
            .field("gateway", &self.inner.gateway)
            .field("snapshot", &*self.inner.state.borrow())
            .finish()
    }
}

/// Holds the `connecting` flag for one connect attempt and clears it on drop,
/// including when the attempt's future is cancelled.
struct ConnectingGuard<'a> {
    machine: &'a SessionStateMachine,
}

impl<'a> ConnectingGuard<'a> {
    fn engage(machine: &'a SessionStateMachine) -> Self {
        machine.set_connecting(true);
        Self { machine }
    }
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        self.machine.set_connecting(false);
        self.machine.inner.connecting.store(false, Ordering::SeqCst);
    }
}
