//! Session driver: the owning context of a wallet session.
//!
//! # Responsibilities
//! - Subscribe to provider events and route them into the state machine
//! - Start polling when the session becomes active, stop it when inactive
//! - Tear down listeners and timers on shutdown
//!
//! Event handlers take their ordering token synchronously, in arrival order,
//! then run the provider calls on a spawned task so the loop never waits on
//! the network.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{ChainChangePolicy, SyncConfig};
use crate::observability::metrics;
use crate::polling::PollingScheduler;
use crate::provider::ProviderEvent;
use crate::session::machine::SessionStateMachine;
use crate::session::state::RefreshOutcome;

pub struct SessionDriver {
    machine: SessionStateMachine,
    scheduler: Arc<PollingScheduler>,
    policy: ChainChangePolicy,
    session_id: Uuid,
}

impl SessionDriver {
    pub fn new(machine: SessionStateMachine, config: &SyncConfig) -> Self {
        Self::with_scheduler(
            machine,
            PollingScheduler::from_config(&config.polling),
            config.session.chain_change_policy,
        )
    }

    pub fn with_scheduler(
        machine: SessionStateMachine,
        scheduler: PollingScheduler,
        policy: ChainChangePolicy,
    ) -> Self {
        Self {
            machine,
            scheduler: Arc::new(scheduler),
            policy,
            session_id: Uuid::new_v4(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn machine(&self) -> &SessionStateMachine {
        &self.machine
    }

    /// Shared handle to the scheduler, for inspection while running.
    pub fn scheduler(&self) -> Arc<PollingScheduler> {
        self.scheduler.clone()
    }

    /// Run until `shutdown` fires (or its sender is dropped).
    pub async fn run(self, shutdown: broadcast::Receiver<()>) {
        let span = tracing::info_span!("session", id = %self.session_id);
        self.run_loop(shutdown).instrument(span).await
    }

    async fn run_loop(self, mut shutdown: broadcast::Receiver<()>) {
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let subscription = self.machine.gateway().subscribe(events_tx);
        match &subscription {
            Some(_) => tracing::info!("Listening for wallet account and chain changes"),
            None => tracing::info!("No wallet provider; event listeners not registered"),
        }

        let mut snapshots = self.machine.subscribe();
        let active = snapshots.borrow_and_update().session.is_active();
        self.sync_polling(active);

        loop {
            tokio::select! {
                Some(event) = events.recv() => {
                    self.handle_event(event);
                }
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let active = snapshots.borrow_and_update().session.is_active();
                    self.sync_polling(active);
                }
                _ = shutdown.recv() => {
                    tracing::info!("Session driver received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
        self.scheduler.stop();
        metrics::set_session_active(false);
        tracing::info!("Session torn down");
    }

    fn handle_event(&self, event: ProviderEvent) {
        metrics::record_provider_event(event.kind());

        match event {
            ProviderEvent::AccountsChanged(accounts) => {
                tracing::debug!(count = accounts.len(), "Accounts changed");
                self.spawn_refresh(self.machine.on_accounts_changed(&accounts));
            }
            ProviderEvent::ChainChanged(chain_id) => {
                self.spawn_refresh(self.machine.on_chain_changed(&chain_id, self.policy));
            }
        }
    }

    fn spawn_refresh<F>(&self, pending: F)
    where
        F: Future<Output = RefreshOutcome> + Send + 'static,
    {
        tokio::spawn(
            async move {
                let outcome = pending.await;
                tracing::debug!(outcome = outcome.label(), "Event refresh finished");
            }
            .in_current_span(),
        );
    }

    fn sync_polling(&self, active: bool) {
        if active {
            self.scheduler.start(self.machine.clone());
        } else {
            self.scheduler.stop();
        }
        metrics::set_session_active(active);
    }
}

impl std::fmt::Debug for SessionDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionDriver")
            .field("session_id", &self.session_id)
            .field("policy", &self.policy)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
