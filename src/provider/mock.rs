//! In-memory wallet provider.
//!
//! Scriptable stand-in for a real wallet: fixed or queued responses,
//! per-call latency, call counters and manual event emission.

use alloy::primitives::U256;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::provider::types::{ProviderError, ProviderEvent, ProviderResult, Subscription};
use crate::provider::WalletProvider;

/// A queued response with artificial latency.
#[derive(Debug, Clone)]
struct Scripted<T> {
    delay: Duration,
    result: ProviderResult<T>,
}

#[derive(Debug, Default)]
struct MockState {
    accounts: Vec<String>,
    reject_accounts: bool,
    accounts_delay: Duration,
    chain_id: String,
    balance: U256,
    switch_rejected: bool,
    chain_script: VecDeque<Scripted<String>>,
    balance_script: VecDeque<Scripted<U256>>,
    subscribers: Vec<(u64, mpsc::UnboundedSender<ProviderEvent>)>,
    next_subscriber: u64,
    request_accounts_calls: usize,
    switch_calls: Vec<String>,
    chain_calls: usize,
    balance_calls: usize,
}

/// Scriptable in-memory wallet provider.
#[derive(Debug, Clone, Default)]
pub struct MockWalletProvider {
    state: Arc<Mutex<MockState>>,
}

impl MockWalletProvider {
    /// Empty wallet on chain "1" with zero balance and no accounts.
    pub fn new() -> Self {
        let mock = Self::default();
        mock.lock().chain_id = "1".to_string();
        mock
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_accounts(self, accounts: Vec<String>) -> Self {
        self.set_accounts(accounts);
        self
    }

    pub fn with_chain_id(self, chain_id: &str) -> Self {
        self.set_chain_id(chain_id);
        self
    }

    pub fn with_balance(self, wei: U256) -> Self {
        self.set_balance(wei);
        self
    }

    /// Delay before the account prompt answers.
    pub fn with_accounts_delay(self, delay: Duration) -> Self {
        self.lock().accounts_delay = delay;
        self
    }

    /// Decline every account request.
    pub fn rejecting(self) -> Self {
        self.lock().reject_accounts = true;
        self
    }

    /// Decline every chain switch.
    pub fn rejecting_switch(self) -> Self {
        self.lock().switch_rejected = true;
        self
    }

    pub fn set_accounts(&self, accounts: Vec<String>) {
        self.lock().accounts = accounts;
    }

    /// Change the chain the next `switch_chain` or `chain_id` sees.
    pub fn set_chain_id(&self, chain_id: &str) {
        self.lock().chain_id = chain_id.to_string();
    }

    pub fn set_balance(&self, wei: U256) {
        self.lock().balance = wei;
    }

    /// Queue a one-shot `chain_id` response, consumed in call order.
    pub fn push_chain_response(&self, delay: Duration, result: ProviderResult<String>) {
        self.lock().chain_script.push_back(Scripted { delay, result });
    }

    /// Queue a one-shot `balance` response, consumed in call order.
    pub fn push_balance_response(&self, delay: Duration, result: ProviderResult<U256>) {
        self.lock().balance_script.push_back(Scripted { delay, result });
    }

    /// Deliver an event to every live subscriber. Returns how many got it.
    pub fn emit(&self, event: ProviderEvent) -> usize {
        let mut state = self.lock();
        state
            .subscribers
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
        state.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    pub fn request_accounts_calls(&self) -> usize {
        self.lock().request_accounts_calls
    }

    pub fn switch_calls(&self) -> Vec<String> {
        self.lock().switch_calls.clone()
    }

    pub fn chain_calls(&self) -> usize {
        self.lock().chain_calls
    }

    pub fn balance_calls(&self) -> usize {
        self.lock().balance_calls
    }
}

async fn respond<T>(delay: Duration, result: ProviderResult<T>) -> ProviderResult<T> {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    result
}

#[async_trait]
impl WalletProvider for MockWalletProvider {
    async fn request_accounts(&self) -> ProviderResult<Vec<String>> {
        let (delay, result) = {
            let mut state = self.lock();
            state.request_accounts_calls += 1;
            let result = if state.reject_accounts {
                Err(ProviderError::UserRejected("User rejected the request".to_string()))
            } else {
                Ok(state.accounts.clone())
            };
            (state.accounts_delay, result)
        };
        respond(delay, result).await
    }

    async fn switch_chain(&self, chain_id: &str) -> ProviderResult<()> {
        let mut state = self.lock();
        state.switch_calls.push(chain_id.to_string());
        if state.switch_rejected {
            return Err(ProviderError::UserRejected(format!(
                "User rejected switch to {}",
                chain_id
            )));
        }
        state.chain_id = chain_id.to_string();
        Ok(())
    }

    async fn chain_id(&self) -> ProviderResult<String> {
        let scripted = {
            let mut state = self.lock();
            state.chain_calls += 1;
            state.chain_script.pop_front().unwrap_or_else(|| Scripted {
                delay: Duration::ZERO,
                result: Ok(state.chain_id.clone()),
            })
        };
        respond(scripted.delay, scripted.result).await
    }

    async fn balance(&self, _address: &str) -> ProviderResult<U256> {
        let scripted = {
            let mut state = self.lock();
            state.balance_calls += 1;
            state.balance_script.pop_front().unwrap_or_else(|| Scripted {
                delay: Duration::ZERO,
                result: Ok(state.balance),
            })
        };
        respond(scripted.delay, scripted.result).await
    }

    fn subscribe(&self, events: mpsc::UnboundedSender<ProviderEvent>) -> Subscription {
        let id = {
            let mut state = self.lock();
            let id = state.next_subscriber;
            state.next_subscriber += 1;
            state.subscribers.push((id, events));
            id
        };

        let state = self.state.clone();
        Subscription::new(move || {
            state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .subscribers
                .retain(|(sub_id, _)| *sub_id != id);
        })
    }
}
