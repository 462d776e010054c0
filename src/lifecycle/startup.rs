//! Startup orchestration.
//!
//! Builds the session stack in dependency order:
//! provider → gateway → state machine → driver.

use std::sync::Arc;

use crate::chain::ChainRegistry;
use crate::config::{ProviderConfig, SyncConfig};
use crate::provider::{ProviderGateway, RpcWalletProvider, WalletProvider};
use crate::session::{SessionDriver, SessionStateMachine};

/// Build the provider described by `config`.
///
/// `None` means "no wallet installed": either disabled in config or the
/// endpoint could not be set up. The session handles that as a normal state.
pub fn build_provider(config: &ProviderConfig) -> Option<Arc<dyn WalletProvider>> {
    if !config.enabled {
        tracing::info!("Wallet provider disabled by configuration");
        return None;
    }

    match RpcWalletProvider::new(config) {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to set up wallet provider");
            None
        }
    }
}

/// Assemble the state machine and its driver around `provider`.
pub fn assemble(config: &SyncConfig, provider: Option<Arc<dyn WalletProvider>>) -> SessionDriver {
    let gateway = ProviderGateway::new(provider, &config.provider);
    let machine = SessionStateMachine::new(gateway, ChainRegistry::new(), &config.session);

    tracing::info!(
        provider_available = machine.gateway().is_available(),
        poll_interval_secs = config.polling.interval_secs,
        chain_change_policy = ?config.session.chain_change_policy,
        "Session assembled"
    );

    SessionDriver::new(machine, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::SessionPhase;

    #[test]
    fn test_disabled_provider() {
        let mut config = ProviderConfig::default();
        config.enabled = false;
        assert!(build_provider(&config).is_none());
    }

    #[tokio::test]
    async fn test_assemble_starts_disconnected() {
        let config = SyncConfig::default();
        let driver = assemble(&config, build_provider(&config.provider));
        assert!(driver.machine().gateway().is_available());
        assert_eq!(driver.machine().phase(), SessionPhase::Disconnected);
        assert_eq!(driver.scheduler().interval().as_secs(), 10);
    }
}
