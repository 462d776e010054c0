//! Wallet session synchronizer library.

pub mod chain;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod polling;
pub mod provider;
pub mod render;
pub mod session;

pub use config::SyncConfig;
pub use lifecycle::Shutdown;
pub use provider::{ProviderGateway, WalletProvider};
pub use session::{SessionDriver, SessionSnapshot, SessionStateMachine};
