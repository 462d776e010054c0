//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → provider → gateway → state machine → driver
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C (signals.rs) → broadcast → driver unsubscribes & stops polling
//! ```
//!
//! # Design Decisions
//! - Every session starts fresh; nothing is restored from disk
//! - Teardown is driven by one broadcast so no listener or timer outlives it

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
