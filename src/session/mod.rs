//! Wallet session subsystem.
//!
//! # Data Flow
//! ```text
//! connect() ──────────────┐
//! accountsChanged ────────┤
//! chainChanged ───────────┼──→ machine.rs (token, provider queries)
//! polling tick ───────────┘        → publish (single write path)
//!                                  → watch channel
//!                                  → renderers (read-only)
//!
//! driver.rs owns the event subscription and the polling scheduler,
//! and starts/stops polling as the snapshot becomes active/inactive.
//! ```

pub mod driver;
pub mod machine;
pub mod state;

pub use driver::SessionDriver;
pub use machine::SessionStateMachine;
pub use state::{ConnectOutcome, RefreshOutcome, Session, SessionPhase, SessionSnapshot};
