//! Periodic refresh subsystem.
//!
//! # Data Flow
//! ```text
//! Session becomes active (driver observes non-empty address)
//!     → scheduler.rs start(): one timer task
//!     → every interval: machine.refresh_current()
//!
//! Session becomes inactive / driver shuts down / scheduler dropped
//!     → scheduler.rs stop(): task cancelled exactly once
//! ```
//!
//! # Design Decisions
//! - At most one timer task per scheduler; start is idempotent
//! - First tick fires one full interval after start
//! - Ticks that fall behind are delayed, never bunched
//! - The timer holds no domain data; it reads the address at each tick

pub mod scheduler;

pub use scheduler::PollingScheduler;
