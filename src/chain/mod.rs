//! Chain metadata subsystem.
//!
//! # Data Flow
//! ```text
//! Provider chain id ("11155111" or "0xaa36a7")
//!     → registry.rs (normalize, lookup display metadata)
//!     → NetworkInfo (name, symbol, accent color)
//!
//! Provider balance (wei, U256)
//!     → units.rs (round half-up to 4 places)
//!     → display string ("1.2345")
//! ```
//!
//! # Design Decisions
//! - Registry is static and immutable; lookups are pure and total
//! - Unknown chains resolve to a generic entry instead of an error
//! - Balance formatting uses integer arithmetic only

pub mod registry;
pub mod units;

pub use registry::{ChainRegistry, NetworkInfo};
pub use units::format_balance;
