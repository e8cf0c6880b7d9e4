//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-memory implementations of the outbound ports plus the wallet account
//! change detector.

mod account_watcher;
mod clock;
mod simulated_chain;

pub use account_watcher::{AccountChangeDetector, AccountChanged};
pub use clock::{ManualClock, SystemClock};
pub use simulated_chain::{ObservedClaim, SimulatedChain, TxKind, TxOutcome};
