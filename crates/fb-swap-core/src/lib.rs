//! # Fusion Bridge Swap Core
//!
//! Coordinates hash-time-locked token swaps between EVM networks and Tron.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Flow
//!
//! ```text
//! PENDING_APPROVAL -> APPROVING -> CREATING_SOURCE_ESCROW -> WAITING_FOR_DESTINATION
//!                  \______________/                                   |
//!                                       READY_TO_CLAIM <-------------'
//!                                            |
//!                                        CLAIMING -> COMPLETED
//! ```
//!
//! Any non-terminal state may end in `FAILED`; the first four also accept a
//! user cancel, and `WAITING_FOR_DESTINATION` expires once the cancellation
//! window opens.
//!
//! ## Security
//!
//! | Rule | Where |
//! |------|-------|
//! | `keccak256(secret) == hashLock` | `SwapRecord::check_invariants` |
//! | Secret revealed only after the counterparty escrow matches | `SwapRecord::apply` |
//! | Time-lock stages non-decreasing, packed into 160 bits | `timelock_codec` |
//! | Addresses always in the owning network's format | `address_codec` |
//!
//! ## Module Structure
//!
//! ```text
//! fb-swap-core/
//! ├── domain/          # SwapRecord, value types, schedule, errors
//! ├── algorithms/      # Address codec, time-lock codec, hashes, transitions
//! ├── ports/           # BridgeApi, chain collaborators
//! ├── adapters/        # Simulated chain, clocks, account watcher
//! ├── config.rs        # Network/token registry and tunables
//! └── service.rs       # BridgeOrchestrator
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    AccountChangeDetector, AccountChanged, ManualClock, ObservedClaim, SimulatedChain,
    SystemClock, TxKind, TxOutcome,
};
pub use algorithms::{
    compute_order_hash, create_hash_lock, format_token_amount, parse_token_amount, transition,
    verify_secret, SwapEvent,
};
pub use config::{BridgeConfig, ConfigError, NetworkInfo, OrchestratorConfig, TokenInfo};
pub use domain::{
    AddressError, AddressFormat, BridgeError, EscrowDeployment, EscrowInfo, Hash, NativeAddress,
    NetworkId, SecureSecret, SwapInput, SwapRecord, SwapStatus, SwapStep, TimeLockError,
    TimeLockPolicy, TimeLockSchedule, TransactionHandle, TransferRequest, TxStatus,
};
pub use ports::{
    AllowanceQuery, ApprovalSubmitter, BridgeApi, BridgeCollaborators, ChainCallError,
    ClaimSubmitter, Clock, EscrowDeployer, EscrowObserver, TransactionTracker,
};
pub use service::{resolve_destination, BridgeOrchestrator};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
