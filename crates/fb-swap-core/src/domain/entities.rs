//! # Domain Entities
//!
//! `SwapRecord` is the authoritative state of one bridge transfer. Its fields
//! are private: the only way to change a record is `apply`, which runs the
//! state machine and its record-level guards, plus the two bookkeeping calls
//! for submissions that do not change state.

use super::errors::{BridgeError, Hash};
use super::invariants::{
    invariant_distinct_networks, invariant_error_only_when_failed, invariant_hashlock_matches,
    invariant_native_format, invariant_positive_amount, invariant_schedule_ordered,
};
use super::secure_secret::SecureSecret;
use super::timelocks::TimeLockSchedule;
use super::value_objects::{NativeAddress, NetworkId, SwapStatus, SwapStep, TransactionHandle};
use crate::algorithms::secret::create_hash_lock;
use crate::algorithms::state_machine::{transition, SwapEvent};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};
use uuid::Uuid;

/// `0x`-hex serde for 32-byte digests.
pub(crate) mod hash_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(hash)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let text = String::deserialize(deserializer)?;
        let mut out = [0u8; 32];
        hex::decode_to_slice(text.trim_start_matches("0x"), &mut out)
            .map_err(serde::de::Error::custom)?;
        Ok(out)
    }
}

/// A transfer as requested by the user. Addresses are untrusted text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Network the tokens leave.
    pub from_network: NetworkId,
    /// Network the tokens arrive on.
    pub to_network: NetworkId,
    /// Token symbol; the configured default token when absent.
    #[serde(default)]
    pub token: Option<String>,
    /// Amount in token base units.
    pub amount: U256,
    /// The user's address, in either format.
    pub user_address: String,
    /// Receiving address; the user's own address on `to_network` when absent.
    #[serde(default)]
    pub destination_address: Option<String>,
}

/// Counterparty escrow as reported by `EscrowObserver`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowInfo {
    /// Network the escrow lives on.
    pub network: NetworkId,
    /// Escrow contract address.
    pub address: String,
    /// Order hash the escrow was created for.
    #[serde(with = "hash_hex")]
    pub order_hash: Hash,
    /// Hash lock guarding the escrow.
    #[serde(with = "hash_hex")]
    pub hash_lock: Hash,
    /// Locked amount in base units.
    pub amount: U256,
    /// Deployment transaction, when known.
    #[serde(default)]
    pub tx_hash: Option<String>,
}

/// Arguments of a source escrow deployment. Maker and taker are always in the
/// deployment network's format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EscrowDeployment {
    /// Order hash of the swap.
    pub order_hash: Hash,
    /// Hash lock of the swap.
    pub hash_lock: Hash,
    /// Amount in base units.
    pub amount: U256,
    /// Packed schedule, below 2^160.
    pub time_locks_packed: U256,
    /// User funding the escrow.
    pub maker: NativeAddress,
    /// Resolver allowed to withdraw.
    pub taker: NativeAddress,
    /// Network to deploy on.
    pub network: NetworkId,
}

/// Everything a new record is built from.
#[derive(Clone, Debug)]
pub struct SwapRecordParams {
    /// Record id.
    pub id: Uuid,
    /// Order hash, computed by the caller from the registry.
    pub order_hash: Hash,
    /// Swap secret; the hash lock is derived from it.
    pub secret: SecureSecret,
    /// Source network.
    pub from_network: NetworkId,
    /// Destination network.
    pub to_network: NetworkId,
    /// Token symbol.
    pub token: String,
    /// Amount in base units.
    pub amount: U256,
    /// User address on `from_network`.
    pub user_address: NativeAddress,
    /// Receiving address on `to_network`.
    pub destination_address: NativeAddress,
    /// Resolver on `from_network`.
    pub resolver_address: NativeAddress,
    /// Initial schedule.
    pub time_locks: TimeLockSchedule,
    /// Creation time, unix seconds.
    pub created_at: u64,
}

/// Context-carrying input to `SwapRecord::apply`.
#[derive(Clone, Debug)]
pub enum SwapInput {
    /// Allowance read back as `allowance`.
    ApprovalNotNeeded {
        /// Current allowance for the resolver.
        allowance: U256,
    },
    /// Approval sent as `handle`.
    ApprovalSubmitted {
        /// Approval transaction.
        handle: TransactionHandle,
    },
    /// Pending approval finalized.
    ApprovalConfirmed,
    /// Pending approval reverted.
    ApprovalFailed {
        /// Revert reason.
        reason: String,
    },
    /// Pending source escrow deployment finalized.
    SourceEscrowCreated,
    /// Pending source escrow deployment reverted.
    SourceEscrowFailed {
        /// Revert reason.
        reason: String,
    },
    /// Counterparty escrow found.
    DestinationEscrowObserved {
        /// The escrow as observed.
        escrow: EscrowInfo,
    },
    /// Clock read as `now` while still waiting.
    DestinationTimeout {
        /// Current unix time.
        now: u64,
    },
    /// Withdrawal sent as `handle`.
    ClaimSubmitted {
        /// Withdrawal transaction.
        handle: TransactionHandle,
    },
    /// Pending withdrawal finalized.
    ClaimConfirmed,
    /// Pending withdrawal reverted with the budget spent.
    ClaimFailed {
        /// Revert reason.
        reason: String,
        /// Configured retry budget.
        max_attempts: u32,
    },
    /// User abort.
    UserCancel,
    /// A collaborator call errored.
    CollaboratorFailed {
        /// Collaborator name.
        collaborator: &'static str,
        /// Error text.
        message: String,
    },
}

impl SwapInput {
    /// The state-machine event this input drives.
    pub fn event(&self) -> SwapEvent {
        match self {
            Self::ApprovalNotNeeded { .. } => SwapEvent::ApprovalNotNeeded,
            Self::ApprovalSubmitted { .. } => SwapEvent::ApprovalSubmitted,
            Self::ApprovalConfirmed => SwapEvent::ApprovalConfirmed,
            Self::ApprovalFailed { .. } => SwapEvent::ApprovalFailed,
            Self::SourceEscrowCreated => SwapEvent::SourceEscrowCreated,
            Self::SourceEscrowFailed { .. } => SwapEvent::SourceEscrowFailed,
            Self::DestinationEscrowObserved { .. } => SwapEvent::DestinationEscrowObserved,
            Self::DestinationTimeout { .. } => SwapEvent::DestinationTimeout,
            Self::ClaimSubmitted { .. } => SwapEvent::ClaimSubmitted,
            Self::ClaimConfirmed => SwapEvent::ClaimConfirmed,
            Self::ClaimFailed { .. } => SwapEvent::ClaimFailed,
            Self::UserCancel => SwapEvent::UserCancel,
            Self::CollaboratorFailed { .. } => SwapEvent::CollaboratorFailed,
        }
    }
}

/// Authoritative record of one transfer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredSwapRecord")]
pub struct SwapRecord {
    id: Uuid,
    #[serde(with = "hash_hex")]
    order_hash: Hash,
    secret: SecureSecret,
    #[serde(with = "hash_hex")]
    hash_lock: Hash,
    from_network: NetworkId,
    to_network: NetworkId,
    token: String,
    amount: U256,
    user_address: NativeAddress,
    destination_address: NativeAddress,
    resolver_address: NativeAddress,
    time_locks: TimeLockSchedule,
    status: SwapStatus,
    transaction_hashes: BTreeMap<SwapStep, String>,
    error: Option<String>,
    created_at: u64,
    pending_transaction: Option<TransactionHandle>,
    claim_attempts: u32,
    destination_escrow: Option<EscrowInfo>,
}

/// Wire form of `SwapRecord`, validated on the way in.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSwapRecord {
    id: Uuid,
    #[serde(with = "hash_hex")]
    order_hash: Hash,
    secret: SecureSecret,
    #[serde(with = "hash_hex")]
    hash_lock: Hash,
    from_network: NetworkId,
    to_network: NetworkId,
    token: String,
    amount: U256,
    user_address: NativeAddress,
    destination_address: NativeAddress,
    resolver_address: NativeAddress,
    time_locks: TimeLockSchedule,
    status: SwapStatus,
    #[serde(default)]
    transaction_hashes: BTreeMap<SwapStep, String>,
    #[serde(default)]
    error: Option<String>,
    created_at: u64,
    #[serde(default)]
    pending_transaction: Option<TransactionHandle>,
    #[serde(default)]
    claim_attempts: u32,
    #[serde(default)]
    destination_escrow: Option<EscrowInfo>,
}

impl TryFrom<StoredSwapRecord> for SwapRecord {
    type Error = BridgeError;

    fn try_from(stored: StoredSwapRecord) -> Result<Self, Self::Error> {
        let record = SwapRecord {
            id: stored.id,
            order_hash: stored.order_hash,
            secret: stored.secret,
            hash_lock: stored.hash_lock,
            from_network: stored.from_network,
            to_network: stored.to_network,
            token: stored.token,
            amount: stored.amount,
            user_address: stored.user_address,
            destination_address: stored.destination_address,
            resolver_address: stored.resolver_address,
            time_locks: stored.time_locks,
            status: stored.status,
            transaction_hashes: stored.transaction_hashes,
            error: stored.error,
            created_at: stored.created_at,
            pending_transaction: stored.pending_transaction,
            claim_attempts: stored.claim_attempts,
            destination_escrow: stored.destination_escrow,
        };
        record.check_invariants()?;
        Ok(record)
    }
}

impl SwapRecord {
    /// Create a record in `PENDING_APPROVAL`.
    pub fn new(params: SwapRecordParams) -> Result<Self, BridgeError> {
        let hash_lock = create_hash_lock(&params.secret);
        let record = Self {
            id: params.id,
            order_hash: params.order_hash,
            secret: params.secret,
            hash_lock,
            from_network: params.from_network,
            to_network: params.to_network,
            token: params.token,
            amount: params.amount,
            user_address: params.user_address,
            destination_address: params.destination_address,
            resolver_address: params.resolver_address,
            time_locks: params.time_locks,
            status: SwapStatus::PendingApproval,
            transaction_hashes: BTreeMap::new(),
            error: None,
            created_at: params.created_at,
            pending_transaction: None,
            claim_attempts: 0,
            destination_escrow: None,
        };
        record.check_invariants()?;
        Ok(record)
    }

    /// Record id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Order hash.
    pub fn order_hash(&self) -> &Hash {
        &self.order_hash
    }

    /// Hash lock.
    pub fn hash_lock(&self) -> &Hash {
        &self.hash_lock
    }

    /// The secret. Only the claim submission should read it.
    pub fn secret(&self) -> &SecureSecret {
        &self.secret
    }

    /// Source network.
    pub fn from_network(&self) -> NetworkId {
        self.from_network
    }

    /// Destination network.
    pub fn to_network(&self) -> NetworkId {
        self.to_network
    }

    /// Token symbol.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Amount in base units.
    pub fn amount(&self) -> U256 {
        self.amount
    }

    /// User address on the source network.
    pub fn user_address(&self) -> &NativeAddress {
        &self.user_address
    }

    /// Receiving address on the destination network.
    pub fn destination_address(&self) -> &NativeAddress {
        &self.destination_address
    }

    /// Resolver on the source network.
    pub fn resolver_address(&self) -> &NativeAddress {
        &self.resolver_address
    }

    /// Current schedule.
    pub fn time_locks(&self) -> &TimeLockSchedule {
        &self.time_locks
    }

    /// Current state.
    pub fn status(&self) -> SwapStatus {
        self.status
    }

    /// Step -> transaction id. On `COMPLETED` this holds every step.
    pub fn transaction_hashes(&self) -> &BTreeMap<SwapStep, String> {
        &self.transaction_hashes
    }

    /// Failure description, only while `FAILED`.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Creation time, unix seconds.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// In-flight transaction of the current step.
    pub fn pending_transaction(&self) -> Option<&TransactionHandle> {
        self.pending_transaction.as_ref()
    }

    /// Withdrawal submissions so far.
    pub fn claim_attempts(&self) -> u32 {
        self.claim_attempts
    }

    /// Counterparty escrow, once observed.
    pub fn destination_escrow(&self) -> Option<&EscrowInfo> {
        self.destination_escrow.as_ref()
    }

    /// True once the secret has been sent on-chain.
    pub fn secret_revealed(&self) -> bool {
        matches!(self.status, SwapStatus::Claiming | SwapStatus::Completed)
            || self.claim_attempts > 0
    }

    /// Why a terminal non-success state was reached.
    pub fn terminal_reason(&self) -> Option<String> {
        match self.status {
            SwapStatus::Failed => self.error.clone(),
            SwapStatus::Expired => Some(format!(
                "no matching {} escrow before cancellation opened at {}",
                self.to_network,
                self.time_locks.cancellation_at()
            )),
            SwapStatus::Cancelled => Some("cancelled by user".to_string()),
            _ => None,
        }
    }

    /// Run every record invariant.
    pub fn check_invariants(&self) -> Result<(), BridgeError> {
        invariant_hashlock_matches(&self.secret, &self.hash_lock)?;
        invariant_distinct_networks(self.from_network, self.to_network)?;
        invariant_positive_amount(self.amount)?;
        invariant_schedule_ordered(&self.time_locks)?;
        invariant_native_format("user address", &self.user_address, self.from_network)?;
        invariant_native_format(
            "destination address",
            &self.destination_address,
            self.to_network,
        )?;
        invariant_native_format("resolver address", &self.resolver_address, self.from_network)?;
        invariant_error_only_when_failed(self.status, self.error.as_deref())?;
        Ok(())
    }

    /// Drive the state machine. On error the record is untouched.
    pub fn apply(&mut self, input: SwapInput) -> Result<SwapStatus, BridgeError> {
        self.check_invariants()?;
        let from = self.status;
        let event = input.event();

        let to = match transition(from, event).and_then(|to| {
            self.check_guard(&input)?;
            Ok(to)
        }) {
            Ok(to) => to,
            Err(err) => {
                warn!(swap_id = %self.id, status = %from, %event, error = %err, "Rejected out-of-order transition");
                return Err(err);
            }
        };

        match input {
            SwapInput::ApprovalSubmitted { handle } => {
                self.transaction_hashes
                    .entry(SwapStep::Approval)
                    .or_insert_with(|| handle.tx_hash.clone());
                self.pending_transaction = Some(handle);
            }
            SwapInput::ApprovalFailed { reason } | SwapInput::SourceEscrowFailed { reason } => {
                self.pending_transaction = None;
                self.error = Some(reason);
            }
            SwapInput::DestinationEscrowObserved { escrow } => {
                if let Some(tx) = &escrow.tx_hash {
                    self.transaction_hashes
                        .entry(SwapStep::DestinationEscrow)
                        .or_insert_with(|| tx.clone());
                }
                self.destination_escrow = Some(escrow);
            }
            SwapInput::ClaimSubmitted { handle } => {
                self.claim_attempts = 1;
                self.pending_transaction = Some(handle);
            }
            SwapInput::ClaimConfirmed => {
                if let Some(handle) = self.pending_transaction.take() {
                    self.transaction_hashes
                        .entry(SwapStep::Withdrawal)
                        .or_insert(handle.tx_hash);
                }
            }
            SwapInput::ClaimFailed { reason, .. } => {
                if let Some(handle) = self.pending_transaction.take() {
                    self.transaction_hashes
                        .entry(SwapStep::Withdrawal)
                        .or_insert(handle.tx_hash);
                }
                self.error = Some(reason);
            }
            SwapInput::CollaboratorFailed {
                collaborator,
                message,
            } => {
                self.pending_transaction = None;
                self.error = Some(format!("{collaborator}: {message}"));
            }
            SwapInput::ApprovalNotNeeded { .. }
            | SwapInput::ApprovalConfirmed
            | SwapInput::SourceEscrowCreated
            | SwapInput::DestinationTimeout { .. }
            | SwapInput::UserCancel => {
                self.pending_transaction = None;
            }
        }
        self.status = to;

        info!(swap_id = %self.id, from = %from, to = %to, %event, "Swap transition");
        Ok(to)
    }

    /// Record a source escrow deployment sent with `time_locks`. No state
    /// change: the step completes when the deployment finalizes.
    pub fn record_source_escrow_submission(
        &mut self,
        time_locks: TimeLockSchedule,
        handle: TransactionHandle,
    ) -> Result<(), BridgeError> {
        self.ensure_in(SwapStatus::CreatingSourceEscrow, "source_escrow_submitted")?;
        if self.pending_transaction.is_some() {
            return Err(BridgeError::InvalidTransition {
                from: self.status,
                event: "source_escrow_submitted (deployment already in flight)".to_string(),
            });
        }
        invariant_schedule_ordered(&time_locks)?;
        if handle.network != self.from_network {
            return Err(BridgeError::InvariantViolation(format!(
                "source escrow sent to {} instead of {}",
                handle.network, self.from_network
            )));
        }
        self.time_locks = time_locks;
        self.transaction_hashes
            .entry(SwapStep::SourceEscrow)
            .or_insert_with(|| handle.tx_hash.clone());
        self.pending_transaction = Some(handle);
        info!(swap_id = %self.id, deployed_at = time_locks.deployed_at, "Source escrow submitted");
        Ok(())
    }

    /// Record a withdrawal resubmission after a revert.
    pub fn record_claim_retry(&mut self, handle: TransactionHandle) -> Result<(), BridgeError> {
        self.ensure_in(SwapStatus::Claiming, "claim_resubmitted")?;
        if handle.network != self.to_network {
            return Err(BridgeError::InvalidTransition {
                from: self.status,
                event: "claim_resubmitted (withdrawal sent to the wrong network)".to_string(),
            });
        }
        self.claim_attempts = self.claim_attempts.saturating_add(1);
        self.pending_transaction = Some(handle);
        info!(swap_id = %self.id, attempt = self.claim_attempts, "Withdrawal resubmitted");
        Ok(())
    }

    /// Append a late-arriving transaction id for a step that has none yet.
    /// Only terminal records accept it; live records fill the map through
    /// transitions. Returns whether it was added.
    pub fn record_transaction(
        &mut self,
        step: SwapStep,
        tx_hash: impl Into<String>,
    ) -> Result<bool, BridgeError> {
        if !self.status.is_terminal() {
            warn!(swap_id = %self.id, status = %self.status, ?step, "Rejected transaction hash on live swap");
            return Err(BridgeError::InvalidTransition {
                from: self.status,
                event: "record_transaction (swap not terminal)".to_string(),
            });
        }
        if self.transaction_hashes.contains_key(&step) {
            return Ok(false);
        }
        self.transaction_hashes.insert(step, tx_hash.into());
        Ok(true)
    }

    fn ensure_in(&self, expected: SwapStatus, what: &str) -> Result<(), BridgeError> {
        if self.status != expected {
            warn!(swap_id = %self.id, status = %self.status, what, "Rejected out-of-order transition");
            return Err(BridgeError::InvalidTransition {
                from: self.status,
                event: what.to_string(),
            });
        }
        Ok(())
    }

    fn check_guard(&self, input: &SwapInput) -> Result<(), BridgeError> {
        let rejected = |why: &str| BridgeError::InvalidTransition {
            from: self.status,
            event: format!("{} ({why})", input.event()),
        };

        match input {
            SwapInput::ApprovalNotNeeded { allowance } if *allowance < self.amount => {
                Err(rejected("allowance below amount"))
            }
            SwapInput::ApprovalSubmitted { handle } if handle.network != self.from_network => {
                Err(rejected("approval sent to the wrong network"))
            }
            SwapInput::ApprovalConfirmed
            | SwapInput::ApprovalFailed { .. }
            | SwapInput::SourceEscrowCreated
            | SwapInput::SourceEscrowFailed { .. }
            | SwapInput::ClaimConfirmed
                if self.pending_transaction.is_none() =>
            {
                Err(rejected("no transaction in flight"))
            }
            SwapInput::DestinationEscrowObserved { escrow } => {
                if escrow.network != self.to_network {
                    Err(rejected("escrow on the wrong network"))
                } else if escrow.hash_lock != self.hash_lock {
                    Err(rejected("hash lock mismatch"))
                } else if escrow.order_hash != self.order_hash {
                    Err(rejected("order hash mismatch"))
                } else {
                    Ok(())
                }
            }
            SwapInput::DestinationTimeout { now } if *now <= self.time_locks.cancellation_at() => {
                Err(rejected("cancellation deadline not reached"))
            }
            SwapInput::ClaimSubmitted { handle } if handle.network != self.to_network => {
                Err(rejected("withdrawal sent to the wrong network"))
            }
            SwapInput::ClaimFailed { max_attempts, .. } if self.claim_attempts < *max_attempts => {
                Err(rejected("retry budget not exhausted"))
            }
            _ => Ok(()),
        }
    }
}
