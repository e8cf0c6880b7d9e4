//! # Swap State Machine
//!
//! The legal `(status, event)` pairs of a swap. `transition` is a pure table
//! lookup; guards that need the record (hash-lock match, deadlines, retry
//! budget) are checked by `SwapRecord::apply` before it gets here.
//!
//! ```text
//! PENDING_APPROVAL ─┬─ approval_not_needed ─────────────┐
//!                   └─ approval_submitted ─> APPROVING ─┤ approval_confirmed
//!                                                       v
//!                                        CREATING_SOURCE_ESCROW
//!                                                       │ source_escrow_created
//!                                                       v
//!                                        WAITING_FOR_DESTINATION ── destination_timeout ─> EXPIRED
//!                                                       │ destination_escrow_observed
//!                                                       v
//!                                        READY_TO_CLAIM ── claim_submitted ─> CLAIMING
//!                                                                                │ claim_confirmed
//!                                                                                v
//!                                                                            COMPLETED
//! ```

use crate::domain::{BridgeError, SwapStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inputs to the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapEvent {
    /// Allowance already covers the amount.
    ApprovalNotNeeded,
    /// Approval transaction sent.
    ApprovalSubmitted,
    /// Approval finalized.
    ApprovalConfirmed,
    /// Approval reverted.
    ApprovalFailed,
    /// Source escrow deployment finalized.
    SourceEscrowCreated,
    /// Source escrow deployment reverted.
    SourceEscrowFailed,
    /// A counterparty escrow with identical hash lock and order hash appeared.
    DestinationEscrowObserved,
    /// Cancellation deadline passed with no counterparty escrow.
    DestinationTimeout,
    /// Withdrawal sent; the secret is now public.
    ClaimSubmitted,
    /// Withdrawal finalized.
    ClaimConfirmed,
    /// Withdrawal reverted and no retries remain.
    ClaimFailed,
    /// User abort.
    UserCancel,
    /// An injected collaborator call errored.
    CollaboratorFailed,
}

impl SwapEvent {
    /// Every event.
    pub const ALL: [SwapEvent; 13] = [
        SwapEvent::ApprovalNotNeeded,
        SwapEvent::ApprovalSubmitted,
        SwapEvent::ApprovalConfirmed,
        SwapEvent::ApprovalFailed,
        SwapEvent::SourceEscrowCreated,
        SwapEvent::SourceEscrowFailed,
        SwapEvent::DestinationEscrowObserved,
        SwapEvent::DestinationTimeout,
        SwapEvent::ClaimSubmitted,
        SwapEvent::ClaimConfirmed,
        SwapEvent::ClaimFailed,
        SwapEvent::UserCancel,
        SwapEvent::CollaboratorFailed,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApprovalNotNeeded => "approval_not_needed",
            Self::ApprovalSubmitted => "approval_submitted",
            Self::ApprovalConfirmed => "approval_confirmed",
            Self::ApprovalFailed => "approval_failed",
            Self::SourceEscrowCreated => "source_escrow_created",
            Self::SourceEscrowFailed => "source_escrow_failed",
            Self::DestinationEscrowObserved => "destination_escrow_observed",
            Self::DestinationTimeout => "destination_timeout",
            Self::ClaimSubmitted => "claim_submitted",
            Self::ClaimConfirmed => "claim_confirmed",
            Self::ClaimFailed => "claim_failed",
            Self::UserCancel => "user_cancel",
            Self::CollaboratorFailed => "collaborator_failed",
        }
    }
}

impl fmt::Display for SwapEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Next state for `event` in `from`, or `InvalidTransition`.
pub fn transition(from: SwapStatus, event: SwapEvent) -> Result<SwapStatus, BridgeError> {
    use SwapEvent as E;
    use SwapStatus as S;

    let to = match (from, event) {
        (S::PendingApproval, E::ApprovalNotNeeded) => S::CreatingSourceEscrow,
        (S::PendingApproval, E::ApprovalSubmitted) => S::Approving,
        (S::Approving, E::ApprovalConfirmed) => S::CreatingSourceEscrow,
        (S::Approving, E::ApprovalFailed) => S::Failed,
        (S::CreatingSourceEscrow, E::SourceEscrowCreated) => S::WaitingForDestination,
        (S::CreatingSourceEscrow, E::SourceEscrowFailed) => S::Failed,
        (S::WaitingForDestination, E::DestinationEscrowObserved) => S::ReadyToClaim,
        (S::WaitingForDestination, E::DestinationTimeout) => S::Expired,
        (S::ReadyToClaim, E::ClaimSubmitted) => S::Claiming,
        (S::Claiming, E::ClaimConfirmed) => S::Completed,
        (S::Claiming, E::ClaimFailed) => S::Failed,
        (
            S::PendingApproval | S::Approving | S::CreatingSourceEscrow | S::WaitingForDestination,
            E::UserCancel,
        ) => S::Cancelled,
        (s, E::CollaboratorFailed) if !s.is_terminal() => S::Failed,
        _ => {
            return Err(BridgeError::InvalidTransition {
                from,
                event: event.as_str().to_string(),
            })
        }
    };
    Ok(to)
}

/// True when `user_cancel` is legal: the secret has not been revealed.
pub fn can_cancel(status: SwapStatus) -> bool {
    transition(status, SwapEvent::UserCancel).is_ok()
}
