//! # Domain Errors
//!
//! Error types for the swap core. Codec errors are returned to the immediate
//! caller; `BridgeError` is what the orchestrator surfaces.

use super::value_objects::{AddressFormat, SwapStatus};
use thiserror::Error;

/// Hash type (32-byte keccak-256 digest).
pub type Hash = [u8; 32];

/// Account identifier shared by both address encodings (160 bits).
pub type AccountId = [u8; 20];

/// Address validation and conversion errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// Input matches neither supported encoding, or fails its checksum.
    #[error("Invalid {target} address {input:?}: {reason}")]
    InvalidFormat {
        /// The untrusted input as received.
        input: String,
        /// Format the caller asked for.
        target: AddressFormat,
        /// What was wrong with it.
        reason: String,
    },
}

impl AddressError {
    pub(crate) fn invalid(input: &str, target: AddressFormat, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            input: input.to_string(),
            target,
            reason: reason.into(),
        }
    }
}

/// Time-lock schedule errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TimeLockError {
    /// A field does not fit in 32 bits.
    #[error("Time-lock field {field} out of range: {value} > u32::MAX")]
    FieldOverflow {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: u64,
    },

    /// A later stage starts before an earlier one.
    #[error("Time-lock {later}={later_value} precedes {earlier}={earlier_value}")]
    NonMonotonic {
        /// Earlier stage name.
        earlier: &'static str,
        /// Earlier stage offset.
        earlier_value: u32,
        /// Later stage name.
        later: &'static str,
        /// Later stage offset.
        later_value: u32,
    },

    /// Packed word has bits set above bit 159.
    #[error("Packed time-lock word exceeds 160 bits")]
    WordOverflow,
}

/// Token amount parsing errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// Not a plain decimal number.
    #[error("Malformed amount {0:?}")]
    Malformed(String),

    /// More fractional digits than the token has decimals.
    #[error("Amount {input:?} has more than {decimals} decimal places")]
    TooPrecise {
        /// The input as received.
        input: String,
        /// Token decimals.
        decimals: u8,
    },

    /// Does not fit in 256 bits.
    #[error("Amount {0:?} overflows uint256")]
    Overflow(String),
}

/// Orchestrator error type.
#[derive(Clone, Debug, Error)]
pub enum BridgeError {
    /// Bad network pair, non-positive amount, unknown token.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Address failed validation or conversion.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// Time-lock schedule rejected.
    #[error(transparent)]
    TimeLock(#[from] TimeLockError),

    /// Event not legal for the current state.
    #[error("Invalid transition: {event} while {from}")]
    InvalidTransition {
        /// State the record was in.
        from: SwapStatus,
        /// Event (or operation) that was rejected.
        event: String,
    },

    /// An injected collaborator call reverted or errored.
    #[error("{collaborator} call failed: {message}")]
    ExternalCallFailed {
        /// Collaborator name.
        collaborator: &'static str,
        /// Underlying message.
        message: String,
    },

    /// Deadline exceeded while awaiting an outcome.
    #[error("Timed out after {elapsed_ms}ms awaiting {operation}")]
    Timeout {
        /// What was being awaited.
        operation: &'static str,
        /// Deadline that elapsed.
        elapsed_ms: u64,
    },

    /// Internally impossible condition. Always a programming error.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl From<AmountError> for BridgeError {
    fn from(err: AmountError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

impl BridgeError {
    /// True for failures that moved the record to `FAILED`.
    pub fn is_external(&self) -> bool {
        matches!(self, Self::ExternalCallFailed { .. })
    }
}
