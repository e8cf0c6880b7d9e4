//! # Domain Invariants
//!
//! Checks every `SwapRecord` must pass on creation, on deserialization and
//! before each orchestrator step.

use super::errors::{BridgeError, Hash};
use super::secure_secret::SecureSecret;
use super::timelocks::TimeLockSchedule;
use super::value_objects::{NativeAddress, NetworkId, SwapStatus};
use crate::algorithms::secret::verify_secret;
use primitive_types::U256;

/// Invariant: `hash_lock == keccak256(secret)`.
pub fn invariant_hashlock_matches(secret: &SecureSecret, hash_lock: &Hash) -> Result<(), BridgeError> {
    if !verify_secret(secret, hash_lock) {
        return Err(BridgeError::InvariantViolation(
            "hash lock does not match secret".to_string(),
        ));
    }
    Ok(())
}

/// Invariant: a swap crosses chains.
pub fn invariant_distinct_networks(from: NetworkId, to: NetworkId) -> Result<(), BridgeError> {
    if from == to {
        return Err(BridgeError::InvalidRequest(format!(
            "source and destination network are both {from}"
        )));
    }
    Ok(())
}

/// Invariant: amount is strictly positive.
pub fn invariant_positive_amount(amount: U256) -> Result<(), BridgeError> {
    if amount.is_zero() {
        return Err(BridgeError::InvalidRequest(
            "amount must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Invariant: schedule offsets are ordered.
pub fn invariant_schedule_ordered(schedule: &TimeLockSchedule) -> Result<(), BridgeError> {
    schedule.validate().map_err(BridgeError::from)
}

/// Invariant: an address is rendered in its network's native format.
pub fn invariant_native_format(
    role: &str,
    address: &NativeAddress,
    network: NetworkId,
) -> Result<(), BridgeError> {
    if address.format() != network.address_format() {
        return Err(BridgeError::InvariantViolation(format!(
            "{role} {address} is {} but {network} expects {}",
            address.format(),
            network.address_format()
        )));
    }
    Ok(())
}

/// Invariant: `error` is set exactly while `FAILED`.
pub fn invariant_error_only_when_failed(
    status: SwapStatus,
    error: Option<&str>,
) -> Result<(), BridgeError> {
    match (status, error) {
        (SwapStatus::Failed, None) => Err(BridgeError::InvariantViolation(
            "failed record carries no error".to_string(),
        )),
        (s, Some(_)) if s != SwapStatus::Failed => Err(BridgeError::InvariantViolation(format!(
            "{s} record carries an error"
        ))),
        _ => Ok(()),
    }
}
