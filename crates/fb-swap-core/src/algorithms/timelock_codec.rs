//! # Time-Lock Codec
//!
//! Packs the five schedule fields into the single `uint256` word the escrow
//! factories take, 32 bits per field:
//!
//! ```text
//! bits   0..32   deployedAt
//! bits  32..64   withdrawal
//! bits  64..96   publicWithdrawal
//! bits  96..128  cancellation
//! bits 128..160  publicCancellation
//! ```

use crate::domain::{TimeLockError, TimeLockSchedule};
use primitive_types::U256;

/// Width of one packed field.
pub const FIELD_BITS: usize = 32;

/// Significant width of a packed word.
pub const PACKED_BITS: usize = 160;

/// Pack a schedule. Non-monotonic offsets are rejected.
pub fn pack(schedule: &TimeLockSchedule) -> Result<U256, TimeLockError> {
    schedule.validate()?;
    Ok(schedule
        .fields()
        .iter()
        .enumerate()
        .fold(U256::zero(), |word, (i, field)| {
            word | (U256::from(*field) << (i * FIELD_BITS))
        }))
}

/// Unpack a word produced by `pack`. Words with bits above 159 are rejected.
pub fn unpack(word: U256) -> Result<TimeLockSchedule, TimeLockError> {
    if word.bits() > PACKED_BITS {
        return Err(TimeLockError::WordOverflow);
    }
    let mask = U256::from(u32::MAX);
    let mut fields = [0u32; 5];
    for (i, field) in fields.iter_mut().enumerate() {
        *field = ((word >> (i * FIELD_BITS)) & mask).low_u32();
    }
    Ok(TimeLockSchedule::from_fields(fields))
}

/// Big-endian 32-byte ABI encoding of a packed word.
pub fn to_abi_bytes(word: U256) -> [u8; 32] {
    let mut out = [0u8; 32];
    word.to_big_endian(&mut out);
    out
}
