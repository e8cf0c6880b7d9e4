//! # Time-Lock Schedule
//!
//! Five-stage escrow timing: an absolute deployment time plus four offsets
//! that open private withdrawal, public withdrawal, private cancellation and
//! public cancellation in that order.

use super::errors::TimeLockError;
use serde::{Deserialize, Serialize};

/// Stage names in packing order.
pub const FIELD_NAMES: [&str; 5] = [
    "deployedAt",
    "withdrawal",
    "publicWithdrawal",
    "cancellation",
    "publicCancellation",
];

/// Escrow timing schedule. `deployed_at` is wall-clock seconds, the rest are
/// offsets from it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeLockSchedule {
    /// Deployment time, unix seconds.
    pub deployed_at: u32,
    /// Taker-only withdrawal opens.
    pub withdrawal: u32,
    /// Anyone may withdraw on the taker's behalf.
    pub public_withdrawal: u32,
    /// Maker-only cancellation opens.
    pub cancellation: u32,
    /// Anyone may cancel.
    pub public_cancellation: u32,
}

impl TimeLockSchedule {
    /// Build from wider integers, rejecting anything beyond `u32`.
    pub fn from_u64s(fields: [u64; 5]) -> Result<Self, TimeLockError> {
        let mut narrow = [0u32; 5];
        for (i, value) in fields.iter().enumerate() {
            narrow[i] = u32::try_from(*value).map_err(|_| TimeLockError::FieldOverflow {
                field: FIELD_NAMES[i],
                value: *value,
            })?;
        }
        Ok(Self::from_fields(narrow))
    }

    /// Build from fields in packing order.
    pub fn from_fields(fields: [u32; 5]) -> Self {
        Self {
            deployed_at: fields[0],
            withdrawal: fields[1],
            public_withdrawal: fields[2],
            cancellation: fields[3],
            public_cancellation: fields[4],
        }
    }

    /// Fields in packing order.
    pub fn fields(&self) -> [u32; 5] {
        [
            self.deployed_at,
            self.withdrawal,
            self.public_withdrawal,
            self.cancellation,
            self.public_cancellation,
        ]
    }

    /// Offsets must be non-decreasing: an escrow may not become cancellable
    /// before it is withdrawable, nor publicly before privately.
    pub fn validate(&self) -> Result<(), TimeLockError> {
        let fields = self.fields();
        for i in 2..fields.len() {
            if fields[i] < fields[i - 1] {
                return Err(TimeLockError::NonMonotonic {
                    earlier: FIELD_NAMES[i - 1],
                    earlier_value: fields[i - 1],
                    later: FIELD_NAMES[i],
                    later_value: fields[i],
                });
            }
        }
        Ok(())
    }

    /// Copy with a new deployment time.
    pub fn with_deployed_at(self, deployed_at: u32) -> Self {
        Self {
            deployed_at,
            ..self
        }
    }

    /// Absolute start of private withdrawal.
    pub fn withdrawal_at(&self) -> u64 {
        self.absolute(self.withdrawal)
    }

    /// Absolute start of public withdrawal.
    pub fn public_withdrawal_at(&self) -> u64 {
        self.absolute(self.public_withdrawal)
    }

    /// Absolute start of private cancellation. Past this point the
    /// counterparty escrow is no longer worth waiting for.
    pub fn cancellation_at(&self) -> u64 {
        self.absolute(self.cancellation)
    }

    /// Absolute start of public cancellation.
    pub fn public_cancellation_at(&self) -> u64 {
        self.absolute(self.public_cancellation)
    }

    /// Stage in force at `now`.
    pub fn stage_at(&self, now: u64) -> TimeLockStage {
        if now >= self.public_cancellation_at() {
            TimeLockStage::PublicCancellation
        } else if now >= self.cancellation_at() {
            TimeLockStage::Cancellation
        } else if now >= self.public_withdrawal_at() {
            TimeLockStage::PublicWithdrawal
        } else if now >= self.withdrawal_at() {
            TimeLockStage::Withdrawal
        } else {
            TimeLockStage::Locked
        }
    }

    /// Seconds left before cancellation opens, zero once it has.
    pub fn seconds_until_cancellation(&self, now: u64) -> u64 {
        self.cancellation_at().saturating_sub(now)
    }

    fn absolute(&self, offset: u32) -> u64 {
        u64::from(self.deployed_at) + u64::from(offset)
    }
}

/// Window of an escrow's life.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeLockStage {
    /// Nothing allowed yet.
    Locked,
    /// Taker may withdraw.
    Withdrawal,
    /// Anyone may withdraw for the taker.
    PublicWithdrawal,
    /// Maker may cancel.
    Cancellation,
    /// Anyone may cancel.
    PublicCancellation,
}

/// Offsets applied to every new swap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeLockPolicy {
    /// Seconds until private withdrawal.
    pub withdrawal: u32,
    /// Seconds until public withdrawal.
    pub public_withdrawal: u32,
    /// Seconds until private cancellation.
    pub cancellation: u32,
    /// Seconds until public cancellation.
    pub public_cancellation: u32,
}

impl Default for TimeLockPolicy {
    fn default() -> Self {
        Self {
            withdrawal: 0,
            public_withdrawal: 5 * 60,
            cancellation: 60 * 60,
            public_cancellation: 2 * 60 * 60,
        }
    }
}

impl TimeLockPolicy {
    /// Schedule anchored at `deployed_at` (unix seconds).
    pub fn schedule(&self, deployed_at: u64) -> Result<TimeLockSchedule, TimeLockError> {
        let schedule = TimeLockSchedule::from_u64s([
            deployed_at,
            u64::from(self.withdrawal),
            u64::from(self.public_withdrawal),
            u64::from(self.cancellation),
            u64::from(self.public_cancellation),
        ])?;
        schedule.validate()?;
        Ok(schedule)
    }
}

/// Human-readable countdown: `"1h 5m"`, `"4m 10s"`, `"9s"`, `"Expired"`.
pub fn format_time_remaining(seconds: u64) -> String {
    if seconds == 0 {
        return "Expired".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}
