//! # Domain Value Objects
//!
//! Immutable value types shared by the codecs, the state machine and the
//! orchestrator.

use super::errors::{AccountId, AddressError};
use crate::algorithms::address_codec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address encoding family of a network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFormat {
    /// `0x` + 40 hex digits, EIP-55 checksummed when mixed-case.
    Evm,
    /// Base58check over `0x41 || account_id`.
    Tron,
}

impl AddressFormat {
    /// The other supported format.
    pub fn other(self) -> Self {
        match self {
            Self::Evm => Self::Tron,
            Self::Tron => Self::Evm,
        }
    }
}

impl fmt::Display for AddressFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evm => f.write_str("EVM"),
            Self::Tron => f.write_str("Tron"),
        }
    }
}

/// An address validated for one format. Only the codec constructs these, so
/// holding one proves the text passed syntax and checksum checks.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NativeAddress {
    format: AddressFormat,
    text: String,
    account: AccountId,
}

impl NativeAddress {
    pub(crate) fn from_parts(format: AddressFormat, text: String, account: AccountId) -> Self {
        Self {
            format,
            text,
            account,
        }
    }

    /// Encoding of `as_str()`.
    pub fn format(&self) -> AddressFormat {
        self.format
    }

    /// Address text exactly as validated or produced.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The 160-bit account id behind the text.
    pub fn account_id(&self) -> &AccountId {
        &self.account
    }

    /// Same account rendered in `target`; a clone when already in it.
    pub fn to_format(&self, target: AddressFormat) -> NativeAddress {
        if target == self.format {
            self.clone()
        } else {
            address_codec::encode(&self.account, target)
        }
    }

    /// True when both name the same account, whatever the rendering.
    pub fn same_account(&self, other: &NativeAddress) -> bool {
        self.account == other.account
    }
}

impl fmt::Display for NativeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TryFrom<String> for NativeAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        address_codec::parse(&value)
    }
}

impl From<NativeAddress> for String {
    fn from(value: NativeAddress) -> Self {
        value.text
    }
}

/// Supported networks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// Ethereum Sepolia testnet.
    Sepolia,
    /// Monad testnet.
    Monad,
    /// Tron Shasta testnet.
    Tron,
}

impl NetworkId {
    /// Every network the core knows how to address.
    pub const ALL: [NetworkId; 3] = [NetworkId::Sepolia, NetworkId::Monad, NetworkId::Tron];

    /// Native address format of this network.
    pub fn address_format(&self) -> AddressFormat {
        match self {
            NetworkId::Sepolia | NetworkId::Monad => AddressFormat::Evm,
            NetworkId::Tron => AddressFormat::Tron,
        }
    }

    /// Registry key.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkId::Sepolia => "sepolia",
            NetworkId::Monad => "monad",
            NetworkId::Tron => "tron",
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sepolia" => Ok(NetworkId::Sepolia),
            "monad" => Ok(NetworkId::Monad),
            "tron" => Ok(NetworkId::Tron),
            other => Err(format!("unknown network: {other}")),
        }
    }
}

/// Lifecycle state of a swap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    /// Created; allowance not yet checked.
    #[default]
    PendingApproval,
    /// Approval transaction in flight.
    Approving,
    /// Source escrow deployment pending or in flight.
    CreatingSourceEscrow,
    /// Source escrow live, awaiting the counterparty escrow.
    WaitingForDestination,
    /// Counterparty escrow matched; secret may be revealed.
    ReadyToClaim,
    /// Withdrawal in flight, secret revealed.
    Claiming,
    /// Withdrawal finalized.
    Completed,
    /// An action failed.
    Failed,
    /// Counterparty never showed up before the cancellation deadline.
    Expired,
    /// Aborted by the user.
    Cancelled,
}

impl SwapStatus {
    /// Every state, in lifecycle order.
    pub const ALL: [SwapStatus; 10] = [
        SwapStatus::PendingApproval,
        SwapStatus::Approving,
        SwapStatus::CreatingSourceEscrow,
        SwapStatus::WaitingForDestination,
        SwapStatus::ReadyToClaim,
        SwapStatus::Claiming,
        SwapStatus::Completed,
        SwapStatus::Failed,
        SwapStatus::Expired,
        SwapStatus::Cancelled,
    ];

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Expired | Self::Cancelled
        )
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingApproval => "pending_approval",
            Self::Approving => "approving",
            Self::CreatingSourceEscrow => "creating_source_escrow",
            Self::WaitingForDestination => "waiting_for_destination",
            Self::ReadyToClaim => "ready_to_claim",
            Self::Claiming => "claiming",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step keys of `SwapRecord::transaction_hashes`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SwapStep {
    /// Token approval for the resolver.
    Approval,
    /// Source escrow deployment.
    SourceEscrow,
    /// Counterparty escrow deployment (observed, not sent).
    DestinationEscrow,
    /// Withdrawal revealing the secret.
    Withdrawal,
}

/// Outcome of a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum TxStatus {
    /// Not final yet.
    Pending,
    /// Finalized successfully.
    Confirmed,
    /// Reverted or rejected.
    Reverted {
        /// Revert reason if the chain reported one.
        reason: String,
    },
}

/// Handle to a submitted transaction, pollable through `TransactionTracker`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionHandle {
    /// Network the transaction was sent to.
    pub network: NetworkId,
    /// Transaction identifier as reported by the chain.
    pub tx_hash: String,
}

impl TransactionHandle {
    /// Create a new handle.
    pub fn new(network: NetworkId, tx_hash: impl Into<String>) -> Self {
        Self {
            network,
            tx_hash: tx_hash.into(),
        }
    }
}
