//! # Outbound Ports
//!
//! Chain-facing collaborators the orchestrator drives. Every address handed
//! to a collaborator is already in the target network's native format.

use crate::domain::{
    EscrowDeployment, EscrowInfo, Hash, NativeAddress, NetworkId, SecureSecret, TransactionHandle,
    TxStatus,
};
use async_trait::async_trait;
use primitive_types::U256;
use std::sync::Arc;
use thiserror::Error;

/// Collaborator names as they appear in `BridgeError::ExternalCallFailed`.
pub mod collaborator {
    /// `AllowanceQuery`.
    pub const ALLOWANCE: &str = "AllowanceQuery";
    /// `ApprovalSubmitter`.
    pub const APPROVALS: &str = "ApprovalSubmitter";
    /// `EscrowDeployer`.
    pub const DEPLOYER: &str = "EscrowDeployer";
    /// `EscrowObserver`.
    pub const OBSERVER: &str = "EscrowObserver";
    /// `ClaimSubmitter`.
    pub const CLAIMS: &str = "ClaimSubmitter";
    /// `TransactionTracker`.
    pub const TRACKER: &str = "TransactionTracker";
}

/// Failure reported by a collaborator.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChainCallError {
    /// RPC or wallet unreachable.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Call rejected (user denied, node refused, simulation reverted).
    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Reads ERC-20/TRC-20 allowances.
#[async_trait]
pub trait AllowanceQuery: Send + Sync {
    /// Allowance `owner` granted `spender` on `network`.
    async fn allowance(
        &self,
        owner: &NativeAddress,
        spender: &NativeAddress,
        network: NetworkId,
    ) -> Result<U256, ChainCallError>;
}

/// Sends token approvals.
#[async_trait]
pub trait ApprovalSubmitter: Send + Sync {
    /// Approve `spender` for `amount` on `network`.
    async fn submit_approval(
        &self,
        spender: &NativeAddress,
        amount: U256,
        network: NetworkId,
    ) -> Result<TransactionHandle, ChainCallError>;
}

/// Deploys source escrows through the network's escrow factory.
#[async_trait]
pub trait EscrowDeployer: Send + Sync {
    /// Send the deployment.
    async fn deploy_escrow(
        &self,
        deployment: &EscrowDeployment,
    ) -> Result<TransactionHandle, ChainCallError>;
}

/// Looks up counterparty escrows.
#[async_trait]
pub trait EscrowObserver: Send + Sync {
    /// Escrow created for `order_hash` on `network`, if any.
    async fn find_escrow(
        &self,
        order_hash: &Hash,
        network: NetworkId,
    ) -> Result<Option<EscrowInfo>, ChainCallError>;
}

/// Sends withdrawals. The secret becomes public once this is called.
#[async_trait]
pub trait ClaimSubmitter: Send + Sync {
    /// Withdraw from the escrow for `order_hash` on `network`.
    async fn submit_claim(
        &self,
        order_hash: &Hash,
        secret: &SecureSecret,
        network: NetworkId,
    ) -> Result<TransactionHandle, ChainCallError>;
}

/// Polls transaction outcomes.
#[async_trait]
pub trait TransactionTracker: Send + Sync {
    /// Current status of `handle`.
    async fn status(&self, handle: &TransactionHandle) -> Result<TxStatus, ChainCallError>;
}

/// Wall clock, unix seconds.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now_secs(&self) -> u64;
}

/// Every collaborator the orchestrator needs.
#[derive(Clone)]
pub struct BridgeCollaborators {
    /// Allowance reads.
    pub allowance: Arc<dyn AllowanceQuery>,
    /// Approval submission.
    pub approvals: Arc<dyn ApprovalSubmitter>,
    /// Source escrow deployment.
    pub deployer: Arc<dyn EscrowDeployer>,
    /// Counterparty escrow lookup.
    pub observer: Arc<dyn EscrowObserver>,
    /// Withdrawal submission.
    pub claims: Arc<dyn ClaimSubmitter>,
    /// Transaction polling.
    pub tracker: Arc<dyn TransactionTracker>,
    /// Wall clock.
    pub clock: Arc<dyn Clock>,
}

impl BridgeCollaborators {
    /// Use one backend for every chain-facing port.
    pub fn from_backend<B>(backend: Arc<B>, clock: Arc<dyn Clock>) -> Self
    where
        B: AllowanceQuery
            + ApprovalSubmitter
            + EscrowDeployer
            + EscrowObserver
            + ClaimSubmitter
            + TransactionTracker
            + 'static,
    {
        Self {
            allowance: backend.clone(),
            approvals: backend.clone(),
            deployer: backend.clone(),
            observer: backend.clone(),
            claims: backend.clone(),
            tracker: backend,
            clock,
        }
    }
}

impl std::fmt::Debug for BridgeCollaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeCollaborators").finish_non_exhaustive()
    }
}
