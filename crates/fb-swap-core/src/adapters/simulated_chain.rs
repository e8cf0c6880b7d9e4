//! Simulated Chain Adapter
//!
//! In-memory implementation of every chain-facing port. Transactions finalize
//! after a configurable number of polls with a scripted outcome, and any call
//! can be made to fail once. Used by the test suites and local demos.

use crate::algorithms::secret::keccak256;
use crate::domain::{
    AccountId, AddressFormat, EscrowDeployment, EscrowInfo, Hash, NativeAddress, NetworkId, SecureSecret,
    SwapRecord, TransactionHandle, TxStatus,
};
use crate::ports::outbound::{
    collaborator, AllowanceQuery, ApprovalSubmitter, ChainCallError, ClaimSubmitter,
    EscrowDeployer, EscrowObserver, TransactionTracker,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use primitive_types::U256;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tracing::debug;

/// Kind of transaction a submission produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TxKind {
    /// Token approval.
    Approval,
    /// Source escrow deployment.
    Deployment,
    /// Withdrawal.
    Claim,
}

/// Final outcome of a simulated transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxOutcome {
    /// Finalizes successfully.
    Confirm,
    /// Reverts with the given reason.
    Revert(String),
    /// Never finalizes.
    Hang,
}

/// A withdrawal as seen by the chain.
#[derive(Clone, Debug)]
pub struct ObservedClaim {
    /// Network it was sent to.
    pub network: NetworkId,
    /// Escrow's order hash.
    pub order_hash: Hash,
    /// Revealed secret.
    pub secret: SecureSecret,
}

#[derive(Clone, Debug)]
struct SimTx {
    outcome: TxOutcome,
    polls_left: u32,
}

#[derive(Default)]
struct ChainState {
    allowances: HashMap<(NetworkId, AccountId, AccountId), U256>,
    transactions: HashMap<String, SimTx>,
    scripted: HashMap<TxKind, VecDeque<TxOutcome>>,
    failures: HashMap<&'static str, VecDeque<ChainCallError>>,
    escrows: HashMap<(NetworkId, Hash), EscrowInfo>,
    deployments: Vec<EscrowDeployment>,
    approvals: Vec<(NetworkId, NativeAddress, U256)>,
    claims: Vec<ObservedClaim>,
    calls: HashMap<&'static str, usize>,
    next_nonce: u64,
}

/// In-memory chain backend for every outbound port.
pub struct SimulatedChain {
    state: Mutex<ChainState>,
    confirmation_polls: u32,
    latency: Option<Duration>,
}

impl SimulatedChain {
    /// Transactions finalize on their first poll.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState::default()),
            confirmation_polls: 0,
            latency: None,
        }
    }

    /// Transactions report `Pending` for `polls` polls before finalizing.
    pub fn with_confirmation_polls(mut self, polls: u32) -> Self {
        self.confirmation_polls = polls;
        self
    }

    /// Every call sleeps for `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Set the allowance `owner` granted `spender`.
    pub fn set_allowance(
        &self,
        owner: &NativeAddress,
        spender: &NativeAddress,
        network: NetworkId,
        amount: U256,
    ) {
        self.state
            .lock()
            .allowances
            .insert((network, *owner.account_id(), *spender.account_id()), amount);
    }

    /// Queue the outcome of the next transaction of `kind`. Unscripted
    /// transactions confirm.
    pub fn script(&self, kind: TxKind, outcome: TxOutcome) {
        self.state
            .lock()
            .scripted
            .entry(kind)
            .or_default()
            .push_back(outcome);
    }

    /// Make the next call to `collaborator` fail with `error`.
    pub fn fail_next(&self, collaborator: &'static str, error: ChainCallError) {
        self.state
            .lock()
            .failures
            .entry(collaborator)
            .or_default()
            .push_back(error);
    }

    /// Publish an escrow for the observer to find.
    pub fn place_escrow(&self, escrow: EscrowInfo) {
        self.state
            .lock()
            .escrows
            .insert((escrow.network, escrow.order_hash), escrow);
    }

    /// Publish the counterparty escrow a resolver would create for `record`.
    pub fn place_matching_escrow(&self, record: &SwapRecord) -> EscrowInfo {
        let nonce = self.next_nonce();
        let escrow = EscrowInfo {
            network: record.to_network(),
            address: record.destination_address().as_str().to_string(),
            order_hash: *record.order_hash(),
            hash_lock: *record.hash_lock(),
            amount: record.amount(),
            tx_hash: Some(tx_hash_for(record.to_network(), nonce)),
        };
        self.place_escrow(escrow.clone());
        escrow
    }

    /// Deployments received so far.
    pub fn deployments(&self) -> Vec<EscrowDeployment> {
        self.state.lock().deployments.clone()
    }

    /// Approvals received so far.
    pub fn approvals(&self) -> Vec<(NetworkId, NativeAddress, U256)> {
        self.state.lock().approvals.clone()
    }

    /// Withdrawals received so far.
    pub fn claims(&self) -> Vec<ObservedClaim> {
        self.state.lock().claims.clone()
    }

    /// Calls made to `collaborator`.
    pub fn call_count(&self, collaborator: &'static str) -> usize {
        self.state.lock().calls.get(collaborator).copied().unwrap_or(0)
    }

    async fn enter(&self, collaborator: &'static str) -> Result<(), ChainCallError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let mut state = self.state.lock();
        *state.calls.entry(collaborator).or_default() += 1;
        match state.failures.get_mut(collaborator).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_nonce(&self) -> u64 {
        let mut state = self.state.lock();
        state.next_nonce += 1;
        state.next_nonce
    }

    fn submit(&self, kind: TxKind, network: NetworkId) -> TransactionHandle {
        let mut state = self.state.lock();
        state.next_nonce += 1;
        let tx_hash = tx_hash_for(network, state.next_nonce);
        let outcome = state
            .scripted
            .get_mut(&kind)
            .and_then(VecDeque::pop_front)
            .unwrap_or(TxOutcome::Confirm);
        debug!(?kind, %network, %tx_hash, ?outcome, "Simulated transaction submitted");
        state.transactions.insert(
            tx_hash.clone(),
            SimTx {
                outcome,
                polls_left: self.confirmation_polls,
            },
        );
        TransactionHandle::new(network, tx_hash)
    }
}

impl Default for SimulatedChain {
    fn default() -> Self {
        Self::new()
    }
}

/// EVM transaction ids are `0x`-prefixed, Tron ids are bare hex.
fn tx_hash_for(network: NetworkId, nonce: u64) -> String {
    let digest = hex::encode(keccak256(&nonce.to_be_bytes()));
    match network.address_format() {
        AddressFormat::Evm => format!("0x{digest}"),
        AddressFormat::Tron => digest,
    }
}

#[async_trait]
impl AllowanceQuery for SimulatedChain {
    async fn allowance(
        &self,
        owner: &NativeAddress,
        spender: &NativeAddress,
        network: NetworkId,
    ) -> Result<U256, ChainCallError> {
        self.enter(collaborator::ALLOWANCE).await?;
        Ok(self
            .state
            .lock()
            .allowances
            .get(&(network, *owner.account_id(), *spender.account_id()))
            .copied()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ApprovalSubmitter for SimulatedChain {
    async fn submit_approval(
        &self,
        spender: &NativeAddress,
        amount: U256,
        network: NetworkId,
    ) -> Result<TransactionHandle, ChainCallError> {
        self.enter(collaborator::APPROVALS).await?;
        self.state
            .lock()
            .approvals
            .push((network, spender.clone(), amount));
        Ok(self.submit(TxKind::Approval, network))
    }
}

#[async_trait]
impl EscrowDeployer for SimulatedChain {
    async fn deploy_escrow(
        &self,
        deployment: &EscrowDeployment,
    ) -> Result<TransactionHandle, ChainCallError> {
        self.enter(collaborator::DEPLOYER).await?;
        if deployment.time_locks_packed.bits() > 160 {
            return Err(ChainCallError::Rejected("timeLocks exceeds 160 bits".into()));
        }
        self.state.lock().deployments.push(deployment.clone());
        Ok(self.submit(TxKind::Deployment, deployment.network))
    }
}

#[async_trait]
impl EscrowObserver for SimulatedChain {
    async fn find_escrow(
        &self,
        order_hash: &Hash,
        network: NetworkId,
    ) -> Result<Option<EscrowInfo>, ChainCallError> {
        self.enter(collaborator::OBSERVER).await?;
        Ok(self.state.lock().escrows.get(&(network, *order_hash)).cloned())
    }
}

#[async_trait]
impl ClaimSubmitter for SimulatedChain {
    async fn submit_claim(
        &self,
        order_hash: &Hash,
        secret: &SecureSecret,
        network: NetworkId,
    ) -> Result<TransactionHandle, ChainCallError> {
        self.enter(collaborator::CLAIMS).await?;
        self.state.lock().claims.push(ObservedClaim {
            network,
            order_hash: *order_hash,
            secret: secret.clone(),
        });
        Ok(self.submit(TxKind::Claim, network))
    }
}

#[async_trait]
impl TransactionTracker for SimulatedChain {
    async fn status(&self, handle: &TransactionHandle) -> Result<TxStatus, ChainCallError> {
        self.enter(collaborator::TRACKER).await?;
        let mut state = self.state.lock();
        let tx = state
            .transactions
            .get_mut(&handle.tx_hash)
            .ok_or_else(|| {
                ChainCallError::Rejected(format!("unknown transaction {}", handle.tx_hash))
            })?;
        if tx.polls_left > 0 {
            tx.polls_left -= 1;
            return Ok(TxStatus::Pending);
        }
        Ok(match &tx.outcome {
            TxOutcome::Confirm => TxStatus::Confirmed,
            TxOutcome::Revert(reason) => TxStatus::Reverted {
                reason: reason.clone(),
            },
            TxOutcome::Hang => TxStatus::Pending,
        })
    }
}
