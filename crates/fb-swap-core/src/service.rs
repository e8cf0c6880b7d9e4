//! # Bridge Orchestrator
//!
//! Drives a `SwapRecord` through the state machine, one external action per
//! `advance`, using the injected chain collaborators.
//!
//! ## Concurrency
//!
//! - `advance` and `cancel` take `&mut SwapRecord`: one writer per record.
//! - The orchestrator itself is `Send + Sync`; share it through `Arc` and
//!   advance distinct records from as many tasks as needed.
//! - Records change only after an await has completed, so dropping an
//!   `advance` future (or hitting its deadline) leaves the record as it was.

use crate::algorithms::address_codec;
use crate::algorithms::secret::{compute_order_hash, create_hash_lock, OrderParams};
use crate::algorithms::timelock_codec;
use crate::config::BridgeConfig;
use crate::domain::{
    invariant_distinct_networks, invariant_positive_amount, AddressError, BridgeError,
    EscrowDeployment, EscrowInfo, NativeAddress, NetworkId, SecureSecret, SwapInput, SwapRecord,
    SwapRecordParams, SwapStatus, TimeLockError, TransactionHandle, TransferRequest, TxStatus,
};
use crate::ports::inbound::BridgeApi;
use crate::ports::outbound::{collaborator, BridgeCollaborators, ChainCallError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Receiving address for a swap: the requested one in `to`'s format, or the
/// user's own account rendered for `to`.
pub fn resolve_destination(
    requested: Option<&str>,
    user: &NativeAddress,
    to: NetworkId,
) -> Result<NativeAddress, AddressError> {
    let target = to.address_format();
    match requested.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => address_codec::normalize(text, target),
        None => Ok(user.to_format(target)),
    }
}

/// True when `escrow` is the counterparty of `record`.
pub fn escrow_matches(record: &SwapRecord, escrow: &EscrowInfo) -> bool {
    escrow.network == record.to_network()
        && escrow.hash_lock == *record.hash_lock()
        && escrow.order_hash == *record.order_hash()
}

/// The main bridge orchestrator.
#[derive(Debug)]
pub struct BridgeOrchestrator {
    config: BridgeConfig,
    collaborators: BridgeCollaborators,
}

impl BridgeOrchestrator {
    /// Create an orchestrator. The configuration is validated first.
    pub fn new(
        config: BridgeConfig,
        collaborators: BridgeCollaborators,
    ) -> Result<Self, BridgeError> {
        config.validate()?;
        Ok(Self {
            config,
            collaborators,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Validate a request and create its record in `PENDING_APPROVAL`.
    #[instrument(skip(self, request), fields(from = %request.from_network, to = %request.to_network))]
    pub fn initiate(&self, request: &TransferRequest) -> Result<SwapRecord, BridgeError> {
        let (from, to) = (request.from_network, request.to_network);
        invariant_distinct_networks(from, to)?;
        for network in [from, to] {
            if !self.config.is_supported(network) {
                return Err(BridgeError::InvalidRequest(format!(
                    "network {network} is not supported"
                )));
            }
        }
        invariant_positive_amount(request.amount)?;

        let token = request
            .token
            .clone()
            .unwrap_or_else(|| self.config.default_token.clone());
        let token_address = self.config.token_address(&token, from)?;
        self.config.token_address(&token, to)?;

        let user_address = address_codec::normalize(&request.user_address, from.address_format())?;
        let destination_address =
            resolve_destination(request.destination_address.as_deref(), &user_address, to)?;
        let resolver_address = self.config.resolver_address(from)?;

        let secret = SecureSecret::generate();
        let hash_lock = create_hash_lock(&secret);
        let order_hash = compute_order_hash(&OrderParams {
            source_chain_id: self.config.network(from)?.chain_id,
            destination_chain_id: self.config.network(to)?.chain_id,
            token: token_address.account_id(),
            amount: request.amount,
            maker: user_address.account_id(),
            hash_lock: &hash_lock,
        });

        let now = self.collaborators.clock.now_secs();
        let time_locks = self.config.time_locks.schedule(now)?;

        let record = SwapRecord::new(SwapRecordParams {
            id: Uuid::new_v4(),
            order_hash,
            secret,
            from_network: from,
            to_network: to,
            token,
            amount: request.amount,
            user_address,
            destination_address,
            resolver_address,
            time_locks,
            created_at: now,
        })?;

        info!(
            swap_id = %record.id(),
            user = %record.user_address(),
            destination = %record.destination_address(),
            amount = %record.amount(),
            "Swap initiated"
        );
        Ok(record)
    }

    /// Perform the next external action, bounded by the configured step
    /// deadline when one is set.
    pub async fn advance(&self, record: &mut SwapRecord) -> Result<SwapStatus, BridgeError> {
        match self.config.orchestrator.step_deadline_ms {
            Some(ms) => {
                self.advance_with_deadline(record, Duration::from_millis(ms))
                    .await
            }
            None => self.step(record).await,
        }
    }

    /// `advance` bounded by `deadline`. On `Timeout` the record is unchanged.
    pub async fn advance_with_deadline(
        &self,
        record: &mut SwapRecord,
        deadline: Duration,
    ) -> Result<SwapStatus, BridgeError> {
        let swap_id = record.id();
        let operation = operation_name(record.status());
        let deadline_ms = duration_ms(deadline);
        match tokio::time::timeout(deadline, self.step(record)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%swap_id, operation, deadline_ms, "Advance deadline elapsed");
                Err(BridgeError::Timeout {
                    operation,
                    elapsed_ms: deadline_ms,
                })
            }
        }
    }

    /// Abort a swap whose secret has not been revealed.
    #[instrument(skip(self, record), fields(swap_id = %record.id(), status = %record.status()))]
    pub fn cancel(&self, record: &mut SwapRecord) -> Result<SwapStatus, BridgeError> {
        record.check_invariants()?;
        record.apply(SwapInput::UserCancel)
    }

    #[instrument(skip(self, record), fields(swap_id = %record.id(), status = %record.status()))]
    async fn step(&self, record: &mut SwapRecord) -> Result<SwapStatus, BridgeError> {
        record.check_invariants()?;
        match record.status() {
            SwapStatus::PendingApproval => self.check_allowance(record).await,
            SwapStatus::Approving => self.await_approval(record).await,
            SwapStatus::CreatingSourceEscrow if record.pending_transaction().is_none() => {
                self.deploy_source_escrow(record).await
            }
            SwapStatus::CreatingSourceEscrow => self.await_source_escrow(record).await,
            SwapStatus::WaitingForDestination => self.wait_for_destination(record).await,
            SwapStatus::ReadyToClaim => self.submit_claim(record).await,
            SwapStatus::Claiming => self.await_claim(record).await,
            terminal => {
                warn!(status = %terminal, "Advance on terminal swap");
                Err(BridgeError::InvalidTransition {
                    from: terminal,
                    event: "advance".to_string(),
                })
            }
        }
    }

    async fn check_allowance(&self, record: &mut SwapRecord) -> Result<SwapStatus, BridgeError> {
        let network = record.from_network();
        let allowance = match self
            .collaborators
            .allowance
            .allowance(record.user_address(), record.resolver_address(), network)
            .await
        {
            Ok(allowance) => allowance,
            Err(err) => return Err(self.collaborator_failed(record, collaborator::ALLOWANCE, err)),
        };
        debug!(%allowance, amount = %record.amount(), "Allowance read");

        if allowance >= record.amount() {
            return record.apply(SwapInput::ApprovalNotNeeded { allowance });
        }

        let handle = match self
            .collaborators
            .approvals
            .submit_approval(record.resolver_address(), record.amount(), network)
            .await
        {
            Ok(handle) => handle,
            Err(err) => return Err(self.collaborator_failed(record, collaborator::APPROVALS, err)),
        };
        record.apply(SwapInput::ApprovalSubmitted { handle })
    }

    async fn await_approval(&self, record: &mut SwapRecord) -> Result<SwapStatus, BridgeError> {
        match self.poll_pending(record).await? {
            TxStatus::Reverted { reason } => record.apply(SwapInput::ApprovalFailed {
                reason: format!("approval reverted: {reason}"),
            }),
            _ => record.apply(SwapInput::ApprovalConfirmed),
        }
    }

    async fn deploy_source_escrow(
        &self,
        record: &mut SwapRecord,
    ) -> Result<SwapStatus, BridgeError> {
        let now = self.collaborators.clock.now_secs();
        let deployed_at = u32::try_from(now).map_err(|_| {
            BridgeError::TimeLock(TimeLockError::FieldOverflow {
                field: "deployedAt",
                value: now,
            })
        })?;
        let time_locks = record.time_locks().with_deployed_at(deployed_at);
        let deployment = EscrowDeployment {
            order_hash: *record.order_hash(),
            hash_lock: *record.hash_lock(),
            amount: record.amount(),
            time_locks_packed: timelock_codec::pack(&time_locks)?,
            maker: record.user_address().clone(),
            taker: record.resolver_address().clone(),
            network: record.from_network(),
        };
        debug!(time_locks = %deployment.time_locks_packed, "Deploying source escrow");

        let handle = match self.collaborators.deployer.deploy_escrow(&deployment).await {
            Ok(handle) => handle,
            Err(err) => return Err(self.collaborator_failed(record, collaborator::DEPLOYER, err)),
        };
        record.record_source_escrow_submission(time_locks, handle)?;
        Ok(record.status())
    }

    async fn await_source_escrow(
        &self,
        record: &mut SwapRecord,
    ) -> Result<SwapStatus, BridgeError> {
        match self.poll_pending(record).await? {
            TxStatus::Reverted { reason } => record.apply(SwapInput::SourceEscrowFailed {
                reason: format!("source escrow deployment reverted: {reason}"),
            }),
            _ => record.apply(SwapInput::SourceEscrowCreated),
        }
    }

    async fn wait_for_destination(
        &self,
        record: &mut SwapRecord,
    ) -> Result<SwapStatus, BridgeError> {
        let network = record.to_network();
        loop {
            let now = self.collaborators.clock.now_secs();
            if now > record.time_locks().cancellation_at() {
                return record.apply(SwapInput::DestinationTimeout { now });
            }

            let found = match self
                .collaborators
                .observer
                .find_escrow(record.order_hash(), network)
                .await
            {
                Ok(found) => found,
                Err(err) => {
                    return Err(self.collaborator_failed(record, collaborator::OBSERVER, err))
                }
            };
            match found {
                Some(escrow) if escrow_matches(record, &escrow) => {
                    return record.apply(SwapInput::DestinationEscrowObserved { escrow });
                }
                Some(escrow) => {
                    warn!(escrow = %escrow.address, "Ignoring escrow with mismatched hash lock or order hash");
                }
                None => debug!(%network, "Destination escrow not yet observed"),
            }
            self.pause().await;
        }
    }

    async fn submit_claim(&self, record: &mut SwapRecord) -> Result<SwapStatus, BridgeError> {
        let handle = match self.send_claim(record).await {
            Ok(handle) => handle,
            Err(err) => return Err(self.collaborator_failed(record, collaborator::CLAIMS, err)),
        };
        record.apply(SwapInput::ClaimSubmitted { handle })
    }

    async fn await_claim(&self, record: &mut SwapRecord) -> Result<SwapStatus, BridgeError> {
        let reason = match self.poll_pending(record).await? {
            TxStatus::Reverted { reason } => reason,
            _ => return record.apply(SwapInput::ClaimConfirmed),
        };

        let max_attempts = self.config.orchestrator.max_claim_attempts;
        if record.claim_attempts() >= max_attempts {
            return record.apply(SwapInput::ClaimFailed {
                reason: format!(
                    "withdrawal reverted after {} attempts: {reason}",
                    record.claim_attempts()
                ),
                max_attempts,
            });
        }

        warn!(attempt = record.claim_attempts(), %reason, "Withdrawal reverted, resubmitting");
        let handle = match self.send_claim(record).await {
            Ok(handle) => handle,
            Err(err) => return Err(self.collaborator_failed(record, collaborator::CLAIMS, err)),
        };
        record.record_claim_retry(handle)?;
        Ok(record.status())
    }

    async fn send_claim(&self, record: &SwapRecord) -> Result<TransactionHandle, ChainCallError> {
        self.collaborators
            .claims
            .submit_claim(record.order_hash(), record.secret(), record.to_network())
            .await
    }

    /// Poll the in-flight transaction until it leaves `Pending`.
    async fn poll_pending(&self, record: &mut SwapRecord) -> Result<TxStatus, BridgeError> {
        let handle = record.pending_transaction().cloned().ok_or_else(|| {
            BridgeError::InvariantViolation(format!(
                "{} without a transaction in flight",
                record.status()
            ))
        })?;
        loop {
            match self.collaborators.tracker.status(&handle).await {
                Ok(TxStatus::Pending) => {
                    debug!(tx_hash = %handle.tx_hash, "Transaction pending");
                    self.pause().await;
                }
                Ok(status) => return Ok(status),
                Err(err) => {
                    return Err(self.collaborator_failed(record, collaborator::TRACKER, err))
                }
            }
        }
    }

    async fn pause(&self) {
        tokio::time::sleep(Duration::from_millis(
            self.config.orchestrator.poll_interval_ms,
        ))
        .await;
    }

    fn collaborator_failed(
        &self,
        record: &mut SwapRecord,
        collaborator: &'static str,
        err: ChainCallError,
    ) -> BridgeError {
        let message = err.to_string();
        error!(swap_id = %record.id(), collaborator, %message, "Collaborator call failed");
        if let Err(apply_err) = record.apply(SwapInput::CollaboratorFailed {
            collaborator,
            message: message.clone(),
        }) {
            return apply_err;
        }
        BridgeError::ExternalCallFailed {
            collaborator,
            message,
        }
    }
}

/// Whole milliseconds, saturating for deadlines beyond `u64::MAX` ms.
fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn operation_name(status: SwapStatus) -> &'static str {
    match status {
        SwapStatus::PendingApproval => "allowance check",
        SwapStatus::Approving => "approval confirmation",
        SwapStatus::CreatingSourceEscrow => "source escrow deployment",
        SwapStatus::WaitingForDestination => "destination escrow",
        SwapStatus::ReadyToClaim => "withdrawal submission",
        SwapStatus::Claiming => "withdrawal confirmation",
        _ => "advance",
    }
}

#[async_trait]
impl BridgeApi for BridgeOrchestrator {
    fn initiate(&self, request: &TransferRequest) -> Result<SwapRecord, BridgeError> {
        BridgeOrchestrator::initiate(self, request)
    }

    async fn advance(&self, record: &mut SwapRecord) -> Result<SwapStatus, BridgeError> {
        BridgeOrchestrator::advance(self, record).await
    }

    async fn advance_with_deadline(
        &self,
        record: &mut SwapRecord,
        deadline: Duration,
    ) -> Result<SwapStatus, BridgeError> {
        BridgeOrchestrator::advance_with_deadline(self, record, deadline).await
    }

    fn cancel(&self, record: &mut SwapRecord) -> Result<SwapStatus, BridgeError> {
        BridgeOrchestrator::cancel(self, record)
    }
}
