//! # Swap Flow Tests
//!
//! Full swaps through `BridgeOrchestrator` over the simulated chain:
//!
//! 1. **Initiate**: destination derived in the target network's format
//! 2. **Approval**: skipped when the allowance already covers the amount
//! 3. **Escrows**: source deployment carries the packed schedule, the
//!    counterparty escrow is only accepted when it matches
//! 4. **Claim**: the secret reaches the destination network exactly once
//! 5. **Expiry**: no counterparty before the cancellation window opens

#[cfg(test)]
mod tests {
    use crate::support::{bridge, bridge_with, request, test_config, USER_EVM, USER_TRON};
    use fb_swap_core::algorithms::{address_codec, timelock_codec};
    use fb_swap_core::{
        verify_secret, AddressFormat, BridgeError, NetworkId, SimulatedChain, SwapStatus,
        SwapStep, TimeLockSchedule,
    };
    use primitive_types::U256;
    use std::time::Duration;

    // =============================================================================
    // INITIATE
    // =============================================================================

    #[test]
    fn test_initiate_derives_destination_in_target_format() {
        let b = bridge();
        let record = b
            .orchestrator
            .initiate(&request(NetworkId::Sepolia, NetworkId::Tron, USER_EVM, 100))
            .unwrap();

        assert_eq!(record.status(), SwapStatus::PendingApproval);
        assert_eq!(record.destination_address().as_str(), USER_TRON);
        assert!(record.destination_address().same_account(record.user_address()));
        assert!(record.transaction_hashes().is_empty());
        assert!(record.error().is_none());
    }

    #[test]
    fn test_initiate_honours_explicit_destination() {
        let b = bridge();
        let mut req = request(NetworkId::Tron, NetworkId::Monad, USER_TRON, 100);
        req.destination_address = Some("TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeL".to_string());
        let record = b.orchestrator.initiate(&req).unwrap();

        assert_eq!(record.destination_address().format(), AddressFormat::Evm);
        assert_eq!(
            record.destination_address().as_str(),
            address_codec::normalize("TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeL", AddressFormat::Evm)
                .unwrap()
                .as_str()
        );
        assert_eq!(record.user_address().as_str(), USER_TRON);
        assert_eq!(record.resolver_address().format(), AddressFormat::Tron);
    }

    // =============================================================================
    // APPROVAL
    // =============================================================================

    #[tokio::test]
    async fn test_sufficient_allowance_skips_approving() {
        let b = bridge();
        let mut record = b
            .orchestrator
            .initiate(&request(NetworkId::Sepolia, NetworkId::Tron, USER_EVM, 100))
            .unwrap();
        b.grant_allowance(&record);

        let status = b.orchestrator.advance(&mut record).await.unwrap();

        assert_eq!(status, SwapStatus::CreatingSourceEscrow);
        assert!(b.chain.approvals().is_empty());
        assert!(!record.transaction_hashes().contains_key(&SwapStep::Approval));
    }

    #[tokio::test]
    async fn test_zero_allowance_goes_through_approving() {
        let b = bridge();
        let mut record = b
            .orchestrator
            .initiate(&request(NetworkId::Sepolia, NetworkId::Tron, USER_EVM, 100))
            .unwrap();

        assert_eq!(
            b.orchestrator.advance(&mut record).await.unwrap(),
            SwapStatus::Approving
        );
        let approvals = b.chain.approvals();
        assert_eq!(approvals.len(), 1);
        assert_eq!(approvals[0].0, NetworkId::Sepolia);
        assert_eq!(approvals[0].2, U256::from(100u64));

        assert_eq!(
            b.orchestrator.advance(&mut record).await.unwrap(),
            SwapStatus::CreatingSourceEscrow
        );
        assert!(record
            .transaction_hashes()
            .get(&SwapStep::Approval)
            .unwrap()
            .starts_with("0x"));
    }

    #[tokio::test]
    async fn test_approval_waits_for_confirmation_polls() {
        let b = bridge_with(SimulatedChain::new().with_confirmation_polls(3), test_config());
        let mut record = b
            .orchestrator
            .initiate(&request(NetworkId::Monad, NetworkId::Tron, USER_EVM, 5))
            .unwrap();

        b.orchestrator.advance(&mut record).await.unwrap();
        assert_eq!(
            b.orchestrator.advance(&mut record).await.unwrap(),
            SwapStatus::CreatingSourceEscrow
        );
        assert_eq!(b.chain.approvals().len(), 1);
    }

    #[tokio::test]
    async fn test_claim_waits_for_confirmation_polls() {
        let b = bridge_with(SimulatedChain::new().with_confirmation_polls(3), test_config());
        let mut record = b
            .orchestrator
            .initiate(&request(NetworkId::Sepolia, NetworkId::Tron, USER_EVM, 100))
            .unwrap();
        b.grant_allowance(&record);
        b.advance_until(&mut record, SwapStatus::Claiming).await.unwrap();
        let claim_hash = record.pending_transaction().unwrap().tx_hash.clone();

        assert_eq!(
            b.orchestrator.advance(&mut record).await.unwrap(),
            SwapStatus::Completed
        );
        assert_eq!(b.chain.claims().len(), 1);
        assert_eq!(record.claim_attempts(), 1);
        assert_eq!(record.transaction_hashes()[&SwapStep::Withdrawal], claim_hash);
    }

    // =============================================================================
    // FULL SWAPS
    // =============================================================================

    #[tokio::test]
    async fn test_evm_to_tron_swap_completes() {
        let b = bridge();
        let mut record = b
            .orchestrator
            .initiate(&request(NetworkId::Sepolia, NetworkId::Tron, USER_EVM, 100))
            .unwrap();

        // Approval
        assert_eq!(b.orchestrator.advance(&mut record).await.unwrap(), SwapStatus::Approving);
        assert_eq!(
            b.orchestrator.advance(&mut record).await.unwrap(),
            SwapStatus::CreatingSourceEscrow
        );

        // Source escrow: deploy, then confirm
        b.clock.advance(12);
        assert_eq!(
            b.orchestrator.advance(&mut record).await.unwrap(),
            SwapStatus::CreatingSourceEscrow
        );
        assert!(record.pending_transaction().is_some());
        assert_eq!(
            b.orchestrator.advance(&mut record).await.unwrap(),
            SwapStatus::WaitingForDestination
        );

        let deployments = b.chain.deployments();
        assert_eq!(deployments.len(), 1);
        let deployment = &deployments[0];
        assert_eq!(deployment.network, NetworkId::Sepolia);
        assert_eq!(&deployment.hash_lock, record.hash_lock());
        assert_eq!(&deployment.order_hash, record.order_hash());
        assert_eq!(deployment.maker.as_str(), USER_EVM);
        let schedule = timelock_codec::unpack(deployment.time_locks_packed).unwrap();
        assert_eq!(schedule.deployed_at, 1_700_000_012);
        assert_eq!(&schedule, record.time_locks());

        // Counterparty escrow
        assert!(b.chain.claims().is_empty());
        b.chain.place_matching_escrow(&record);
        assert_eq!(
            b.orchestrator.advance(&mut record).await.unwrap(),
            SwapStatus::ReadyToClaim
        );
        assert!(record.destination_escrow().is_some());

        // Claim
        assert_eq!(b.orchestrator.advance(&mut record).await.unwrap(), SwapStatus::Claiming);
        assert!(record.secret_revealed());
        assert_eq!(
            b.orchestrator.advance(&mut record).await.unwrap(),
            SwapStatus::Completed
        );

        let claims = b.chain.claims();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].network, NetworkId::Tron);
        assert!(verify_secret(&claims[0].secret, record.hash_lock()));

        let hashes = record.transaction_hashes();
        assert_eq!(hashes.len(), 4);
        assert!(!hashes[&SwapStep::DestinationEscrow].starts_with("0x"));
        assert!(hashes[&SwapStep::SourceEscrow].starts_with("0x"));
        assert!(!hashes[&SwapStep::Withdrawal].starts_with("0x"));
        assert!(record.pending_transaction().is_none());
        assert!(record.error().is_none());
    }

    #[tokio::test]
    async fn test_tron_to_monad_swap_completes() {
        let b = bridge();
        let mut record = b
            .orchestrator
            .initiate(&request(NetworkId::Tron, NetworkId::Monad, USER_TRON, 2_500_000))
            .unwrap();
        b.grant_allowance(&record);

        assert_eq!(
            b.drive_to_terminal(&mut record).await.unwrap(),
            SwapStatus::Completed
        );
        assert_eq!(b.chain.deployments()[0].taker.format(), AddressFormat::Tron);
        assert!(!record.transaction_hashes()[&SwapStep::SourceEscrow].starts_with("0x"));
        assert!(record.transaction_hashes()[&SwapStep::Withdrawal].starts_with("0x"));
        assert_eq!(b.chain.claims()[0].network, NetworkId::Monad);
    }

    #[tokio::test]
    async fn test_withdrawal_hash_cannot_be_seeded_before_claim() {
        let b = bridge();
        let mut record = b
            .orchestrator
            .initiate(&request(NetworkId::Sepolia, NetworkId::Tron, USER_EVM, 100))
            .unwrap();
        b.grant_allowance(&record);

        assert!(matches!(
            record.record_transaction(SwapStep::Withdrawal, "0xnever_sent"),
            Err(BridgeError::InvalidTransition {
                from: SwapStatus::PendingApproval,
                ..
            })
        ));
        assert!(record.transaction_hashes().is_empty());

        assert_eq!(
            b.drive_to_terminal(&mut record).await.unwrap(),
            SwapStatus::Completed
        );
        let withdrawal = record.transaction_hashes()[&SwapStep::Withdrawal].clone();
        assert_ne!(withdrawal, "0xnever_sent");
        assert!(!withdrawal.starts_with("0x"));
        assert_eq!(b.chain.claims().len(), 1);

        assert!(!record
            .record_transaction(SwapStep::Withdrawal, "0xnever_sent")
            .unwrap());
        assert_eq!(record.transaction_hashes()[&SwapStep::Withdrawal], withdrawal);
    }

    // =============================================================================
    // DESTINATION ESCROW
    // =============================================================================

    #[tokio::test]
    async fn test_escrow_appearing_mid_wait_is_picked_up() {
        let b = bridge();
        let mut record = b
            .orchestrator
            .initiate(&request(NetworkId::Sepolia, NetworkId::Tron, USER_EVM, 100))
            .unwrap();
        b.grant_allowance(&record);
        b.advance_until(&mut record, SwapStatus::WaitingForDestination)
            .await
            .unwrap();

        let chain = b.chain.clone();
        let snapshot = record.clone();
        let publisher = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            chain.place_matching_escrow(&snapshot);
        });

        assert_eq!(
            b.orchestrator.advance(&mut record).await.unwrap(),
            SwapStatus::ReadyToClaim
        );
        publisher.await.unwrap();
        assert!(b.chain.call_count("EscrowObserver") > 1);
    }

    #[tokio::test]
    async fn test_no_counterparty_before_cancellation_expires() {
        let b = bridge();
        let mut record = b
            .orchestrator
            .initiate(&request(NetworkId::Sepolia, NetworkId::Tron, USER_EVM, 100))
            .unwrap();
        b.grant_allowance(&record);
        b.advance_until(&mut record, SwapStatus::WaitingForDestination)
            .await
            .unwrap();

        b.clock.set(record.time_locks().cancellation_at() + 1);
        assert_eq!(
            b.orchestrator.advance(&mut record).await.unwrap(),
            SwapStatus::Expired
        );
        assert!(b.chain.claims().is_empty());
        assert!(record.error().is_none());
        assert!(record.terminal_reason().unwrap().contains("cancellation"));
    }

    #[tokio::test]
    async fn test_escrow_exactly_at_deadline_is_still_accepted() {
        let b = bridge();
        let mut record = b
            .orchestrator
            .initiate(&request(NetworkId::Sepolia, NetworkId::Tron, USER_EVM, 100))
            .unwrap();
        b.grant_allowance(&record);
        b.advance_until(&mut record, SwapStatus::WaitingForDestination)
            .await
            .unwrap();

        b.clock.set(record.time_locks().cancellation_at());
        b.chain.place_matching_escrow(&record);
        assert_eq!(
            b.orchestrator.advance(&mut record).await.unwrap(),
            SwapStatus::ReadyToClaim
        );
    }

    // =============================================================================
    // TIME-LOCK WORD
    // =============================================================================

    #[test]
    fn test_schedule_word_round_trips() {
        let schedule = TimeLockSchedule::from_fields([1000, 0, 300, 3600, 7200]);
        let word = timelock_codec::pack(&schedule).unwrap();
        assert!(word.bits() <= 160);
        assert_eq!(timelock_codec::unpack(word).unwrap(), schedule);
    }
}
