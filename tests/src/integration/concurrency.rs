//! # Concurrency Tests
//!
//! One `Arc<BridgeOrchestrator>` shared by many tasks, each owning its own
//! `SwapRecord`.

#[cfg(test)]
mod tests {
    use crate::support::{bridge, request, USER_EVM, USER_TRON};
    use fb_swap_core::{NetworkId, SwapStatus};
    use std::collections::HashSet;

    const SWAPS: usize = 16;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_swaps_complete_independently() {
        let b = std::sync::Arc::new(bridge());

        let mut handles = Vec::with_capacity(SWAPS);
        for i in 0..SWAPS {
            let b = b.clone();
            handles.push(tokio::spawn(async move {
                let req = if i % 2 == 0 {
                    request(NetworkId::Sepolia, NetworkId::Tron, USER_EVM, 100 + i as u64)
                } else {
                    request(NetworkId::Tron, NetworkId::Monad, USER_TRON, 100 + i as u64)
                };
                let mut record = b.orchestrator.initiate(&req).unwrap();
                let status = b.drive_to_terminal(&mut record).await.unwrap();
                (status, record)
            }));
        }

        let mut ids = HashSet::new();
        let mut order_hashes = HashSet::new();
        for handle in handles {
            let (status, record) = handle.await.unwrap();
            assert_eq!(status, SwapStatus::Completed);
            assert!(ids.insert(record.id()));
            assert!(order_hashes.insert(*record.order_hash()));
        }

        assert_eq!(b.chain.claims().len(), SWAPS);
        assert_eq!(b.chain.deployments().len(), SWAPS);
        // Nobody granted allowance, so every swap approved first.
        assert_eq!(b.chain.approvals().len(), SWAPS);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancelled_swap_does_not_affect_others() {
        let b = std::sync::Arc::new(bridge());
        let mut cancelled = b
            .orchestrator
            .initiate(&request(NetworkId::Sepolia, NetworkId::Tron, USER_EVM, 1))
            .unwrap();
        let mut healthy = b
            .orchestrator
            .initiate(&request(NetworkId::Monad, NetworkId::Tron, USER_EVM, 1))
            .unwrap();

        b.orchestrator.cancel(&mut cancelled).unwrap();

        let other = b.clone();
        let task = tokio::spawn(async move {
            let status = other.drive_to_terminal(&mut healthy).await.unwrap();
            (status, healthy)
        });
        let (status, healthy) = task.await.unwrap();

        assert_eq!(cancelled.status(), SwapStatus::Cancelled);
        assert_eq!(status, SwapStatus::Completed);
        assert_eq!(b.chain.claims().len(), 1);
        assert_eq!(b.chain.claims()[0].order_hash, *healthy.order_hash());
    }
}
