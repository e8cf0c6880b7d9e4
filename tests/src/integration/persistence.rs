//! # Persistence Tests
//!
//! A record serialized mid-swap must resume where it stopped, and a stored
//! record that breaks an invariant must not load.

#[cfg(test)]
mod tests {
    use crate::support::{bridge, request, USER_EVM};
    use fb_swap_core::{NetworkId, SwapRecord, SwapStatus};
    use serde_json::{json, Value};

    async fn waiting_record() -> (crate::support::Bridge, SwapRecord) {
        let b = bridge();
        let mut record = b
            .orchestrator
            .initiate(&request(NetworkId::Sepolia, NetworkId::Tron, USER_EVM, 100))
            .unwrap();
        b.grant_allowance(&record);
        b.advance_until(&mut record, SwapStatus::WaitingForDestination)
            .await
            .unwrap();
        (b, record)
    }

    #[tokio::test]
    async fn test_restored_record_resumes() {
        let (b, record) = waiting_record().await;
        let stored = serde_json::to_string(&record).unwrap();
        drop(record);

        let mut restored: SwapRecord = serde_json::from_str(&stored).unwrap();
        assert_eq!(restored.status(), SwapStatus::WaitingForDestination);
        assert_eq!(
            b.drive_to_terminal(&mut restored).await.unwrap(),
            SwapStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_stored_shape_is_camel_case() {
        let (_b, record) = waiting_record().await;
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["status"], json!("waiting_for_destination"));
        assert_eq!(value["fromNetwork"], json!("sepolia"));
        assert!(value["hashLock"].as_str().unwrap().starts_with("0x"));
        assert!(value["transactionHashes"]["sourceEscrow"].is_string());
        assert_eq!(value["timeLocks"]["cancellation"], json!(3600));
    }

    fn tampered(record: &SwapRecord, edit: impl FnOnce(&mut Value)) -> serde_json::Result<SwapRecord> {
        let mut value = serde_json::to_value(record).unwrap();
        edit(&mut value);
        serde_json::from_value(value)
    }

    #[tokio::test]
    async fn test_tampered_records_are_rejected() {
        let (_b, record) = waiting_record().await;

        assert!(tampered(&record, |v| v["secret"] = json!(format!("0x{}", "11".repeat(32)))).is_err());
        assert!(tampered(&record, |v| v["status"] = json!("failed")).is_err());
        assert!(tampered(&record, |v| v["error"] = json!("boom")).is_err());
        assert!(tampered(&record, |v| v["toNetwork"] = json!("sepolia")).is_err());
        assert!(tampered(&record, |v| v["amount"] = json!("0x0")).is_err());
        assert!(tampered(&record, |v| v["timeLocks"]["cancellation"] = json!(10)).is_err());
        assert!(tampered(&record, |_| {}).is_ok());
    }
}
