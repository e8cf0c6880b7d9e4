//! # Inbound Ports
//!
//! What callers can ask of the bridge core.

use crate::domain::{BridgeError, SwapRecord, SwapStatus, TransferRequest};
use async_trait::async_trait;
use std::time::Duration;

/// Bridge API - inbound port.
#[async_trait]
pub trait BridgeApi: Send + Sync {
    /// Validate a request and create its record in `PENDING_APPROVAL`.
    fn initiate(&self, request: &TransferRequest) -> Result<SwapRecord, BridgeError>;

    /// Perform the next external action for `record`.
    async fn advance(&self, record: &mut SwapRecord) -> Result<SwapStatus, BridgeError>;

    /// `advance` bounded by `deadline`. On `Timeout` the record is unchanged.
    async fn advance_with_deadline(
        &self,
        record: &mut SwapRecord,
        deadline: Duration,
    ) -> Result<SwapStatus, BridgeError>;

    /// Abort a swap whose secret has not been revealed.
    fn cancel(&self, record: &mut SwapRecord) -> Result<SwapStatus, BridgeError>;
}
