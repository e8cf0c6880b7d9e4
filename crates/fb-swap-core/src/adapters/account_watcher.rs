//! Account Change Detector
//!
//! Wallet extensions only expose the selected account by polling. The
//! detector turns successive poll results into deduplicated `AccountChanged`
//! events on a channel; the polling loop itself belongs to the caller.

use crate::algorithms::address_codec;
use crate::domain::{AddressFormat, BridgeError, NativeAddress};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// A wallet switched accounts, connected or disconnected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountChanged {
    /// Account before the change.
    pub previous: Option<NativeAddress>,
    /// Account after the change; `None` when disconnected.
    pub current: Option<NativeAddress>,
}

/// Feeds polled wallet accounts in and emits changes.
#[derive(Debug)]
pub struct AccountChangeDetector {
    format: AddressFormat,
    last: Option<NativeAddress>,
    events: mpsc::Sender<AccountChanged>,
}

impl AccountChangeDetector {
    /// Detector for a wallet speaking `format`, with a bounded channel.
    pub fn channel(
        format: AddressFormat,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<AccountChanged>) {
        let (events, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                format,
                last: None,
                events,
            },
            rx,
        )
    }

    /// Account seen on the last poll.
    pub fn current(&self) -> Option<&NativeAddress> {
        self.last.as_ref()
    }

    /// Feed one poll result. Returns whether an event was sent.
    ///
    /// Empty text counts as disconnected. Re-rendering the same account
    /// (case, format) is not a change.
    pub async fn observe(&mut self, polled: Option<&str>) -> Result<bool, BridgeError> {
        let current = match polled.map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => Some(address_codec::normalize(text, self.format)?),
            None => None,
        };

        let unchanged = match (&self.last, &current) {
            (Some(a), Some(b)) => a.same_account(b),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            debug!("Wallet account unchanged");
            return Ok(false);
        }

        let event = AccountChanged {
            previous: self.last.clone(),
            current: current.clone(),
        };
        self.events
            .send(event)
            .await
            .map_err(|_| BridgeError::ExternalCallFailed {
                collaborator: "AccountChangeDetector",
                message: "event receiver dropped".to_string(),
            })?;
        info!(
            account = current.as_ref().map(NativeAddress::as_str).unwrap_or("<disconnected>"),
            "Wallet account changed"
        );
        self.last = current;
        Ok(true)
    }
}
