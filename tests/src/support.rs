//! Shared fixtures: an orchestrator wired to a `SimulatedChain` and a
//! `ManualClock`.

use fb_swap_core::{
    BridgeCollaborators, BridgeConfig, BridgeError, BridgeOrchestrator, ManualClock, NetworkId,
    SimulatedChain, SwapRecord, SwapStatus, TransferRequest,
};
use primitive_types::U256;
use std::sync::{Arc, Once};

/// Checksummed EVM test account.
pub const USER_EVM: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

/// The same account as a Tron address.
pub const USER_TRON: &str = "TJEh7TX8sNj5uq4hXKyYdTrnGmeeG48top";

/// Start time of every `ManualClock` built here.
pub const START: u64 = 1_700_000_000;

/// Upper bound on `advance` calls in `drive_to_terminal`.
pub const MAX_STEPS: usize = 32;

static LOGGING: Once = Once::new();

/// Install a quiet subscriber once per test binary.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let mut config = fb_telemetry::TelemetryConfig::from_env();
        if std::env::var("FB_LOG_LEVEL").is_err() && std::env::var("RUST_LOG").is_err() {
            config.log_level = "warn".to_string();
        }
        let _ = fb_telemetry::init_logging(&config);
    });
}

/// Orchestrator plus handles on its simulated collaborators.
pub struct Bridge {
    /// Chain backend behind every port.
    pub chain: Arc<SimulatedChain>,
    /// Clock read by the orchestrator.
    pub clock: Arc<ManualClock>,
    /// System under test.
    pub orchestrator: Arc<BridgeOrchestrator>,
}

/// Test configuration: default registry, 1 ms polling.
pub fn test_config() -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.orchestrator.poll_interval_ms = 1;
    config
}

/// Bridge over a fresh chain with `test_config`.
pub fn bridge() -> Bridge {
    bridge_with(SimulatedChain::new(), test_config())
}

/// Bridge over `chain` with `config`.
pub fn bridge_with(chain: SimulatedChain, config: BridgeConfig) -> Bridge {
    init_test_logging();
    let chain = Arc::new(chain);
    let clock = Arc::new(ManualClock::new(START));
    let orchestrator = BridgeOrchestrator::new(
        config,
        BridgeCollaborators::from_backend(chain.clone(), clock.clone()),
    )
    .expect("test config is valid");
    Bridge {
        chain,
        clock,
        orchestrator: Arc::new(orchestrator),
    }
}

/// Transfer `amount` base units of the default token.
pub fn request(from: NetworkId, to: NetworkId, user: &str, amount: u64) -> TransferRequest {
    TransferRequest {
        from_network: from,
        to_network: to,
        token: None,
        amount: U256::from(amount),
        user_address: user.to_string(),
        destination_address: None,
    }
}

impl Bridge {
    /// Let the resolver spend whatever `record` needs.
    pub fn grant_allowance(&self, record: &SwapRecord) {
        self.chain.set_allowance(
            record.user_address(),
            record.resolver_address(),
            record.from_network(),
            record.amount(),
        );
    }

    /// Advance until terminal, publishing the counterparty escrow when the
    /// swap starts waiting for it.
    pub async fn drive_to_terminal(
        &self,
        record: &mut SwapRecord,
    ) -> Result<SwapStatus, BridgeError> {
        for _ in 0..MAX_STEPS {
            if record.status().is_terminal() {
                return Ok(record.status());
            }
            if record.status() == SwapStatus::WaitingForDestination {
                self.chain.place_matching_escrow(record);
            }
            self.orchestrator.advance(record).await?;
        }
        Err(BridgeError::InvariantViolation(format!(
            "swap still {} after {MAX_STEPS} steps",
            record.status()
        )))
    }

    /// Advance until `status` is reached.
    pub async fn advance_until(
        &self,
        record: &mut SwapRecord,
        status: SwapStatus,
    ) -> Result<(), BridgeError> {
        for _ in 0..MAX_STEPS {
            if record.status() == status {
                return Ok(());
            }
            if record.status() == SwapStatus::WaitingForDestination {
                self.chain.place_matching_escrow(record);
            }
            self.orchestrator.advance(record).await?;
        }
        Err(BridgeError::InvariantViolation(format!(
            "swap stuck in {} waiting for {status}",
            record.status()
        )))
    }
}
