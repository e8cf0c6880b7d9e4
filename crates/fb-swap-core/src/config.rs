//! # Bridge Configuration
//!
//! Network and token registry, time-lock policy and orchestrator tuning.
//! Defaults describe the public testnet deployment; a JSON document or
//! `FB_*` environment variables override them.

use crate::algorithms::address_codec;
use crate::domain::{
    AddressError, AddressFormat, BridgeError, NativeAddress, NetworkId, TimeLockError, TimeLockPolicy,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Configuration errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Network listed as supported but missing from the registry.
    #[error("Network {0} is not in the registry")]
    UnknownNetwork(NetworkId),

    /// Token symbol missing from the registry.
    #[error("Unknown token {0}")]
    UnknownToken(String),

    /// Token has no deployment on a supported network.
    #[error("Token {token} has no address on {network}")]
    MissingTokenAddress {
        /// Token symbol.
        token: String,
        /// Network lacking it.
        network: NetworkId,
    },

    /// Registry address fails its network's format.
    #[error("{network} {field}: {source}")]
    InvalidAddress {
        /// Network entry.
        network: NetworkId,
        /// Field name.
        field: String,
        /// Codec error.
        #[source]
        source: AddressError,
    },

    /// Two networks share a chain id.
    #[error("Duplicate chain id {0}")]
    DuplicateChainId(u64),

    /// Time-lock policy rejected.
    #[error(transparent)]
    TimeLocks(#[from] TimeLockError),

    /// Out-of-range tuning value.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Unparseable environment override.
    #[error("Invalid {key}={value:?}")]
    InvalidEnv {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },

    /// Malformed JSON document.
    #[error("Config JSON: {0}")]
    Json(String),
}

impl From<ConfigError> for BridgeError {
    fn from(err: ConfigError) -> Self {
        BridgeError::InvalidRequest(err.to_string())
    }
}

/// Native gas currency of a network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    /// Ticker.
    pub symbol: String,
    /// Decimals.
    pub decimals: u8,
}

/// What an explorer link points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExplorerKind {
    /// Transaction page.
    Tx,
    /// Account or contract page.
    Address,
}

/// Registry entry for one network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    /// Display name.
    pub name: String,
    /// Chain id (Tron Shasta reports 2).
    pub chain_id: u64,
    /// JSON-RPC / HTTP API endpoint.
    pub rpc_url: String,
    /// Block explorer base URL.
    pub block_explorer: String,
    /// Gas currency.
    pub native_currency: NativeCurrency,
    /// Escrow factory contract.
    pub escrow_factory: String,
    /// Resolver (spender and taker of source escrows).
    pub resolver: String,
}

impl NetworkInfo {
    /// Explorer link for a transaction or address.
    pub fn explorer_url(&self, network: NetworkId, hash: &str, kind: ExplorerKind) -> String {
        let base = self.block_explorer.trim_end_matches('/');
        match (network.address_format(), kind) {
            (AddressFormat::Tron, ExplorerKind::Tx) => {
                format!("{base}/#/transaction/{}", hash.trim_start_matches("0x"))
            }
            (AddressFormat::Tron, ExplorerKind::Address) => {
                format!("{base}/#/address/{hash}")
            }
            (_, ExplorerKind::Tx) => format!("{base}/tx/{hash}"),
            (_, ExplorerKind::Address) => format!("{base}/address/{hash}"),
        }
    }
}

/// Registry entry for one token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Ticker.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Decimals, identical on every network.
    pub decimals: u8,
    /// Contract per network.
    pub addresses: BTreeMap<NetworkId, String>,
}

/// Orchestrator tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrchestratorConfig {
    /// Delay between polls of a pending transaction or the escrow observer.
    pub poll_interval_ms: u64,
    /// Deadline applied by `advance`; none when unset.
    pub step_deadline_ms: Option<u64>,
    /// Withdrawal submissions allowed before giving up.
    pub max_claim_attempts: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_000,
            step_deadline_ms: None,
            max_claim_attempts: 3,
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    /// Network registry.
    pub networks: BTreeMap<NetworkId, NetworkInfo>,
    /// Token registry, keyed by symbol.
    pub tokens: BTreeMap<String, TokenInfo>,
    /// Token used when a request names none.
    pub default_token: String,
    /// Networks swaps may use.
    pub supported_networks: Vec<NetworkId>,
    /// Offsets for new schedules.
    pub time_locks: TimeLockPolicy,
    /// Orchestrator tuning.
    pub orchestrator: OrchestratorConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let mut networks = BTreeMap::new();
        networks.insert(
            NetworkId::Sepolia,
            NetworkInfo {
                name: "Ethereum Sepolia".to_string(),
                chain_id: 11_155_111,
                rpc_url: "https://ethereum-sepolia-rpc.publicnode.com".to_string(),
                block_explorer: "https://sepolia.etherscan.io".to_string(),
                native_currency: NativeCurrency {
                    symbol: "ETH".to_string(),
                    decimals: 18,
                },
                escrow_factory: "0xcBcFEe91Bbd4A12533Fc72a3D286B6d86ab2B9D5".to_string(),
                resolver: "0xe841d59Bb054b5cf81cF8BEA1b74EcE5A12550F2".to_string(),
            },
        );
        networks.insert(
            NetworkId::Monad,
            NetworkInfo {
                name: "Monad Testnet".to_string(),
                chain_id: 10_143,
                rpc_url: "https://monad-testnet.drpc.org".to_string(),
                block_explorer: "https://explorer.monad.xyz".to_string(),
                native_currency: NativeCurrency {
                    symbol: "MON".to_string(),
                    decimals: 18,
                },
                escrow_factory: "0xcEeeaA149BEd3Af5FB9553f0AdA0a537efcc6256".to_string(),
                resolver: "0x917999645773E99d03d44817B7318861F018Cb74".to_string(),
            },
        );
        networks.insert(
            NetworkId::Tron,
            NetworkInfo {
                name: "Tron Shasta".to_string(),
                chain_id: 2,
                rpc_url: "https://api.shasta.trongrid.io".to_string(),
                block_explorer: "https://shasta.tronscan.org".to_string(),
                native_currency: NativeCurrency {
                    symbol: "TRX".to_string(),
                    decimals: 6,
                },
                escrow_factory: "TDSffTVz8BGTgKeTvgHQeWDa2WQxErey7b".to_string(),
                resolver: "TDjWsSyKvT6X8gdfCvVXmJeLQfnQVjz1XS".to_string(),
            },
        );

        let mut usdc_addresses = BTreeMap::new();
        usdc_addresses.insert(
            NetworkId::Sepolia,
            "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238".to_string(),
        );
        usdc_addresses.insert(
            NetworkId::Monad,
            "0xf817257fed379853cDe0fa4F97AB987181B1E5Ea".to_string(),
        );
        usdc_addresses.insert(
            NetworkId::Tron,
            "TSdZwNqpHofzP6BsBKGQUWdBeJphLmF6id".to_string(),
        );
        let mut tokens = BTreeMap::new();
        tokens.insert(
            "USDC".to_string(),
            TokenInfo {
                symbol: "USDC".to_string(),
                name: "USD Coin".to_string(),
                decimals: 6,
                addresses: usdc_addresses,
            },
        );

        Self {
            networks,
            tokens,
            default_token: "USDC".to_string(),
            supported_networks: NetworkId::ALL.to_vec(),
            time_locks: TimeLockPolicy::default(),
            orchestrator: OrchestratorConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Defaults with `FB_*` environment overrides applied, then validated.
    ///
    /// # Environment Variables
    ///
    /// - `FB_POLL_INTERVAL_MS`: poll interval (default: 2000)
    /// - `FB_STEP_DEADLINE_MS`: per-`advance` deadline (default: none)
    /// - `FB_MAX_CLAIM_ATTEMPTS`: withdrawal retry budget (default: 3)
    /// - `FB_PUBLIC_WITHDRAWAL_SECS`: public withdrawal offset (default: 300)
    /// - `FB_CANCELLATION_SECS`: cancellation offset (default: 3600)
    /// - `FB_PUBLIC_CANCELLATION_SECS`: public cancellation offset (default: 7200)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document. Missing sections keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (the process environment in `from_env`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var::<u64, _>(&lookup, "FB_POLL_INTERVAL_MS")? {
            self.orchestrator.poll_interval_ms = v;
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, "FB_STEP_DEADLINE_MS")? {
            self.orchestrator.step_deadline_ms = Some(v);
        }
        if let Some(v) = parse_var::<u32, _>(&lookup, "FB_MAX_CLAIM_ATTEMPTS")? {
            self.orchestrator.max_claim_attempts = v;
        }
        if let Some(v) = parse_var::<u32, _>(&lookup, "FB_PUBLIC_WITHDRAWAL_SECS")? {
            self.time_locks.public_withdrawal = v;
        }
        if let Some(v) = parse_var::<u32, _>(&lookup, "FB_CANCELLATION_SECS")? {
            self.time_locks.cancellation = v;
        }
        if let Some(v) = parse_var::<u32, _>(&lookup, "FB_PUBLIC_CANCELLATION_SECS")? {
            self.time_locks.public_cancellation = v;
        }
        Ok(())
    }

    /// Check registry addresses, chain ids, token coverage, policy and tuning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut chain_ids = HashSet::new();
        for (network, info) in &self.networks {
            if !chain_ids.insert(info.chain_id) {
                return Err(ConfigError::DuplicateChainId(info.chain_id));
            }
            check_address(*network, "escrowFactory", &info.escrow_factory)?;
            check_address(*network, "resolver", &info.resolver)?;
        }

        for network in &self.supported_networks {
            if !self.networks.contains_key(network) {
                return Err(ConfigError::UnknownNetwork(*network));
            }
        }

        let default_token = self.token(&self.default_token)?;
        for token in self.tokens.values() {
            if token.decimals > 77 {
                return Err(ConfigError::InvalidValue(format!(
                    "{} decimals {} exceed uint256 range",
                    token.symbol, token.decimals
                )));
            }
            for (network, address) in &token.addresses {
                check_address(*network, &token.symbol, address)?;
            }
        }
        for network in &self.supported_networks {
            if !default_token.addresses.contains_key(network) {
                return Err(ConfigError::MissingTokenAddress {
                    token: default_token.symbol.clone(),
                    network: *network,
                });
            }
        }

        self.time_locks.schedule(0)?;

        if self.orchestrator.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue("pollIntervalMs cannot be 0".into()));
        }
        if self.orchestrator.max_claim_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "maxClaimAttempts cannot be 0".into(),
            ));
        }
        if self.orchestrator.step_deadline_ms == Some(0) {
            return Err(ConfigError::InvalidValue("stepDeadlineMs cannot be 0".into()));
        }
        Ok(())
    }

    /// True when swaps may use `network`.
    pub fn is_supported(&self, network: NetworkId) -> bool {
        self.supported_networks.contains(&network) && self.networks.contains_key(&network)
    }

    /// Registry entry for `network`.
    pub fn network(&self, network: NetworkId) -> Result<&NetworkInfo, ConfigError> {
        self.networks
            .get(&network)
            .ok_or(ConfigError::UnknownNetwork(network))
    }

    /// Registry entry for `symbol`.
    pub fn token(&self, symbol: &str) -> Result<&TokenInfo, ConfigError> {
        self.tokens
            .get(symbol)
            .ok_or_else(|| ConfigError::UnknownToken(symbol.to_string()))
    }

    /// Resolver of `network`, in its native format.
    pub fn resolver_address(&self, network: NetworkId) -> Result<NativeAddress, ConfigError> {
        let info = self.network(network)?;
        native(network, "resolver", &info.resolver)
    }

    /// Contract of `symbol` on `network`, in its native format.
    pub fn token_address(&self, symbol: &str, network: NetworkId) -> Result<NativeAddress, ConfigError> {
        let token = self.token(symbol)?;
        let address = token
            .addresses
            .get(&network)
            .ok_or_else(|| ConfigError::MissingTokenAddress {
                token: symbol.to_string(),
                network,
            })?;
        native(network, &token.symbol, address)
    }

    /// Explorer link on `network`.
    pub fn explorer_url(
        &self,
        network: NetworkId,
        hash: &str,
        kind: ExplorerKind,
    ) -> Result<String, ConfigError> {
        Ok(self.network(network)?.explorer_url(network, hash, kind))
    }
}

fn native(network: NetworkId, field: &str, address: &str) -> Result<NativeAddress, ConfigError> {
    address_codec::normalize(address, network.address_format()).map_err(|source| {
        ConfigError::InvalidAddress {
            network,
            field: field.to_string(),
            source,
        }
    })
}

fn check_address(network: NetworkId, field: &str, address: &str) -> Result<(), ConfigError> {
    let format = network.address_format();
    if address_codec::is_valid_for_format(address, format) {
        return Ok(());
    }
    Err(ConfigError::InvalidAddress {
        network,
        field: field.to_string(),
        source: AddressError::invalid(address, format, "not valid for this network"),
    })
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value: raw }),
    }
}
