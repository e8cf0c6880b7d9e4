//! # Hash Lock and Order Hash
//!
//! Keccak-256 digests shared with the escrow contracts: the hash lock guarding
//! both escrows and the order hash identifying the swap on both chains.

use crate::domain::{AccountId, Hash, SecureSecret};
use primitive_types::U256;
use sha3::{Digest, Keccak256};

/// Hash lock: `keccak256(secret)`.
pub fn create_hash_lock(secret: &SecureSecret) -> Hash {
    keccak256(secret.as_bytes())
}

/// Check a secret against a hash lock.
pub fn verify_secret(secret: &SecureSecret, hash_lock: &Hash) -> bool {
    create_hash_lock(secret) == *hash_lock
}

/// Inputs to the order hash. Addresses enter as raw account ids so the hash
/// does not depend on which encoding the caller typed.
#[derive(Clone, Copy, Debug)]
pub struct OrderParams<'a> {
    /// Chain id of the source network.
    pub source_chain_id: u64,
    /// Chain id of the destination network.
    pub destination_chain_id: u64,
    /// Source token contract.
    pub token: &'a AccountId,
    /// Amount in token base units.
    pub amount: U256,
    /// Maker (user) account.
    pub maker: &'a AccountId,
    /// Hash lock of the swap.
    pub hash_lock: &'a Hash,
}

/// `keccak256(abi.encodePacked(uint256 srcChainId, uint256 dstChainId,
/// address token, uint256 amount, address maker, bytes32 hashLock))`.
pub fn compute_order_hash(params: &OrderParams<'_>) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(u256_bytes(U256::from(params.source_chain_id)));
    hasher.update(u256_bytes(U256::from(params.destination_chain_id)));
    hasher.update(params.token);
    hasher.update(u256_bytes(params.amount));
    hasher.update(params.maker);
    hasher.update(params.hash_lock);
    hasher.finalize().into()
}

/// Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> Hash {
    Keccak256::digest(data).into()
}

fn u256_bytes(value: U256) -> [u8; 32] {
    let mut out = [0u8; 32];
    value.to_big_endian(&mut out);
    out
}
