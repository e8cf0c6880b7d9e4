//! # Address Codec
//!
//! Validation and lossless conversion between the two address encodings.
//! Both carry the same 20-byte account id:
//!
//! ```text
//! EVM:  "0x" || hex(account_id)                 (EIP-55 mixed-case checksum)
//! Tron: base58(0x41 || account_id || checksum)  (checksum = sha256d[..4])
//! ```
//!
//! Every function here is total over untrusted text: malformed input yields
//! `AddressError::InvalidFormat`, never a panic.

use crate::domain::{AccountId, AddressError, AddressFormat, NativeAddress};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// Version byte of Tron mainnet/testnet account addresses.
pub const TRON_ADDRESS_PREFIX: u8 = 0x41;

/// Length of a base58check-encoded Tron address.
pub const TRON_ADDRESS_LEN: usize = 34;

/// Length of a `0x`-prefixed EVM address.
pub const EVM_ADDRESS_LEN: usize = 42;

/// Normalize untrusted text into `target`'s native encoding.
///
/// Input already valid for `target` is returned unchanged. Input valid in the
/// other format is converted. Anything else is rejected.
pub fn normalize(address: &str, target: AddressFormat) -> Result<NativeAddress, AddressError> {
    if address.is_empty() {
        return Err(AddressError::invalid(address, target, "address is required"));
    }

    let direct = decode(address, target);
    if let Ok(account) = direct {
        return Ok(NativeAddress::from_parts(target, address.to_string(), account));
    }

    match decode(address, target.other()) {
        Ok(account) => Ok(encode(&account, target)),
        Err(other_reason) => {
            let reason = match detect_syntax(address) {
                Some(format) if format == target => direct.err().unwrap_or(other_reason),
                Some(_) => other_reason,
                None => "matches neither EVM nor Tron address syntax",
            };
            Err(AddressError::invalid(address, target, reason))
        }
    }
}

/// Syntactic and checksum validation for one format.
pub fn is_valid_for_format(address: &str, format: AddressFormat) -> bool {
    decode(address, format).is_ok()
}

/// Parse an address in whichever format it is written in.
pub fn parse(address: &str) -> Result<NativeAddress, AddressError> {
    let format = detect_syntax(address).unwrap_or(AddressFormat::Evm);
    let account =
        decode(address, format).map_err(|reason| AddressError::invalid(address, format, reason))?;
    Ok(NativeAddress::from_parts(format, address.to_string(), account))
}

/// Render an account id in `format`. EVM output is EIP-55 checksummed.
pub fn encode(account: &AccountId, format: AddressFormat) -> NativeAddress {
    let text = match format {
        AddressFormat::Evm => to_checksum_address(account),
        AddressFormat::Tron => encode_tron(account),
    };
    NativeAddress::from_parts(format, text, *account)
}

/// EIP-55 checksummed rendering of an account id.
pub fn to_checksum_address(account: &AccountId) -> String {
    let lower = hex::encode(account);
    let digest = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(EVM_ADDRESS_LEN);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let byte = digest[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Both renderings of one account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFormats {
    /// Input as given.
    pub original: String,
    /// EIP-55 EVM rendering.
    pub evm: String,
    /// Base58check Tron rendering.
    pub tron: String,
}

/// Render a valid address in both formats.
pub fn address_formats(address: &str) -> Result<AddressFormats, AddressError> {
    let parsed = parse(address)?;
    Ok(AddressFormats {
        original: address.to_string(),
        evm: to_checksum_address(parsed.account_id()),
        tron: encode_tron(parsed.account_id()),
    })
}

/// `0x1234...abcd` style shortening for display.
pub fn shorten_address(address: &str, head: usize, tail: usize) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= head.saturating_add(tail) {
        return address.to_string();
    }
    let start: String = chars[..head].iter().collect();
    let end: String = chars[chars.len() - tail..].iter().collect();
    format!("{start}...{end}")
}

fn decode(address: &str, format: AddressFormat) -> Result<AccountId, &'static str> {
    match format {
        AddressFormat::Evm => decode_evm(address),
        AddressFormat::Tron => decode_tron(address),
    }
}

fn detect_syntax(address: &str) -> Option<AddressFormat> {
    if address.starts_with("0x") {
        Some(AddressFormat::Evm)
    } else if address.starts_with('T') {
        Some(AddressFormat::Tron)
    } else {
        None
    }
}

fn decode_evm(address: &str) -> Result<AccountId, &'static str> {
    let body = address.strip_prefix("0x").ok_or("missing 0x prefix")?;
    if body.len() != 40 {
        return Err("expected 40 hex digits");
    }

    let mut account = [0u8; 20];
    hex::decode_to_slice(body, &mut account).map_err(|_| "non-hex character")?;

    let has_lower = body.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = body.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper && to_checksum_address(&account)[2..] != *body {
        return Err("EIP-55 checksum mismatch");
    }
    Ok(account)
}

fn decode_tron(address: &str) -> Result<AccountId, &'static str> {
    if address.len() != TRON_ADDRESS_LEN {
        return Err("expected 34 base58 characters");
    }

    let payload = bs58::decode(address)
        .with_check(Some(TRON_ADDRESS_PREFIX))
        .into_vec()
        .map_err(|e| match e {
            bs58::decode::Error::InvalidChecksum { .. } => "base58check checksum mismatch",
            bs58::decode::Error::InvalidVersion { .. } => "missing 0x41 version byte",
            _ => "not valid base58",
        })?;

    if payload.len() != 21 {
        return Err("expected 21-byte payload");
    }
    let mut account = [0u8; 20];
    account.copy_from_slice(&payload[1..]);
    Ok(account)
}

fn encode_tron(account: &AccountId) -> String {
    let mut payload = [0u8; 21];
    payload[0] = TRON_ADDRESS_PREFIX;
    payload[1..].copy_from_slice(account);
    bs58::encode(payload).with_check().into_string()
}
