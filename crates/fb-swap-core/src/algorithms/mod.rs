//! # Algorithms Module
//!
//! Pure functions: address conversion, time-lock packing, hashing, amount
//! parsing and the swap transition table.

pub mod address_codec;
pub mod amount;
pub mod secret;
pub mod state_machine;
pub mod timelock_codec;

pub use address_codec::{address_formats, is_valid_for_format, normalize, shorten_address};
pub use amount::{format_token_amount, parse_token_amount};
pub use secret::{compute_order_hash, create_hash_lock, keccak256, verify_secret, OrderParams};
pub use state_machine::{can_cancel, transition, SwapEvent};
