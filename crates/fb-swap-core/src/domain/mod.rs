//! # Domain Module
//!
//! Swap record, value types, schedule and the invariants tying them together.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod secure_secret;
pub mod timelocks;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use secure_secret::SecureSecret;
pub use timelocks::*;
pub use value_objects::*;
