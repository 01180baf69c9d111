//! # basalt-crypto
//!
//! Cryptographic primitives for the basalt execution engine.
//!
//! - Keccak-256 and SHA-256 hashing
//! - ECDSA public key recovery (secp256k1)
//! - Contract address derivation (CREATE and CREATE2 schemes)

#![warn(missing_docs)]
#![warn(clippy::all)]

mod contract;
mod error;
mod hash;
mod recover;

pub use contract::{create2_address, create_address};
pub use error::CryptoError;
pub use hash::{keccak256, sha256};
pub use recover::recover_address;
