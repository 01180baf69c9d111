//! # basalt-primitives
//!
//! Fundamental data types shared by the basalt execution engine:
//! addresses, 256-bit hashes and the 256-bit machine word.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod hash;

pub use address::{Address, AddressError};
pub use hash::{H256, HashError};

// Re-export primitive-types for the 256-bit machine word.
pub use primitive_types::{U256, U512};

/// Block height type
pub type BlockHeight = u64;

/// Account nonce type
pub type Nonce = u64;

/// Gas type
pub type Gas = u64;
