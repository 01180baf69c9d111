//! Built-in contracts at fixed low addresses
//!
//! A precompile is looked up before any bytecode is interpreted: a
//! call targeting a registered address runs the native implementation
//! and never enters the dispatch loop. Each precompile declares its
//! own gas formula; the caller charges it before running.

use crate::error::VmResult;
use basalt_crypto::{recover_address, sha256};
use basalt_primitives::Address;
use std::collections::HashMap;

/// A natively implemented contract.
pub trait Precompile {
    /// Gas consumed by a run over `input`
    fn required_gas(&self, input: &[u8]) -> u64;
    /// Execute over `input`
    fn run(&self, input: &[u8]) -> VmResult<Vec<u8>>;
}

/// Address-indexed precompile registry.
pub struct Precompiles {
    contracts: HashMap<Address, Box<dyn Precompile>>,
}

impl Precompiles {
    /// Registry with the standard contracts: ecrecover (0x01),
    /// sha256 (0x02), identity (0x04).
    pub fn standard() -> Self {
        let mut contracts: HashMap<Address, Box<dyn Precompile>> = HashMap::new();
        contracts.insert(precompile_address(0x01), Box::new(EcRecover));
        contracts.insert(precompile_address(0x02), Box::new(Sha256));
        contracts.insert(precompile_address(0x04), Box::new(Identity));
        Self { contracts }
    }

    /// Look up the precompile at `address`
    pub fn get(&self, address: &Address) -> Option<&dyn Precompile> {
        self.contracts.get(address).map(|b| b.as_ref())
    }

    /// Whether `address` hosts a precompile
    pub fn contains(&self, address: &Address) -> bool {
        self.contracts.contains_key(address)
    }

    /// All registered addresses, for warm-set seeding
    pub fn addresses(&self) -> impl Iterator<Item = Address> + '_ {
        self.contracts.keys().copied()
    }
}

fn precompile_address(index: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = index;
    Address::from_bytes(bytes)
}

/// ECDSA public key recovery (address 0x01).
///
/// Flat 3000 gas. Invalid input yields empty output, never an error:
/// contracts probe this precompile with unverified signatures.
struct EcRecover;

impl Precompile for EcRecover {
    fn required_gas(&self, _input: &[u8]) -> u64 {
        3000
    }

    fn run(&self, input: &[u8]) -> VmResult<Vec<u8>> {
        let mut buf = [0u8; 128];
        let len = input.len().min(128);
        buf[..len].copy_from_slice(&input[..len]);

        // v is a 32-byte word holding 27 or 28
        if buf[32..63].iter().any(|&b| b != 0) {
            return Ok(Vec::new());
        }
        let v = buf[63];
        if v != 27 && v != 28 {
            return Ok(Vec::new());
        }

        let mut hash_bytes = [0u8; 32];
        hash_bytes.copy_from_slice(&buf[..32]);
        let hash = basalt_primitives::H256::from_bytes(hash_bytes);
        let mut r = [0u8; 32];
        r.copy_from_slice(&buf[64..96]);
        let mut s = [0u8; 32];
        s.copy_from_slice(&buf[96..128]);

        match recover_address(&hash, v, &r, &s) {
            Ok(address) => {
                let mut out = vec![0u8; 32];
                out[12..].copy_from_slice(address.as_bytes());
                Ok(out)
            }
            Err(_) => Ok(Vec::new()),
        }
    }
}

/// SHA-256 (address 0x02): 60 + 12 per input word.
struct Sha256;

impl Precompile for Sha256 {
    fn required_gas(&self, input: &[u8]) -> u64 {
        60 + 12 * input.len().div_ceil(32) as u64
    }

    fn run(&self, input: &[u8]) -> VmResult<Vec<u8>> {
        Ok(sha256(input).as_bytes().to_vec())
    }
}

/// Identity copy (address 0x04): 15 + 3 per input word.
struct Identity;

impl Precompile for Identity {
    fn required_gas(&self, input: &[u8]) -> u64 {
        15 + 3 * input.len().div_ceil(32) as u64
    }

    fn run(&self, input: &[u8]) -> VmResult<Vec<u8>> {
        Ok(input.to_vec())
    }
}
