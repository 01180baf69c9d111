//! Execution configuration
//!
//! A [`Config`] bundles the block context, the transaction origin and
//! the fork schedule. It is built once by a pure constructor and read
//! for the duration of one execution; nothing in it mutates.

use basalt_crypto::keccak256;
use basalt_primitives::{Address, H256, U256};

/// Resolves a block hash for the BLOCKHASH opcode
pub type BlockHashFn = Box<dyn Fn(u64) -> H256>;

/// Fork activation schedule, as block heights.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForkSchedule {
    /// Height at which BASEFEE becomes available
    pub london: u64,
    /// Height at which PUSH0 becomes available
    pub shanghai: u64,
}

impl ForkSchedule {
    /// Opcode availability predicates at a given block height
    pub fn rules(&self, number: u64) -> Rules {
        Rules {
            has_base_fee: number >= self.london,
            has_push0: number >= self.shanghai,
        }
    }
}

/// Opcode availability at the configured block height
#[derive(Debug, Clone, Copy)]
pub struct Rules {
    /// BASEFEE is a valid opcode
    pub has_base_fee: bool,
    /// PUSH0 is a valid opcode
    pub has_push0: bool,
}

/// Immutable execution environment for one top-level execution.
pub struct Config {
    /// Chain id exposed by CHAINID
    pub chain_id: u64,
    /// Block number
    pub number: u64,
    /// Block timestamp
    pub timestamp: u64,
    /// Block difficulty
    pub difficulty: U256,
    /// Block gas limit exposed by GASLIMIT
    pub gas_limit: u64,
    /// Gas price exposed by GASPRICE
    pub gas_price: U256,
    /// Base fee exposed by BASEFEE
    pub base_fee: U256,
    /// Block coinbase
    pub coinbase: Address,
    /// Transaction origin exposed by ORIGIN
    pub origin: Address,
    /// Fork activation heights
    pub forks: ForkSchedule,
    /// Block hash lookup for BLOCKHASH
    pub block_hash: BlockHashFn,
}

impl Config {
    /// Build a config from explicit values. The block hash lookup
    /// hashes the decimal string of the requested number, which is
    /// stable and collision-free for test harnesses; callers with a
    /// real chain behind them supply their own via `with_block_hash`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain_id: u64,
        number: u64,
        timestamp: u64,
        difficulty: U256,
        gas_limit: u64,
        gas_price: U256,
        base_fee: U256,
        coinbase: Address,
        origin: Address,
        forks: ForkSchedule,
    ) -> Self {
        Self {
            chain_id,
            number,
            timestamp,
            difficulty,
            gas_limit,
            gas_price,
            base_fee,
            coinbase,
            origin,
            forks,
            block_hash: Box::new(default_block_hash),
        }
    }

    /// Replace the block hash lookup
    pub fn with_block_hash(mut self, f: BlockHashFn) -> Self {
        self.block_hash = f;
        self
    }

    /// Availability predicates for the configured height
    pub fn rules(&self) -> Rules {
        self.forks.rules(self.number)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            1,
            0,
            0,
            U256::zero(),
            30_000_000,
            U256::zero(),
            U256::zero(),
            Address::ZERO,
            Address::ZERO,
            // all forks active from genesis
            ForkSchedule::default(),
        )
    }
}

fn default_block_hash(number: u64) -> H256 {
    keccak256(number.to_string().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_activates_all_forks() {
        let config = Config::default();
        let rules = config.rules();
        assert!(rules.has_base_fee);
        assert!(rules.has_push0);
    }

    #[test]
    fn fork_heights_gate_rules() {
        let forks = ForkSchedule {
            london: 100,
            shanghai: 200,
        };
        let at_50 = forks.rules(50);
        assert!(!at_50.has_base_fee);
        assert!(!at_50.has_push0);
        let at_150 = forks.rules(150);
        assert!(at_150.has_base_fee);
        assert!(!at_150.has_push0);
        let at_200 = forks.rules(200);
        assert!(at_200.has_push0);
    }

    #[test]
    fn default_block_hash_is_deterministic() {
        let config = Config::default();
        let a = (config.block_hash)(12345);
        let b = (config.block_hash)(12345);
        assert_eq!(a, b);
        assert_ne!(a, (config.block_hash)(12346));
        assert_eq!(a, keccak256(b"12345"));
    }

    #[test]
    fn custom_block_hash_lookup() {
        let config =
            Config::default().with_block_hash(Box::new(|_| H256::from_bytes([0xab; 32])));
        assert_eq!((config.block_hash)(7), H256::from_bytes([0xab; 32]));
    }
}
