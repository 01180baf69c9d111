//! Gas cost tables and formulas

use crate::opcode::Opcode;
use basalt_primitives::U256;

/// Structural limits enforced by the interpreter
pub mod limits {
    /// Max call nesting depth
    pub const MAX_CALL_DEPTH: usize = 1024;
    /// Max operand stack size
    pub const MAX_STACK_SIZE: usize = 1024;
    /// Max deployed code size (EIP-170)
    pub const MAX_CODE_SIZE: usize = 24576;
    /// Max init code size (EIP-3860)
    pub const MAX_INIT_CODE_SIZE: usize = 49152;
}

/// Gas costs for individual operations
pub mod cost {
    /// Zero gas
    pub const ZERO: u64 = 0;
    /// Base gas
    pub const BASE: u64 = 2;
    /// Very low gas
    pub const VERYLOW: u64 = 3;
    /// Low gas
    pub const LOW: u64 = 5;
    /// Mid gas
    pub const MID: u64 = 8;
    /// High gas
    pub const HIGH: u64 = 10;

    /// Jump dest gas
    pub const JUMPDEST: u64 = 1;
    /// Exp base gas
    pub const EXP: u64 = 10;
    /// Exp per exponent byte
    pub const EXP_BYTE: u64 = 50;
    /// Keccak base gas
    pub const KECCAK: u64 = 30;
    /// Keccak per word
    pub const KECCAK_WORD: u64 = 6;
    /// Blockhash lookup gas
    pub const BLOCKHASH: u64 = 20;

    /// Warm account or slot access (EIP-2929)
    pub const WARM_ACCESS: u64 = 100;
    /// Cold account access (EIP-2929)
    pub const COLD_ACCOUNT_ACCESS: u64 = 2600;
    /// Cold storage slot access (EIP-2929)
    pub const COLD_SLOAD: u64 = 2100;

    /// Sstore zero to non-zero
    pub const SSTORE_SET: u64 = 20000;
    /// Sstore non-zero to any
    pub const SSTORE_RESET: u64 = 2900;
    /// Refund for clearing a slot (EIP-3529)
    pub const SSTORE_CLEAR_REFUND: u64 = 4800;
    /// Minimum gas a frame must hold to issue a storage write (EIP-2200)
    pub const SSTORE_SENTRY: u64 = 2300;

    /// Log base gas
    pub const LOG: u64 = 375;
    /// Log per topic
    pub const LOG_TOPIC: u64 = 375;
    /// Log per data byte
    pub const LOG_DATA: u64 = 8;

    /// Create base gas
    pub const CREATE: u64 = 32000;
    /// Value transfer surcharge on CALL
    pub const CALL_VALUE: u64 = 9000;
    /// Surcharge when a value transfer targets a nonexistent account
    pub const CALL_NEW_ACCOUNT: u64 = 25000;
    /// Stipend granted to the callee on a value transfer
    pub const CALL_STIPEND: u64 = 2300;

    /// Memory gas per word
    pub const MEMORY: u64 = 3;
    /// Copy gas per word
    pub const COPY: u64 = 3;
    /// Init code gas per word (EIP-3860)
    pub const INIT_CODE_WORD: u64 = 2;
    /// Deployed code deposit per byte
    pub const CODE_DEPOSIT: u64 = 200;

    /// Selfdestruct base gas
    pub const SELFDESTRUCT: u64 = 5000;
    /// Selfdestruct surcharge when sweeping funds to a new account
    pub const SELFDESTRUCT_NEW_ACCOUNT: u64 = 25000;

    /// Divisor of gas used bounding the applied refund (EIP-3529)
    pub const REFUND_QUOTIENT: u64 = 5;
}

/// Static gas cost of an opcode. Opcodes whose cost depends on access
/// state or operands (storage, account access, calls) report zero here
/// and are charged dynamically by the interpreter.
pub fn static_gas(opcode: Opcode) -> u64 {
    match opcode {
        Opcode::STOP | Opcode::RETURN | Opcode::REVERT | Opcode::INVALID => cost::ZERO,

        Opcode::ADDRESS | Opcode::ORIGIN | Opcode::CALLER | Opcode::CALLVALUE |
        Opcode::CALLDATASIZE | Opcode::CODESIZE | Opcode::GASPRICE |
        Opcode::COINBASE | Opcode::TIMESTAMP | Opcode::NUMBER |
        Opcode::DIFFICULTY | Opcode::GASLIMIT | Opcode::CHAINID |
        Opcode::RETURNDATASIZE | Opcode::POP | Opcode::PC |
        Opcode::MSIZE | Opcode::GAS | Opcode::BASEFEE | Opcode::PUSH0 => cost::BASE,

        Opcode::ADD | Opcode::SUB | Opcode::NOT | Opcode::LT | Opcode::GT |
        Opcode::SLT | Opcode::SGT | Opcode::EQ | Opcode::ISZERO |
        Opcode::AND | Opcode::OR | Opcode::XOR | Opcode::BYTE |
        Opcode::SHL | Opcode::SHR | Opcode::SAR |
        Opcode::CALLDATALOAD | Opcode::MLOAD | Opcode::MSTORE | Opcode::MSTORE8 |
        Opcode::CALLDATACOPY | Opcode::CODECOPY |
        Opcode::RETURNDATACOPY | Opcode::MCOPY => cost::VERYLOW,

        op if op.is_push() || op.dup_depth() > 0 || op.swap_depth() > 0 => cost::VERYLOW,

        Opcode::MUL | Opcode::DIV | Opcode::SDIV | Opcode::MOD |
        Opcode::SMOD | Opcode::SIGNEXTEND | Opcode::SELFBALANCE => cost::LOW,

        Opcode::ADDMOD | Opcode::MULMOD | Opcode::JUMP => cost::MID,

        Opcode::JUMPI => cost::HIGH,
        Opcode::JUMPDEST => cost::JUMPDEST,

        Opcode::EXP => cost::EXP,
        Opcode::KECCAK256 => cost::KECCAK,
        Opcode::BLOCKHASH => cost::BLOCKHASH,

        op if op.is_log() => cost::LOG + op.log_topics() as u64 * cost::LOG_TOPIC,

        Opcode::CREATE | Opcode::CREATE2 => cost::CREATE,
        Opcode::SELFDESTRUCT => cost::SELFDESTRUCT,

        // Charged per warm/cold access rules in the interpreter.
        Opcode::BALANCE | Opcode::EXTCODESIZE | Opcode::EXTCODECOPY |
        Opcode::EXTCODEHASH | Opcode::SLOAD | Opcode::SSTORE |
        Opcode::CALL | Opcode::CALLCODE | Opcode::DELEGATECALL |
        Opcode::STATICCALL => cost::ZERO,

        _ => cost::ZERO,
    }
}

/// Gas for expanding memory from `current_size` to `new_size` bytes.
/// Cost grows quadratically with the highest touched word.
pub fn memory_gas(current_size: usize, new_size: usize) -> u64 {
    if new_size <= current_size {
        return 0;
    }
    memory_word_cost(new_size.div_ceil(32)) - memory_word_cost(current_size.div_ceil(32))
}

fn memory_word_cost(words: usize) -> u64 {
    let words = words as u64;
    cost::MEMORY * words + words * words / 512
}

/// Per-word cost of copy operations (CALLDATACOPY, CODECOPY, ...)
pub fn copy_gas(len: usize) -> u64 {
    cost::COPY * len.div_ceil(32) as u64
}

/// Dynamic part of EXP: 50 per significant exponent byte
pub fn exp_gas(exponent: U256) -> u64 {
    let byte_size = (exponent.bits() as u64).div_ceil(8);
    cost::EXP_BYTE * byte_size
}

/// Dynamic part of KECCAK256: 6 per word hashed
pub fn keccak_gas(len: usize) -> u64 {
    cost::KECCAK_WORD * len.div_ceil(32) as u64
}

/// Per-byte cost of LOG data
pub fn log_data_gas(len: usize) -> u64 {
    cost::LOG_DATA * len as u64
}

/// Per-word charge on init code handed to CREATE/CREATE2 (EIP-3860)
pub fn init_code_gas(len: usize) -> u64 {
    cost::INIT_CODE_WORD * len.div_ceil(32) as u64
}

/// Gas forwarded to a child call: at most 63/64 of what remains,
/// less if the caller requested less (EIP-150).
///
/// The retained share is `available / 64` rounded down, so the cap is
/// one higher than a floored 63/64 whenever `available` is not a
/// multiple of 64.
pub fn forwarded_gas(available: u64, requested: U256) -> u64 {
    let cap = available - available / 64;
    if requested >= U256::from(cap) {
        cap
    } else {
        requested.as_u64()
    }
}

/// Refund actually applied at top level, capped at a fifth of gas used.
pub fn capped_refund(gas_used: u64, refund: u64) -> u64 {
    refund.min(gas_used / cost::REFUND_QUOTIENT)
}
