//! Execution errors and results

use basalt_primitives::{Address, H256};
use thiserror::Error;

/// Errors that halt a frame
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Gas exhausted
    #[error("out of gas")]
    OutOfGas,
    /// Stack underflow
    #[error("stack underflow")]
    StackUnderflow,
    /// Stack overflow
    #[error("stack overflow")]
    StackOverflow,
    /// Jump to a non-JUMPDEST target
    #[error("invalid jump destination: {0}")]
    InvalidJump(usize),
    /// Unrecognized opcode byte
    #[error("invalid opcode: 0x{0:02x}")]
    InvalidOpcode(u8),
    /// State mutation attempted inside a static call
    #[error("write protection violated in static context")]
    WriteProtection,
    /// RETURNDATACOPY range past the end of the return buffer
    #[error("return data access out of bounds")]
    ReturnDataOutOfBounds,
    /// Operand too large for a memory offset or length
    #[error("gas or offset computation overflowed")]
    GasUintOverflow,
    /// CREATE target already has code or a nonce
    #[error("contract address collision")]
    CreateCollision,
    /// Deployed code exceeds 24576 bytes (EIP-170)
    #[error("deployed code size exceeds limit")]
    MaxCodeSizeExceeded,
    /// Init code exceeds 49152 bytes (EIP-3860)
    #[error("init code size exceeds limit")]
    MaxInitCodeSizeExceeded,
    /// Call nesting past 1024 frames
    #[error("max call depth exceeded")]
    MaxCallDepthExceeded,
    /// Value transfer exceeds the sender's balance
    #[error("insufficient balance for transfer")]
    InsufficientBalance,
    /// Nonce at u64::MAX cannot be incremented
    #[error("nonce overflow")]
    NonceOverflow,
    /// Explicit REVERT with its output payload
    #[error("execution reverted")]
    Reverted(Vec<u8>),
}

/// Convenience alias for fallible interpreter operations
pub type VmResult<T> = Result<T, VmError>;

/// Event emitted by a LOG opcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    /// Emitting contract
    pub address: Address,
    /// Indexed topics (up to four)
    pub topics: Vec<H256>,
    /// Unindexed payload
    pub data: Vec<u8>,
}

/// How an execution concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Ran to STOP or RETURN
    Success,
    /// Halted by REVERT; state rolled back, remaining gas returned
    Revert,
    /// Halted by an exceptional condition; all gas consumed
    Error,
}

/// Final result of a top-level execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// How the execution concluded
    pub outcome: Outcome,
    /// Return or revert payload
    pub output: Vec<u8>,
    /// Gas consumed, net of the applied refund
    pub gas_used: u64,
    /// Refund actually applied (already subtracted from `gas_used`)
    pub gas_refunded: u64,
    /// Logs emitted by frames that completed successfully
    pub logs: Vec<Log>,
    /// The halting error, when `outcome` is not `Success`
    pub error: Option<VmError>,
}

impl ExecutionResult {
    /// Whether the execution ran to completion
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}
