//! Call frame state

use crate::error::{VmError, VmResult};
use crate::memory::Memory;
use crate::opcode::Opcode;
use crate::stack::Stack;
use basalt_primitives::{Address, U256};
use bytes::Bytes;
use std::collections::HashSet;

/// Machine state of one call context: its own stack, memory, program
/// counter and gas budget. Frames never share state; a nested call
/// gets a fresh frame and only its return payload flows back.
pub struct Frame {
    /// Account whose storage this frame reads and writes
    pub address: Address,
    /// Immediate caller
    pub caller: Address,
    /// Value attached to the call
    pub value: U256,
    /// Code being executed
    pub code: Bytes,
    /// Call input data
    pub input: Bytes,
    /// Gas remaining
    pub gas: u64,
    /// Whether state mutation is forbidden
    pub is_static: bool,
    /// Operand stack
    pub stack: Stack,
    /// Byte-addressable memory
    pub memory: Memory,
    /// Program counter
    pub pc: usize,
    /// Return buffer from the most recent child call
    pub return_data: Vec<u8>,
    /// RETURN or REVERT payload of this frame
    pub output: Vec<u8>,
    /// Valid jump targets
    pub jumpdests: HashSet<usize>,
    /// Set by STOP, RETURN and REVERT
    pub stopped: bool,
}

impl Frame {
    /// Build a frame ready to run `code`
    pub fn new(
        address: Address,
        caller: Address,
        value: U256,
        code: Bytes,
        input: Bytes,
        gas: u64,
        is_static: bool,
    ) -> Self {
        let jumpdests = analyze_jump_dests(&code);
        Self {
            address,
            caller,
            value,
            code,
            input,
            gas,
            is_static,
            stack: Stack::new(),
            memory: Memory::new(),
            pc: 0,
            return_data: Vec::new(),
            output: Vec::new(),
            jumpdests,
            stopped: false,
        }
    }

    /// Deduct gas, failing with OutOfGas when the budget is exhausted
    pub fn use_gas(&mut self, amount: u64) -> VmResult<()> {
        if self.gas < amount {
            self.gas = 0;
            return Err(VmError::OutOfGas);
        }
        self.gas -= amount;
        Ok(())
    }
}

/// Scan code for JUMPDEST positions, skipping PUSH operand bytes so a
/// 0x5B inside immediate data is not a valid target.
pub fn analyze_jump_dests(code: &[u8]) -> HashSet<usize> {
    let mut dests = HashSet::new();
    let mut i = 0;
    while i < code.len() {
        match Opcode::from_byte(code[i]) {
            Some(Opcode::JUMPDEST) => {
                dests.insert(i);
                i += 1;
            }
            Some(op) => i += 1 + op.push_size(),
            None => i += 1,
        }
    }
    dests
}
