//! Operand stack

use crate::error::{VmError, VmResult};
use crate::gas::limits::MAX_STACK_SIZE;
use basalt_primitives::U256;

/// Bounded operand stack of 256-bit words (max 1024 items).
#[derive(Clone, Debug, Default)]
pub struct Stack {
    data: Vec<U256>,
}

impl Stack {
    /// Create a new empty stack
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(MAX_STACK_SIZE),
        }
    }

    /// Push a value onto the stack
    pub fn push(&mut self, value: U256) -> VmResult<()> {
        if self.data.len() >= MAX_STACK_SIZE {
            return Err(VmError::StackOverflow);
        }
        self.data.push(value);
        Ok(())
    }

    /// Pop a value from the stack
    pub fn pop(&mut self) -> VmResult<U256> {
        self.data.pop().ok_or(VmError::StackUnderflow)
    }

    /// Peek at a specific depth (0 = top)
    pub fn peek(&self, depth: usize) -> VmResult<U256> {
        if depth >= self.data.len() {
            return Err(VmError::StackUnderflow);
        }
        Ok(self.data[self.data.len() - 1 - depth])
    }

    /// Duplicate the item at depth onto the top (1 = dup top)
    pub fn dup(&mut self, depth: usize) -> VmResult<()> {
        if depth == 0 || depth > self.data.len() {
            return Err(VmError::StackUnderflow);
        }
        if self.data.len() >= MAX_STACK_SIZE {
            return Err(VmError::StackOverflow);
        }
        let value = self.data[self.data.len() - depth];
        self.data.push(value);
        Ok(())
    }

    /// Swap the top with the item at depth (1 = swap with second item)
    pub fn swap(&mut self, depth: usize) -> VmResult<()> {
        if depth == 0 || depth >= self.data.len() {
            return Err(VmError::StackUnderflow);
        }
        let len = self.data.len();
        self.data.swap(len - 1, len - 1 - depth);
        Ok(())
    }

    /// Current number of items
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the stack is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
