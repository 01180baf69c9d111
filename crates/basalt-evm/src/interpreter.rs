//! Instruction dispatch loop
//!
//! One instruction is processed per iteration: decode, notify the
//! tracer, charge the static cost, then charge dynamic costs and
//! apply the effect. Dynamic charges always land before the effect
//! they pay for, so a frame that runs out of gas mid-instruction has
//! not mutated anything.

use crate::error::{Log, VmError, VmResult};
use crate::evm::{CallInputs, CallOutcome, Evm};
use crate::frame::Frame;
use crate::gas::{self, cost, limits};
use crate::memory::Memory;
use crate::opcode::Opcode;
use crate::tracer::StepRecord;
use crate::word;
use basalt_crypto::keccak256;
use basalt_primitives::{Address, H256, U256};
use bytes::Bytes;

fn as_usize(value: U256) -> VmResult<usize> {
    word::to_usize(value).ok_or(VmError::GasUintOverflow)
}

/// Fully charged CREATE/CREATE2 operands, ready to hand to the frame
/// manager.
struct CreatePrep {
    value: U256,
    init_code: Bytes,
    gas: u64,
    salt: Option<H256>,
}

/// Convert a memory range to usizes, charge its expansion cost and
/// grow the buffer. A zero-length range is free and ignores the offset.
fn mem_range(frame: &mut Frame, offset: U256, len: U256) -> VmResult<(usize, usize)> {
    let len = as_usize(len)?;
    if len == 0 {
        return Ok((0, 0));
    }
    let offset = as_usize(offset)?;
    let required = Memory::required_size(offset, len).ok_or(VmError::GasUintOverflow)?;
    frame.use_gas(gas::memory_gas(frame.memory.size(), required))?;
    frame.memory.grow(required);
    Ok((offset, len))
}

/// Read `len` bytes of `source` starting at a 256-bit offset,
/// zero-padding everything past the end.
fn copy_padded(source: &[u8], offset: U256, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    if let Some(offset) = word::to_usize(offset) {
        if offset < source.len() {
            let n = len.min(source.len() - offset);
            out[..n].copy_from_slice(&source[offset..offset + n]);
        }
    }
    out
}

impl Evm<'_> {
    /// Run `frame` to completion. `Ok` carries the RETURN payload
    /// (empty after STOP or running off the end of code); a REVERT
    /// surfaces as `Err(VmError::Reverted)` with its payload.
    pub(crate) fn run_frame(&mut self, frame: &mut Frame) -> VmResult<Vec<u8>> {
        let rules = self.config.rules();
        while !frame.stopped && frame.pc < frame.code.len() {
            let byte = frame.code[frame.pc];
            let op = Opcode::from_byte(byte).ok_or(VmError::InvalidOpcode(byte))?;
            if (op == Opcode::PUSH0 && !rules.has_push0)
                || (op == Opcode::BASEFEE && !rules.has_base_fee)
            {
                return Err(VmError::InvalidOpcode(byte));
            }

            self.tracer.on_step(StepRecord {
                pc: frame.pc,
                opcode: byte,
                gas_remaining: frame.gas,
                stack_depth: frame.stack.len(),
                call_depth: self.depth,
            });

            frame.use_gas(gas::static_gas(op))?;
            frame.pc += 1;
            self.step(frame, op)?;
        }
        Ok(std::mem::take(&mut frame.output))
    }

    /// Execute one instruction. The arms that recurse into a child
    /// frame live here; everything else is dispatched to [`Self::exec`],
    /// whose native frame is released before any recursion happens, so
    /// a call chain at the full 1024-frame depth stays within an
    /// ordinary thread stack.
    fn step(&mut self, frame: &mut Frame, op: Opcode) -> VmResult<()> {
        match op {
            Opcode::CALL | Opcode::CALLCODE | Opcode::DELEGATECALL | Opcode::STATICCALL => {
                let (inputs, out_offset, out_len) = self.prepare_call(frame, op)?;
                let outcome = self.call(inputs);
                self.finish_call(frame, outcome, out_offset, out_len)
            }
            Opcode::CREATE | Opcode::CREATE2 => {
                let prep = self.prepare_create(frame, op == Opcode::CREATE2)?;
                let outcome =
                    self.create(frame.address, prep.value, prep.init_code, prep.gas, prep.salt);
                frame.gas += outcome.gas_left;
                frame.return_data = outcome.output;
                match outcome.address {
                    Some(address) => frame.stack.push(address.into_word()),
                    None => frame.stack.push(U256::zero()),
                }
            }
            op => self.exec(frame, op),
        }
    }

    #[inline(never)]
    fn exec(&mut self, frame: &mut Frame, op: Opcode) -> VmResult<()> {
        match op {
            Opcode::STOP => frame.stopped = true,

            Opcode::ADD => {
                let (a, b) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(a.overflowing_add(b).0)?;
            }
            Opcode::MUL => {
                let (a, b) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(a.overflowing_mul(b).0)?;
            }
            Opcode::SUB => {
                let (a, b) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(a.overflowing_sub(b).0)?;
            }
            Opcode::DIV => {
                let (a, b) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(word::div(a, b))?;
            }
            Opcode::SDIV => {
                let (a, b) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(word::sdiv(a, b))?;
            }
            Opcode::MOD => {
                let (a, b) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(word::rem(a, b))?;
            }
            Opcode::SMOD => {
                let (a, b) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(word::smod(a, b))?;
            }
            Opcode::ADDMOD => {
                let (a, b, n) = (frame.stack.pop()?, frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(word::addmod(a, b, n))?;
            }
            Opcode::MULMOD => {
                let (a, b, n) = (frame.stack.pop()?, frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(word::mulmod(a, b, n))?;
            }
            Opcode::EXP => {
                let (base, exponent) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.use_gas(gas::exp_gas(exponent))?;
                frame.stack.push(word::exp(base, exponent))?;
            }
            Opcode::SIGNEXTEND => {
                let (b, x) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(word::signextend(b, x))?;
            }

            Opcode::LT => {
                let (a, b) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(word::from_bool(a < b))?;
            }
            Opcode::GT => {
                let (a, b) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(word::from_bool(a > b))?;
            }
            Opcode::SLT => {
                let (a, b) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(word::from_bool(word::slt(a, b)))?;
            }
            Opcode::SGT => {
                let (a, b) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(word::from_bool(word::sgt(a, b)))?;
            }
            Opcode::EQ => {
                let (a, b) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(word::from_bool(a == b))?;
            }
            Opcode::ISZERO => {
                let a = frame.stack.pop()?;
                frame.stack.push(word::from_bool(a.is_zero()))?;
            }
            Opcode::AND => {
                let (a, b) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(a & b)?;
            }
            Opcode::OR => {
                let (a, b) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(a | b)?;
            }
            Opcode::XOR => {
                let (a, b) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(a ^ b)?;
            }
            Opcode::NOT => {
                let a = frame.stack.pop()?;
                frame.stack.push(!a)?;
            }
            Opcode::BYTE => {
                let (i, x) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(word::byte(i, x))?;
            }
            Opcode::SHL => {
                let (shift, value) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(word::shl(shift, value))?;
            }
            Opcode::SHR => {
                let (shift, value) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(word::shr(shift, value))?;
            }
            Opcode::SAR => {
                let (shift, value) = (frame.stack.pop()?, frame.stack.pop()?);
                frame.stack.push(word::sar(shift, value))?;
            }

            Opcode::KECCAK256 => {
                let (offset, len) = (frame.stack.pop()?, frame.stack.pop()?);
                let (offset, len) = mem_range(frame, offset, len)?;
                frame.use_gas(gas::keccak_gas(len))?;
                let data = frame.memory.load_slice(offset, len);
                frame.stack.push(keccak256(&data).into_word())?;
            }

            Opcode::ADDRESS => frame.stack.push(frame.address.into_word())?,
            Opcode::BALANCE => {
                let address = Address::from_word(frame.stack.pop()?);
                let access = self.access_address(address);
                frame.use_gas(access)?;
                frame.stack.push(self.state.balance(address))?;
            }
            Opcode::ORIGIN => frame.stack.push(self.config.origin.into_word())?,
            Opcode::CALLER => frame.stack.push(frame.caller.into_word())?,
            Opcode::CALLVALUE => frame.stack.push(frame.value)?,
            Opcode::CALLDATALOAD => {
                let offset = frame.stack.pop()?;
                let buf = copy_padded(&frame.input, offset, 32);
                frame.stack.push(U256::from_big_endian(&buf))?;
            }
            Opcode::CALLDATASIZE => frame.stack.push(U256::from(frame.input.len()))?,
            Opcode::CALLDATACOPY => {
                let (dest, offset, len) =
                    (frame.stack.pop()?, frame.stack.pop()?, frame.stack.pop()?);
                let (dest, len) = mem_range(frame, dest, len)?;
                frame.use_gas(gas::copy_gas(len))?;
                let data = copy_padded(&frame.input, offset, len);
                frame.memory.store_slice(dest, &data);
            }
            Opcode::CODESIZE => frame.stack.push(U256::from(frame.code.len()))?,
            Opcode::CODECOPY => {
                let (dest, offset, len) =
                    (frame.stack.pop()?, frame.stack.pop()?, frame.stack.pop()?);
                let (dest, len) = mem_range(frame, dest, len)?;
                frame.use_gas(gas::copy_gas(len))?;
                let data = copy_padded(&frame.code, offset, len);
                frame.memory.store_slice(dest, &data);
            }
            Opcode::GASPRICE => frame.stack.push(self.config.gas_price)?,
            Opcode::EXTCODESIZE => {
                let address = Address::from_word(frame.stack.pop()?);
                let access = self.access_address(address);
                frame.use_gas(access)?;
                frame.stack.push(U256::from(self.state.code(address).len()))?;
            }
            Opcode::EXTCODECOPY => {
                let address = Address::from_word(frame.stack.pop()?);
                let (dest, offset, len) =
                    (frame.stack.pop()?, frame.stack.pop()?, frame.stack.pop()?);
                let access = self.access_address(address);
                frame.use_gas(access)?;
                let (dest, len) = mem_range(frame, dest, len)?;
                frame.use_gas(gas::copy_gas(len))?;
                let code = self.state.code(address);
                let data = copy_padded(&code, offset, len);
                frame.memory.store_slice(dest, &data);
            }
            Opcode::RETURNDATASIZE => {
                frame.stack.push(U256::from(frame.return_data.len()))?;
            }
            Opcode::RETURNDATACOPY => {
                let (dest, offset, len) =
                    (frame.stack.pop()?, frame.stack.pop()?, frame.stack.pop()?);
                // strict bounds, unlike the other copies
                let end = offset
                    .checked_add(len)
                    .ok_or(VmError::ReturnDataOutOfBounds)?;
                if end > U256::from(frame.return_data.len()) {
                    return Err(VmError::ReturnDataOutOfBounds);
                }
                let (dest, len) = mem_range(frame, dest, len)?;
                frame.use_gas(gas::copy_gas(len))?;
                let offset = as_usize(offset)?;
                let data = frame.return_data[offset..offset + len].to_vec();
                frame.memory.store_slice(dest, &data);
            }
            Opcode::EXTCODEHASH => {
                let address = Address::from_word(frame.stack.pop()?);
                let access = self.access_address(address);
                frame.use_gas(access)?;
                if self.state.exists(address) {
                    let code = self.state.code(address);
                    frame.stack.push(keccak256(&code).into_word())?;
                } else {
                    frame.stack.push(U256::zero())?;
                }
            }

            Opcode::BLOCKHASH => {
                let requested = frame.stack.pop()?;
                let number = U256::from(self.config.number);
                let in_window = requested < number
                    && number - requested <= U256::from(256);
                if in_window {
                    let hash = (self.config.block_hash)(requested.as_u64());
                    frame.stack.push(hash.into_word())?;
                } else {
                    frame.stack.push(U256::zero())?;
                }
            }
            Opcode::COINBASE => frame.stack.push(self.config.coinbase.into_word())?,
            Opcode::TIMESTAMP => frame.stack.push(U256::from(self.config.timestamp))?,
            Opcode::NUMBER => frame.stack.push(U256::from(self.config.number))?,
            Opcode::DIFFICULTY => frame.stack.push(self.config.difficulty)?,
            Opcode::GASLIMIT => frame.stack.push(U256::from(self.config.gas_limit))?,
            Opcode::CHAINID => frame.stack.push(U256::from(self.config.chain_id))?,
            Opcode::SELFBALANCE => {
                frame.stack.push(self.state.balance(frame.address))?;
            }
            Opcode::BASEFEE => frame.stack.push(self.config.base_fee)?,

            Opcode::POP => {
                frame.stack.pop()?;
            }
            Opcode::MLOAD => {
                let offset = frame.stack.pop()?;
                let (offset, _) = mem_range(frame, offset, U256::from(32))?;
                frame.stack.push(frame.memory.load(offset))?;
            }
            Opcode::MSTORE => {
                let (offset, value) = (frame.stack.pop()?, frame.stack.pop()?);
                let (offset, _) = mem_range(frame, offset, U256::from(32))?;
                frame.memory.store(offset, value);
            }
            Opcode::MSTORE8 => {
                let (offset, value) = (frame.stack.pop()?, frame.stack.pop()?);
                let (offset, _) = mem_range(frame, offset, U256::one())?;
                frame.memory.store8(offset, value.byte(0));
            }
            Opcode::SLOAD => {
                let slot = H256::from_word(frame.stack.pop()?);
                let access = if self.warm_slots.insert((frame.address, slot)) {
                    cost::COLD_SLOAD
                } else {
                    cost::WARM_ACCESS
                };
                frame.use_gas(access)?;
                let value = self.state.storage(frame.address, slot);
                frame.stack.push(value.into_word())?;
            }
            Opcode::SSTORE => self.sstore(frame)?,
            Opcode::JUMP => {
                let target = frame.stack.pop()?;
                frame.pc = Self::jump_target(frame, target)?;
            }
            Opcode::JUMPI => {
                let (target, condition) = (frame.stack.pop()?, frame.stack.pop()?);
                if !condition.is_zero() {
                    frame.pc = Self::jump_target(frame, target)?;
                }
            }
            Opcode::PC => {
                // pc was already advanced past this opcode
                frame.stack.push(U256::from(frame.pc - 1))?;
            }
            Opcode::MSIZE => frame.stack.push(U256::from(frame.memory.size()))?,
            Opcode::GAS => frame.stack.push(U256::from(frame.gas))?,
            Opcode::JUMPDEST => {}
            Opcode::MCOPY => {
                let (dest, src, len) =
                    (frame.stack.pop()?, frame.stack.pop()?, frame.stack.pop()?);
                let len_usize = as_usize(len)?;
                if len_usize > 0 {
                    let dest = as_usize(dest)?;
                    let src = as_usize(src)?;
                    let required = Memory::required_size(dest.max(src), len_usize)
                        .ok_or(VmError::GasUintOverflow)?;
                    frame.use_gas(gas::memory_gas(frame.memory.size(), required))?;
                    frame.use_gas(gas::copy_gas(len_usize))?;
                    frame.memory.grow(required);
                    frame.memory.copy(dest, src, len_usize);
                } else {
                    frame.use_gas(gas::copy_gas(0))?;
                }
            }

            op if op.is_push() => {
                let n = op.push_size();
                let end = (frame.pc + n).min(frame.code.len());
                let mut buf = [0u8; 32];
                buf[32 - n..32 - n + (end - frame.pc)]
                    .copy_from_slice(&frame.code[frame.pc..end]);
                frame.stack.push(U256::from_big_endian(&buf))?;
                frame.pc += n;
            }
            op if op.dup_depth() > 0 => frame.stack.dup(op.dup_depth())?,
            op if op.swap_depth() > 0 => frame.stack.swap(op.swap_depth())?,

            op if op.is_log() => {
                if frame.is_static {
                    return Err(VmError::WriteProtection);
                }
                let (offset, len) = (frame.stack.pop()?, frame.stack.pop()?);
                let mut topics = Vec::with_capacity(op.log_topics());
                for _ in 0..op.log_topics() {
                    topics.push(H256::from_word(frame.stack.pop()?));
                }
                let (offset, len) = mem_range(frame, offset, len)?;
                frame.use_gas(gas::log_data_gas(len))?;
                let data = frame.memory.load_slice(offset, len);
                self.logs.push(Log {
                    address: frame.address,
                    topics,
                    data,
                });
            }

            Opcode::RETURN => {
                let (offset, len) = (frame.stack.pop()?, frame.stack.pop()?);
                let (offset, len) = mem_range(frame, offset, len)?;
                frame.output = frame.memory.load_slice(offset, len);
                frame.stopped = true;
            }
            Opcode::REVERT => {
                let (offset, len) = (frame.stack.pop()?, frame.stack.pop()?);
                let (offset, len) = mem_range(frame, offset, len)?;
                return Err(VmError::Reverted(frame.memory.load_slice(offset, len)));
            }
            Opcode::INVALID => return Err(VmError::InvalidOpcode(Opcode::INVALID as u8)),
            Opcode::SELFDESTRUCT => self.selfdestruct(frame)?,

            op => return Err(VmError::InvalidOpcode(op as u8)),
        }
        Ok(())
    }

    fn jump_target(frame: &Frame, target: U256) -> VmResult<usize> {
        match word::to_usize(target) {
            Some(dest) if frame.jumpdests.contains(&dest) => Ok(dest),
            _ => Err(VmError::InvalidJump(target.low_u64() as usize)),
        }
    }

    /// Storage write: classified by the slot's value before this
    /// write, plus the cold surcharge when the slot has not been
    /// touched yet this execution.
    fn sstore(&mut self, frame: &mut Frame) -> VmResult<()> {
        if frame.is_static {
            return Err(VmError::WriteProtection);
        }
        // a frame down to its stipend may not write storage
        if frame.gas <= cost::SSTORE_SENTRY {
            return Err(VmError::OutOfGas);
        }
        let slot = H256::from_word(frame.stack.pop()?);
        let new = H256::from_word(frame.stack.pop()?);

        let surcharge = self.slot_surcharge(frame.address, slot);
        let current = self.state.storage(frame.address, slot);
        let base = if current == new {
            cost::WARM_ACCESS
        } else if current.is_zero() {
            cost::SSTORE_SET
        } else {
            cost::SSTORE_RESET
        };
        frame.use_gas(surcharge + base)?;

        if current != new && !current.is_zero() && new.is_zero() {
            self.refund += cost::SSTORE_CLEAR_REFUND;
        }
        self.state.set_storage(frame.address, slot, new);
        Ok(())
    }

    /// Pop and charge everything a call-family opcode needs, returning
    /// the child inputs and the return-buffer range. Kept out of line
    /// so its locals are off the native stack when the child runs.
    #[inline(never)]
    fn prepare_call(
        &mut self,
        frame: &mut Frame,
        op: Opcode,
    ) -> VmResult<(CallInputs, usize, usize)> {
        let gas_word = frame.stack.pop()?;
        let target = Address::from_word(frame.stack.pop()?);
        let value = match op {
            Opcode::CALL | Opcode::CALLCODE => frame.stack.pop()?,
            _ => U256::zero(),
        };
        let in_offset = frame.stack.pop()?;
        let in_len = frame.stack.pop()?;
        let out_offset = frame.stack.pop()?;
        let out_len = frame.stack.pop()?;

        if op == Opcode::CALL && frame.is_static && !value.is_zero() {
            return Err(VmError::WriteProtection);
        }

        let access = self.access_address(target);
        frame.use_gas(access)?;

        let (in_offset, in_len) = mem_range(frame, in_offset, in_len)?;
        let (out_offset, out_len) = mem_range(frame, out_offset, out_len)?;

        let mut surcharge = 0;
        if !value.is_zero() {
            surcharge += cost::CALL_VALUE;
            if op == Opcode::CALL && !self.state.exists(target) {
                surcharge += cost::CALL_NEW_ACCOUNT;
            }
        }
        frame.use_gas(surcharge)?;

        let forwarded = gas::forwarded_gas(frame.gas, gas_word);
        frame.use_gas(forwarded)?;
        let stipend = if value.is_zero() { 0 } else { cost::CALL_STIPEND };
        let input = Bytes::from(frame.memory.load_slice(in_offset, in_len));

        let inputs = match op {
            Opcode::CALL => CallInputs {
                caller: frame.address,
                address: target,
                code_address: target,
                apparent_value: value,
                transfer_value: value,
                input,
                gas: forwarded + stipend,
                is_static: frame.is_static,
            },
            Opcode::CALLCODE => CallInputs {
                caller: frame.address,
                address: frame.address,
                code_address: target,
                apparent_value: value,
                transfer_value: value,
                input,
                gas: forwarded + stipend,
                is_static: frame.is_static,
            },
            Opcode::DELEGATECALL => CallInputs {
                caller: frame.caller,
                address: frame.address,
                code_address: target,
                apparent_value: frame.value,
                transfer_value: U256::zero(),
                input,
                gas: forwarded,
                is_static: frame.is_static,
            },
            _ => CallInputs {
                caller: frame.address,
                address: target,
                code_address: target,
                apparent_value: U256::zero(),
                transfer_value: U256::zero(),
                input,
                gas: forwarded,
                is_static: true,
            },
        };

        Ok((inputs, out_offset, out_len))
    }

    #[inline(never)]
    fn finish_call(
        &mut self,
        frame: &mut Frame,
        outcome: CallOutcome,
        out_offset: usize,
        out_len: usize,
    ) -> VmResult<()> {
        frame.gas += outcome.gas_left;
        let n = out_len.min(outcome.output.len());
        if n > 0 {
            frame.memory.store_slice(out_offset, &outcome.output[..n]);
        }
        frame.return_data = outcome.output;
        frame.stack.push(word::from_bool(outcome.success))
    }

    /// Pop and charge everything CREATE/CREATE2 needs before the init
    /// frame runs. Kept out of line for the same reason as
    /// [`Self::prepare_call`].
    #[inline(never)]
    fn prepare_create(&mut self, frame: &mut Frame, with_salt: bool) -> VmResult<CreatePrep> {
        if frame.is_static {
            return Err(VmError::WriteProtection);
        }
        let value = frame.stack.pop()?;
        let offset = frame.stack.pop()?;
        let len = frame.stack.pop()?;
        let salt = if with_salt {
            Some(H256::from_word(frame.stack.pop()?))
        } else {
            None
        };

        let (offset, len) = mem_range(frame, offset, len)?;
        if len > limits::MAX_INIT_CODE_SIZE {
            return Err(VmError::MaxInitCodeSizeExceeded);
        }
        frame.use_gas(gas::init_code_gas(len))?;
        if with_salt {
            // the create address commits to the init code hash
            frame.use_gas(gas::keccak_gas(len))?;
        }

        let init_code = Bytes::from(frame.memory.load_slice(offset, len));
        let forwarded = frame.gas - frame.gas / 64;
        frame.use_gas(forwarded)?;

        Ok(CreatePrep {
            value,
            init_code,
            gas: forwarded,
            salt,
        })
    }

    fn selfdestruct(&mut self, frame: &mut Frame) -> VmResult<()> {
        if frame.is_static {
            return Err(VmError::WriteProtection);
        }
        let beneficiary = Address::from_word(frame.stack.pop()?);
        let mut surcharge = if self.warm_addresses.contains(&beneficiary) {
            0
        } else {
            self.warm_address(beneficiary);
            cost::COLD_ACCOUNT_ACCESS
        };
        let balance = self.state.balance(frame.address);
        if !balance.is_zero() && !self.state.exists(beneficiary) {
            surcharge += cost::SELFDESTRUCT_NEW_ACCOUNT;
        }
        frame.use_gas(surcharge)?;

        // debit then credit, so a self-beneficiary keeps its funds
        // (the account survives unless it was created in this execution)
        if !balance.is_zero() {
            self.state.set_balance(frame.address, U256::zero());
            let to_balance = self.state.balance(beneficiary);
            self.state.set_balance(beneficiary, to_balance + balance);
        }
        // only accounts born in this execution are actually removed
        if self.created.contains(&frame.address) {
            self.state.delete_account(frame.address);
        }
        frame.stopped = true;
        Ok(())
    }
}
