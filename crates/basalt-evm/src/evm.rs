//! Call frame manager
//!
//! [`Evm`] owns everything that outlives a single frame: the state
//! handle, warm access sets, the refund counter, collected logs and
//! the call depth. Nested calls and creates run through here so that
//! every frame gets its own snapshot and failures roll back exactly
//! the state the failed frame touched.

use crate::config::Config;
use crate::error::{Log, VmError};
use crate::frame::Frame;
use crate::gas::{cost, limits};
use crate::precompile::Precompiles;
use crate::tracer::Tracer;
use basalt_crypto::{create2_address, create_address, keccak256};
use basalt_primitives::{Address, H256, U256};
use basalt_state::StateAccessor;
use bytes::Bytes;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Parameters of one message call.
pub(crate) struct CallInputs {
    /// Account charged for the value transfer
    pub caller: Address,
    /// Context account: storage, ADDRESS, log emitter
    pub address: Address,
    /// Account the code (or precompile) is loaded from
    pub code_address: Address,
    /// Value exposed via CALLVALUE
    pub apparent_value: U256,
    /// Value actually moved from caller to address
    pub transfer_value: U256,
    /// Input data
    pub input: Bytes,
    /// Gas handed to the child frame
    pub gas: u64,
    /// Whether the child runs read-only
    pub is_static: bool,
}

/// Result of a nested call as seen by the parent frame.
pub(crate) struct CallOutcome {
    pub success: bool,
    pub gas_left: u64,
    pub output: Vec<u8>,
    /// What halted the frame, when it did not succeed
    pub error: Option<VmError>,
}

/// Result of a nested create as seen by the parent frame.
pub(crate) struct CreateOutcome {
    pub address: Option<Address>,
    pub gas_left: u64,
    pub output: Vec<u8>,
    /// What halted the init frame, when creation failed
    pub error: Option<VmError>,
}

/// Execution engine state shared across the frames of one execution.
pub struct Evm<'a> {
    pub(crate) config: &'a Config,
    pub(crate) state: &'a mut dyn StateAccessor,
    pub(crate) tracer: &'a mut dyn Tracer,
    pub(crate) precompiles: Precompiles,
    pub(crate) warm_addresses: HashSet<Address>,
    pub(crate) warm_slots: HashSet<(Address, H256)>,
    pub(crate) refund: u64,
    pub(crate) depth: usize,
    pub(crate) logs: Vec<Log>,
    /// Accounts created during this execution; only these may be
    /// removed by SELFDESTRUCT (EIP-6780)
    pub(crate) created: HashSet<Address>,
}

impl<'a> Evm<'a> {
    /// Build an engine with warm sets seeded with the origin and all
    /// precompile addresses.
    pub fn new(
        config: &'a Config,
        state: &'a mut dyn StateAccessor,
        tracer: &'a mut dyn Tracer,
    ) -> Self {
        let precompiles = Precompiles::standard();
        let mut warm_addresses: HashSet<Address> = precompiles.addresses().collect();
        warm_addresses.insert(config.origin);
        Self {
            config,
            state,
            tracer,
            precompiles,
            warm_addresses,
            warm_slots: HashSet::new(),
            refund: 0,
            depth: 0,
            logs: Vec::new(),
            created: HashSet::new(),
        }
    }

    /// Mark `address` warm for the rest of the execution
    pub(crate) fn warm_address(&mut self, address: Address) {
        self.warm_addresses.insert(address);
    }

    /// Access cost for `address`, warming it as a side effect
    pub(crate) fn access_address(&mut self, address: Address) -> u64 {
        if self.warm_addresses.insert(address) {
            cost::COLD_ACCOUNT_ACCESS
        } else {
            cost::WARM_ACCESS
        }
    }

    /// Cold surcharge for a storage slot, warming it as a side effect.
    /// Returns zero when the slot is already warm.
    pub(crate) fn slot_surcharge(&mut self, address: Address, slot: H256) -> u64 {
        if self.warm_slots.insert((address, slot)) {
            cost::COLD_SLOAD
        } else {
            0
        }
    }

    /// Run a message call in a fresh frame. Depth and balance guards
    /// fail the attempt without consuming the forwarded gas; a revert
    /// returns the remaining gas; any other error consumes it all.
    pub(crate) fn call(&mut self, inputs: CallInputs) -> CallOutcome {
        if self.depth >= limits::MAX_CALL_DEPTH {
            return CallOutcome {
                success: false,
                gas_left: inputs.gas,
                output: Vec::new(),
                error: Some(VmError::MaxCallDepthExceeded),
            };
        }
        if self.state.balance(inputs.caller) < inputs.transfer_value {
            return CallOutcome {
                success: false,
                gas_left: inputs.gas,
                output: Vec::new(),
                error: Some(VmError::InsufficientBalance),
            };
        }

        let snapshot = self.state.snapshot();
        let log_mark = self.logs.len();
        let refund_mark = self.refund;
        self.transfer(inputs.caller, inputs.address, inputs.transfer_value);

        if let Some(precompile) = self.precompiles.get(&inputs.code_address) {
            let required = precompile.required_gas(&inputs.input);
            if inputs.gas < required {
                self.state.revert_to(snapshot);
                return CallOutcome {
                    success: false,
                    gas_left: 0,
                    output: Vec::new(),
                    error: Some(VmError::OutOfGas),
                };
            }
            return match precompile.run(&inputs.input) {
                Ok(output) => {
                    self.state.discard(snapshot);
                    CallOutcome {
                        success: true,
                        gas_left: inputs.gas - required,
                        output,
                        error: None,
                    }
                }
                Err(error) => {
                    self.state.revert_to(snapshot);
                    CallOutcome {
                        success: false,
                        gas_left: 0,
                        output: Vec::new(),
                        error: Some(error),
                    }
                }
            };
        }

        let code = self.state.code(inputs.code_address);
        // boxed: a frame per nesting level must not live on the native stack
        let mut frame = Box::new(Frame::new(
            inputs.address,
            inputs.caller,
            inputs.apparent_value,
            code,
            inputs.input,
            inputs.gas,
            inputs.is_static,
        ));

        trace!(
            depth = self.depth,
            address = %inputs.address,
            gas = inputs.gas,
            "entering call frame"
        );
        self.depth += 1;
        let result = self.run_frame(&mut frame);
        self.depth -= 1;

        match result {
            Ok(output) => {
                self.state.discard(snapshot);
                CallOutcome {
                    success: true,
                    gas_left: frame.gas,
                    output,
                    error: None,
                }
            }
            Err(VmError::Reverted(output)) => {
                self.rollback(snapshot, log_mark, refund_mark);
                CallOutcome {
                    success: false,
                    gas_left: frame.gas,
                    output: output.clone(),
                    error: Some(VmError::Reverted(output)),
                }
            }
            Err(error) => {
                debug!(depth = self.depth, %error, "call frame failed");
                self.rollback(snapshot, log_mark, refund_mark);
                CallOutcome {
                    success: false,
                    gas_left: 0,
                    output: Vec::new(),
                    error: Some(error),
                }
            }
        }
    }

    /// Run contract creation. The init code size cap and the per-word
    /// init code charge are the caller's responsibility; this handles
    /// address derivation, the collision check, nonce bookkeeping and
    /// the deposit charge.
    pub(crate) fn create(
        &mut self,
        caller: Address,
        value: U256,
        init_code: Bytes,
        gas: u64,
        salt: Option<H256>,
    ) -> CreateOutcome {
        if self.depth >= limits::MAX_CALL_DEPTH {
            return CreateOutcome {
                address: None,
                gas_left: gas,
                output: Vec::new(),
                error: Some(VmError::MaxCallDepthExceeded),
            };
        }
        if self.state.balance(caller) < value {
            return CreateOutcome {
                address: None,
                gas_left: gas,
                output: Vec::new(),
                error: Some(VmError::InsufficientBalance),
            };
        }
        let nonce = self.state.nonce(caller);
        if nonce == u64::MAX {
            return CreateOutcome {
                address: None,
                gas_left: gas,
                output: Vec::new(),
                error: Some(VmError::NonceOverflow),
            };
        }

        let address = match salt {
            None => create_address(caller, nonce),
            Some(salt) => create2_address(caller, salt, keccak256(&init_code)),
        };
        self.state.set_nonce(caller, nonce + 1);
        self.warm_address(address);

        // an account with code or a nonce already lives there
        if self.state.nonce(address) != 0 || !self.state.code(address).is_empty() {
            return CreateOutcome {
                address: None,
                gas_left: 0,
                output: Vec::new(),
                error: Some(VmError::CreateCollision),
            };
        }

        let snapshot = self.state.snapshot();
        let log_mark = self.logs.len();
        let refund_mark = self.refund;
        self.state.set_nonce(address, 1);
        self.transfer(caller, address, value);
        self.created.insert(address);

        let mut frame = Box::new(Frame::new(
            address,
            caller,
            value,
            init_code,
            Bytes::new(),
            gas,
            false,
        ));

        trace!(depth = self.depth, address = %address, gas, "entering init frame");
        self.depth += 1;
        let result = self.run_frame(&mut frame);
        self.depth -= 1;

        match result {
            Ok(deployed) => {
                if deployed.len() > limits::MAX_CODE_SIZE {
                    self.rollback(snapshot, log_mark, refund_mark);
                    return CreateOutcome {
                        address: None,
                        gas_left: 0,
                        output: Vec::new(),
                        error: Some(VmError::MaxCodeSizeExceeded),
                    };
                }
                let deposit = cost::CODE_DEPOSIT * deployed.len() as u64;
                if frame.use_gas(deposit).is_err() {
                    self.rollback(snapshot, log_mark, refund_mark);
                    return CreateOutcome {
                        address: None,
                        gas_left: 0,
                        output: Vec::new(),
                        error: Some(VmError::OutOfGas),
                    };
                }
                self.state.set_code(address, Bytes::from(deployed));
                self.state.discard(snapshot);
                CreateOutcome {
                    address: Some(address),
                    gas_left: frame.gas,
                    output: Vec::new(),
                    error: None,
                }
            }
            Err(VmError::Reverted(output)) => {
                self.rollback(snapshot, log_mark, refund_mark);
                CreateOutcome {
                    address: None,
                    gas_left: frame.gas,
                    output: output.clone(),
                    error: Some(VmError::Reverted(output)),
                }
            }
            Err(error) => {
                debug!(depth = self.depth, %error, "init frame failed");
                self.rollback(snapshot, log_mark, refund_mark);
                CreateOutcome {
                    address: None,
                    gas_left: 0,
                    output: Vec::new(),
                    error: Some(error),
                }
            }
        }
    }

    fn transfer(&mut self, from: Address, to: Address, value: U256) {
        if value.is_zero() || from == to {
            return;
        }
        let from_balance = self.state.balance(from);
        let to_balance = self.state.balance(to);
        self.state.set_balance(from, from_balance - value);
        self.state.set_balance(to, to_balance + value);
    }

    fn rollback(&mut self, snapshot: usize, log_mark: usize, refund_mark: u64) {
        self.state.revert_to(snapshot);
        self.logs.truncate(log_mark);
        self.refund = refund_mark;
    }
}
