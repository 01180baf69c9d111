//! Top-level execution entrypoints
//!
//! `execute` installs the given code at a fixed address, runs one
//! top-level frame against it and finalizes the gas refund exactly
//! once. Nothing here touches state outside the passed accessor, so
//! two runs over equal inputs produce identical results.

use crate::config::Config;
use crate::error::{ExecutionResult, Outcome, VmError};
use crate::evm::{CallInputs, Evm};
use crate::gas::{self, limits};
use crate::tracer::{NoopTracer, Tracer};
use basalt_primitives::{Address, U256};
use basalt_state::StateAccessor;
use bytes::Bytes;
use tracing::debug;

/// Address the executed code is installed at
pub const CONTRACT_ADDRESS: Address = Address::from_bytes([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, b'c', b'o', b'n', b't', b'r', b'a', b'c', b't',
]);

/// Run `code` over `input` with a gas budget of `gas`.
pub fn execute(
    code: &[u8],
    input: &[u8],
    config: &Config,
    state: &mut dyn StateAccessor,
    value: U256,
    gas: u64,
) -> ExecutionResult {
    let mut tracer = NoopTracer;
    execute_traced(code, input, config, state, value, gas, &mut tracer)
}

/// Like [`execute`], with every step reported to `tracer`.
pub fn execute_traced(
    code: &[u8],
    input: &[u8],
    config: &Config,
    state: &mut dyn StateAccessor,
    value: U256,
    gas: u64,
    tracer: &mut dyn Tracer,
) -> ExecutionResult {
    debug!(code_len = code.len(), input_len = input.len(), gas, "execute");
    state.set_code(CONTRACT_ADDRESS, Bytes::copy_from_slice(code));

    let mut evm = Evm::new(config, state, tracer);
    evm.warm_address(CONTRACT_ADDRESS);
    let origin = config.origin;
    let outcome = evm.call(CallInputs {
        caller: origin,
        address: CONTRACT_ADDRESS,
        code_address: CONTRACT_ADDRESS,
        apparent_value: value,
        transfer_value: value,
        input: Bytes::copy_from_slice(input),
        gas,
        is_static: false,
    });

    let refund = evm.refund;
    let logs = std::mem::take(&mut evm.logs);
    drop(evm);
    finalize(
        outcome.success,
        outcome.output,
        outcome.error,
        gas,
        outcome.gas_left,
        refund,
        logs,
    )
}

/// Deploy `init_code` from the configured origin. Returns the result
/// and the created address on success.
pub fn create(
    init_code: &[u8],
    config: &Config,
    state: &mut dyn StateAccessor,
    value: U256,
    gas: u64,
) -> (ExecutionResult, Option<Address>) {
    debug!(init_len = init_code.len(), gas, "create");
    if init_code.len() > limits::MAX_INIT_CODE_SIZE {
        let result = finalize(
            false,
            Vec::new(),
            Some(VmError::MaxInitCodeSizeExceeded),
            gas,
            0,
            0,
            Vec::new(),
        );
        return (result, None);
    }
    let word_charge = gas::init_code_gas(init_code.len());
    if gas < word_charge {
        let result = finalize(false, Vec::new(), Some(VmError::OutOfGas), gas, 0, 0, Vec::new());
        return (result, None);
    }

    let mut tracer = NoopTracer;
    let mut evm = Evm::new(config, state, &mut tracer);
    let origin = config.origin;
    let outcome = evm.create(
        origin,
        value,
        Bytes::copy_from_slice(init_code),
        gas - word_charge,
        None,
    );

    let refund = evm.refund;
    let logs = std::mem::take(&mut evm.logs);
    drop(evm);
    let result = finalize(
        outcome.address.is_some(),
        outcome.output,
        outcome.error,
        gas,
        outcome.gas_left,
        refund,
        logs,
    );
    (result, outcome.address)
}

fn finalize(
    success: bool,
    output: Vec<u8>,
    error: Option<VmError>,
    gas_limit: u64,
    gas_left: u64,
    refund: u64,
    logs: Vec<crate::error::Log>,
) -> ExecutionResult {
    let gross_used = gas_limit - gas_left;
    let (outcome, applied_refund) = if success {
        (Outcome::Success, gas::capped_refund(gross_used, refund))
    } else if matches!(error, Some(VmError::Reverted(_))) {
        (Outcome::Revert, 0)
    } else {
        (Outcome::Error, 0)
    };
    ExecutionResult {
        outcome,
        output,
        gas_used: gross_used - applied_refund,
        gas_refunded: applied_refund,
        logs,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::CollectingTracer;
    use basalt_primitives::H256;
    use basalt_state::JournaledState;
    use proptest::prelude::*;

    fn run(code: &[u8], gas: u64) -> ExecutionResult {
        let config = Config::default();
        let mut state = JournaledState::new();
        execute(code, &[], &config, &mut state, U256::zero(), gas)
    }

    fn code(hex_str: &str) -> Vec<u8> {
        hex::decode(hex_str).unwrap()
    }

    #[test]
    fn stop_consumes_no_gas() {
        let result = run(&[0x00], 100_000);
        assert!(result.is_success());
        assert_eq!(result.gas_used, 0);
        assert!(result.output.is_empty());
    }

    #[test]
    fn empty_code_is_success() {
        let result = run(&[], 100_000);
        assert!(result.is_success());
        assert_eq!(result.gas_used, 0);
    }

    #[test]
    fn add_and_return() {
        // PUSH1 2, PUSH1 3, ADD, PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN
        let result = run(&code("600260030160005260206000f3"), 100_000);
        assert!(result.is_success());
        assert_eq!(result.output.len(), 32);
        assert_eq!(result.output[31], 5);
        // 4 pushes (12) + ADD (3) + MSTORE (3) + one word of memory (3)
        // + 2 pushes for RETURN (6)
        assert_eq!(result.gas_used, 24);
    }

    #[test]
    fn out_of_gas_consumes_entire_budget() {
        let result = run(&code("600260030160005260206000f3"), 10);
        assert_eq!(result.outcome, Outcome::Error);
        assert_eq!(result.error, Some(VmError::OutOfGas));
        assert_eq!(result.gas_used, 10);
    }

    #[test]
    fn invalid_opcode_consumes_entire_budget() {
        let result = run(&[0x0C], 50_000);
        assert_eq!(result.outcome, Outcome::Error);
        assert_eq!(result.error, Some(VmError::InvalidOpcode(0x0C)));
        assert_eq!(result.gas_used, 50_000);
    }

    #[test]
    fn execution_is_deterministic() {
        let bytecode = code("600260030160005260206000f3");
        let a = run(&bytecode, 100_000);
        let b = run(&bytecode, 100_000);
        assert_eq!(a.output, b.output);
        assert_eq!(a.gas_used, b.gas_used);
        assert_eq!(a.outcome, b.outcome);
    }

    #[test]
    fn revert_returns_payload_and_remaining_gas() {
        // PUSH1 0x42, PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, REVERT
        let result = run(&code("604260005260206000fd"), 100_000);
        assert_eq!(result.outcome, Outcome::Revert);
        assert_eq!(result.output.len(), 32);
        assert_eq!(result.output[31], 0x42);
        assert!(result.gas_used < 100);
        assert_eq!(result.gas_refunded, 0);
    }

    #[test]
    fn revert_rolls_back_storage() {
        let config = Config::default();
        let mut state = JournaledState::new();
        // PUSH1 1, PUSH1 0, SSTORE, PUSH1 0, PUSH1 0, REVERT
        let result = execute(
            &code("600160005560006000fd"),
            &[],
            &config,
            &mut state,
            U256::zero(),
            100_000,
        );
        assert_eq!(result.outcome, Outcome::Revert);
        assert_eq!(
            state.storage(CONTRACT_ADDRESS, H256::ZERO),
            H256::ZERO
        );
    }

    #[test]
    fn logs_are_collected() {
        // PUSH1 0xaa, PUSH1 0, MSTORE, PUSH1 7 (topic),
        // PUSH1 32 (len), PUSH1 0 (offset) ... LOG1 pops offset, len, topic
        let result = run(&code("60aa600052600760206000a1"), 100_000);
        assert!(result.is_success(), "{:?}", result.error);
        assert_eq!(result.logs.len(), 1);
        let log = &result.logs[0];
        assert_eq!(log.address, CONTRACT_ADDRESS);
        assert_eq!(log.topics, vec![H256::from_word(U256::from(7))]);
        assert_eq!(log.data.len(), 32);
        assert_eq!(log.data[31], 0xaa);
    }

    #[test]
    fn logs_discarded_when_frame_reverts() {
        // LOG0 over empty data, then REVERT
        let result = run(&code("60006000a060006000fd"), 100_000);
        assert_eq!(result.outcome, Outcome::Revert);
        assert!(result.logs.is_empty());
    }

    #[test]
    fn sload_cold_then_warm() {
        // PUSH1 0, SLOAD, POP, PUSH1 0, SLOAD, POP
        let result = run(&code("60005450600054"), 100_000);
        assert!(result.is_success());
        // 3 + 2100 + 2 + 3 + 100
        assert_eq!(result.gas_used, 2208);
    }

    #[test]
    fn sstore_fresh_slot_charges_set_cost() {
        // PUSH1 1, PUSH1 0, SSTORE
        let result = run(&code("600160005500"), 100_000);
        assert!(result.is_success());
        // 3 + 3 + 2100 cold + 20000 set
        assert_eq!(result.gas_used, 22106);
        assert_eq!(result.gas_refunded, 0);
    }

    #[test]
    fn sstore_clear_refunds_capped() {
        let config = Config::default();
        let mut state = JournaledState::new();
        state.set_storage(CONTRACT_ADDRESS, H256::ZERO, H256::from_word(U256::one()));
        // PUSH1 0, PUSH1 0, SSTORE
        let result = execute(
            &code("600060005500"),
            &[],
            &config,
            &mut state,
            U256::zero(),
            100_000,
        );
        assert!(result.is_success());
        // gross: 3 + 3 + 2100 cold + 2900 reset = 5006; refund capped at 5006/5
        assert_eq!(result.gas_refunded, 1001);
        assert_eq!(result.gas_used, 5006 - 1001);
        assert_eq!(state.storage(CONTRACT_ADDRESS, H256::ZERO), H256::ZERO);
    }

    #[test]
    fn sstore_same_value_is_cheap() {
        let config = Config::default();
        let mut state = JournaledState::new();
        state.set_storage(CONTRACT_ADDRESS, H256::ZERO, H256::from_word(U256::one()));
        // PUSH1 1, PUSH1 0, SSTORE
        let result = execute(
            &code("600160005500"),
            &[],
            &config,
            &mut state,
            U256::zero(),
            100_000,
        );
        assert!(result.is_success());
        // 3 + 3 + 2100 cold + 100 no-op
        assert_eq!(result.gas_used, 2206);
    }

    #[test]
    fn sstore_blocked_below_stipend() {
        // enough gas for the pushes but the sentry trips at SSTORE
        let result = run(&code("600160005500"), 2306);
        assert_eq!(result.outcome, Outcome::Error);
        assert_eq!(result.error, Some(VmError::OutOfGas));
    }

    #[test]
    fn identity_precompile_through_call() {
        // store 0xaa at mem[31], call identity with mem[0..32],
        // return the copy written at mem[32..64]
        // PUSH1 0xaa, PUSH1 0, MSTORE,
        // PUSH1 32 (retLen), PUSH1 32 (retOff), PUSH1 32 (argLen),
        // PUSH1 0 (argOff), PUSH1 0 (value), PUSH1 4 (addr),
        // PUSH2 0xffff (gas), CALL, POP,
        // PUSH1 32, PUSH1 32, RETURN
        let result = run(
            &code("60aa60005260206020602060006000600461fffff15060206020f3"),
            100_000,
        );
        assert!(result.is_success(), "{:?}", result.error);
        assert_eq!(result.output.len(), 32);
        assert_eq!(result.output[31], 0xaa);
    }

    #[test]
    fn call_success_flag_is_pushed() {
        // call identity, return the flag word
        // PUSH1 0 x4, PUSH1 0 (value), PUSH1 4, PUSH2 0xffff, CALL,
        // PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN
        let result = run(
            &code("60006000600060006000600461fffff160005260206000f3"),
            100_000,
        );
        assert!(result.is_success());
        assert_eq!(result.output[31], 1);
    }

    #[test]
    fn static_call_blocks_storage_writes() {
        let config = Config::default();
        let mut state = JournaledState::new();
        let callee = Address::from_bytes([0xee; 20]);
        // PUSH1 1, PUSH1 0, SSTORE, STOP
        state.set_code(callee, Bytes::from(code("600160005500")));

        // STATICCALL callee, return the success flag
        // PUSH1 0 (retLen), PUSH1 0 (retOff), PUSH1 0 (argLen),
        // PUSH1 0 (argOff), PUSH20 callee, PUSH2 0xffff, STATICCALL,
        // PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN
        let mut bytecode = code("6000600060006000");
        bytecode.push(0x73);
        bytecode.extend_from_slice(callee.as_bytes());
        bytecode.extend_from_slice(&code("61fffffa60005260206000f3"));

        let result = execute(&bytecode, &[], &config, &mut state, U256::zero(), 200_000);
        assert!(result.is_success());
        // inner frame failed with WriteProtection, flag is 0
        assert_eq!(result.output[31], 0);
        assert_eq!(state.storage(callee, H256::ZERO), H256::ZERO);
    }

    #[test]
    fn call_depth_capped_at_1024() {
        let config = Config::default();
        let mut state = JournaledState::new();
        let mut tracer = CollectingTracer::default();
        // PUSH1 0 x4, PUSH1 0 (value), ADDRESS, GAS, CALL, STOP
        // the budget is large enough that the 63/64 rule alone would
        // carry the recursion past 1024 frames
        let result = execute_traced(
            &code("60006000600060006000305af100"),
            &[],
            &config,
            &mut state,
            U256::zero(),
            2_000_000_000_000,
            &mut tracer,
        );
        assert!(result.is_success(), "{:?}", result.error);

        let deepest = tracer.steps.iter().map(|s| s.call_depth).max().unwrap();
        assert_eq!(deepest, 1024);
        // the deepest frame still held ample gas, so the depth guard,
        // not gas exhaustion, stopped the recursion there
        let gas_at_deepest = tracer
            .steps
            .iter()
            .filter(|s| s.call_depth == 1024)
            .map(|s| s.gas_remaining)
            .max()
            .unwrap();
        assert!(gas_at_deepest > 100_000, "gas at depth 1024: {gas_at_deepest}");
    }

    #[test]
    fn selfdestruct_to_self_keeps_balance() {
        let config = Config::default();
        let mut state = JournaledState::new();
        state.set_balance(CONTRACT_ADDRESS, U256::from(1000));
        // ADDRESS, SELFDESTRUCT
        let result = execute(&code("30ff"), &[], &config, &mut state, U256::zero(), 100_000);
        assert!(result.is_success(), "{:?}", result.error);
        // the account predates this execution, so it survives with
        // its funds intact
        assert_eq!(state.balance(CONTRACT_ADDRESS), U256::from(1000));
        assert!(state.exists(CONTRACT_ADDRESS));
    }

    #[test]
    fn selfdestruct_sweeps_balance_to_beneficiary() {
        let config = Config::default();
        let mut state = JournaledState::new();
        state.set_balance(CONTRACT_ADDRESS, U256::from(1000));
        let beneficiary = Address::from_bytes([0xbb; 20]);
        // PUSH20 beneficiary, SELFDESTRUCT
        let mut bytecode = vec![0x73];
        bytecode.extend_from_slice(beneficiary.as_bytes());
        bytecode.push(0xff);
        let result = execute(&bytecode, &[], &config, &mut state, U256::zero(), 100_000);
        assert!(result.is_success(), "{:?}", result.error);
        assert_eq!(state.balance(CONTRACT_ADDRESS), U256::zero());
        assert_eq!(state.balance(beneficiary), U256::from(1000));
        // pre-existing account: code stays in place
        assert!(!state.code(CONTRACT_ADDRESS).is_empty());
    }

    #[test]
    fn recursive_self_call_terminates() {
        // PUSH1 0 x4, PUSH1 0 (value), ADDRESS, GAS, CALL, STOP
        // recurses until the depth guard or the 63/64 rule stops it,
        // and the failed innermost attempt does not abort the parents
        let result = run(&code("60006000600060006000305af100"), 10_000_000);
        assert!(result.is_success(), "{:?}", result.error);
    }

    #[test]
    fn value_transfer_requires_balance() {
        let config = Config::default();
        let mut state = JournaledState::new();
        let result = execute(
            &[0x00],
            &[],
            &config,
            &mut state,
            U256::from(5),
            100_000,
        );
        assert_eq!(result.outcome, Outcome::Error);
        assert_eq!(result.error, Some(VmError::InsufficientBalance));
        // the failed attempt consumed nothing
        assert_eq!(result.gas_used, 0);
    }

    #[test]
    fn value_transfer_moves_balance() {
        let config = Config::default();
        let mut state = JournaledState::new();
        state.set_balance(config.origin, U256::from(100));
        let result = execute(
            &[0x00],
            &[],
            &config,
            &mut state,
            U256::from(40),
            100_000,
        );
        assert!(result.is_success());
        assert_eq!(state.balance(CONTRACT_ADDRESS), U256::from(40));
        assert_eq!(state.balance(config.origin), U256::from(60));
    }

    #[test]
    fn create_deploys_runtime_code() {
        let config = Config::default();
        let mut state = JournaledState::new();
        // init: PUSH1 0xfe, PUSH1 0, MSTORE8, PUSH1 1, PUSH1 0, RETURN
        let (result, address) = create(
            &code("60fe60005360016000f3"),
            &config,
            &mut state,
            U256::zero(),
            1_000_000,
        );
        assert!(result.is_success(), "{:?}", result.error);
        let address = address.unwrap();
        assert_eq!(state.code(address).as_ref(), [0xfe]);
        assert_eq!(state.nonce(address), 1);
        // deployer nonce moved past the derivation value
        assert_eq!(state.nonce(config.origin), 1);
        // deposit charge: 200 per deployed byte
        assert!(result.gas_used >= 200);
    }

    #[test]
    fn create_reverting_init_deploys_nothing() {
        let config = Config::default();
        let mut state = JournaledState::new();
        // init: PUSH1 0, PUSH1 0, REVERT
        let (result, address) = create(
            &code("60006000fd"),
            &config,
            &mut state,
            U256::zero(),
            1_000_000,
        );
        assert_eq!(result.outcome, Outcome::Revert);
        assert!(address.is_none());
    }

    #[test]
    fn create_rejects_oversized_init_code() {
        let config = Config::default();
        let mut state = JournaledState::new();
        let init = vec![0u8; limits::MAX_INIT_CODE_SIZE + 1];
        let (result, address) = create(&init, &config, &mut state, U256::zero(), 1_000_000);
        assert_eq!(result.outcome, Outcome::Error);
        assert_eq!(result.error, Some(VmError::MaxInitCodeSizeExceeded));
        assert!(address.is_none());
    }

    #[test]
    fn invalid_jump_is_an_error() {
        // PUSH1 3, JUMP (target is not a JUMPDEST)
        let result = run(&code("600356"), 100_000);
        assert_eq!(result.outcome, Outcome::Error);
        assert_eq!(result.error, Some(VmError::InvalidJump(3)));
    }

    #[test]
    fn jump_to_jumpdest_succeeds() {
        // PUSH1 3, JUMP, JUMPDEST, STOP
        let result = run(&code("6003565b00"), 100_000);
        assert!(result.is_success());
        // 3 + 8 + 1
        assert_eq!(result.gas_used, 12);
    }

    #[test]
    fn tracer_observes_every_step() {
        let config = Config::default();
        let mut state = JournaledState::new();
        let mut tracer = CollectingTracer::default();
        // PUSH1 1, POP, STOP
        let result = execute_traced(
            &code("60015000"),
            &[],
            &config,
            &mut state,
            U256::zero(),
            100_000,
            &mut tracer,
        );
        assert!(result.is_success());
        let pcs: Vec<usize> = tracer.steps.iter().map(|s| s.pc).collect();
        assert_eq!(pcs, vec![0, 2, 3]);
        assert_eq!(tracer.steps[0].opcode, 0x60);
        assert_eq!(tracer.steps[0].call_depth, 1);
        // gas decreases monotonically across steps
        assert!(tracer.steps[0].gas_remaining > tracer.steps[1].gas_remaining);
    }

    #[test]
    fn blockhash_outside_window_is_zero() {
        // PUSH1 5, BLOCKHASH, PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN
        // default config runs at height 0, so block 5 is out of range
        let result = run(&code("60054060005260206000f3"), 100_000);
        assert!(result.is_success());
        assert!(result.output.iter().all(|&b| b == 0));
    }

    proptest! {
        #[test]
        fn push_pop_pairs_meter_linearly(n in 0usize..200) {
            // n repetitions of PUSH1 0 / POP, then STOP
            let mut bytecode = Vec::with_capacity(n * 3 + 1);
            for _ in 0..n {
                bytecode.extend_from_slice(&[0x60, 0x00, 0x50]);
            }
            bytecode.push(0x00);
            let result = run(&bytecode, 10_000_000);
            prop_assert!(result.is_success());
            prop_assert_eq!(result.gas_used, (n as u64) * 5);
        }
    }
}
