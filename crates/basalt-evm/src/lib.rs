//! # basalt-evm
//!
//! Deterministic, gas-metered bytecode execution engine.
//!
//! This crate provides:
//! - the stack-based interpreter with per-opcode gas metering
//! - nested call-frame management with state snapshot and revert
//! - the precompile registry
//! - per-step instrumentation for external collectors

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
mod error;
mod evm;
mod frame;
pub mod gas;
mod interpreter;
mod memory;
pub mod opcode;
pub mod precompile;
mod runtime;
mod stack;
pub mod tracer;
pub mod word;

pub use config::Config;
pub use error::{ExecutionResult, Log, Outcome, VmError, VmResult};
pub use memory::Memory;
pub use opcode::Opcode;
pub use runtime::{create, execute, execute_traced, CONTRACT_ADDRESS};
pub use stack::Stack;
