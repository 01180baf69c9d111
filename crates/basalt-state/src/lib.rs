//! # basalt-state
//!
//! State access for the basalt execution engine.
//!
//! The core never owns persistent state: it drives the [`StateAccessor`]
//! capability for the duration of one execution and issues snapshot and
//! revert operations against it. [`JournaledState`] is the in-memory
//! implementation used by tests and harnesses.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod accessor;
mod journal;

pub use accessor::StateAccessor;
pub use journal::JournaledState;
