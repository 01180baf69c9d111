//! State access capability consumed by the execution engine

use basalt_primitives::{Address, H256, U256};
use bytes::Bytes;

/// Capability interface over account balances, nonces, code and storage.
///
/// A snapshot handle returned by [`snapshot`](StateAccessor::snapshot) is
/// scoped to the call frame that opened it and must be resolved exactly
/// once, either by [`revert_to`](StateAccessor::revert_to) or by
/// [`discard`](StateAccessor::discard). Snapshots nest: reverting to an
/// outer snapshot undoes everything recorded after it, including changes
/// an inner frame already committed.
pub trait StateAccessor {
    /// Get the balance of an account. Missing accounts read as zero.
    fn balance(&self, address: Address) -> U256;

    /// Set the balance of an account, creating it if needed.
    fn set_balance(&mut self, address: Address, balance: U256);

    /// Get the nonce of an account. Missing accounts read as zero.
    fn nonce(&self, address: Address) -> u64;

    /// Set the nonce of an account, creating it if needed.
    fn set_nonce(&mut self, address: Address, nonce: u64);

    /// Get the code of an account. Missing accounts read as empty.
    fn code(&self, address: Address) -> Bytes;

    /// Install code on an account, creating it if needed.
    fn set_code(&mut self, address: Address, code: Bytes);

    /// Read a storage slot. Unset slots read as zero.
    fn storage(&self, address: Address, slot: H256) -> H256;

    /// Write a storage slot, creating the account if needed.
    fn set_storage(&mut self, address: Address, slot: H256, value: H256);

    /// Check whether an account exists at all.
    fn exists(&self, address: Address) -> bool;

    /// Remove an account and all of its storage.
    fn delete_account(&mut self, address: Address);

    /// Open a snapshot and return its handle.
    fn snapshot(&mut self) -> usize;

    /// Undo every change made since the snapshot was opened.
    fn revert_to(&mut self, snapshot: usize);

    /// Release a snapshot, keeping the changes made since it was opened.
    fn discard(&mut self, snapshot: usize);
}
