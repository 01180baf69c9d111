//! In-memory journaled state

use crate::StateAccessor;
use basalt_primitives::{Address, H256, U256};
use bytes::Bytes;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
struct Account {
    balance: U256,
    nonce: u64,
    code: Bytes,
    storage: HashMap<H256, H256>,
}

/// One reversible operation recorded before the state mutation it covers.
#[derive(Debug)]
enum JournalEntry {
    AccountCreated {
        address: Address,
    },
    AccountDeleted {
        address: Address,
        account: Account,
    },
    BalanceChanged {
        address: Address,
        prior: U256,
    },
    NonceChanged {
        address: Address,
        prior: u64,
    },
    CodeChanged {
        address: Address,
        prior: Bytes,
    },
    StorageChanged {
        address: Address,
        slot: H256,
        prior: H256,
    },
}

/// In-memory state with an explicit journal of reversible operations.
///
/// A snapshot is a position in the journal. Reverting pops entries back
/// to that position and undoes each one; discarding keeps the entries so
/// an outer snapshot can still revert past them.
#[derive(Debug, Default)]
pub struct JournaledState {
    accounts: HashMap<Address, Account>,
    journal: Vec<JournalEntry>,
}

impl JournaledState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_account(&mut self, address: Address) -> &mut Account {
        if !self.accounts.contains_key(&address) {
            self.accounts.insert(address, Account::default());
            self.journal.push(JournalEntry::AccountCreated { address });
        }
        self.accounts.get_mut(&address).unwrap()
    }

    fn undo(&mut self, entry: JournalEntry) {
        match entry {
            JournalEntry::AccountCreated { address } => {
                self.accounts.remove(&address);
            }
            JournalEntry::AccountDeleted { address, account } => {
                self.accounts.insert(address, account);
            }
            JournalEntry::BalanceChanged { address, prior } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.balance = prior;
                }
            }
            JournalEntry::NonceChanged { address, prior } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.nonce = prior;
                }
            }
            JournalEntry::CodeChanged { address, prior } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.code = prior;
                }
            }
            JournalEntry::StorageChanged {
                address,
                slot,
                prior,
            } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.storage.insert(slot, prior);
                }
            }
        }
    }
}

impl StateAccessor for JournaledState {
    fn balance(&self, address: Address) -> U256 {
        self.accounts
            .get(&address)
            .map(|a| a.balance)
            .unwrap_or_default()
    }

    fn set_balance(&mut self, address: Address, balance: U256) {
        let account = self.ensure_account(address);
        let prior = account.balance;
        account.balance = balance;
        self.journal
            .push(JournalEntry::BalanceChanged { address, prior });
    }

    fn nonce(&self, address: Address) -> u64 {
        self.accounts
            .get(&address)
            .map(|a| a.nonce)
            .unwrap_or_default()
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) {
        let account = self.ensure_account(address);
        let prior = account.nonce;
        account.nonce = nonce;
        self.journal
            .push(JournalEntry::NonceChanged { address, prior });
    }

    fn code(&self, address: Address) -> Bytes {
        self.accounts
            .get(&address)
            .map(|a| a.code.clone())
            .unwrap_or_default()
    }

    fn set_code(&mut self, address: Address, code: Bytes) {
        let account = self.ensure_account(address);
        let prior = account.code.clone();
        account.code = code;
        self.journal
            .push(JournalEntry::CodeChanged { address, prior });
    }

    fn storage(&self, address: Address, slot: H256) -> H256 {
        self.accounts
            .get(&address)
            .and_then(|a| a.storage.get(&slot).copied())
            .unwrap_or(H256::ZERO)
    }

    fn set_storage(&mut self, address: Address, slot: H256, value: H256) {
        let account = self.ensure_account(address);
        let prior = account.storage.insert(slot, value).unwrap_or(H256::ZERO);
        self.journal.push(JournalEntry::StorageChanged {
            address,
            slot,
            prior,
        });
    }

    fn exists(&self, address: Address) -> bool {
        self.accounts.contains_key(&address)
    }

    fn delete_account(&mut self, address: Address) {
        if let Some(account) = self.accounts.remove(&address) {
            self.journal
                .push(JournalEntry::AccountDeleted { address, account });
        }
    }

    fn snapshot(&mut self) -> usize {
        self.journal.len()
    }

    fn revert_to(&mut self, snapshot: usize) {
        while self.journal.len() > snapshot {
            let entry = self.journal.pop().unwrap();
            self.undo(entry);
        }
    }

    fn discard(&mut self, snapshot: usize) {
        // Entries stay in the journal so an enclosing snapshot can still
        // revert past this one.
        debug_assert!(snapshot <= self.journal.len());
    }
}
