//! Transactional store for Kasira.
//!
//! Holds the committed ledger state behind a single `RwLock` and applies
//! the change-sets produced by the `kasira-core` engines as atomic units:
//! every validation runs before the first mutation, so a failed operation
//! leaves no partial state behind.

pub mod state;
pub mod store;

pub use state::Customer;
pub use store::{LedgerStore, UpdateDraftInput};
