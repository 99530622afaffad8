//! [`LinkStore`](burrow_core::LinkStore) adapters.
//!
//! [`MySqlStore`] is the durable store. [`InMemoryStore`] keeps the same
//! contract in process memory for tests and single-shot runs.

pub mod memory;
pub mod mysql;

pub use burrow_core::store::Result;
pub use burrow_core::{LinkStore, StorageError};
pub use memory::InMemoryStore;
pub use mysql::MySqlStore;
