//! RGB color objects on an in-memory object ledger.
//!
//! [`ColorObject`] is the payload. The [`Ledger`] keeps every object beside
//! an ownership tag ([`Owner`]) and only grants mutable access to the owning
//! address, inside a [`Transaction`].

pub mod color_object;
pub mod config;
pub mod context;
pub mod error;
pub mod id;
pub mod objects;
pub mod ownership;
pub mod receipt;
pub mod runtime;
pub mod storage;
pub mod storage_traits;

// Re-export the main types for convenience
pub use color_object::ColorObject;
pub use config::LedgerConfig;
pub use context::{TransactionHash, TxContext};
pub use error::{LedgerError, StorageError};
pub use id::{Address, ObjectId};
pub use objects::{Immutable, LedgerObject, StoredObject};
pub use ownership::Owner;
pub use receipt::{EffectKind, TransactionEffect, TransactionReceipt};
pub use runtime::{Ledger, Transaction};
pub use storage::InMemoryStorage;
pub use storage_traits::{ObjectStorage, ObjectStorageIterator};
