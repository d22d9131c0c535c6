// Re-export the storage trait
pub use crate::storage_traits::{ObjectStorage, ObjectStorageIterator};

// Export implementations
mod memory;
pub use memory::{InMemoryStorage, InMemoryStorageIterator};
