use crate::id::{Address, ObjectId};
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with object storage
#[derive(Error, Debug)]
pub enum StorageError {
    /// Errors raised by the underlying storage backend
    #[error("Backend error: {0}")]
    Backend(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A deleted identity cannot be written again
    #[error("Identity {0} has been retired")]
    Retired(ObjectId),

    /// Errors related to missing or invalid data
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic errors that don't fit in other categories
    #[error("Other error: {0}")]
    Other(String),

    /// Anyhow error wrapper for error context
    #[error(transparent)]
    Context(#[from] anyhow::Error),
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Errors surfaced by the ledger while executing a transaction.
///
/// Variants fall into two classes: lookup failures, where the requested
/// object is absent from the pool it was requested from, and precondition
/// violations, where the caller asked for access the ownership state does
/// not grant. Neither class is retried.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// No object with this identity exists
    #[error("Object not found: {0}")]
    NotFound(ObjectId),

    /// The identity belonged to an object that has been deleted
    #[error("Object {0} has been deleted")]
    Deleted(ObjectId),

    /// The owner holds no object of the requested type
    #[error("No object of type {type_tag} owned by {owner}")]
    NoOwnedObject { owner: Address, type_tag: String },

    /// The immutable pool holds no object of the requested type
    #[error("No immutable object of type {0}")]
    NoImmutableObject(String),

    /// The object exists but is not in the immutable pool
    #[error("Object {0} is not immutable")]
    NotImmutable(ObjectId),

    /// The stored object has a different type than requested
    #[error("Object {id} has type {actual}, expected {expected}")]
    TypeMismatch {
        id: ObjectId,
        expected: String,
        actual: String,
    },

    /// The object is owned by someone other than the transaction sender
    #[error("Object {id} is not owned by {sender}")]
    NotOwned { id: ObjectId, sender: Address },

    /// The object is frozen and cannot be accessed mutably
    #[error("Object {0} is immutable")]
    ImmutableObject(ObjectId),

    /// The object has already been taken by this transaction
    #[error("Object {0} is already taken by this transaction")]
    AlreadyTaken(ObjectId),

    /// The object was neither created nor taken by this transaction
    #[error("Object {0} is not accessible to this transaction")]
    NotAccessible(ObjectId),

    /// The object was already transferred, frozen, returned or deleted in this transaction
    #[error("Object {0} was already consumed by this transaction")]
    AlreadyConsumed(ObjectId),

    /// The object was created or taken but never handed back before commit
    #[error("Object {0} was not returned, transferred, frozen or deleted before commit")]
    Unconsumed(ObjectId),

    /// A freshly allocated identity is already live or retired in storage
    #[error("Identity {0} is already in use")]
    IdentityInUse(ObjectId),

    /// The transaction touched more objects than the ledger allows
    #[error("Transaction touches {count} objects, limit is {limit}")]
    TooManyObjects { count: usize, limit: usize },

    /// Errors raised by the storage layer
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Invalid ledger configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// The requested object is absent from the pool it was requested from
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            LedgerError::NotFound(_)
                | LedgerError::Deleted(_)
                | LedgerError::NoOwnedObject { .. }
                | LedgerError::NoImmutableObject(_)
                | LedgerError::NotImmutable(_)
                | LedgerError::TypeMismatch { .. }
        )
    }

    /// The operation requires an access right the object's state does not grant
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            LedgerError::NotOwned { .. }
                | LedgerError::ImmutableObject(_)
                | LedgerError::AlreadyTaken(_)
                | LedgerError::NotAccessible(_)
                | LedgerError::AlreadyConsumed(_)
                | LedgerError::Unconsumed(_)
                | LedgerError::IdentityInUse(_)
                | LedgerError::TooManyObjects { .. }
        )
    }
}

impl From<bincode::Error> for LedgerError {
    fn from(err: bincode::Error) -> Self {
        LedgerError::Storage(err.into())
    }
}
