use crate::error::LedgerError;
use crate::id::ObjectId;
use crate::ownership::Owner;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// A typed resource the ledger can store.
///
/// Implementors should not derive `Clone` or `Copy`: a value in hand is the
/// only handle to the object, and the ledger relies on it being moved back
/// through `return_owned`, `transfer`, `freeze` or a destructor.
pub trait LedgerObject: Serialize + DeserializeOwned {
    /// Fully qualified type name used for by-type lookups
    const TYPE_TAG: &'static str;

    /// The identity assigned to this object at construction
    fn id(&self) -> &ObjectId;
}

/// Storage record for a single object.
///
/// The ownership tag lives here, next to the serialized contents, rather
/// than inside the object itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Identity of the stored object
    pub id: ObjectId,

    /// `LedgerObject::TYPE_TAG` of the contents
    pub type_tag: String,

    /// Current ownership state
    pub owner: Owner,

    /// Sequence number of the transaction that last wrote this object
    pub version: u64,

    /// Ledger-wide write ordinal, used to pick the most recent object of a type
    pub write_seq: u64,

    /// bincode-encoded object contents
    pub contents: Vec<u8>,
}

impl StoredObject {
    /// Serialize an object into a storage record
    pub fn from_object<T: LedgerObject>(
        object: &T,
        owner: Owner,
        version: u64,
        write_seq: u64,
    ) -> Result<Self, LedgerError> {
        Ok(Self {
            id: *object.id(),
            type_tag: T::TYPE_TAG.to_string(),
            owner,
            version,
            write_seq,
            contents: bincode::serialize(object)?,
        })
    }

    /// Check whether the record holds a `T`
    pub fn is_type<T: LedgerObject>(&self) -> bool {
        self.type_tag == T::TYPE_TAG
    }

    /// Decode the contents as a `T`, checking the type tag first
    pub fn to_object<T: LedgerObject>(&self) -> Result<T, LedgerError> {
        if !self.is_type::<T>() {
            return Err(LedgerError::TypeMismatch {
                id: self.id,
                expected: T::TYPE_TAG.to_string(),
                actual: self.type_tag.clone(),
            });
        }
        Ok(bincode::deserialize(&self.contents)?)
    }
}

/// Read-only handle to a frozen object.
///
/// Only `Deref` is provided, so the wrapped value can be inspected but never
/// mutated or moved out. Give it back with `Transaction::return_immutable`.
#[derive(Debug)]
pub struct Immutable<T> {
    inner: T,
}

impl<T> Immutable<T> {
    pub(crate) fn new(inner: T) -> Self {
        Self { inner }
    }

    pub(crate) fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Deref for Immutable<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}
