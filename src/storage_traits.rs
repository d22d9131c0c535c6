use crate::error::StorageError;
use crate::id::ObjectId;
use crate::objects::StoredObject;

/// Iterator for traversing objects in storage
pub trait ObjectStorageIterator: Iterator<Item = Result<StoredObject, StorageError>> {}

/// Object table keyed by identity, holding each object with its ownership tag.
///
/// Deleted identities are retired: they are remembered by the backend and can
/// never be written again.
pub trait ObjectStorage {
    /// Get an object by its ID
    ///
    /// # Parameters
    /// * `id` - The ID of the object to retrieve
    ///
    /// # Returns
    /// Some(object) if found, None otherwise (including retired identities)
    fn get(&self, id: &ObjectId) -> Result<Option<StoredObject>, StorageError>;

    /// Store an object, replacing any previous record with the same ID
    ///
    /// # Parameters
    /// * `object` - The record to store
    ///
    /// # Returns
    /// Ok(()) if successful, Err if the identity has been retired
    fn set(&mut self, object: &StoredObject) -> Result<(), StorageError>;

    /// Delete an object by its ID and retire the identity
    ///
    /// # Parameters
    /// * `id` - The ID of the object to delete
    ///
    /// # Returns
    /// Ok(()) if successful, Err if no such object exists
    fn delete(&mut self, id: &ObjectId) -> Result<(), StorageError>;

    /// Check whether an identity belonged to a deleted object
    fn is_retired(&self, id: &ObjectId) -> Result<bool, StorageError>;

    /// Fail with [`StorageError::Retired`] if the identity can no longer be written
    fn ensure_writable(&self, id: &ObjectId) -> Result<(), StorageError> {
        if self.is_retired(id)? {
            return Err(StorageError::Retired(*id));
        }
        Ok(())
    }

    /// Create an iterator to scan through all live objects
    ///
    /// # Returns
    /// A boxed iterator that yields `StoredObject`s
    fn scan(&self) -> Box<dyn ObjectStorageIterator + '_>;

    /// Apply the writes and deletions of one transaction.
    ///
    /// All preconditions are checked before anything is written, so a failed
    /// batch leaves the storage untouched.
    ///
    /// # Parameters
    /// * `writes` - Records to store
    /// * `deletions` - IDs to delete and retire
    fn apply_batch(
        &mut self,
        writes: &[StoredObject],
        deletions: &[ObjectId],
    ) -> Result<(), StorageError> {
        for object in writes {
            self.ensure_writable(&object.id)?;
        }
        for id in deletions {
            if self.get(id)?.is_none() {
                return Err(StorageError::NotFound(id.to_string()));
            }
        }

        for object in writes {
            self.set(object)?;
        }
        for id in deletions {
            self.delete(id)?;
        }

        Ok(())
    }
}
