use crate::error::StorageError;
use crate::id::ObjectId;
use crate::objects::StoredObject;
use crate::storage_traits::{ObjectStorage, ObjectStorageIterator};
use std::collections::{btree_map, BTreeMap, HashSet};

/// In-memory object table.
///
/// Objects are kept in a `BTreeMap` so scans are deterministic.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    objects: BTreeMap<ObjectId, StoredObject>,
    retired: HashSet<ObjectId>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Iterator over the live objects of an [`InMemoryStorage`]
pub struct InMemoryStorageIterator<'a> {
    inner: btree_map::Values<'a, ObjectId, StoredObject>,
}

impl Iterator for InMemoryStorageIterator<'_> {
    type Item = Result<StoredObject, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().cloned().map(Ok)
    }
}

impl ObjectStorageIterator for InMemoryStorageIterator<'_> {}

impl ObjectStorage for InMemoryStorage {
    fn get(&self, id: &ObjectId) -> Result<Option<StoredObject>, StorageError> {
        Ok(self.objects.get(id).cloned())
    }

    fn set(&mut self, object: &StoredObject) -> Result<(), StorageError> {
        self.ensure_writable(&object.id)?;
        self.objects.insert(object.id, object.clone());
        Ok(())
    }

    fn delete(&mut self, id: &ObjectId) -> Result<(), StorageError> {
        match self.objects.remove(id) {
            Some(_) => {
                self.retired.insert(*id);
                Ok(())
            }
            None => Err(StorageError::NotFound(id.to_string())),
        }
    }

    fn is_retired(&self, id: &ObjectId) -> Result<bool, StorageError> {
        Ok(self.retired.contains(id))
    }

    fn scan(&self) -> Box<dyn ObjectStorageIterator + '_> {
        Box::new(InMemoryStorageIterator {
            inner: self.objects.values(),
        })
    }
}
