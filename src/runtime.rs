use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

use crate::config::LedgerConfig;
use crate::context::{TransactionHash, TxContext};
use crate::error::LedgerError;
use crate::id::{Address, ObjectId};
use crate::objects::{Immutable, LedgerObject, StoredObject};
use crate::ownership::Owner;
use crate::receipt::{TransactionEffect, TransactionReceipt};
use crate::storage::InMemoryStorage;
use crate::storage_traits::ObjectStorage;

/// Host ledger: owns the object table and sequences transactions.
///
/// Transactions run one at a time. [`Ledger::begin_tx`] borrows the ledger
/// mutably for the lifetime of the returned [`Transaction`], so a second
/// transaction cannot start until the first is committed or dropped.
pub struct Ledger<S: ObjectStorage = InMemoryStorage> {
    storage: S,
    config: LedgerConfig,
    /// Number of transactions begun so far, committed or not
    sequence: u64,
    /// Ledger-wide write ordinal
    write_seq: u64,
    receipts: Vec<TransactionReceipt>,
}

impl Ledger<InMemoryStorage> {
    /// Create a ledger backed by in-memory storage
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        Self::with_storage(InMemoryStorage::new(), config)
    }
}

impl Default for Ledger<InMemoryStorage> {
    fn default() -> Self {
        Self::from_parts(InMemoryStorage::new(), LedgerConfig::default(), 0, 0)
    }
}

impl<S: ObjectStorage> Ledger<S> {
    /// Open a ledger over existing storage.
    ///
    /// The transaction sequence and write ordinal resume after the highest
    /// values found in storage, so identities derived from new transactions
    /// cannot repeat ones already handed out.
    pub fn with_storage(storage: S, config: LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;

        let mut sequence = 0;
        let mut write_seq = 0;
        for object in storage.scan() {
            let object = object?;
            sequence = sequence.max(object.version);
            write_seq = write_seq.max(object.write_seq);
        }
        debug!(
            "Opened ledger at sequence {} (write ordinal {})",
            sequence, write_seq
        );

        Ok(Self::from_parts(storage, config, sequence, write_seq))
    }

    fn from_parts(storage: S, config: LedgerConfig, sequence: u64, write_seq: u64) -> Self {
        Self {
            storage,
            config,
            sequence,
            write_seq,
            receipts: Vec::new(),
        }
    }

    /// Close the ledger and hand back its storage
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Start a transaction executed by `sender`.
    ///
    /// The sequence number is consumed even if the transaction is later
    /// dropped, so identities derived from it are never handed out twice.
    pub fn begin_tx(&mut self, sender: Address) -> Transaction<'_, S> {
        self.sequence += 1;
        let sequence = self.sequence;
        let transaction_hash = transaction_hash(sequence, &sender);

        debug!(
            "Begin transaction #{} ({}) from {}",
            sequence,
            hex::encode(&transaction_hash[..8]),
            sender
        );

        Transaction {
            ledger: self,
            ctx: TxContext::new(sender, transaction_hash),
            sequence,
            taken: HashMap::new(),
            writes: Vec::new(),
            consumed: HashSet::new(),
        }
    }

    /// Check whether `owner` holds at least one committed object of type `T`
    pub fn has_owned<T: LedgerObject>(&self, owner: &Address) -> Result<bool, LedgerError> {
        Ok(self
            .find_latest::<T>(|o| o.is_owned_by(owner), |_| false)?
            .is_some())
    }

    /// Check whether at least one committed object of type `T` is frozen
    pub fn has_immutable<T: LedgerObject>(&self) -> Result<bool, LedgerError> {
        Ok(self
            .find_latest::<T>(Owner::is_immutable, |_| false)?
            .is_some())
    }

    /// Current ownership state of an object
    pub fn owner_of(&self, id: &ObjectId) -> Result<Owner, LedgerError> {
        Ok(self.lookup(id)?.owner)
    }

    /// Detached copy of a committed object, for inspection only.
    ///
    /// The copy grants no access: handing it to a transaction fails with
    /// [`LedgerError::NotAccessible`].
    pub fn snapshot<T: LedgerObject>(&self, id: &ObjectId) -> Result<T, LedgerError> {
        self.lookup(id)?.to_object()
    }

    /// Whether `id` belonged to an object that has been deleted
    pub fn is_retired(&self, id: &ObjectId) -> Result<bool, LedgerError> {
        Ok(self.storage.is_retired(id)?)
    }

    pub fn receipt(&self, hash: &TransactionHash) -> Option<&TransactionReceipt> {
        self.receipts
            .iter()
            .find(|receipt| &receipt.transaction_hash == hash)
    }

    pub fn receipts(&self) -> &[TransactionReceipt] {
        &self.receipts
    }

    /// Number of transactions begun so far
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn lookup(&self, id: &ObjectId) -> Result<StoredObject, LedgerError> {
        match self.storage.get(id)? {
            Some(object) => Ok(object),
            None if self.storage.is_retired(id)? => Err(LedgerError::Deleted(*id)),
            None => Err(LedgerError::NotFound(*id)),
        }
    }

    /// Most recently written object of type `T` whose owner matches
    fn find_latest<T: LedgerObject>(
        &self,
        matches: impl Fn(&Owner) -> bool,
        skip: impl Fn(&ObjectId) -> bool,
    ) -> Result<Option<StoredObject>, LedgerError> {
        let mut latest: Option<StoredObject> = None;
        for object in self.storage.scan() {
            let object = object?;
            if !object.is_type::<T>() || !matches(&object.owner) || skip(&object.id) {
                continue;
            }
            if latest
                .as_ref()
                .map_or(true, |current| object.write_seq > current.write_seq)
            {
                latest = Some(object);
            }
        }
        Ok(latest)
    }
}

fn transaction_hash(sequence: u64, sender: &Address) -> TransactionHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"color_object::transaction");
    hasher.update(&sequence.to_le_bytes());
    hasher.update(&sender[..]);
    *hasher.finalize().as_bytes()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Owned,
    Immutable,
}

#[derive(Debug)]
struct TakenObject {
    image: StoredObject,
    access: Access,
}

#[derive(Debug)]
struct PendingWrite {
    id: ObjectId,
    type_tag: &'static str,
    owner: Owner,
    contents: Vec<u8>,
}

/// An open transaction scoped to one sender.
///
/// Objects are checked out of committed storage with the `take_*` methods
/// and must be handed back (returned, transferred, frozen or deleted) before
/// [`Transaction::commit_tx`]. Nothing reaches storage until commit; dropping
/// the transaction aborts it.
#[must_use = "a transaction does nothing unless committed"]
pub struct Transaction<'l, S: ObjectStorage = InMemoryStorage> {
    ledger: &'l mut Ledger<S>,
    ctx: TxContext,
    sequence: u64,
    taken: HashMap<ObjectId, TakenObject>,
    writes: Vec<PendingWrite>,
    consumed: HashSet<ObjectId>,
}

impl<'l, S: ObjectStorage> Transaction<'l, S> {
    /// Execution context for object constructors and destructors
    pub fn ctx(&mut self) -> &mut TxContext {
        &mut self.ctx
    }

    pub fn sender(&self) -> Address {
        self.ctx.sender()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn transaction_hash(&self) -> &TransactionHash {
        self.ctx.transaction_hash()
    }

    /// Take the most recently written `T` owned by the sender
    pub fn take_owned<T: LedgerObject>(&mut self) -> Result<T, LedgerError> {
        let sender = self.sender();
        let image = self
            .ledger
            .find_latest::<T>(|o| o.is_owned_by(&sender), |id| self.taken.contains_key(id))?
            .ok_or_else(|| LedgerError::NoOwnedObject {
                owner: sender,
                type_tag: T::TYPE_TAG.to_string(),
            })?;
        self.check_out(image, Access::Owned)
    }

    /// Take a specific object owned by the sender
    pub fn take_owned_by_id<T: LedgerObject>(&mut self, id: ObjectId) -> Result<T, LedgerError> {
        if self.taken.contains_key(&id) {
            return Err(LedgerError::AlreadyTaken(id));
        }
        let image = self.ledger.lookup(&id)?;
        let sender = self.sender();
        match image.owner {
            Owner::Immutable => return Err(LedgerError::ImmutableObject(id)),
            Owner::Address(owner) if owner != sender => {
                return Err(LedgerError::NotOwned { id, sender })
            }
            Owner::Address(_) => {}
        }
        self.check_out(image, Access::Owned)
    }

    /// Take the most recently frozen `T`. Any sender may do this.
    pub fn take_immutable<T: LedgerObject>(&mut self) -> Result<Immutable<T>, LedgerError> {
        let image = self
            .ledger
            .find_latest::<T>(Owner::is_immutable, |id| self.taken.contains_key(id))?
            .ok_or_else(|| LedgerError::NoImmutableObject(T::TYPE_TAG.to_string()))?;
        self.check_out(image, Access::Immutable).map(Immutable::new)
    }

    /// Take a specific frozen object
    pub fn take_immutable_by_id<T: LedgerObject>(
        &mut self,
        id: ObjectId,
    ) -> Result<Immutable<T>, LedgerError> {
        if self.taken.contains_key(&id) {
            return Err(LedgerError::AlreadyTaken(id));
        }
        let image = self.ledger.lookup(&id)?;
        if !image.owner.is_immutable() {
            return Err(LedgerError::NotImmutable(id));
        }
        self.check_out(image, Access::Immutable).map(Immutable::new)
    }

    /// Hand a frozen object back unchanged
    pub fn return_immutable<T: LedgerObject>(
        &mut self,
        object: Immutable<T>,
    ) -> Result<(), LedgerError> {
        let object = object.into_inner();
        let id = *object.id();
        match self.taken.get(&id) {
            Some(taken) if taken.access == Access::Immutable => {}
            _ => return Err(LedgerError::NotAccessible(id)),
        }
        if !self.consumed.insert(id) {
            return Err(LedgerError::AlreadyConsumed(id));
        }
        debug!("Returned immutable {}", id);
        Ok(())
    }

    /// Give an object back to the sender
    pub fn return_owned<T: LedgerObject>(&mut self, object: T) -> Result<(), LedgerError> {
        let owner = Owner::Address(self.sender());
        self.write(object, owner)
    }

    /// Reassign an owned object to `recipient`
    pub fn transfer<T: LedgerObject>(
        &mut self,
        object: T,
        recipient: Address,
    ) -> Result<(), LedgerError> {
        self.write(object, Owner::Address(recipient))
    }

    /// Irreversibly move an owned object into the immutable pool
    pub fn freeze<T: LedgerObject>(&mut self, object: T) -> Result<(), LedgerError> {
        self.write(object, Owner::Immutable)
    }

    /// Whether `owner` holds a committed `T` that this transaction has not taken
    pub fn has_owned<T: LedgerObject>(&self, owner: &Address) -> Result<bool, LedgerError> {
        Ok(self
            .ledger
            .find_latest::<T>(|o| o.is_owned_by(owner), |id| self.taken.contains_key(id))?
            .is_some())
    }

    /// Whether a committed frozen `T` exists that this transaction has not taken
    pub fn has_immutable<T: LedgerObject>(&self) -> Result<bool, LedgerError> {
        Ok(self
            .ledger
            .find_latest::<T>(Owner::is_immutable, |id| self.taken.contains_key(id))?
            .is_some())
    }

    fn check_out<T: LedgerObject>(
        &mut self,
        image: StoredObject,
        access: Access,
    ) -> Result<T, LedgerError> {
        let object = image.to_object::<T>()?;
        debug!("Took {} as {:?} ({})", image.id, access, image.owner);
        self.taken.insert(image.id, TakenObject { image, access });
        Ok(object)
    }

    /// Queue an object for writing with the given ownership
    fn write<T: LedgerObject>(&mut self, object: T, owner: Owner) -> Result<(), LedgerError> {
        let id = *object.id();
        if self.consumed.contains(&id) {
            return Err(LedgerError::AlreadyConsumed(id));
        }
        match self.taken.get(&id) {
            Some(taken) if taken.access == Access::Immutable => {
                return Err(LedgerError::ImmutableObject(id))
            }
            Some(taken) if taken.image.type_tag != T::TYPE_TAG => {
                return Err(LedgerError::TypeMismatch {
                    id,
                    expected: taken.image.type_tag.clone(),
                    actual: T::TYPE_TAG.to_string(),
                })
            }
            Some(_) => {}
            None if self.ctx.created().contains(&id) => {}
            None => return Err(LedgerError::NotAccessible(id)),
        }

        let contents = bincode::serialize(&object)?;
        debug!("Queued {} for {}", id, owner);
        self.consumed.insert(id);
        self.writes.push(PendingWrite {
            id,
            type_tag: T::TYPE_TAG,
            owner,
            contents,
        });
        Ok(())
    }

    /// Validate the transaction and apply its writes and deletions atomically.
    ///
    /// On error nothing is written and the ledger is left as it was before
    /// the transaction began (apart from the consumed sequence number).
    pub fn commit_tx(self) -> Result<TransactionReceipt, LedgerError> {
        let sequence = self.sequence;
        match self.apply() {
            Ok(receipt) => Ok(receipt),
            Err(err) => {
                warn!("Transaction #{} rejected: {}", sequence, err);
                Err(err)
            }
        }
    }

    fn apply(self) -> Result<TransactionReceipt, LedgerError> {
        let Transaction {
            ledger,
            ctx,
            sequence,
            taken,
            writes,
            mut consumed,
        } = self;

        let touched = ctx.created().len() + taken.len();
        let limit = ledger.config.max_objects_per_transaction;
        if touched > limit {
            return Err(LedgerError::TooManyObjects {
                count: touched,
                limit,
            });
        }

        // Fresh identities must not collide with anything storage has seen
        for id in ctx.created() {
            if ledger.storage.get(id)?.is_some() || ledger.storage.is_retired(id)? {
                return Err(LedgerError::IdentityInUse(*id));
            }
        }

        // Released identities must belong to something this transaction may destroy
        let mut deletions = Vec::new();
        for id in ctx.released() {
            if !consumed.insert(*id) {
                return Err(LedgerError::AlreadyConsumed(*id));
            }
            match taken.get(id) {
                Some(object) if object.access == Access::Immutable => {
                    return Err(LedgerError::ImmutableObject(*id))
                }
                Some(_) => deletions.push(*id),
                // Created and destroyed within this transaction: never stored
                None if ctx.created().contains(id) => {}
                None => return Err(LedgerError::NotAccessible(*id)),
            }
        }

        if let Some(id) = ctx
            .created()
            .iter()
            .chain(taken.keys())
            .find(|id| !consumed.contains(*id))
        {
            return Err(LedgerError::Unconsumed(*id));
        }

        let mut receipt = TransactionReceipt::new(*ctx.transaction_hash(), sequence, ctx.sender());
        let mut write_seq = ledger.write_seq;
        let mut records = Vec::with_capacity(writes.len());

        for pending in writes {
            write_seq += 1;
            let record = StoredObject {
                id: pending.id,
                type_tag: pending.type_tag.to_string(),
                owner: pending.owner,
                version: sequence,
                write_seq,
                contents: pending.contents,
            };
            let before_image = taken.get(&pending.id).map(|t| t.image.clone());
            let unchanged = before_image.as_ref().map_or(false, |before| {
                before.owner == record.owner && before.contents == record.contents
            });
            if !unchanged {
                receipt.add_effect(TransactionEffect {
                    transaction_hash: receipt.transaction_hash,
                    object_id: record.id,
                    before_image,
                    after_image: Some(record.clone()),
                });
            }
            records.push(record);
        }

        for id in &deletions {
            receipt.add_effect(TransactionEffect {
                transaction_hash: receipt.transaction_hash,
                object_id: *id,
                before_image: taken.get(id).map(|t| t.image.clone()),
                after_image: None,
            });
        }

        ledger.storage.apply_batch(&records, &deletions)?;
        ledger.write_seq = write_seq;

        info!(
            "Committed transaction #{} from {}: {} written, {} deleted, {} effects",
            sequence,
            receipt.sender,
            records.len(),
            deletions.len(),
            receipt.effects.len()
        );

        if ledger.config.retain_receipts {
            ledger.receipts.push(receipt.clone());
        }
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_object::ColorObject;
    use crate::receipt::EffectKind;
    use serde::{Deserialize, Serialize};

    fn alice() -> Address {
        Address::from_low_u8(1)
    }

    fn bob() -> Address {
        Address::from_low_u8(2)
    }

    /// Create a color object owned by `owner` in its own transaction
    fn mint(ledger: &mut Ledger, owner: Address, rgb: (u8, u8, u8)) -> ObjectId {
        let mut tx = ledger.begin_tx(owner);
        let obj = ColorObject::new(rgb.0, rgb.1, rgb.2, tx.ctx());
        let id = *obj.id();
        tx.return_owned(obj).unwrap();
        tx.commit_tx().unwrap();
        id
    }

    #[test]
    fn test_objects_visible_only_after_commit() {
        let mut ledger = Ledger::default();

        let mut tx = ledger.begin_tx(alice());
        let obj = ColorObject::new(1, 2, 3, tx.ctx());
        tx.return_owned(obj).unwrap();
        assert!(!tx.has_owned::<ColorObject>(&alice()).unwrap());
        tx.commit_tx().unwrap();

        assert!(ledger.has_owned::<ColorObject>(&alice()).unwrap());
    }

    #[test]
    fn test_dropped_transaction_is_aborted() {
        let mut ledger = Ledger::default();
        let id = mint(&mut ledger, alice(), (1, 2, 3));

        {
            let mut tx = ledger.begin_tx(alice());
            let mut obj: ColorObject = tx.take_owned_by_id(id).unwrap();
            obj.update(9, 9, 9);
            tx.return_owned(obj).unwrap();
            // dropped without commit
        }

        let snapshot: ColorObject = ledger.snapshot(&id).unwrap();
        assert_eq!(snapshot.get_color(), (1, 2, 3));
        assert_eq!(ledger.sequence(), 2);
        assert_eq!(ledger.receipts().len(), 1);
    }

    #[test]
    fn test_unreturned_object_rejects_commit() {
        let mut ledger = Ledger::default();
        let id = mint(&mut ledger, alice(), (1, 2, 3));

        let mut tx = ledger.begin_tx(alice());
        let obj: ColorObject = tx.take_owned_by_id(id).unwrap();
        drop(obj);
        let err = tx.commit_tx().unwrap_err();

        assert!(matches!(err, LedgerError::Unconsumed(unreturned) if unreturned == id));
        assert!(err.is_precondition_violation());
        // Still owned by alice, untouched
        assert_eq!(ledger.owner_of(&id).unwrap(), Owner::Address(alice()));
    }

    #[test]
    fn test_dropped_new_object_rejects_commit() {
        let mut ledger = Ledger::default();

        let mut tx = ledger.begin_tx(alice());
        let obj = ColorObject::new(0, 0, 0, tx.ctx());
        let id = *obj.id();
        drop(obj);

        let err = tx.commit_tx().unwrap_err();
        assert!(matches!(err, LedgerError::Unconsumed(unreturned) if unreturned == id));
    }

    #[test]
    fn test_non_owner_cannot_take_by_id() {
        let mut ledger = Ledger::default();
        let id = mint(&mut ledger, alice(), (1, 2, 3));

        let mut tx = ledger.begin_tx(bob());
        let err = tx.take_owned_by_id::<ColorObject>(id).unwrap_err();
        assert!(matches!(err, LedgerError::NotOwned { .. }));
        assert!(err.is_precondition_violation());
    }

    #[test]
    fn test_take_owned_twice_fails() {
        let mut ledger = Ledger::default();
        let id = mint(&mut ledger, alice(), (1, 2, 3));

        let mut tx = ledger.begin_tx(alice());
        let obj: ColorObject = tx.take_owned_by_id(id).unwrap();
        assert!(matches!(
            tx.take_owned_by_id::<ColorObject>(id),
            Err(LedgerError::AlreadyTaken(_))
        ));
        assert!(matches!(
            tx.take_owned::<ColorObject>(),
            Err(LedgerError::NoOwnedObject { .. })
        ));
        tx.return_owned(obj).unwrap();
        tx.commit_tx().unwrap();
    }

    #[test]
    fn test_take_owned_picks_most_recent() {
        let mut ledger = Ledger::default();
        mint(&mut ledger, alice(), (1, 1, 1));
        let newest = mint(&mut ledger, alice(), (2, 2, 2));

        let mut tx = ledger.begin_tx(alice());
        let obj: ColorObject = tx.take_owned().unwrap();
        assert_eq!(obj.id(), &newest);
        tx.return_owned(obj).unwrap();
        tx.commit_tx().unwrap();
    }

    #[test]
    fn test_immutable_cannot_be_taken_as_owned() {
        let mut ledger = Ledger::default();

        let mut tx = ledger.begin_tx(alice());
        let obj = ColorObject::new(1, 2, 3, tx.ctx());
        let id = *obj.id();
        tx.freeze(obj).unwrap();
        tx.commit_tx().unwrap();

        let mut tx = ledger.begin_tx(alice());
        let err = tx.take_owned_by_id::<ColorObject>(id).unwrap_err();
        assert!(matches!(err, LedgerError::ImmutableObject(_)));
    }

    #[test]
    fn test_owned_object_is_not_immutable() {
        let mut ledger = Ledger::default();
        let id = mint(&mut ledger, alice(), (1, 2, 3));

        let mut tx = ledger.begin_tx(alice());
        let err = tx.take_immutable_by_id::<ColorObject>(id).unwrap_err();
        assert!(matches!(err, LedgerError::NotImmutable(_)));
        assert!(err.is_lookup_failure());
    }

    #[test]
    fn test_release_of_immutable_identity_rejected() {
        let mut ledger = Ledger::default();

        let mut tx = ledger.begin_tx(alice());
        let obj = ColorObject::new(1, 2, 3, tx.ctx());
        let id = *obj.id();
        tx.freeze(obj).unwrap();
        tx.commit_tx().unwrap();

        let mut tx = ledger.begin_tx(alice());
        let frozen: Immutable<ColorObject> = tx.take_immutable_by_id(id).unwrap();
        tx.ctx().release_identity(*frozen.id());
        tx.return_immutable(frozen).unwrap();

        // The immutable was returned, so the release is a double consume
        let err = tx.commit_tx().unwrap_err();
        assert!(err.is_precondition_violation());
        assert_eq!(ledger.owner_of(&id).unwrap(), Owner::Immutable);
    }

    #[test]
    fn test_snapshot_grants_no_access() {
        let mut ledger = Ledger::default();
        let id = mint(&mut ledger, alice(), (1, 2, 3));
        let copy: ColorObject = ledger.snapshot(&id).unwrap();

        let mut tx = ledger.begin_tx(alice());
        let err = tx.transfer(copy, bob()).unwrap_err();
        assert!(matches!(err, LedgerError::NotAccessible(_)));
    }

    #[test]
    fn test_object_limit_enforced() {
        let config = LedgerConfig {
            max_objects_per_transaction: 1,
            ..LedgerConfig::default()
        };
        let mut ledger = Ledger::new(config).unwrap();

        let mut tx = ledger.begin_tx(alice());
        let a = ColorObject::new(0, 0, 0, tx.ctx());
        let b = ColorObject::new(1, 1, 1, tx.ctx());
        tx.return_owned(a).unwrap();
        tx.return_owned(b).unwrap();

        let err = tx.commit_tx().unwrap_err();
        assert!(matches!(err, LedgerError::TooManyObjects { count: 2, limit: 1 }));
        assert!(!ledger.has_owned::<ColorObject>(&alice()).unwrap());
    }

    #[test]
    fn test_receipt_effects() {
        let mut ledger = Ledger::default();
        let id = mint(&mut ledger, alice(), (1, 2, 3));

        let first = &ledger.receipts()[0];
        assert_eq!(first.created(), vec![id]);

        // Unchanged return produces no effect
        let mut tx = ledger.begin_tx(alice());
        let obj: ColorObject = tx.take_owned_by_id(id).unwrap();
        tx.return_owned(obj).unwrap();
        let receipt = tx.commit_tx().unwrap();
        assert!(receipt.effects.is_empty());

        let mut tx = ledger.begin_tx(alice());
        let mut obj: ColorObject = tx.take_owned_by_id(id).unwrap();
        obj.update(4, 5, 6);
        tx.return_owned(obj).unwrap();
        let receipt = tx.commit_tx().unwrap();
        assert_eq!(receipt.effect_for(&id).unwrap().kind(), EffectKind::Mutated);

        let mut tx = ledger.begin_tx(alice());
        let obj: ColorObject = tx.take_owned_by_id(id).unwrap();
        tx.transfer(obj, bob()).unwrap();
        let receipt = tx.commit_tx().unwrap();
        let effect = receipt.effect_for(&id).unwrap();
        assert_eq!(effect.kind(), EffectKind::Transferred);
        assert_eq!(effect.new_owner(), Some(Owner::Address(bob())));

        assert!(ledger.receipt(&receipt.transaction_hash).is_some());
        assert_eq!(ledger.receipts().len(), 4);
    }

    #[test]
    fn test_receipts_not_retained_when_disabled() {
        let config = LedgerConfig {
            retain_receipts: false,
            ..LedgerConfig::default()
        };
        let mut ledger = Ledger::new(config).unwrap();
        mint(&mut ledger, alice(), (1, 2, 3));
        assert!(ledger.receipts().is_empty());
    }

    #[test]
    fn test_transaction_hashes_are_unique() {
        let mut ledger = Ledger::default();
        let first = *ledger.begin_tx(alice()).transaction_hash();
        let second = *ledger.begin_tx(alice()).transaction_hash();
        assert_ne!(first, second);
    }

    #[test]
    fn test_default_matches_empty_storage() {
        let default = Ledger::default();
        let opened = Ledger::with_storage(InMemoryStorage::new(), LedgerConfig::default()).unwrap();

        assert_eq!(default.sequence(), opened.sequence());
        assert_eq!(
            default.config().max_objects_per_transaction,
            opened.config().max_objects_per_transaction
        );
        assert!(default.receipts().is_empty());
        assert!(default.storage().is_empty());
    }

    #[test]
    fn test_reopened_ledger_resumes_sequence() {
        let mut ledger = Ledger::default();
        let original = mint(&mut ledger, alice(), (1, 2, 3));
        mint(&mut ledger, bob(), (4, 5, 6));

        let mut reopened = Ledger::with_storage(ledger.into_storage(), LedgerConfig::default())
            .unwrap();
        assert_eq!(reopened.sequence(), 2);

        let mut tx = reopened.begin_tx(alice());
        let obj = ColorObject::new(9, 9, 9, tx.ctx());
        let fresh = *obj.id();
        tx.transfer(obj, bob()).unwrap();
        tx.commit_tx().unwrap();

        assert_ne!(fresh, original);
        assert_eq!(reopened.owner_of(&original).unwrap(), Owner::Address(alice()));
        let kept: ColorObject = reopened.snapshot(&original).unwrap();
        assert_eq!(kept.get_color(), (1, 2, 3));

        // The newest write is still the one picked by type
        let mut tx = reopened.begin_tx(bob());
        let newest: ColorObject = tx.take_owned().unwrap();
        assert_eq!(newest.id(), &fresh);
        tx.return_owned(newest).unwrap();
        tx.commit_tx().unwrap();
    }

    #[test]
    fn test_colliding_identity_rejected_at_commit() {
        for retire in [false, true] {
            // Storage already holds the id the next transaction will allocate
            let colliding = ObjectId::derive(&[
                &transaction_hash(1, &alice()),
                &0u64.to_le_bytes(),
            ]);
            let mut storage = InMemoryStorage::new();
            storage
                .set(&StoredObject {
                    id: colliding,
                    type_tag: ColorObject::TYPE_TAG.to_string(),
                    owner: Owner::Address(bob()),
                    version: 0,
                    write_seq: 0,
                    contents: vec![],
                })
                .unwrap();
            if retire {
                storage.delete(&colliding).unwrap();
            }

            let mut ledger = Ledger::with_storage(storage, LedgerConfig::default()).unwrap();
            let mut tx = ledger.begin_tx(alice());
            let obj = ColorObject::new(9, 9, 9, tx.ctx());
            assert_eq!(obj.id(), &colliding);
            tx.return_owned(obj).unwrap();

            let err = tx.commit_tx().unwrap_err();
            assert!(matches!(err, LedgerError::IdentityInUse(id) if id == colliding));
            assert!(err.is_precondition_violation());

            if retire {
                assert!(ledger.is_retired(&colliding).unwrap());
            } else {
                assert_eq!(ledger.owner_of(&colliding).unwrap(), Owner::Address(bob()));
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Impostor {
        id: ObjectId,
    }

    impl LedgerObject for Impostor {
        const TYPE_TAG: &'static str = "test::Impostor";

        fn id(&self) -> &ObjectId {
            &self.id
        }
    }

    #[test]
    fn test_write_back_with_other_type_rejected() {
        let mut ledger = Ledger::default();
        let id = mint(&mut ledger, alice(), (1, 2, 3));

        let mut tx = ledger.begin_tx(alice());
        let obj: ColorObject = tx.take_owned_by_id(id).unwrap();
        let err = tx.return_owned(Impostor { id }).unwrap_err();
        assert!(matches!(err, LedgerError::TypeMismatch { .. }));

        tx.return_owned(obj).unwrap();
        tx.commit_tx().unwrap();

        let stored = ledger.storage().get(&id).unwrap().unwrap();
        assert!(stored.is_type::<ColorObject>());
    }
}
