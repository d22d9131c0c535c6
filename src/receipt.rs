use serde::{Deserialize, Serialize};

use crate::context::TransactionHash;
use crate::id::{Address, ObjectId};
use crate::objects::StoredObject;
use crate::ownership::Owner;

/// How a transaction changed one object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    Created,
    Mutated,
    Transferred,
    Frozen,
    Deleted,
}

/// Represents the before and after state of an object in a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEffect {
    /// The transaction that caused this effect
    pub transaction_hash: TransactionHash,

    /// The ID of the object affected
    pub object_id: ObjectId,

    /// The state of the object before the transaction (None if object was created)
    pub before_image: Option<StoredObject>,

    /// The state of the object after the transaction (None if object was deleted)
    pub after_image: Option<StoredObject>,
}

impl TransactionEffect {
    /// Classify the effect from its images.
    ///
    /// An ownership change takes precedence over a content change, so an
    /// object that was updated and then frozen reports `Frozen`.
    pub fn kind(&self) -> EffectKind {
        match (&self.before_image, &self.after_image) {
            (None, _) => EffectKind::Created,
            (Some(_), None) => EffectKind::Deleted,
            (Some(before), Some(after)) => match (before.owner, after.owner) {
                (Owner::Address(_), Owner::Immutable) => EffectKind::Frozen,
                (from, to) if from != to => EffectKind::Transferred,
                _ => EffectKind::Mutated,
            },
        }
    }

    /// Ownership after the transaction, None if the object was deleted
    pub fn new_owner(&self) -> Option<Owner> {
        self.after_image.as_ref().map(|image| image.owner)
    }
}

/// Record of a committed transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// The hash of the transaction that was executed
    pub transaction_hash: TransactionHash,

    /// Position of the transaction in the ledger's sequence
    pub sequence: u64,

    /// The address that executed the transaction
    pub sender: Address,

    /// Timestamp when the transaction was committed (Unix seconds)
    pub timestamp: u64,

    /// Per-object effects; objects handed back unchanged are omitted
    pub effects: Vec<TransactionEffect>,
}

impl TransactionReceipt {
    pub fn new(transaction_hash: TransactionHash, sequence: u64, sender: Address) -> Self {
        Self {
            transaction_hash,
            sequence,
            sender,
            timestamp: chrono::Utc::now().timestamp().max(0) as u64,
            effects: Vec::new(),
        }
    }

    pub fn add_effect(&mut self, effect: TransactionEffect) {
        self.effects.push(effect);
    }

    /// IDs of all objects affected with the given kind
    pub fn objects_with(&self, kind: EffectKind) -> Vec<ObjectId> {
        self.effects
            .iter()
            .filter(|effect| effect.kind() == kind)
            .map(|effect| effect.object_id)
            .collect()
    }

    pub fn created(&self) -> Vec<ObjectId> {
        self.objects_with(EffectKind::Created)
    }

    pub fn deleted(&self) -> Vec<ObjectId> {
        self.objects_with(EffectKind::Deleted)
    }

    pub fn effect_for(&self, id: &ObjectId) -> Option<&TransactionEffect> {
        self.effects.iter().find(|effect| &effect.object_id == id)
    }
}
