use crate::id::{Address, ObjectId};

/// A transaction hash uniquely identifies a transaction in the system
pub type TransactionHash = [u8; 32];

/// Per-transaction execution context handed to object constructors and destructors.
///
/// The context owns the identity allocation counter for its transaction.
/// Every identity it hands out or takes back is journaled so the ledger can
/// check at commit time that no object was silently dropped.
#[derive(Debug)]
pub struct TxContext {
    sender: Address,
    transaction_hash: TransactionHash,
    ids_created: u64,
    created: Vec<ObjectId>,
    released: Vec<ObjectId>,
}

impl TxContext {
    pub fn new(sender: Address, transaction_hash: TransactionHash) -> Self {
        Self {
            sender,
            transaction_hash,
            ids_created: 0,
            created: Vec::new(),
            released: Vec::new(),
        }
    }

    /// The address executing this transaction
    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn transaction_hash(&self) -> &TransactionHash {
        &self.transaction_hash
    }

    /// Number of identities allocated so far
    pub fn ids_created(&self) -> u64 {
        self.ids_created
    }

    /// Allocate a fresh identity derived from the transaction hash and the allocation counter
    pub fn allocate_identity(&mut self) -> ObjectId {
        let id = ObjectId::derive(&[&self.transaction_hash, &self.ids_created.to_le_bytes()]);
        self.ids_created += 1;
        self.created.push(id);
        id
    }

    /// Hand an identity back to the ledger for permanent retirement
    pub fn release_identity(&mut self, id: ObjectId) {
        self.released.push(id);
    }

    pub(crate) fn created(&self) -> &[ObjectId] {
        &self.created
    }

    pub(crate) fn released(&self) -> &[ObjectId] {
        &self.released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_advances_counter() {
        let mut ctx = TxContext::new(Address::from_low_u8(1), [3u8; 32]);

        let a = ctx.allocate_identity();
        let b = ctx.allocate_identity();

        assert_ne!(a, b);
        assert_eq!(ctx.ids_created(), 2);
        assert_eq!(ctx.created(), &[a, b]);
    }

    #[test]
    fn test_same_counter_different_transaction() {
        let mut ctx1 = TxContext::new(Address::from_low_u8(1), [1u8; 32]);
        let mut ctx2 = TxContext::new(Address::from_low_u8(1), [2u8; 32]);

        assert_ne!(ctx1.allocate_identity(), ctx2.allocate_identity());
    }

    #[test]
    fn test_release_is_journaled() {
        let mut ctx = TxContext::new(Address::from_low_u8(1), [0u8; 32]);
        let id = ctx.allocate_identity();
        ctx.release_identity(id);
        assert_eq!(ctx.released(), &[id]);
    }
}
