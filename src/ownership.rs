use crate::id::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ownership tag the ledger stores alongside every object.
///
/// `Owned → Immutable` is one-directional: nothing in the ledger moves an
/// object out of the immutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    /// Bound to exactly one address; only that address may take it mutably
    Address(Address),
    /// Frozen; readable by anyone, never mutably accessible
    Immutable,
}

impl Owner {
    pub fn is_owned_by(&self, address: &Address) -> bool {
        matches!(self, Owner::Address(owner) if owner == address)
    }

    pub fn is_immutable(&self) -> bool {
        matches!(self, Owner::Immutable)
    }

    /// The owning address, if any
    pub fn address(&self) -> Option<&Address> {
        match self {
            Owner::Address(owner) => Some(owner),
            Owner::Immutable => None,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Address(owner) => write!(f, "owned({})", owner),
            Owner::Immutable => write!(f, "immutable"),
        }
    }
}
