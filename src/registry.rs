//! Participant identities and their lookup.
use std::sync::Arc;

use crate::scheme::PublicKey;

/// A registered participant: a stable index, a network address and the key
/// its contributions verify against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity<P> {
    id: u32,
    address: String,
    public_key: P,
}

impl<P: PublicKey> Identity<P> {
    pub fn new(id: u32, address: impl Into<String>, public_key: P) -> Self {
        Self {
            id,
            address: address.into(),
            public_key,
        }
    }

    /// Index of the participant in the registry.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn public_key(&self) -> &P {
        &self.public_key
    }
}

/// Read-only view of all participants of a run, ordered by index.
pub trait Registry: Send + Sync {
    type PublicKey: PublicKey;

    /// Total number of participants.
    fn size(&self) -> usize;

    /// Identity registered at index `idx`.
    fn identity(&self, idx: usize) -> Option<Identity<Self::PublicKey>>;

    /// Identities of the indices `[min, max)`, in order. `None` when the range
    /// is empty or not fully registered.
    fn identities(&self, min: usize, max: usize) -> Option<Vec<Identity<Self::PublicKey>>>;
}

impl<T: Registry + ?Sized> Registry for Arc<T> {
    type PublicKey = T::PublicKey;

    fn size(&self) -> usize {
        (**self).size()
    }

    fn identity(&self, idx: usize) -> Option<Identity<T::PublicKey>> {
        (**self).identity(idx)
    }

    fn identities(&self, min: usize, max: usize) -> Option<Vec<Identity<T::PublicKey>>> {
        (**self).identities(min, max)
    }
}

/// `Registry` holding every identity in memory.
#[derive(Clone, Debug)]
pub struct ArrayRegistry<P> {
    identities: Vec<Identity<P>>,
}

impl<P: PublicKey> ArrayRegistry<P> {
    /// Build a registry from identities whose ids are `0..len`, in order.
    ///
    /// Returns `None` if an identity's id does not match its position.
    pub fn new(identities: Vec<Identity<P>>) -> Option<Self> {
        let ordered = identities
            .iter()
            .enumerate()
            .all(|(i, identity)| identity.id as usize == i);
        ordered.then_some(Self { identities })
    }
}

impl<P: PublicKey> Registry for ArrayRegistry<P> {
    type PublicKey = P;

    fn size(&self) -> usize {
        self.identities.len()
    }

    fn identity(&self, idx: usize) -> Option<Identity<P>> {
        self.identities.get(idx).cloned()
    }

    fn identities(&self, min: usize, max: usize) -> Option<Vec<Identity<P>>> {
        if min >= max {
            return None;
        }
        self.identities.get(min..max).map(<[Identity<P>]>::to_vec)
    }
}
