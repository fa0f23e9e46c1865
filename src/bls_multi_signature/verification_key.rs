use std::fmt;

use blst::min_sig::{AggregatePublicKey, PublicKey as BlstVk};

use crate::bls_multi_signature::{BLS_DST, BlsSignature, BlsSigningKey};
use crate::error::{SchemeError, blst_err_to_scheme};
use crate::scheme::PublicKey;

/// Size in bytes of a compressed verification key.
pub const BLS_VK_SIZE: usize = 96;

/// MultiSig verification key, which is a wrapper over the BlstVk (element in G2)
/// from the blst library.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BlsVerificationKey(pub(crate) BlstVk);

impl BlsVerificationKey {
    /// Sum of two verification keys.
    pub fn add(&self, other: &BlsVerificationKey) -> BlsVerificationKey {
        let mut aggregate = AggregatePublicKey::from_public_key(&self.0);
        aggregate.add_aggregate(&AggregatePublicKey::from_public_key(&other.0));
        BlsVerificationKey(aggregate.to_public_key())
    }

    /// Convert an `BlsVerificationKey` to its compressed byte representation.
    pub fn to_bytes(self) -> [u8; BLS_VK_SIZE] {
        self.0.to_bytes()
    }

    /// Convert a compressed byte string into a `BlsVerificationKey`.
    ///
    /// # Error
    /// This function fails if the bytes do not represent a compressed point of
    /// the prime order subgroup, or represent the point at infinity.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SchemeError> {
        let bytes = bytes
            .get(..BLS_VK_SIZE)
            .ok_or(SchemeError::SerializationError)?;
        match BlstVk::key_validate(bytes) {
            Ok(vk) => Ok(Self(vk)),
            Err(e) => Err(blst_err_to_scheme(e)
                .err()
                .unwrap_or(SchemeError::SerializationError)),
        }
    }
}

impl From<&BlsSigningKey> for BlsVerificationKey {
    fn from(sk: &BlsSigningKey) -> Self {
        BlsVerificationKey(sk.0.sk_to_pk())
    }
}

impl fmt::Debug for BlsVerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlsVerificationKey(")?;
        for byte in &self.to_bytes()[..8] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

impl PublicKey for BlsVerificationKey {
    type Signature = BlsSignature;

    fn combine(&self, other: &Self) -> Self {
        self.add(other)
    }

    fn verify_signature(&self, msg: &[u8], sig: &BlsSignature) -> Result<(), SchemeError> {
        blst_err_to_scheme(sig.0.verify(true, msg, BLS_DST, &[], &self.0, false))
    }
}
