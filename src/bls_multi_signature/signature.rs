use std::fmt;

use blst::min_sig::{AggregateSignature, Signature as BlstSig};

use crate::bls_multi_signature::BlsVerificationKey;
use crate::error::{SchemeError, blst_err_to_scheme};
use crate::scheme::{PublicKey, Signature};

/// MultiSig signature, which is a wrapper over the `BlstSig` type.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BlsSignature(pub(crate) BlstSig);

/// Size in bytes of a compressed signature.
pub const BLS_SIG_SIZE: usize = 48;

impl BlsSignature {
    /// Verify a signature against a verification key.
    pub fn verify(&self, msg: &[u8], mvk: &BlsVerificationKey) -> Result<(), SchemeError> {
        mvk.verify_signature(msg, self)
    }

    /// Convert an `Signature` to its compressed byte representation.
    pub fn to_bytes(self) -> [u8; BLS_SIG_SIZE] {
        self.0.to_bytes()
    }

    /// Convert a string of bytes into a `BlsSignature`.
    ///
    /// # Error
    /// Returns an error if the byte string does not represent a point of the
    /// prime order subgroup, or represents the point at infinity.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SchemeError> {
        if bytes.len() != BLS_SIG_SIZE {
            return Err(SchemeError::SerializationError);
        }
        match BlstSig::sig_validate(bytes, true) {
            Ok(sig) => Ok(Self(sig)),
            Err(e) => Err(blst_err_to_scheme(e)
                .err()
                .unwrap_or(SchemeError::SerializationError)),
        }
    }

    /// Sum of two signatures.
    pub fn add(&self, other: &BlsSignature) -> BlsSignature {
        let mut aggregate = AggregateSignature::from_signature(&self.0);
        aggregate.add_aggregate(&AggregateSignature::from_signature(&other.0));
        BlsSignature(aggregate.to_signature())
    }
}

impl Signature for BlsSignature {
    fn combine(&self, other: &Self) -> Self {
        self.add(other)
    }

    fn to_bytes(&self) -> Vec<u8> {
        BlsSignature::to_bytes(*self).to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, SchemeError> {
        BlsSignature::from_bytes(bytes)
    }
}

impl fmt::Debug for BlsSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlsSignature(")?;
        for byte in &self.to_bytes()[..8] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}
