use blst::min_sig::SecretKey as BlstSk;
use rand_core::{CryptoRng, RngCore};

use crate::bls_multi_signature::{BLS_DST, BlsSignature};
use crate::error::{SchemeError, blst_err_to_scheme};

/// Size in bytes of a serialized signing key.
pub const BLS_SK_SIZE: usize = 32;

/// MultiSig secret key, which is a wrapper over the BlstSk type from the blst
/// library.
#[derive(Debug, Clone)]
pub struct BlsSigningKey(pub(crate) BlstSk);

impl BlsSigningKey {
    /// Generate a secret key from 32 bytes of key material drawn from `rng`.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, SchemeError> {
        let mut ikm = [0u8; 32];
        rng.fill_bytes(&mut ikm);
        BlstSk::key_gen(&ikm, &[])
            .map(Self)
            .map_err(|_| SchemeError::KeyGeneration)
    }

    /// Sign a message with the given secret key.
    pub fn sign(&self, msg: &[u8]) -> BlsSignature {
        BlsSignature(self.0.sign(msg, BLS_DST, &[]))
    }

    /// Convert the secret key into byte string.
    pub fn to_bytes(&self) -> [u8; BLS_SK_SIZE] {
        self.0.to_bytes()
    }

    /// Convert a string of bytes into a `BlsSigningKey`.
    ///
    /// # Error
    /// Fails if the byte string represents a scalar larger than the group order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SchemeError> {
        let bytes = bytes
            .get(..BLS_SK_SIZE)
            .ok_or(SchemeError::SerializationError)?;
        match BlstSk::from_bytes(bytes) {
            Ok(sk) => Ok(Self(sk)),
            Err(e) => Err(blst_err_to_scheme(e)
                .err()
                .unwrap_or(SchemeError::SerializationError)),
        }
    }
}
