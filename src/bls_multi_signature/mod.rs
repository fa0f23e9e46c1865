//! BLS12-381 multi-signatures in the "minimal signature size" setting:
//! signatures live in G1, verification keys in G2.

mod signature;
mod signing_key;
mod verification_key;

pub use signature::*;
pub use signing_key::*;
pub use verification_key::*;

use rand_core::{CryptoRng, RngCore};

use crate::error::SchemeError;
use crate::scheme::SignatureScheme;

/// Domain separation tag of the hash-to-curve used when signing.
pub const BLS_DST: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_";

/// `SignatureScheme` backed by a BLS signing key.
#[derive(Debug, Clone)]
pub struct BlsScheme {
    sk: BlsSigningKey,
    vk: BlsVerificationKey,
}

impl BlsScheme {
    /// Create a scheme over a fresh signing key.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, SchemeError> {
        Ok(Self::from(BlsSigningKey::generate(rng)?))
    }

    /// Verification key to register for this node.
    pub fn verification_key(&self) -> BlsVerificationKey {
        self.vk
    }
}

impl From<BlsSigningKey> for BlsScheme {
    fn from(sk: BlsSigningKey) -> Self {
        let vk = BlsVerificationKey::from(&sk);
        Self { sk, vk }
    }
}

impl SignatureScheme for BlsScheme {
    type Signature = BlsSignature;
    type PublicKey = BlsVerificationKey;

    fn sign(&self, msg: &[u8]) -> Result<BlsSignature, SchemeError> {
        Ok(self.sk.sign(msg))
    }

    fn public_key(&self) -> BlsVerificationKey {
        self.vk
    }
}
