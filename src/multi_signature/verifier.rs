use crate::error::MultiSignatureError;
use crate::multi_signature::MultiSignature;
use crate::registry::Identity;
use crate::scheme::{PublicKey, Signature, aggregate_keys};

impl<S: Signature> MultiSignature<S> {
    /// Verify the multi-signature on `msg` against the identities of its range.
    ///
    /// The aggregate key is the sum of the keys of the identities whose bit is
    /// set; `identities` must list the whole range in order.
    pub fn verify<P>(
        &self,
        msg: &[u8],
        identities: &[Identity<P>],
    ) -> Result<(), MultiSignatureError>
    where
        P: PublicKey<Signature = S>,
    {
        if identities.len() != self.bitset.bit_length() {
            return Err(MultiSignatureError::InconsistentLength {
                expected: identities.len(),
                got: self.bitset.bit_length(),
            });
        }

        let aggregate_key: P =
            aggregate_keys(self.bitset.ones().map(|i| identities[i].public_key()))?;
        aggregate_key
            .verify_signature(msg, &self.signature)
            .map_err(MultiSignatureError::Scheme)
    }
}
