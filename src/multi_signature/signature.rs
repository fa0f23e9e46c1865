use crate::bitset::BitSet;
use crate::error::MultiSignatureError;
use crate::scheme::Signature;

/// `MultiSignature` pairs an aggregate signature with the bitset of the
/// members of a candidate range that contributed to it.
///
/// Bit `i` refers to the `i`-th index of the range the multi-signature was
/// produced for, not to the global index space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSignature<S> {
    pub signature: S,
    pub bitset: BitSet,
}

impl<S: Signature> MultiSignature<S> {
    pub fn new(signature: S, bitset: BitSet) -> Self {
        Self { signature, bitset }
    }

    /// Multi-signature of a single contributor.
    pub fn single(signature: S) -> Self {
        let mut bitset = BitSet::new(1);
        bitset.set(0, true);
        Self { signature, bitset }
    }

    /// Number of contributors.
    pub fn cardinality(&self) -> usize {
        self.bitset.cardinality()
    }

    /// Merge two multi-signatures of the same range.
    ///
    /// Disjoint contributor sets are added together. When one set contains
    /// the other, the larger multi-signature is returned as is. Any other
    /// overlap is refused since adding it would count a contributor twice.
    pub fn merge(&self, other: &Self) -> Result<Self, MultiSignatureError> {
        if self.bitset.bit_length() != other.bitset.bit_length() {
            return Err(MultiSignatureError::InconsistentLength {
                expected: self.bitset.bit_length(),
                got: other.bitset.bit_length(),
            });
        }
        if self.bitset.is_superset_of(&other.bitset) {
            return Ok(self.clone());
        }
        if other.bitset.is_superset_of(&self.bitset) {
            return Ok(other.clone());
        }
        if self.bitset.intersects(&other.bitset) {
            return Err(MultiSignatureError::Overlap);
        }
        Ok(Self {
            signature: self.signature.combine(&other.signature),
            bitset: self.bitset.or(&other.bitset)?,
        })
    }

    /// Concatenate the multi-signatures of two adjacent ranges into one
    /// multi-signature of their union, `self` covering the lower indices.
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            signature: self.signature.combine(&other.signature),
            bitset: self.bitset.combine(&other.bitset),
        }
    }

    /// Convert a `MultiSignature` into bytes.
    ///
    /// # Layout
    /// * bitset (2-byte length followed by the packed bits)
    /// * signature, as encoded by the scheme
    pub fn to_bytes(&self) -> Result<Vec<u8>, MultiSignatureError> {
        let mut output = self.bitset.to_bytes()?;
        output.extend_from_slice(&self.signature.to_bytes());
        Ok(output)
    }

    /// Extract a `MultiSignature` whose bitset must hold `bitset_length` bits.
    pub fn from_bytes(bytes: &[u8], bitset_length: usize) -> Result<Self, MultiSignatureError> {
        let (bitset, read) = BitSet::read_from(bytes)?;
        if bitset.bit_length() != bitset_length {
            return Err(MultiSignatureError::InconsistentLength {
                expected: bitset_length,
                got: bitset.bit_length(),
            });
        }
        let signature = S::from_bytes(&bytes[read..])?;
        Ok(Self { signature, bitset })
    }
}
