//! Fixed-length bit vector used to record which members of a candidate range
//! contributed to a multi-signature.
use std::fmt;

use crate::error::BitSetError;

/// Largest bit length that fits the 2-byte length prefix of the encoding.
pub const MAX_BITSET_LENGTH: usize = u16::MAX as usize;

/// Size in bytes of the encoded length prefix.
pub const BITSET_PREFIX_SIZE: usize = 2;

/// A fixed-length bit vector.
///
/// Accesses outside `[0, bit_length)` never panic: `get` answers `false` and
/// `set` leaves the vector untouched.
///
/// # Encoding
/// * bit length as a big-endian `u16`
/// * `ceil(bit_length / 8)` bytes, bit `i` stored in byte `i / 8` at position
///   `7 - i % 8` (most significant bit first), unused trailing bits zero
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct BitSet {
    bits: Vec<u8>,
    length: usize,
}

impl BitSet {
    /// Create a zeroed bit vector of the given length.
    pub fn new(length: usize) -> Self {
        Self {
            bits: vec![0u8; length.div_ceil(8)],
            length,
        }
    }

    /// Fixed number of bits of this vector.
    pub fn bit_length(&self) -> usize {
        self.length
    }

    /// Number of bits set to one.
    pub fn cardinality(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Set the bit at `idx`. Out of bound indices are ignored.
    pub fn set(&mut self, idx: usize, status: bool) {
        if !self.in_bound(idx) {
            return;
        }
        let mask = Self::mask(idx);
        if status {
            self.bits[idx / 8] |= mask;
        } else {
            self.bits[idx / 8] &= !mask;
        }
    }

    /// Status of the bit at `idx`, `false` when out of bound.
    pub fn get(&self, idx: usize) -> bool {
        self.in_bound(idx) && self.bits[idx / 8] & Self::mask(idx) != 0
    }

    /// Fresh vector holding bits `[from, to)` of `self`.
    ///
    /// An invalid range returns a copy of `self` unchanged.
    pub fn slice(&self, from: usize, to: usize) -> BitSet {
        if !self.in_bound(from) || to < from || to > self.length {
            return self.clone();
        }
        let mut out = BitSet::new(to - from);
        for i in from..to {
            out.set(i - from, self.get(i));
        }
        out
    }

    /// Concatenation of `self` followed by `other`.
    pub fn combine(&self, other: &BitSet) -> BitSet {
        let mut out = BitSet::new(self.length + other.length);
        for i in self.ones() {
            out.set(i, true);
        }
        for i in other.ones() {
            out.set(self.length + i, true);
        }
        out
    }

    /// Bitwise union of two vectors of the same length.
    pub fn or(&self, other: &BitSet) -> Result<BitSet, BitSetError> {
        self.check_same_length(other)?;
        let bits = self
            .bits
            .iter()
            .zip(other.bits.iter())
            .map(|(a, b)| a | b)
            .collect();
        Ok(BitSet {
            bits,
            length: self.length,
        })
    }

    /// Whether both vectors share at least one set bit.
    pub fn intersects(&self, other: &BitSet) -> bool {
        self.bits
            .iter()
            .zip(other.bits.iter())
            .any(|(a, b)| a & b != 0)
    }

    /// Whether every bit set in `other` is also set in `self`.
    pub fn is_superset_of(&self, other: &BitSet) -> bool {
        self.length == other.length
            && self
                .bits
                .iter()
                .zip(other.bits.iter())
                .all(|(a, b)| a & b == *b)
    }

    /// Whether every bit is set.
    pub fn is_full(&self) -> bool {
        self.cardinality() == self.length
    }

    /// Indices of the bits set to one, in increasing order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.length).filter(|&i| self.get(i))
    }

    /// Size in bytes of the encoding of a vector of `length` bits.
    pub fn encoded_size(length: usize) -> usize {
        BITSET_PREFIX_SIZE + length.div_ceil(8)
    }

    /// Convert a `BitSet` into bytes.
    ///
    /// # Error
    /// Fails when the length does not fit the 2-byte prefix.
    pub fn to_bytes(&self) -> Result<Vec<u8>, BitSetError> {
        let length =
            u16::try_from(self.length).map_err(|_| BitSetError::LengthOverflow(self.length))?;
        let mut output = Vec::with_capacity(Self::encoded_size(self.length));
        output.extend_from_slice(&length.to_be_bytes());
        output.extend_from_slice(&self.bits);
        Ok(output)
    }

    /// Decode a `BitSet` occupying the whole byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<BitSet, BitSetError> {
        let (bitset, read) = Self::read_from(bytes)?;
        if read != bytes.len() {
            return Err(BitSetError::TrailingBytes);
        }
        Ok(bitset)
    }

    /// Decode a `BitSet` from the start of `bytes`, returning it together
    /// with the number of bytes consumed.
    pub(crate) fn read_from(bytes: &[u8]) -> Result<(BitSet, usize), BitSetError> {
        let prefix = bytes
            .get(..BITSET_PREFIX_SIZE)
            .ok_or(BitSetError::Truncated)?;
        let length = u16::from_be_bytes([prefix[0], prefix[1]]) as usize;
        let end = Self::encoded_size(length);
        let bits = bytes
            .get(BITSET_PREFIX_SIZE..end)
            .ok_or(BitSetError::Truncated)?
            .to_vec();

        // padding bits of the last byte must be zero so that equal sets
        // always share one encoding
        if length % 8 != 0 {
            let padding = 0xffu8 >> (length % 8);
            if bits.last().is_some_and(|last| last & padding != 0) {
                return Err(BitSetError::NonCanonicalPadding);
            }
        }

        Ok((BitSet { bits, length }, end))
    }

    fn in_bound(&self, idx: usize) -> bool {
        idx < self.length
    }

    fn mask(idx: usize) -> u8 {
        0x80 >> (idx % 8)
    }

    fn check_same_length(&self, other: &BitSet) -> Result<(), BitSetError> {
        if self.length != other.length {
            return Err(BitSetError::LengthMismatch(self.length, other.length));
        }
        Ok(())
    }
}

impl fmt::Display for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.length {
            f.write_str(if self.get(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitSet({}: {})", self.length, self)
    }
}
