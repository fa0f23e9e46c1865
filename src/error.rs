//! Crate specific errors
use blst::BLST_ERROR;

/// Errors raised while decoding or combining bit vectors.
#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum BitSetError {
    /// The buffer is shorter than the declared length
    #[error("Bitset buffer shorter than its declared length")]
    Truncated,

    /// Bytes remain after the declared length
    #[error("Trailing bytes after bitset")]
    TrailingBytes,

    /// Unused bits of the last byte are not zero
    #[error("Bitset padding bits are not zero")]
    NonCanonicalPadding,

    /// The length does not fit the 2-byte prefix
    #[error("Bitset of length {0} cannot be encoded")]
    LengthOverflow(usize),

    /// Operation on two bitsets of different lengths
    #[error("Bitset lengths differ: {0} and {1}")]
    LengthMismatch(usize, usize),
}

/// Errors raised by the candidate tree.
#[derive(Debug, Clone, Copy, thiserror::Error, Eq, PartialEq)]
pub enum TreeError {
    /// The level is zero or above the top level of the tree
    #[error("Level {level} out of range, levels are 1..={max}")]
    LevelOutOfRange { level: usize, max: usize },

    /// The level's candidate range lies outside of the registry
    #[error("Level {0} holds no candidate")]
    EmptyLevel(usize),
}

/// Error types of a signature scheme.
#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum SchemeError {
    /// A signature does not verify
    #[error("Invalid signature")]
    SignatureInvalid,

    /// This error occurs when the the serialization of the raw bytes failed
    #[error("Invalid bytes")]
    SerializationError,

    /// A key or signature is the point at infinity
    #[error("Point at infinity")]
    Infinity,

    /// Key material could not be derived
    #[error("Key generation failed")]
    KeyGeneration,

    /// Nothing to aggregate
    #[error("Empty aggregate")]
    EmptyAggregate,
}

/// Errors which can be output by multi-signature decoding and merging.
#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum MultiSignatureError {
    /// The contributor bitset is malformed
    #[error("Invalid bitset: {0}")]
    BitSet(#[from] BitSetError),

    /// The signature is malformed
    #[error("Invalid signature: {0}")]
    Scheme(#[from] SchemeError),

    /// The bitset length does not match the level's range
    #[error("Bitset of length {got} where {expected} was expected")]
    InconsistentLength { expected: usize, got: usize },

    /// Both aggregates count the same contributor
    #[error("Multi-signatures share contributors")]
    Overlap,
}

/// Errors raised while decoding a wire packet.
#[derive(Debug, Clone, Copy, thiserror::Error, Eq, PartialEq)]
pub enum PacketError {
    /// The buffer ends before the packet does
    #[error("Packet truncated")]
    Truncated,

    /// Bytes remain after the packet
    #[error("Trailing bytes after packet")]
    TrailingBytes,

    /// The multi-signature does not fit the length prefix
    #[error("Multi-signature of {0} bytes cannot be encoded")]
    PayloadOverflow(usize),
}

/// Errors which can be output by the aggregation engine.
#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum HandelError {
    /// The packet's multi-signature cannot be decoded
    #[error("handel: packet decoding failed: {0}")]
    Decode(#[from] MultiSignatureError),

    /// The packet's origin is not a registered index
    #[error("handel: packet's origin {origin} out of range (registry size {size})")]
    OriginOutOfRange { origin: u32, size: usize },

    /// The packet's level is above the top level
    #[error("handel: packet's level {level} out of range (max {max})")]
    LevelOutOfRange { level: u8, max: usize },

    /// The level has no candidate range for this node
    #[error("handel: {0}")]
    Tree(#[from] TreeError),

    /// The origin does not belong to the level's range
    #[error("handel: origin {origin} not corresponding to level's range [{min}, {max})")]
    OriginNotInRange { origin: u32, min: usize, max: usize },

    /// The bitset does not match the level's range
    #[error("handel: inconsistent bitset with given level")]
    InconsistentBitSet,

    /// The multi-signature claims no contributor
    #[error("handel: multi-signature without contributor")]
    EmptyMultiSignature,

    /// The registry cannot resolve the range
    #[error("handel: identities can't be retrieved from range [{min}, {max})")]
    UnknownIdentities { min: usize, max: usize },

    /// The aggregate signature does not verify under the aggregate key
    #[error("handel: {0}")]
    Verification(SchemeError),

    /// A better aggregate for the level is already known
    #[error("handel: multi-signature superseded at level {0}")]
    Stale(usize),

    /// Invalid configuration
    #[error("handel: invalid config: {0}")]
    InvalidConfig(String),

    /// The registry cannot be addressed with the wire format
    #[error("handel: registry of size {0} too large")]
    RegistryTooLarge(usize),

    /// The node's own index is not registered
    #[error("handel: own id {id} out of range (registry size {size})")]
    OwnIdOutOfRange { id: usize, size: usize },

    /// The scheme failed to sign the message for this node
    #[error("handel: own signature failed: {0}")]
    OwnSignature(SchemeError),

    /// An outgoing multi-signature could not be encoded
    #[error("handel: multi-signature encoding failed: {0}")]
    Encode(MultiSignatureError),

    /// A thread panicked while holding the engine lock
    #[error("handel: engine lock poisoned")]
    LockPoisoned,
}

/// Map a `blst` status onto the scheme errors.
pub(crate) fn blst_err_to_scheme(e: BLST_ERROR) -> Result<(), SchemeError> {
    match e {
        BLST_ERROR::BLST_SUCCESS => Ok(()),
        BLST_ERROR::BLST_PK_IS_INFINITY => Err(SchemeError::Infinity),
        BLST_ERROR::BLST_VERIFY_FAIL => Err(SchemeError::SignatureInvalid),
        _ => Err(SchemeError::SerializationError),
    }
}
