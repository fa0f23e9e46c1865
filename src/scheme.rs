//! Capabilities the aggregation engine needs from a signature scheme.
//!
//! The engine never looks inside keys or signatures: it only signs its own
//! contribution, adds keys and signatures together, and verifies an aggregate
//! signature against an aggregate key.
use std::fmt::Debug;

use crate::error::SchemeError;

/// Signature that can be aggregated with other signatures on the same message.
pub trait Signature: Clone + PartialEq + Debug + Send + Sync + Sized {
    /// Aggregate `self` with `other`.
    fn combine(&self, other: &Self) -> Self;

    /// Canonical byte representation.
    fn to_bytes(&self) -> Vec<u8>;

    /// Parse a signature, rejecting bytes that are not a valid encoding.
    fn from_bytes(bytes: &[u8]) -> Result<Self, SchemeError>;
}

/// Public key that can be aggregated with other public keys.
pub trait PublicKey: Clone + PartialEq + Debug + Send + Sync {
    type Signature: Signature;

    /// Aggregate `self` with `other`.
    fn combine(&self, other: &Self) -> Self;

    /// Check that `sig` is a valid signature of `msg` under this key.
    fn verify_signature(&self, msg: &[u8], sig: &Self::Signature) -> Result<(), SchemeError>;
}

/// Signing side of a scheme, bound to the secret key of one node.
pub trait SignatureScheme: Send + Sync {
    type Signature: Signature;
    type PublicKey: PublicKey<Signature = Self::Signature>;

    /// Sign `msg` with the node's secret key.
    fn sign(&self, msg: &[u8]) -> Result<Self::Signature, SchemeError>;

    /// Public key matching the node's secret key.
    fn public_key(&self) -> Self::PublicKey;
}

/// Aggregate a non-empty sequence of public keys.
pub fn aggregate_keys<'a, P, I>(keys: I) -> Result<P, SchemeError>
where
    P: PublicKey + 'a,
    I: IntoIterator<Item = &'a P>,
{
    let mut keys = keys.into_iter();
    let first = keys.next().ok_or(SchemeError::EmptyAggregate)?.clone();
    Ok(keys.fold(first, |acc, key| acc.combine(key)))
}

/// Aggregate a non-empty sequence of signatures.
pub fn aggregate_signatures<'a, S, I>(sigs: I) -> Result<S, SchemeError>
where
    S: Signature + 'a,
    I: IntoIterator<Item = &'a S>,
{
    let mut sigs = sigs.into_iter();
    let first = sigs.next().ok_or(SchemeError::EmptyAggregate)?.clone();
    Ok(sigs.fold(first, |acc, sig| acc.combine(sig)))
}
