//! Aggregate signatures paired with the bitset of their contributors.

mod signature;
mod verifier;

pub use signature::*;
