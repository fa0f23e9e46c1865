//! Handel: aggregation of multi-signatures among a large set of participants
//! in a logarithmic number of rounds.
//!
//! Every participant signs the same message. A participant organizes its
//! peers as a binary tree and, level after level, exchanges its current
//! aggregate with the peers of the sibling subtree until the aggregate covers
//! enough participants.

mod bitset;
mod bls_multi_signature;
mod candidate_tree;
mod error;
mod handel;
mod multi_signature;
mod network;
mod registry;
mod scheme;

pub use bitset::{BITSET_PREFIX_SIZE, BitSet, MAX_BITSET_LENGTH};
pub use bls_multi_signature::{
    BLS_DST, BlsScheme, BlsSignature, BlsSigningKey, BlsVerificationKey,
};
pub use candidate_tree::{CandidateTree, log2};
pub use error::{
    BitSetError, HandelError, MultiSignatureError, PacketError, SchemeError, TreeError,
};
pub use handel::{Config, FinalSignature, Handel};
pub use multi_signature::MultiSignature;
pub use network::{Listener, Network, PACKET_HEADER_SIZE, Packet};
pub use registry::{ArrayRegistry, Identity, Registry};
pub use scheme::{PublicKey, Signature, SignatureScheme, aggregate_keys, aggregate_signatures};
