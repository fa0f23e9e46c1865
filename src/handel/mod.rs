//! The Handel aggregation engine.
//!
//! A node keeps, for every level of its candidate tree, the best verified
//! multi-signature of that level's range. At level `l` it sends to the
//! candidates of `l` its own signature aggregated with everything it learnt
//! at lower levels. Incoming multi-signatures are verified outside of the
//! engine lock; only the final "store if still better" step is serialized.

mod config;
mod store;

pub use config::Config;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::bitset::MAX_BITSET_LENGTH;
use crate::candidate_tree::CandidateTree;
use crate::error::{HandelError, MultiSignatureError};
use crate::multi_signature::MultiSignature;
use crate::network::{Listener, Network, Packet};
use crate::registry::Registry;
use crate::scheme::SignatureScheme;
use store::LevelStore;

/// Packets waiting to be handed to the network once the lock is released.
type Outbox = Vec<(Vec<u32>, Packet)>;

/// Receiving end of the final multi-signature of a run.
pub type FinalSignature<S> = mpsc::UnboundedReceiver<MultiSignature<S>>;

/// Mutable state of a run, only touched while holding the engine lock.
struct State<S> {
    store: LevelStore<S>,
    /// Highest level started. `max_level + 1` once every level is started.
    level: usize,
    level_started: Instant,
    /// Next candidate to contact, per level.
    cursors: Vec<usize>,
    done: bool,
}

/// Handel is the principal struct that performs the large scale
/// multi-signature aggregation protocol for one message. Handel is
/// thread-safe: packets may be fed from any number of threads.
pub struct Handel<S: SignatureScheme, R> {
    config: Config,
    net: Arc<dyn Network>,
    reg: R,
    scheme: S,
    msg: Vec<u8>,
    id: u32,
    tree: CandidateTree,
    /// Candidates of each level in contact order, empty for empty levels.
    candidates: Vec<Vec<u32>>,
    threshold: usize,
    state: Mutex<State<S::Signature>>,
    out: mpsc::UnboundedSender<MultiSignature<S::Signature>>,
    /// Whether the update loop was spawned.
    started: AtomicBool,
    stop: watch::Sender<bool>,
}

impl<S, R> Handel<S, R>
where
    S: SignatureScheme,
    R: Registry<PublicKey = S::PublicKey>,
{
    /// Create the engine of node `id` multi-signing `msg`.
    ///
    /// Returns the engine together with the channel on which the final
    /// multi-signature, covering at least `config.contributions` nodes, is
    /// delivered once.
    ///
    /// # Error
    /// Fails when the registry is too large for the wire format, when `id` is
    /// not registered, when the config is invalid, or when the scheme cannot
    /// sign `msg`.
    pub fn new(
        net: Arc<dyn Network>,
        reg: R,
        id: u32,
        scheme: S,
        msg: Vec<u8>,
        config: Config,
    ) -> Result<(Self, FinalSignature<S::Signature>), HandelError> {
        let size = reg.size();
        if size > MAX_BITSET_LENGTH {
            return Err(HandelError::RegistryTooLarge(size));
        }
        if id as usize >= size {
            return Err(HandelError::OwnIdOutOfRange {
                id: id as usize,
                size,
            });
        }
        config.validate(size)?;

        let own = scheme.sign(&msg).map_err(HandelError::OwnSignature)?;
        let tree = CandidateTree::new(id as usize, size);
        let candidates = (0..=tree.max_level())
            .map(|level| {
                tree.candidates_at(level)
                    .map(|peers| peers.into_iter().map(|peer| peer as u32).collect())
                    .unwrap_or_default()
            })
            .collect();
        let state = State {
            store: LevelStore::new(tree, own),
            level: 1,
            level_started: Instant::now(),
            cursors: vec![0; tree.max_level() + 1],
            done: false,
        };
        let (out, final_signature) = mpsc::unbounded_channel();
        let (stop, _) = watch::channel(false);

        let handel = Self {
            threshold: config.threshold(size),
            config,
            net,
            reg,
            scheme,
            msg,
            id,
            tree,
            candidates,
            state: Mutex::new(state),
            out,
            started: AtomicBool::new(false),
            stop,
        };

        {
            let mut state = handel.lock()?;
            handel.progress(&mut state, Instant::now());
            handel.check_completion(&mut state);
        }
        Ok((handel, final_signature))
    }

    /// Index of this node.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn scheme(&self) -> &S {
        &self.scheme
    }

    /// Highest level started so far.
    pub fn level(&self) -> Result<usize, HandelError> {
        Ok(self.lock()?.level)
    }

    /// Best verified multi-signature known for `level`.
    pub fn best(
        &self,
        level: usize,
    ) -> Result<Option<MultiSignature<S::Signature>>, HandelError> {
        Ok(self.lock()?.store.best(level).cloned())
    }

    /// Aggregate over every contribution known so far, indexed over the whole
    /// registry.
    pub fn current_aggregate(&self) -> Result<MultiSignature<S::Signature>, HandelError> {
        Ok(self.lock()?.store.global())
    }

    /// Decode, validate and verify a packet, then store its multi-signature
    /// if it improves the packet's level.
    ///
    /// On error the engine state is left unchanged.
    pub fn process_packet(&self, packet: &Packet) -> Result<(), HandelError> {
        let (level, min, max, ms) = self.parse_packet(packet)?;

        // skip the verification of packets that are already superseded
        if !self.lock()?.store.improves(level, &ms) {
            return Err(HandelError::Stale(level));
        }

        self.verify_multi_signature(&ms, min, max)?;

        let mut outbox = Outbox::new();
        {
            let mut state = self.lock()?;
            if !state.store.insert(level, ms) {
                return Err(HandelError::Stale(level));
            }
            debug!(
                id = self.id,
                origin = packet.origin,
                level,
                contributions = state.store.best(level).map_or(0, |ms| ms.cardinality()),
                "handel: level improved"
            );

            for started in self.progress(&mut state, Instant::now()) {
                outbox.extend(self.next_packet(&mut state, started)?);
            }
            self.check_completion(&mut state);
        }
        self.dispatch(outbox);
        Ok(())
    }

    /// Run one round: start the levels whose predecessor completed or timed
    /// out, then send the current aggregate of every started level to its
    /// next candidates.
    pub fn update(&self) -> Result<(), HandelError> {
        let mut outbox = Outbox::new();
        {
            let mut state = self.lock()?;
            self.progress(&mut state, Instant::now());
            self.check_completion(&mut state);

            let started = state.level.min(self.tree.max_level());
            for level in 1..=started {
                outbox.extend(self.next_packet(&mut state, level)?);
            }
        }
        self.dispatch(outbox);
        Ok(())
    }

    /// Start sending updates every `config.update_period` until `stop` is
    /// called.
    ///
    /// Only one update loop runs per engine: returns `None` when it was
    /// already started.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>>
    where
        S: 'static,
        R: 'static,
    {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!(id = self.id, "handel: already started");
            return None;
        }
        let handel = Arc::clone(self);
        let mut stop = self.stop.subscribe();
        Some(tokio::spawn(async move {
            if *stop.borrow() {
                return;
            }
            info!(id = handel.id, size = handel.tree.size(), "handel: starting");
            let mut ticker = tokio::time::interval(handel.config.update_period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match handel.update() {
                            Ok(()) => {}
                            Err(HandelError::LockPoisoned) => {
                                warn!(id = handel.id, "handel: engine lock poisoned, stopping");
                                break;
                            }
                            Err(e) => warn!(id = handel.id, error = %e, "handel: update failed"),
                        }
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }
            info!(id = handel.id, "handel: stopped");
        }))
    }

    /// Stop the periodic updates. Packets are still accepted afterwards.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    fn lock(&self) -> Result<MutexGuard<'_, State<S::Signature>>, HandelError> {
        self.state.lock().map_err(|_| HandelError::LockPoisoned)
    }

    /// Structural and range checks of a packet, which do not need the lock.
    fn parse_packet(
        &self,
        packet: &Packet,
    ) -> Result<(usize, usize, usize, MultiSignature<S::Signature>), HandelError> {
        let size = self.tree.size();
        if packet.origin as usize >= size {
            return Err(HandelError::OriginOutOfRange {
                origin: packet.origin,
                size,
            });
        }

        let level = packet.level as usize;
        if level == 0 || level > self.tree.max_level() {
            return Err(HandelError::LevelOutOfRange {
                level: packet.level,
                max: self.tree.max_level(),
            });
        }

        let (min, max) = self.tree.range_at(level)?;
        if !(min..max).contains(&(packet.origin as usize)) {
            return Err(HandelError::OriginNotInRange {
                origin: packet.origin,
                min,
                max,
            });
        }

        let ms = MultiSignature::from_bytes(&packet.multi_sig, max - min).map_err(|e| match e {
            MultiSignatureError::InconsistentLength { .. } => HandelError::InconsistentBitSet,
            e => HandelError::Decode(e),
        })?;
        if ms.cardinality() == 0 {
            return Err(HandelError::EmptyMultiSignature);
        }
        Ok((level, min, max, ms))
    }

    /// Check the signature against the aggregate key of the contributors
    /// flagged in the bitset.
    fn verify_multi_signature(
        &self,
        ms: &MultiSignature<S::Signature>,
        min: usize,
        max: usize,
    ) -> Result<(), HandelError> {
        let identities = self
            .reg
            .identities(min, max)
            .ok_or(HandelError::UnknownIdentities { min, max })?;
        ms.verify(&self.msg, &identities).map_err(|e| match e {
            MultiSignatureError::Scheme(e) => HandelError::Verification(e),
            MultiSignatureError::InconsistentLength { .. } => {
                HandelError::UnknownIdentities { min, max }
            }
            e => HandelError::Decode(e),
        })
    }

    /// Start every level whose predecessor is complete, and the current one
    /// if it timed out. Returns the levels started.
    fn progress(&self, state: &mut State<S::Signature>, now: Instant) -> Vec<usize> {
        let mut started = Vec::new();
        while state.level <= self.tree.max_level() {
            let complete = state.store.is_complete(state.level);
            if !complete && now.duration_since(state.level_started) < self.config.level_timeout {
                break;
            }
            if !complete {
                debug!(id = self.id, level = state.level, "handel: level timed out");
            }
            state.level += 1;
            state.level_started = now;
            started.push(state.level);
            trace!(id = self.id, level = state.level, "handel: level started");
        }
        started
    }

    /// Emit the final multi-signature the first time it reaches the threshold.
    fn check_completion(&self, state: &mut State<S::Signature>) {
        if state.done {
            return;
        }
        let aggregate = state.store.global();
        if aggregate.cardinality() < self.threshold {
            return;
        }
        state.done = true;
        info!(
            id = self.id,
            contributions = aggregate.cardinality(),
            "handel: final multi-signature reached"
        );
        if self.out.send(aggregate).is_err() {
            debug!(id = self.id, "handel: final multi-signature receiver dropped");
        }
    }

    /// Packet carrying this node's aggregate for `level`, addressed to the
    /// next `candidate_count` candidates of the level.
    fn next_packet(
        &self,
        state: &mut State<S::Signature>,
        level: usize,
    ) -> Result<Option<(Vec<u32>, Packet)>, HandelError> {
        let candidates = match self.candidates.get(level) {
            Some(candidates) if !candidates.is_empty() => candidates,
            _ => return Ok(None),
        };
        let count = self.config.candidate_count.min(candidates.len());
        let cursor = state.cursors[level];
        let targets = (0..count)
            .map(|i| candidates[(cursor + i) % candidates.len()])
            .collect();
        state.cursors[level] = (cursor + count) % candidates.len();

        let multi_sig = state
            .store
            .outgoing(level)
            .to_bytes()
            .map_err(HandelError::Encode)?;
        let packet = Packet {
            origin: self.id,
            // levels are bounded by log2 of a registry addressable with 16 bits
            level: level as u8,
            multi_sig,
        };
        Ok(Some((targets, packet)))
    }

    fn dispatch(&self, outbox: Outbox) {
        for (targets, packet) in outbox {
            trace!(id = self.id, level = packet.level, ?targets, "handel: sending");
            self.net.send(&targets, &packet);
        }
    }
}

impl<S, R> Listener for Handel<S, R>
where
    S: SignatureScheme,
    R: Registry<PublicKey = S::PublicKey>,
{
    fn new_packet(&self, packet: &Packet) {
        match self.process_packet(packet) {
            Ok(()) => {}
            Err(HandelError::Stale(level)) => {
                trace!(id = self.id, origin = packet.origin, level, "handel: packet superseded");
            }
            Err(e @ (HandelError::Verification(_) | HandelError::UnknownIdentities { .. })) => {
                warn!(
                    id = self.id,
                    origin = packet.origin,
                    level = packet.level,
                    error = %e,
                    "handel: packet rejected"
                );
            }
            Err(e) => {
                debug!(
                    id = self.id,
                    origin = packet.origin,
                    level = packet.level,
                    error = %e,
                    "handel: packet rejected"
                );
            }
        }
    }
}
