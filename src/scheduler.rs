use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;

use crate::types::GhostMode;

#[derive(Clone, Debug)]
struct PendingTimer<K, A> {
    key: K,
    fire_at: u64,
    action: A,
}

/// Deferred single-shot callbacks, one pending timer per key.
///
/// Scheduling a key that is already pending replaces it. Cancelled entries stay in the heap
/// and are skipped when they surface.
#[derive(Clone, Debug)]
pub struct Scheduler<K, A> {
    queue: BinaryHeap<Reverse<(u64, u64)>>,
    pending: HashMap<u64, PendingTimer<K, A>>,
    by_key: HashMap<K, u64>,
    next_seq: u64,
}

impl<K, A> Default for Scheduler<K, A>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, A> Scheduler<K, A>
where
    K: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            pending: HashMap::new(),
            by_key: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, key: K, fire_at: u64, action: A) {
        self.cancel(&key);
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.queue.push(Reverse((fire_at, seq)));
        self.pending.insert(
            seq,
            PendingTimer {
                key,
                fire_at,
                action,
            },
        );
        self.by_key.insert(key, seq);
    }

    pub fn cancel(&mut self, key: &K) -> bool {
        match self.by_key.remove(key) {
            Some(seq) => self.pending.remove(&seq).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn remaining(&self, key: &K, now_ms: u64) -> Option<u64> {
        let seq = self.by_key.get(key)?;
        self.pending
            .get(seq)
            .map(|timer| timer.fire_at.saturating_sub(now_ms))
    }

    /// Pops the earliest timer due at `now_ms`; ties fire in scheduling order.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(K, A)> {
        while let Some(Reverse((fire_at, seq))) = self.queue.peek().copied() {
            if !self.pending.contains_key(&seq) {
                self.queue.pop();
                continue;
            }
            if fire_at > now_ms {
                return None;
            }
            self.queue.pop();
            let timer = self.pending.remove(&seq)?;
            if self.by_key.get(&timer.key) == Some(&seq) {
                self.by_key.remove(&timer.key);
            }
            return Some((timer.key, timer.action));
        }
        None
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.pending.clear();
        self.by_key.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Timer purposes inside one match; each key has at most one pending timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKey {
    GhostMode(usize),
    GhostFlash(usize),
    PacmanReset,
    GhostMultiplierReset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerAction {
    ExpireMode { ghost_id: usize, mode: GhostMode },
    FlashFrightened { ghost_id: usize },
    ResetState,
    ResetGhostMultiplier,
}

pub type MatchTimers = Scheduler<TimerKey, TimerAction>;
