//! Per-slot caches of forward, backward and Viterbi tables.
//! There are `W` slots and the dimension `dim` always lives in the slot `dim % W`.
//! A slot keeps at most one dimension; asking for another one recomputes and re-tags it.
use std::sync::{Mutex, MutexGuard};

/// Identifies which parameters and which sequence produced a table.
/// Generations are unique over the whole process, so a model can never
/// mistake a table written by another model (or by itself before `invalidate`) as its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Stamp {
    pub generation: u64,
    pub dim: usize,
}

/// Dense (time x state) table of log-probabilities, indexed by `t * states + state`.
#[derive(Debug, Clone, Default)]
pub(crate) struct DPTable {
    stamp: Option<Stamp>,
    states: usize,
    len: usize,
    data: Vec<f64>,
    total: f64,
}

impl DPTable {
    pub fn is_valid_for(&self, stamp: Stamp) -> bool {
        self.stamp == Some(stamp)
    }
    // Drop the stamp and shape the table as `len` x `states`.
    pub fn reset(&mut self, len: usize, states: usize) {
        self.stamp = None;
        self.states = states;
        self.len = len;
        self.data.clear();
        self.data.resize(len * states, f64::NEG_INFINITY);
        self.total = f64::NEG_INFINITY;
    }
    pub fn finish(&mut self, stamp: Stamp, total: f64) {
        self.stamp = Some(stamp);
        self.total = total;
    }
    pub fn total(&self) -> f64 {
        self.total
    }
    pub fn len(&self) -> usize {
        self.len
    }
    #[cfg(test)]
    pub fn row(&self, t: usize) -> &[f64] {
        &self.data[t * self.states..(t + 1) * self.states]
    }
}

impl std::ops::Index<(usize, usize)> for DPTable {
    type Output = f64;
    fn index(&self, (t, state): (usize, usize)) -> &Self::Output {
        debug_assert!(t < self.len && state < self.states, "{},{}", t, state);
        &self.data[t * self.states + state]
    }
}

impl std::ops::IndexMut<(usize, usize)> for DPTable {
    fn index_mut(&mut self, (t, state): (usize, usize)) -> &mut Self::Output {
        debug_assert!(t < self.len && state < self.states, "{},{}", t, state);
        &mut self.data[t * self.states + state]
    }
}

/// Viterbi back-pointers and the decoded path.
#[derive(Debug, Clone, Default)]
pub(crate) struct PathTable {
    stamp: Option<Stamp>,
    states: usize,
    psi: Vec<usize>,
    path: Vec<usize>,
    prob: f64,
}

impl PathTable {
    pub fn is_valid_for(&self, stamp: Stamp) -> bool {
        self.stamp == Some(stamp)
    }
    pub fn reset(&mut self, len: usize, states: usize) {
        self.stamp = None;
        self.states = states;
        self.psi.clear();
        self.psi.resize(len * states, 0);
        self.path.clear();
        self.path.resize(len, 0);
        self.prob = f64::NEG_INFINITY;
    }
    pub fn finish(&mut self, stamp: Stamp, prob: f64) {
        self.stamp = Some(stamp);
        self.prob = prob;
    }
    pub fn set_psi(&mut self, t: usize, state: usize, from: usize) {
        self.psi[t * self.states + state] = from;
    }
    pub fn path(&self) -> &[usize] {
        &self.path
    }
    // Walk the back-pointers from `last`, the state at the final time step.
    pub fn trace_back(&mut self, last: usize) {
        let len = self.path.len();
        if len == 0 {
            return;
        }
        let mut state = last;
        self.path[len - 1] = state;
        for t in (1..len).rev() {
            state = self.psi[t * self.states + state];
            self.path[t - 1] = state;
        }
    }
    pub fn prob(&self) -> f64 {
        self.prob
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Slot {
    pub forward: DPTable,
    pub backward: DPTable,
    pub viterbi: PathTable,
}

/// `W` cache slots. Two models may hold the same `CacheSet` through an `Arc`.
#[derive(Debug)]
pub struct CacheSet {
    slots: Vec<Mutex<Slot>>,
}

impl CacheSet {
    pub fn new(workers: usize) -> Self {
        let slots = (0..workers.max(1))
            .map(|_| Mutex::new(Slot::default()))
            .collect();
        Self { slots }
    }
    pub fn workers(&self) -> usize {
        self.slots.len()
    }
    pub fn slot(&self, dim: usize) -> usize {
        dim % self.slots.len()
    }
    pub(crate) fn lock(&self, dim: usize) -> MutexGuard<'_, Slot> {
        // Stamps decide validity, so a poisoned slot is still usable.
        self.slots[self.slot(dim)]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Either a locked cache slot or a private scratch slot when caching is disabled.
pub(crate) enum SlotRef<'a> {
    Cached(MutexGuard<'a, Slot>),
    Scratch(Box<Slot>),
}

impl<'a> std::ops::Deref for SlotRef<'a> {
    type Target = Slot;
    fn deref(&self) -> &Slot {
        match self {
            SlotRef::Cached(guard) => &**guard,
            SlotRef::Scratch(slot) => &**slot,
        }
    }
}

impl<'a> std::ops::DerefMut for SlotRef<'a> {
    fn deref_mut(&mut self) -> &mut Slot {
        match self {
            SlotRef::Cached(guard) => &mut **guard,
            SlotRef::Scratch(slot) => &mut **slot,
        }
    }
}
