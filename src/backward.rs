//! Backward algorithm.
//! backward(t, i) = ln Pr{O_{t+1}..O_{T-1} | state_t = i}, with the end distribution folded in at T-1.
use crate::cache::DPTable;
use crate::logspace::log_add;
use crate::model::Model;

impl Model {
    /// ln Pr{O_{t+1}..O_{T-1} | state_t = state} for `0 <= t`, or the total log-likelihood when `t < 0`.
    /// # Panics
    /// If `0 <= t` reaches past the end of a non-empty sequence.
    pub fn backward(&self, t: isize, state: usize, dim: usize) -> f64 {
        if !self.use_cache() {
            return self.backward_uncached(t, state, dim);
        }
        let mut slot = self.slot(dim);
        self.fill_backward(&mut slot.backward, dim);
        let len = slot.backward.len();
        if t < 0 || len == 0 {
            slot.backward.total()
        } else {
            assert!((t as usize) < len, "backward at {} of a length {} sequence", t, len);
            slot.backward[(t as usize, state)]
        }
    }
    pub(crate) fn fill_backward(&self, table: &mut DPTable, dim: usize) {
        let stamp = self.stamp(dim);
        if table.is_valid_for(stamp) {
            return;
        }
        let obs = self.observation_set();
        let (len, states) = (obs.len(dim), self.states());
        table.reset(len, states);
        if len == 0 {
            table.finish(stamp, f64::NEG_INFINITY);
            return;
        }
        // Initialize.
        for i in 0..states {
            table[(len - 1, i)] = self.terminal(i);
        }
        // Recursion.
        for t in (0..len - 1).rev() {
            let x = obs.symbol(dim, t + 1);
            for i in 0..states {
                let mut sum = f64::NEG_INFINITY;
                for j in 0..states {
                    let lk = self.transition(i, j) + self.emission(j, x) + table[(t + 1, j)];
                    sum = log_add(sum, lk);
                }
                table[(t, i)] = sum;
            }
        }
        let x = obs.symbol(dim, 0);
        let total = (0..states).fold(f64::NEG_INFINITY, |acc, i| {
            log_add(acc, self.initial(i) + self.emission(i, x) + table[(0, i)])
        });
        trace!("BWD\t{}\t{:.4}", dim, total);
        table.finish(stamp, total);
    }
    fn backward_uncached(&self, t: isize, state: usize, dim: usize) -> f64 {
        let obs = self.observation_set();
        let (len, states) = (obs.len(dim), self.states());
        if len == 0 {
            return f64::NEG_INFINITY;
        }
        assert!(t < len as isize, "backward at {} of a length {} sequence", t, len);
        let mut next: Vec<f64> = (0..states).map(|i| self.terminal(i)).collect();
        let mut current = vec![f64::NEG_INFINITY; states];
        let first = t.max(0) as usize;
        for s in (first..len - 1).rev() {
            let x = obs.symbol(dim, s + 1);
            for (i, cell) in current.iter_mut().enumerate() {
                *cell = next
                    .iter()
                    .enumerate()
                    .fold(f64::NEG_INFINITY, |acc, (j, &b)| {
                        log_add(acc, self.transition(i, j) + self.emission(j, x) + b)
                    });
            }
            std::mem::swap(&mut next, &mut current);
        }
        if 0 <= t {
            next[state]
        } else {
            let x = obs.symbol(dim, 0);
            next.iter()
                .enumerate()
                .fold(f64::NEG_INFINITY, |acc, (i, &b)| {
                    log_add(acc, self.initial(i) + self.emission(i, x) + b)
                })
        }
    }
}
