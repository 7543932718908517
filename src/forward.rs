//! Forward algorithm.
//! forward(t, i) = ln Pr{O_0..O_t, state_t = i}.
use crate::cache::DPTable;
use crate::logspace::log_add;
use crate::model::Model;

impl Model {
    /// ln Pr{O_0..O_t, state_t = state} for `t < len(dim)`, or the total log-likelihood
    /// ln Pr{O} when `t >= len(dim)`.
    pub fn forward(&self, t: usize, state: usize, dim: usize) -> f64 {
        if !self.use_cache() {
            return self.forward_uncached(t, state, dim);
        }
        let mut slot = self.slot(dim);
        self.fill_forward(&mut slot.forward, dim);
        if slot.forward.len() <= t {
            slot.forward.total()
        } else {
            slot.forward[(t, state)]
        }
    }
    /// Log-likelihood of the `dim`-th sequence.
    pub fn model_probability(&self, dim: usize) -> f64 {
        let len = self.observation_set().len(dim);
        self.forward(len, 0, dim)
    }
    /// Mean of the per-sequence log-likelihoods. The value is cached until `invalidate`.
    pub fn model_probability_all(&self) -> f64 {
        if let Some(lk) = self.summary_lock().model_probability {
            return lk;
        }
        let dims = self.observation_set().num_sequences();
        let harness = self.harness();
        let mut total = 0f64;
        for batch in harness.batches(dims) {
            harness.prefetch_forward(self, batch.clone());
            total += batch.map(|dim| self.model_probability(dim)).sum::<f64>();
        }
        let lk = total / dims.max(1) as f64;
        self.summary_lock().model_probability = Some(lk);
        lk
    }
    /// Fill `table` with the forward variables of `dim` unless it already holds them.
    pub(crate) fn fill_forward(&self, table: &mut DPTable, dim: usize) {
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
        let x = obs.symbol(dim, 0);
        for i in 0..states {
            table[(0, i)] = self.initial(i) + self.emission(i, x);
        }
        // Recursion.
        for t in 1..len {
            let x = obs.symbol(dim, t);
            for j in 0..states {
                let mut sum = f64::NEG_INFINITY;
                for i in 0..states {
                    sum = log_add(sum, table[(t - 1, i)] + self.transition(i, j));
                }
                table[(t, j)] = sum + self.emission(j, x);
            }
        }
        let total = (0..states).fold(f64::NEG_INFINITY, |acc, i| {
            log_add(acc, table[(len - 1, i)] + self.terminal(i))
        });
        trace!("FWD\t{}\t{:.4}", dim, total);
        table.finish(stamp, total);
    }
    // Two rolling rows, recomputed on each call.
    fn forward_uncached(&self, t: usize, state: usize, dim: usize) -> f64 {
        let obs = self.observation_set();
        let (len, states) = (obs.len(dim), self.states());
        if len == 0 {
            return f64::NEG_INFINITY;
        }
        let x = obs.symbol(dim, 0);
        let mut prev: Vec<f64> = (0..states)
            .map(|i| self.initial(i) + self.emission(i, x))
            .collect();
        let mut current = vec![f64::NEG_INFINITY; states];
        let last = t.min(len - 1);
        for s in 1..=last {
            let x = obs.symbol(dim, s);
            for (j, cell) in current.iter_mut().enumerate() {
                let sum = prev
                    .iter()
                    .enumerate()
                    .fold(f64::NEG_INFINITY, |acc, (i, &f)| {
                        log_add(acc, f + self.transition(i, j))
                    });
                *cell = sum + self.emission(j, x);
            }
            std::mem::swap(&mut prev, &mut current);
        }
        if t < len {
            prev[state]
        } else {
            prev.iter()
                .enumerate()
                .fold(f64::NEG_INFINITY, |acc, (i, &f)| {
                    log_add(acc, f + self.terminal(i))
                })
        }
    }
}
