//! Viterbi decoding: the single most probable state path.
use crate::cache::PathTable;
use crate::model::Model;

impl Model {
    /// Log-probability of the best state path of the `dim`-th sequence.
    /// The path itself is cached and available through [`Model::path`].
    pub fn best_path(&self, dim: usize) -> f64 {
        let mut slot = self.slot(dim);
        self.fill_path(&mut slot.viterbi, dim);
        slot.viterbi.prob()
    }
    /// The best state path of the `dim`-th sequence.
    pub fn path(&self, dim: usize) -> Vec<usize> {
        self.decode(dim).1
    }
    /// The best path and its log-probability.
    pub fn decode(&self, dim: usize) -> (f64, Vec<usize>) {
        let mut slot = self.slot(dim);
        self.fill_path(&mut slot.viterbi, dim);
        (slot.viterbi.prob(), slot.viterbi.path().to_vec())
    }
    /// Mean best-path log-probability over all the sequences. Cached until `invalidate`.
    pub fn best_path_all(&self) -> f64 {
        if let Some(lk) = self.summary_lock().best_path {
            return lk;
        }
        let dims = self.observation_set().num_sequences();
        let harness = self.harness();
        let mut total = 0f64;
        for batch in harness.batches(dims) {
            harness.prefetch_path(self, batch.clone());
            total += batch.map(|dim| self.best_path(dim)).sum::<f64>();
        }
        let lk = total / dims.max(1) as f64;
        self.summary_lock().best_path = Some(lk);
        lk
    }
    pub(crate) fn fill_path(&self, table: &mut PathTable, dim: usize) {
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
        let mut prev: Vec<f64> = (0..states)
            .map(|i| self.initial(i) + self.emission(i, x))
            .collect();
        let mut current = vec![f64::NEG_INFINITY; states];
        // Recursion.
        for t in 1..len {
            let x = obs.symbol(dim, t);
            for j in 0..states {
                let (mut max, mut argmax) = (f64::NEG_INFINITY, 0);
                for (i, &delta) in prev.iter().enumerate() {
                    let lk = delta + self.transition(i, j);
                    if max < lk {
                        max = lk;
                        argmax = i;
                    }
                }
                current[j] = max + self.emission(j, x);
                table.set_psi(t, j, argmax);
            }
            std::mem::swap(&mut prev, &mut current);
        }
        // Terminate.
        let (mut max, mut argmax) = (f64::NEG_INFINITY, 0);
        for (i, &delta) in prev.iter().enumerate() {
            let lk = delta + self.terminal(i);
            if max < lk {
                max = lk;
                argmax = i;
            }
        }
        table.trace_back(argmax);
        trace!("VIT\t{}\t{:.4}", dim, max);
        table.finish(stamp, max);
    }
}
