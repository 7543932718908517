//! Fixed-slot parallel harness.
//! Dimensions are processed in batches of `W` consecutive indices. Inside a batch,
//! the dimension `d` only touches the slot `d % W`, so the workers never contend
//! for a lock. Each batch is joined before the next one starts.
use crate::model::Model;
use rayon::prelude::*;
use std::ops::Range;

#[derive(Debug, Clone, Copy)]
pub struct Harness {
    workers: usize,
}

impl Harness {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }
    pub fn workers(&self) -> usize {
        self.workers
    }
    /// Split `0..dims` into consecutive batches of at most `W` dimensions.
    pub fn batches(&self, dims: usize) -> impl Iterator<Item = Range<usize>> {
        let workers = self.workers;
        (0..dims)
            .step_by(workers)
            .map(move |start| start..(start + workers).min(dims))
    }
    fn is_parallel(&self, model: &Model) -> bool {
        1 < self.workers && model.use_cache()
    }
    /// Fill the forward and backward tables of every dimension in `batch` concurrently.
    /// With a single worker or without caches, nothing happens and the engines compute lazily.
    pub fn prefetch_forward(&self, model: &Model, batch: Range<usize>) {
        if !self.is_parallel(model) {
            return;
        }
        debug_assert!(batch.len() <= self.workers);
        batch.into_par_iter().for_each(|dim| {
            let mut slot = model.slot(dim);
            let slot = &mut *slot;
            model.fill_forward(&mut slot.forward, dim);
            model.fill_backward(&mut slot.backward, dim);
        });
    }
    /// Fill the Viterbi tables of every dimension in `batch` concurrently.
    pub fn prefetch_path(&self, model: &Model, batch: Range<usize>) {
        if !self.is_parallel(model) {
            return;
        }
        debug_assert!(batch.len() <= self.workers);
        batch.into_par_iter().for_each(|dim| {
            let mut slot = model.slot(dim);
            model.fill_path(&mut slot.viterbi, dim);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelConfig;
    use crate::observation::SequenceSet;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    use std::sync::Arc;
    #[test]
    fn batches_cover_all_dims() {
        let harness = Harness::new(3);
        let batches: Vec<_> = harness.batches(7).collect();
        assert_eq!(batches, vec![0..3, 3..6, 6..7]);
        assert_eq!(Harness::new(0).batches(2).count(), 2);
        assert_eq!(harness.batches(0).count(), 0);
    }
    #[test]
    fn parallel_and_sequential_likelihoods_agree() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(2983);
        let params = Model::random(4, 4, &ModelConfig::default(), &mut rng)
            .parameters()
            .clone();
        let seqs: Vec<_> = (0..11)
            .map(|i| crate::gen_seq::random_symbols(&mut rng, 10 + 3 * i, 4))
            .collect();
        let obs = Arc::new(SequenceSet::new(seqs));
        let mut sequential = Model::new(params.clone(), &ModelConfig::default());
        let mut parallel = Model::new(params, &ModelConfig::new(1e-3, 4, true));
        sequential.set_observations(obs.clone()).unwrap();
        parallel.set_observations(obs).unwrap();
        let x = sequential.model_probability_all();
        let y = parallel.model_probability_all();
        assert!((x - y).abs() < 1e-9, "{},{}", x, y);
        let x = sequential.best_path_all();
        let y = parallel.best_path_all();
        assert!((x - y).abs() < 1e-9, "{},{}", x, y);
        for dim in 0..11 {
            assert_eq!(sequential.path(dim), parallel.path(dim));
        }
    }
}
