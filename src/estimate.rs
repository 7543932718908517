//! Re-estimation of the parameters.
//! Each estimator reads the `train` model and writes the new parameters into `self`, the target.
//! It returns the aggregate score of `train` (mean log-likelihood, or mean best-path
//! log-probability), which is also cached on `train`. The caller swaps the two and iterates.
use crate::error::{Error, Result};
use crate::logspace::{log, log_add, logsumexp, ALMOST_NEG_INFTY};
use crate::mask::TrainingMask;
use crate::model::{Model, Parameters};
use std::sync::Arc;

// Counts of each parameter, either in log or in linear space.
#[derive(Debug, Clone)]
struct Accumulator {
    states: usize,
    symbols: usize,
    initial: Vec<f64>,
    terminal: Vec<f64>,
    transition: Vec<f64>,
    emission: Vec<f64>,
}

impl Accumulator {
    fn new(states: usize, symbols: usize, seed: f64) -> Self {
        Self {
            states,
            symbols,
            initial: vec![seed; states],
            terminal: vec![seed; states],
            transition: vec![seed; states * states],
            emission: vec![seed; states * symbols],
        }
    }
    fn into_parameters(self) -> Parameters {
        Parameters::from_parts(
            self.states,
            self.symbols,
            self.initial,
            self.terminal,
            self.transition,
            self.emission,
        )
    }
    fn to_log(&mut self) {
        self.initial
            .iter_mut()
            .chain(self.terminal.iter_mut())
            .chain(self.transition.iter_mut())
            .chain(self.emission.iter_mut())
            .for_each(|x| *x = log(*x));
    }
}

impl Model {
    /// Baum-Welch re-estimation of every parameter.
    pub fn estimate_baum_welch(&mut self, train: &Model) -> f64 {
        let (counts, lk) = self.baum_welch_counts(train);
        let mut params = counts.into_parameters();
        params.normalize();
        self.set_parameters(params);
        lk
    }
    /// Baum-Welch re-estimation of the learnable parameters of the training mask.
    /// Other parameters are copied from `train`.
    pub fn estimate_baum_welch_defined(&mut self, train: &Model) -> f64 {
        let mask = match self.mask().or_else(|| train.mask()).cloned() {
            Some(mask) => mask,
            None => {
                warn!("No training mask. Estimate every parameter.");
                return self.estimate_baum_welch(train);
            }
        };
        let (counts, lk) = self.baum_welch_counts(train);
        let params = redistribute(train.parameters(), &counts.into_parameters(), &mask);
        self.set_parameters(params);
        lk
    }
    /// Baum-Welch re-estimation of p, q, and the transitions. Emissions are copied from `train`.
    /// Cells that are (almost) impossible in `train` keep their values and receive no pseudo count.
    pub fn estimate_baum_welch_trans(&mut self, train: &Model) -> f64 {
        let (mut counts, lk) = self.baum_welch_counts(train);
        let old = train.parameters();
        let states = old.states();
        keep_impossible(&mut counts.initial, old.initial_distribution());
        keep_impossible(&mut counts.terminal, old.terminal_distribution());
        for (i, row) in counts.transition.chunks_mut(states.max(1)).enumerate() {
            keep_impossible(row, old.transitions(i));
        }
        let symbols = old.symbols();
        for (i, row) in counts.emission.chunks_mut(symbols.max(1)).enumerate() {
            row.copy_from_slice(old.emissions(i));
        }
        let mut params = counts.into_parameters();
        params.normalize();
        self.set_parameters(params);
        lk
    }
    /// Initialize a left-to-right chain from the attached observations.
    /// Sequence symbols are stacked onto consecutive states, starting at state 0,
    /// or ending at the last state if `right_align` is true, and every parameter is
    /// set from the resulting histograms. Empty sequences are ignored.
    /// The longest sequence should not be longer than the number of states.
    pub fn linear_train(&mut self, right_align: bool) -> Result<()> {
        let obs = match self.observations() {
            Some(obs) => Arc::clone(obs),
            None => return Err(Error::invalid("no observations to initialize from")),
        };
        let (states, symbols, pseudo) = (self.states(), self.symbols(), self.pseudo());
        let max_len = obs.max_len();
        if states == 0 || states < max_len {
            return Err(Error::invalid(format!(
                "a sequence of length {} does not fit into {} states",
                max_len, states
            )));
        }
        let mut hist = vec![0f64; states * symbols];
        // Sequences starting (right_align) or ending (otherwise) at each state.
        let mut ends = vec![0f64; states];
        // Sequences passing through i -> i + 1.
        let mut passes = vec![0f64; states];
        for dim in 0..obs.num_sequences() {
            let len = obs.len(dim);
            if len == 0 {
                continue;
            }
            let offset = if right_align { states - len } else { 0 };
            for t in 0..len {
                hist[(offset + t) * symbols + obs.symbol(dim, t)] += 1f64;
            }
            passes[offset..offset + len - 1]
                .iter_mut()
                .for_each(|x| *x += 1f64);
            match right_align {
                true => ends[offset] += 1f64,
                false => ends[len - 1] += 1f64,
            }
        }
        let mut initial = vec![0f64; states];
        let mut terminal = vec![0f64; states];
        let mut transition = vec![0f64; states * states];
        let smoothed: Vec<_> = ends.iter().map(|x| x + pseudo).collect();
        if right_align {
            initial = smoothed;
            terminal[states - 1] = 1f64;
        } else {
            initial[0] = 1f64;
            terminal = smoothed;
        }
        for i in 0..states - 1 {
            transition[i * states + i + 1] = match right_align {
                true => 1f64,
                false => passes[i] + pseudo,
            };
        }
        let mut emission = vec![0f64; states * symbols];
        for (row, counts) in emission
            .chunks_mut(symbols.max(1))
            .zip(hist.chunks(symbols.max(1)))
        {
            let total: f64 = counts.iter().sum::<f64>() + pseudo * symbols as f64;
            for (x, c) in row.iter_mut().zip(counts) {
                *x = (c + pseudo) / total;
            }
        }
        let mut params = Parameters::from_linear_elements(
            states,
            symbols,
            &initial,
            &terminal,
            &transition,
            &emission,
        )?;
        params.normalize();
        debug!("LINEAR\t{}\t{}", obs.num_sequences(), right_align);
        self.set_parameters(params);
        Ok(())
    }
    /// Viterbi (hard) re-estimation of every parameter from the best paths of `train`.
    pub fn estimate_viterbi(&mut self, train: &Model) -> f64 {
        let (mut counts, lk) = self.viterbi_counts(train);
        counts.to_log();
        let mut params = counts.into_parameters();
        params.normalize();
        self.set_parameters(params);
        lk
    }
    /// Viterbi re-estimation of the learnable parameters of the training mask.
    /// Other parameters are copied from `train`.
    pub fn estimate_viterbi_defined(&mut self, train: &Model) -> f64 {
        let mask = match self.mask().or_else(|| train.mask()).cloned() {
            Some(mask) => mask,
            None => {
                warn!("No training mask. Estimate every parameter.");
                return self.estimate_viterbi(train);
            }
        };
        let (mut counts, lk) = self.viterbi_counts(train);
        counts.to_log();
        let params = redistribute(train.parameters(), &counts.into_parameters(), &mask);
        self.set_parameters(params);
        lk
    }
    // Expected counts in log space, seeded with ln(pseudo), and the mean log-likelihood.
    fn baum_welch_counts(&mut self, train: &Model) -> (Accumulator, f64) {
        assert_eq!(self.states(), train.states());
        assert_eq!(self.symbols(), train.symbols());
        self.share_observations(train);
        let mut counts = Accumulator::new(train.states(), train.symbols(), log(self.pseudo()));
        let dims = train.num_sequences();
        let harness = train.harness();
        let mut total = 0f64;
        for batch in harness.batches(dims) {
            harness.prefetch_forward(train, batch.clone());
            for dim in batch {
                total += train.accumulate_posteriors(dim, &mut counts);
            }
        }
        let lk = total / dims.max(1) as f64;
        train.summary_lock().model_probability = Some(lk);
        debug!("BW\t{}\t{:.4}", dims, lk);
        (counts, lk)
    }
    fn accumulate_posteriors(&self, dim: usize, counts: &mut Accumulator) -> f64 {
        let obs = self.observation_set();
        let (len, states, symbols) = (obs.len(dim), self.states(), self.symbols());
        self.with_tables(dim, |fwd, bwd| {
            let lk = fwd.total();
            if len == 0 || !lk.is_finite() {
                debug!("Skip {}\t{}", dim, lk);
                return lk;
            }
            for i in 0..states {
                let first = fwd[(0, i)] + bwd[(0, i)] - lk;
                counts.initial[i] = log_add(counts.initial[i], first);
                let last = fwd[(len - 1, i)] + bwd[(len - 1, i)] - lk;
                counts.terminal[i] = log_add(counts.terminal[i], last);
            }
            for t in 0..len {
                let x = obs.symbol(dim, t);
                for i in 0..states {
                    let gamma = fwd[(t, i)] + bwd[(t, i)] - lk;
                    let cell = &mut counts.emission[i * symbols + x];
                    *cell = log_add(*cell, gamma);
                }
            }
            for t in 0..len - 1 {
                let x = obs.symbol(dim, t + 1);
                for i in 0..states {
                    let forward = fwd[(t, i)] - lk;
                    for j in 0..states {
                        let xi = forward + self.transition(i, j) + self.emission(j, x) + bwd[(t + 1, j)];
                        let cell = &mut counts.transition[i * states + j];
                        *cell = log_add(*cell, xi);
                    }
                }
            }
            lk
        })
    }
    // Occurrence counts along the best paths in linear space, seeded with pseudo,
    // and the mean best-path log-probability.
    fn viterbi_counts(&mut self, train: &Model) -> (Accumulator, f64) {
        assert_eq!(self.states(), train.states());
        assert_eq!(self.symbols(), train.symbols());
        self.share_observations(train);
        let (states, symbols) = (train.states(), train.symbols());
        let mut counts = Accumulator::new(states, symbols, self.pseudo());
        let dims = train.num_sequences();
        let obs = train.observation_set();
        let harness = train.harness();
        let mut total = 0f64;
        for batch in harness.batches(dims) {
            harness.prefetch_path(train, batch.clone());
            for dim in batch {
                let (lk, path) = train.decode(dim);
                total += lk;
                if path.is_empty() || !lk.is_finite() {
                    debug!("Skip {}\t{}", dim, lk);
                    continue;
                }
                counts.initial[path[0]] += 1f64;
                counts.terminal[path[path.len() - 1]] += 1f64;
                for w in path.windows(2) {
                    counts.transition[w[0] * states + w[1]] += 1f64;
                }
                for (t, &state) in path.iter().enumerate() {
                    counts.emission[state * symbols + obs.symbol(dim, t)] += 1f64;
                }
            }
        }
        let lk = total / dims.max(1) as f64;
        train.summary_lock().best_path = Some(lk);
        debug!("VIT\t{}\t{:.4}", dims, lk);
        (counts, lk)
    }
}

// Start from `old` and re-estimate the learnable cells of `mask` from the log `counts`.
// The learnable cells of a row keep the total mass they have in `old`, so fixed cells
// and row sums do not change.
fn redistribute(old: &Parameters, counts: &Parameters, mask: &TrainingMask) -> Parameters {
    let mut params = old.clone();
    for (from, columns) in mask.transition_rows() {
        let olds: Vec<_> = columns.iter().map(|&j| old.transition(from, j)).collect();
        let news: Vec<_> = columns.iter().map(|&j| counts.transition(from, j)).collect();
        for (&j, x) in columns.iter().zip(share_mass(&olds, &news)) {
            params.set_transition(from, j, x);
        }
    }
    for (state, columns) in mask.emission_rows() {
        let olds: Vec<_> = columns.iter().map(|&k| old.emission(state, k)).collect();
        let news: Vec<_> = columns.iter().map(|&k| counts.emission(state, k)).collect();
        for (&k, x) in columns.iter().zip(share_mass(&olds, &news)) {
            params.set_emission(state, k, x);
        }
    }
    let learn_p = mask.learn_p();
    let olds: Vec<_> = learn_p.iter().map(|&i| old.initial(i)).collect();
    let news: Vec<_> = learn_p.iter().map(|&i| counts.initial(i)).collect();
    for (&i, x) in learn_p.iter().zip(share_mass(&olds, &news)) {
        params.set_initial(i, x);
    }
    let learn_q = mask.learn_q();
    let olds: Vec<_> = learn_q.iter().map(|&i| old.terminal(i)).collect();
    let news: Vec<_> = learn_q.iter().map(|&i| counts.terminal(i)).collect();
    for (&i, x) in learn_q.iter().zip(share_mass(&olds, &news)) {
        params.set_terminal(i, x);
    }
    params
}

// Cells impossible in `olds` stay as they are.
fn keep_impossible(counts: &mut [f64], olds: &[f64]) {
    for (x, &old) in counts.iter_mut().zip(olds) {
        if old <= ALMOST_NEG_INFTY {
            *x = old;
        }
    }
}

fn share_mass(olds: &[f64], counts: &[f64]) -> Vec<f64> {
    let total = logsumexp(counts);
    if total == f64::NEG_INFINITY {
        return olds.to_vec();
    }
    let mass = logsumexp(olds);
    counts.iter().map(|c| mass + c - total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::tests::sticky_model;
    use crate::model::tests::{assert_normalized, row_sum};
    use crate::model::ModelConfig;
    use crate::observation::SequenceSet;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    use std::sync::Arc;
    fn sampled_observations(seed: u64, num: usize, len: usize) -> Arc<SequenceSet> {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(seed);
        let truth = sticky_model();
        let seqs: Vec<_> = (0..num)
            .map(|_| crate::gen_seq::sample(&truth, &mut rng, len).unwrap().1)
            .collect();
        Arc::new(SequenceSet::new(seqs))
    }
    #[test]
    fn baum_welch_is_monotone() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(4324);
        let config = ModelConfig::new(1e-8, 1, true);
        let mut train = Model::random(2, 4, &config, &mut rng);
        train
            .set_observations(sampled_observations(1, 20, 50))
            .unwrap();
        let mut target = train.clone_sharing_caches();
        let mut lks = vec![];
        for _ in 0..8 {
            lks.push(target.estimate_baum_welch(&train));
            assert_normalized(target.parameters());
            std::mem::swap(&mut target, &mut train);
        }
        lks.push(train.model_probability_all());
        for w in lks.windows(2) {
            assert!(w[0] <= w[1] + 1e-8, "{:?}", lks);
        }
        assert!(lks[0] < lks[lks.len() - 1]);
    }
    #[test]
    fn estimate_records_train_likelihood() {
        let mut train = sticky_model();
        train
            .set_observations(sampled_observations(2, 5, 20))
            .unwrap();
        let mut target = train.clone();
        let lk = target.estimate_baum_welch(&train);
        let expected = (0..5).map(|d| train.model_probability(d)).sum::<f64>() / 5f64;
        assert!((lk - expected).abs() < 1e-9);
        assert_eq!(train.model_probability_all(), lk);
        assert_eq!(target.num_sequences(), 5);
    }
    #[test]
    fn masked_transitions_leave_others_unchanged() {
        let mut train = sticky_model();
        let mask = TrainingMask::new()
            .learn_transition(0, 1)
            .learn_transition(1, 0);
        train.set_mask(Some(mask)).unwrap();
        train
            .set_observations(Arc::new(SequenceSet::from_dna(&[b"AACCGTTA".to_vec()]).unwrap()))
            .unwrap();
        let mut target = train.clone();
        target.estimate_baum_welch_defined(&train);
        let (old, new) = (train.parameters(), target.parameters());
        assert_eq!(old.transition(0, 0), new.transition(0, 0));
        assert_eq!(old.transition(1, 1), new.transition(1, 1));
        assert_eq!(old.initial_distribution(), new.initial_distribution());
        assert_eq!(old.terminal_distribution(), new.terminal_distribution());
        for i in 0..2 {
            assert_eq!(old.emissions(i), new.emissions(i));
            assert!((row_sum(new.transitions(i)) - 1f64).abs() < 1e-9);
        }
    }
    #[test]
    fn masked_row_keeps_its_mass() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(18);
        let mut train = Model::random(3, 4, &ModelConfig::default(), &mut rng);
        let mask = TrainingMask::new()
            .learn_transition(0, 0)
            .learn_transition(0, 2)
            .learn_emission(1, 0)
            .learn_emission(1, 1)
            .learn_initial(0)
            .learn_initial(1);
        train.set_mask(Some(mask)).unwrap();
        let seqs: Vec<_> = (0..6)
            .map(|_| crate::gen_seq::random_symbols(&mut rng, 30, 4))
            .collect();
        train
            .set_observations(Arc::new(SequenceSet::new(seqs)))
            .unwrap();
        let mut target = train.clone();
        target.estimate_baum_welch_defined(&train);
        let (old, new) = (train.parameters(), target.parameters());
        assert_eq!(old.transition(0, 1), new.transition(0, 1));
        assert_eq!(old.transitions(1), new.transitions(1));
        assert_eq!(old.emission(1, 2), new.emission(1, 2));
        assert_eq!(old.initial(2), new.initial(2));
        assert_ne!(old.transition(0, 0), new.transition(0, 0));
        assert_normalized(new);
    }
    #[test]
    fn parallel_and_sequential_estimation_agree() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(8);
        let params = Model::random(3, 4, &ModelConfig::default(), &mut rng)
            .parameters()
            .clone();
        let obs = sampled_observations(3, 13, 40);
        let mut sequential = Model::new(params.clone(), &ModelConfig::default());
        let mut parallel = Model::new(params, &ModelConfig::new(1e-3, 4, true));
        sequential.set_observations(obs.clone()).unwrap();
        parallel.set_observations(obs).unwrap();
        let (mut seq_target, mut par_target) = (sequential.clone(), parallel.clone_sharing_caches());
        let x = seq_target.estimate_baum_welch(&sequential);
        let y = par_target.estimate_baum_welch(&parallel);
        assert!((x - y).abs() < 1e-9);
        assert!(seq_target.dist(&par_target).unwrap() < 1e-20);
        let x = seq_target.estimate_viterbi(&sequential);
        let y = par_target.estimate_viterbi(&parallel);
        assert!((x - y).abs() < 1e-9);
        assert!(seq_target.dist(&par_target).unwrap() < 1e-20);
    }
    #[test]
    fn shared_caches_are_never_stale() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(83);
        let mut train = Model::random(3, 4, &ModelConfig::new(1e-3, 2, true), &mut rng);
        train.set_observations(sampled_observations(4, 5, 30)).unwrap();
        let before: Vec<_> = (0..5).map(|d| train.model_probability(d)).collect();
        let mut target = train.clone_sharing_caches();
        target.estimate_baum_welch(&train);
        assert!(target.shares_caches_with(&train));
        let mut fresh = Model::new(target.parameters().clone(), &ModelConfig::default());
        fresh.share_observations(&train);
        for d in 0..5 {
            let lk = target.model_probability(d);
            assert!((lk - fresh.model_probability(d)).abs() < 1e-12);
            assert!((train.model_probability(d) - before[d]).abs() < 1e-12);
            assert_eq!(target.path(d), fresh.path(d));
        }
    }
    #[test]
    fn viterbi_counts() {
        let mut train = sticky_model();
        train
            .set_observations(Arc::new(SequenceSet::new(vec![vec![0, 0, 1]])))
            .unwrap();
        let mut target = train.clone();
        let lk = target.estimate_viterbi(&train);
        assert_eq!(lk, train.best_path(0));
        assert_normalized(target.parameters());
        let pseudo = target.pseudo();
        // The best path is [0,0,1].
        let expected = (2.0 + pseudo) / (2.0 + 4.0 * pseudo);
        assert!((target.emission(0, 0).exp() - expected).abs() < 1e-12);
        assert!((target.transition(0, 1).exp() - 0.5).abs() < 1e-12);
        let expected = (1.0 + pseudo) / (1.0 + 2.0 * pseudo);
        assert!((target.initial(0).exp() - expected).abs() < 1e-12);
        assert!((target.terminal(1).exp() - expected).abs() < 1e-12);
    }
    #[test]
    fn viterbi_defined_copies_the_rest() {
        let mut train = sticky_model();
        let mask = TrainingMask::new().learn_emission(0, 0).learn_emission(0, 1);
        train.set_mask(Some(mask)).unwrap();
        train
            .set_observations(Arc::new(SequenceSet::new(vec![vec![0, 0, 1, 0], vec![0, 2]])))
            .unwrap();
        let mut target = train.clone();
        target.estimate_viterbi_defined(&train);
        let (old, new) = (train.parameters(), target.parameters());
        assert_eq!(old.emission(0, 2), new.emission(0, 2));
        assert_eq!(old.emission(0, 3), new.emission(0, 3));
        assert_eq!(old.emissions(1), new.emissions(1));
        for i in 0..2 {
            assert_eq!(old.transitions(i), new.transitions(i));
        }
        let mass = |p: &Parameters| p.emission(0, 0).exp() + p.emission(0, 1).exp();
        assert!((mass(old) - mass(new)).abs() < 1e-12);
        // Both best paths stay in state 0, which emits four 0s and one 1.
        let pseudo = target.pseudo();
        let ratio = new.emission(0, 0) - new.emission(0, 1);
        assert!((ratio - ((4.0 + pseudo) / (1.0 + pseudo)).ln()).abs() < 1e-9);
    }
    #[test]
    fn transitions_only() {
        let mut train = sticky_model();
        train.set_transition(1, 0, f64::NEG_INFINITY);
        train.normalize();
        train
            .set_observations(sampled_observations(5, 6, 30))
            .unwrap();
        let mut full = train.clone();
        let mut target = train.clone();
        let lk = full.estimate_baum_welch(&train);
        assert_eq!(target.estimate_baum_welch_trans(&train), lk);
        assert_normalized(target.parameters());
        let (old, new, full) = (train.parameters(), target.parameters(), full.parameters());
        for i in 0..2 {
            for (x, y) in old.emissions(i).iter().zip(new.emissions(i)) {
                assert!((x - y).abs() < 1e-12);
            }
            assert!((new.initial(i) - full.initial(i)).abs() < 1e-12);
            assert!((new.terminal(i) - full.terminal(i)).abs() < 1e-12);
            assert!((new.transition(0, i) - full.transition(0, i)).abs() < 1e-12);
        }
        assert_eq!(new.transition(1, 0), f64::NEG_INFINITY);
        assert!(full.transition(1, 0).is_finite());
        assert_eq!(new.transition(1, 1), 0f64);
    }
    #[test]
    fn linear_left_aligned() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(31);
        let mut model = Model::random(3, 2, &ModelConfig::default(), &mut rng);
        let seqs = vec![vec![0, 1], vec![0, 1, 1], vec![1], vec![]];
        model
            .set_observations(Arc::new(SequenceSet::new(seqs)))
            .unwrap();
        model.linear_train(false).unwrap();
        let p = model.pseudo();
        assert_eq!(model.initial(0), 0f64);
        assert_eq!(model.initial(1), f64::NEG_INFINITY);
        for i in 0..3 {
            assert!((model.terminal(i).exp() - 1.0 / 3.0).abs() < 1e-12);
        }
        assert!(model.transition(0, 1).abs() < 1e-12);
        assert!(model.transition(1, 2).abs() < 1e-12);
        assert_eq!(model.transition(1, 0), f64::NEG_INFINITY);
        assert!(model.parameters().transitions(2).iter().all(|&x| x == f64::NEG_INFINITY));
        assert!((model.emission(0, 0).exp() - (2.0 + p) / (3.0 + 2.0 * p)).abs() < 1e-12);
        assert!((model.emission(1, 0).exp() - p / (2.0 + 2.0 * p)).abs() < 1e-12);
        assert!((model.emission(2, 1).exp() - (1.0 + p) / (1.0 + 2.0 * p)).abs() < 1e-12);
        assert!(model.model_probability(1).is_finite());
        assert_eq!(model.path(1), vec![0, 1, 2]);
    }
    #[test]
    fn linear_right_aligned() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(32);
        let mut model = Model::random(3, 2, &ModelConfig::default(), &mut rng);
        model
            .set_observations(Arc::new(SequenceSet::new(vec![vec![0], vec![1, 1]])))
            .unwrap();
        model.linear_train(true).unwrap();
        let p = model.pseudo();
        assert_eq!(model.terminal(2), 0f64);
        assert_eq!(model.terminal(0), f64::NEG_INFINITY);
        assert!((model.initial(0).exp() - p / (2.0 + 3.0 * p)).abs() < 1e-12);
        assert!((model.initial(1).exp() - (1.0 + p) / (2.0 + 3.0 * p)).abs() < 1e-12);
        assert_eq!(model.transition(0, 1), 0f64);
        assert_eq!(model.transition(1, 2), 0f64);
        assert!((model.emission(1, 1).exp() - (1.0 + p) / (1.0 + 2.0 * p)).abs() < 1e-12);
        assert!((model.emission(2, 0).exp() - 0.5).abs() < 1e-12);
        assert!((model.emission(0, 0).exp() - 0.5).abs() < 1e-12);
        assert_eq!(model.path(0), vec![2]);
        assert_eq!(model.path(1), vec![1, 2]);
    }
    #[test]
    fn linear_needs_enough_states() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(33);
        let mut model = Model::random(3, 2, &ModelConfig::default(), &mut rng);
        assert!(model.linear_train(false).is_err());
        model
            .set_observations(Arc::new(SequenceSet::new(vec![vec![0, 1, 1, 0]])))
            .unwrap();
        let before = model.parameters().clone();
        assert!(model.linear_train(true).is_err());
        assert_eq!(model.parameters(), &before);
    }
}
