//! Posterior probabilities and derivatives of the likelihood with respect to the parameters.
//! Model derivatives are logarithms of dP(O)/d(theta) for the linear-space parameter theta.
//! Path derivatives are d ln P(O, Q*)/d(theta) along the best path Q*, in linear space.
use crate::cache::DPTable;
use crate::logspace::log_add;
use crate::model::Model;

/// Index of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterIndex {
    Initial(usize),
    Terminal(usize),
    Transition(usize, usize),
    Emission(usize, usize),
}

impl Model {
    /// Run `f` on the forward and backward tables of `dim`, computing them if needed.
    pub(crate) fn with_tables<T, F>(&self, dim: usize, f: F) -> T
    where
        F: FnOnce(&DPTable, &DPTable) -> T,
    {
        let mut slot = self.slot(dim);
        let slot = &mut *slot;
        self.fill_forward(&mut slot.forward, dim);
        self.fill_backward(&mut slot.backward, dim);
        f(&slot.forward, &slot.backward)
    }
    /// ln Pr{state_t = i | O}.
    pub fn state_probability(&self, t: usize, i: usize, dim: usize) -> f64 {
        self.with_tables(dim, |fwd, bwd| fwd[(t, i)] + bwd[(t, i)] - fwd.total())
    }
    /// ln Pr{state_t = i, state_{t+1} = j | O}. `t + 1` should be less than the length.
    pub fn transition_probability(&self, t: usize, i: usize, j: usize, dim: usize) -> f64 {
        let x = self.observation_set().symbol(dim, t + 1);
        self.with_tables(dim, |fwd, bwd| {
            fwd[(t, i)] + self.transition(i, j) + self.emission(j, x) + bwd[(t + 1, j)] - fwd.total()
        })
    }
    /// The parameters the derivative dumps refer to: every parameter, or only the
    /// learnable ones when the model has a training mask. Initial, terminal,
    /// transition, and emission parameters, in this order.
    pub fn parameter_indices(&self) -> Vec<ParameterIndex> {
        use ParameterIndex::*;
        match self.mask() {
            Some(mask) => {
                let initial = mask.learn_p().iter().map(|&i| Initial(i));
                let terminal = mask.learn_q().iter().map(|&i| Terminal(i));
                let transition = mask.learn_a().iter().map(|&(i, j)| Transition(i, j));
                let emission = mask.learn_b().iter().map(|&(i, k)| Emission(i, k));
                initial.chain(terminal).chain(transition).chain(emission).collect()
            }
            None => {
                let (states, symbols) = (self.states(), self.symbols());
                let initial = (0..states).map(Initial);
                let terminal = (0..states).map(Terminal);
                let transition = (0..states * states).map(|x| Transition(x / states, x % states));
                let emission = (0..states * symbols).map(|x| Emission(x / symbols, x % symbols));
                initial.chain(terminal).chain(transition).chain(emission).collect()
            }
        }
    }
    pub fn model_derivative_p(&self, i: usize, dim: usize) -> f64 {
        let obs = self.observation_set();
        if obs.len(dim) == 0 {
            return f64::NEG_INFINITY;
        }
        let x = obs.symbol(dim, 0);
        self.with_tables(dim, |_, bwd| bwd[(0, i)] + self.emission(i, x))
    }
    pub fn model_derivative_q(&self, i: usize, dim: usize) -> f64 {
        let len = self.observation_set().len(dim);
        if len == 0 {
            return f64::NEG_INFINITY;
        }
        self.with_tables(dim, |fwd, _| fwd[(len - 1, i)])
    }
    pub fn model_derivative_a(&self, i: usize, j: usize, dim: usize) -> f64 {
        let obs = self.observation_set();
        let len = obs.len(dim);
        self.with_tables(dim, |fwd, bwd| {
            (0..len.saturating_sub(1)).fold(f64::NEG_INFINITY, |acc, t| {
                let x = obs.symbol(dim, t + 1);
                log_add(acc, fwd[(t, i)] + bwd[(t + 1, j)] + self.emission(j, x))
            })
        })
    }
    pub fn model_derivative_b(&self, i: usize, k: usize, dim: usize) -> f64 {
        let obs = self.observation_set();
        let len = obs.len(dim);
        let emission = self.emission(i, k);
        self.with_tables(dim, |fwd, bwd| {
            (0..len)
                .filter(|&t| obs.symbol(dim, t) == k)
                .fold(f64::NEG_INFINITY, |acc, t| {
                    log_add(acc, fwd[(t, i)] + bwd[(t, i)] - emission)
                })
        })
    }
    pub fn model_derivative(&self, index: ParameterIndex, dim: usize) -> f64 {
        match index {
            ParameterIndex::Initial(i) => self.model_derivative_p(i, dim),
            ParameterIndex::Terminal(i) => self.model_derivative_q(i, dim),
            ParameterIndex::Transition(i, j) => self.model_derivative_a(i, j, dim),
            ParameterIndex::Emission(i, k) => self.model_derivative_b(i, k, dim),
        }
    }
    /// Model derivatives of `dim` for each of [`Model::parameter_indices`].
    pub fn model_derivatives(&self, dim: usize) -> Vec<f64> {
        self.parameter_indices()
            .into_iter()
            .map(|index| self.model_derivative(index, dim))
            .collect()
    }
    pub fn path_derivative_p(&self, i: usize, dim: usize) -> f64 {
        match self.path(dim).first() {
            Some(&s) if s == i => (-self.initial(i)).exp(),
            _ => 0f64,
        }
    }
    pub fn path_derivative_q(&self, i: usize, dim: usize) -> f64 {
        match self.path(dim).last() {
            Some(&s) if s == i => (-self.terminal(i)).exp(),
            _ => 0f64,
        }
    }
    pub fn path_derivative_a(&self, i: usize, j: usize, dim: usize) -> f64 {
        let path = self.path(dim);
        let count = path.windows(2).filter(|w| w[0] == i && w[1] == j).count();
        match count {
            0 => 0f64,
            _ => count as f64 * (-self.transition(i, j)).exp(),
        }
    }
    pub fn path_derivative_b(&self, i: usize, k: usize, dim: usize) -> f64 {
        let obs = self.observation_set();
        let path = self.path(dim);
        let count = path
            .iter()
            .enumerate()
            .filter(|&(t, &s)| s == i && obs.symbol(dim, t) == k)
            .count();
        match count {
            0 => 0f64,
            _ => count as f64 * (-self.emission(i, k)).exp(),
        }
    }
    pub fn path_derivative(&self, index: ParameterIndex, dim: usize) -> f64 {
        match index {
            ParameterIndex::Initial(i) => self.path_derivative_p(i, dim),
            ParameterIndex::Terminal(i) => self.path_derivative_q(i, dim),
            ParameterIndex::Transition(i, j) => self.path_derivative_a(i, j, dim),
            ParameterIndex::Emission(i, k) => self.path_derivative_b(i, k, dim),
        }
    }
    /// Path derivatives of `dim` for each of [`Model::parameter_indices`].
    pub fn path_derivatives(&self, dim: usize) -> Vec<f64> {
        self.parameter_indices()
            .into_iter()
            .map(|index| self.path_derivative(index, dim))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::tests::sticky_model;
    use crate::mask::TrainingMask;
    use crate::model::ModelConfig;
    use crate::observation::SequenceSet;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    use std::sync::Arc;
    fn random_model(seed: u64, len: usize) -> Model {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(seed);
        let mut model = Model::random(3, 4, &ModelConfig::default(), &mut rng);
        let xs = crate::gen_seq::random_symbols(&mut rng, len, 4);
        model
            .set_observations(Arc::new(SequenceSet::new(vec![xs])))
            .unwrap();
        model
    }
    #[test]
    fn posteriors_are_consistent() {
        let model = random_model(49, 12);
        for t in 0..11 {
            let total: f64 = (0..3).map(|i| model.state_probability(t, i, 0).exp()).sum();
            assert!((total - 1f64).abs() < 1e-9);
            for i in 0..3 {
                let marginal: f64 = (0..3)
                    .map(|j| model.transition_probability(t, i, j, 0).exp())
                    .sum();
                let gamma = model.state_probability(t, i, 0).exp();
                assert!((marginal - gamma).abs() < 1e-9, "{},{}", marginal, gamma);
            }
        }
    }
    #[test]
    fn derivative_identities() {
        let len = 15;
        let model = random_model(4, len);
        let lk = model.model_probability(0);
        let sum_p: f64 = (0..3)
            .map(|i| (model.model_derivative_p(i, 0) + model.initial(i) - lk).exp())
            .sum();
        assert!((sum_p - 1f64).abs() < 1e-9, "{}", sum_p);
        let sum_q: f64 = (0..3)
            .map(|i| (model.model_derivative_q(i, 0) + model.terminal(i) - lk).exp())
            .sum();
        assert!((sum_q - 1f64).abs() < 1e-9, "{}", sum_q);
        let mut sum_a = 0f64;
        let mut sum_b = 0f64;
        for i in 0..3 {
            for j in 0..3 {
                sum_a += (model.model_derivative_a(i, j, 0) + model.transition(i, j) - lk).exp();
            }
            for k in 0..4 {
                sum_b += (model.model_derivative_b(i, k, 0) + model.emission(i, k) - lk).exp();
            }
        }
        assert!((sum_a - (len - 1) as f64).abs() < 1e-8, "{}", sum_a);
        assert!((sum_b - len as f64).abs() < 1e-8, "{}", sum_b);
    }
    #[test]
    fn derivative_matches_finite_difference() {
        let mut model = random_model(20, 6);
        let h = 1e-6;
        let perturbed = |model: &mut Model, i: usize, j: usize, delta: f64| -> f64 {
            let original = model.transition(i, j);
            model.set_transition(i, j, (original.exp() + delta).ln());
            model.invalidate();
            let lk = model.model_probability(0);
            model.set_transition(i, j, original);
            model.invalidate();
            lk
        };
        for &(i, j) in &[(0, 1), (2, 2)] {
            let numeric = (perturbed(&mut model, i, j, h) - perturbed(&mut model, i, j, -h)) / (2.0 * h);
            let lk = model.model_probability(0);
            let analytic = (model.model_derivative_a(i, j, 0) - lk).exp();
            assert!(
                (numeric - analytic).abs() < 1e-5 * analytic.abs().max(1.0),
                "{},{}",
                numeric,
                analytic
            );
        }
    }
    #[test]
    fn path_derivatives_count_the_best_path() {
        let mut model = sticky_model();
        model
            .set_observations(Arc::new(SequenceSet::new(vec![vec![0, 0, 1]])))
            .unwrap();
        assert_eq!(model.path(0), vec![0, 0, 1]);
        assert!((model.path_derivative_p(0, 0) - 2.0).abs() < 1e-12);
        assert_eq!(model.path_derivative_p(1, 0), 0.0);
        assert!((model.path_derivative_q(1, 0) - 2.0).abs() < 1e-12);
        assert!((model.path_derivative_a(0, 0, 0) - 1.0 / 0.9).abs() < 1e-12);
        assert!((model.path_derivative_a(0, 1, 0) - 10.0).abs() < 1e-9);
        assert_eq!(model.path_derivative_a(1, 0, 0), 0.0);
        assert!((model.path_derivative_b(0, 0, 0) - 2.0 / 0.8).abs() < 1e-12);
        assert!((model.path_derivative_b(1, 1, 0) - 1.0 / 0.8).abs() < 1e-12);
        assert_eq!(model.path_derivatives(0).len(), 2 + 2 + 4 + 8);
    }
    #[test]
    fn masked_indices() {
        let mut model = sticky_model();
        let mask = TrainingMask::new()
            .learn_emission(1, 3)
            .learn_transition(0, 1)
            .learn_initial(1);
        model.set_mask(Some(mask)).unwrap();
        use ParameterIndex::*;
        assert_eq!(
            model.parameter_indices(),
            vec![Initial(1), Transition(0, 1), Emission(1, 3)]
        );
    }
}
