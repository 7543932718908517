//! Parameter store of a discrete-state, discrete-emission hidden Markov model.
//! All the parameters are natural logarithms of probabilities.
use crate::cache::{CacheSet, SlotRef, Stamp};
use crate::error::{Error, Result};
use crate::logspace::{log, log_add, ALMOST_NEG_INFTY};
use crate::mask::TrainingMask;
use crate::observation::Observations;
use crate::parallel::Harness;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Default Laplace smoothing constant used by the estimators.
pub const DEFAULT_PSEUDO: f64 = 1e-3;
// Offsets added to uniform draws so that no random parameter is exactly zero.
const MIN_RAND: f64 = 1e-1;
const MIN_RAND_DEFINED: f64 = 1e-4;
// Random cells of added states are drawn from [MIN_RAND_DEFINED, MIN_RAND_DEFINED + MAX_RAND_ADDED).
const MAX_RAND_ADDED: f64 = 0.2;

static GENERATION: AtomicU64 = AtomicU64::new(0);
fn next_generation() -> u64 {
    GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Configurations
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Pseudo count for re-estimation.
    pub pseudo: f64,
    /// Number of cache slots, and the number of sequences processed at once.
    pub workers: usize,
    /// If false, forward/backward values are recomputed on each call.
    pub use_cache: bool,
}

impl ModelConfig {
    pub fn new(pseudo: f64, workers: usize, use_cache: bool) -> Self {
        Self {
            pseudo,
            workers,
            use_cache,
        }
    }
}

impl std::default::Default for ModelConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PSEUDO, 1, true)
    }
}

/// Log-space tables of an HMM with `states` states and `symbols` symbols.
/// transition[from * states + to] = ln Pr{from->to},
/// emission[state * symbols + symbol] = ln Pr{symbol|state}.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    states: usize,
    symbols: usize,
    initial: Vec<f64>,
    terminal: Vec<f64>,
    transition: Vec<f64>,
    emission: Vec<f64>,
}

impl Parameters {
    /// Every probability is zero.
    pub fn new(states: usize, symbols: usize) -> Self {
        Self {
            states,
            symbols,
            initial: vec![f64::NEG_INFINITY; states],
            terminal: vec![f64::NEG_INFINITY; states],
            transition: vec![f64::NEG_INFINITY; states * states],
            emission: vec![f64::NEG_INFINITY; states * symbols],
        }
    }
    /// From flat log-space tables, laid out as the fields of this struct.
    pub fn from_log_elements(
        states: usize,
        symbols: usize,
        initial: Vec<f64>,
        terminal: Vec<f64>,
        transition: Vec<f64>,
        emission: Vec<f64>,
    ) -> Result<Self> {
        let shape = [
            ("p", initial.len(), states),
            ("q", terminal.len(), states),
            ("a", transition.len(), states * states),
            ("b", emission.len(), states * symbols),
        ];
        for &(name, len, expected) in shape.iter() {
            if len != expected {
                return Err(Error::invalid(format!(
                    "{} has {} elements, expected {}",
                    name, len, expected
                )));
            }
        }
        Ok(Self::from_parts(
            states, symbols, initial, terminal, transition, emission,
        ))
    }
    pub(crate) fn from_parts(
        states: usize,
        symbols: usize,
        initial: Vec<f64>,
        terminal: Vec<f64>,
        transition: Vec<f64>,
        emission: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(initial.len(), states);
        debug_assert_eq!(terminal.len(), states);
        debug_assert_eq!(transition.len(), states * states);
        debug_assert_eq!(emission.len(), states * symbols);
        Self {
            states,
            symbols,
            initial,
            terminal,
            transition,
            emission,
        }
    }
    /// From flat linear-space tables. Probabilities are not normalized.
    pub fn from_linear_elements(
        states: usize,
        symbols: usize,
        initial: &[f64],
        terminal: &[f64],
        transition: &[f64],
        emission: &[f64],
    ) -> Result<Self> {
        let convert = |xs: &[f64]| -> Result<Vec<f64>> {
            xs.iter()
                .map(|&x| match x.is_finite() && 0f64 <= x {
                    true => Ok(log(x)),
                    false => Err(Error::invalid(format!("{} is not a probability", x))),
                })
                .collect()
        };
        Self::from_log_elements(
            states,
            symbols,
            convert(initial)?,
            convert(terminal)?,
            convert(transition)?,
            convert(emission)?,
        )
    }
    pub fn states(&self) -> usize {
        self.states
    }
    pub fn symbols(&self) -> usize {
        self.symbols
    }
    pub fn initial(&self, state: usize) -> f64 {
        debug_assert!(state < self.states);
        self.initial[state]
    }
    pub fn terminal(&self, state: usize) -> f64 {
        debug_assert!(state < self.states);
        self.terminal[state]
    }
    pub fn transition(&self, from: usize, to: usize) -> f64 {
        debug_assert!(from < self.states && to < self.states);
        self.transition[from * self.states + to]
    }
    pub fn emission(&self, state: usize, symbol: usize) -> f64 {
        debug_assert!(state < self.states && symbol < self.symbols);
        self.emission[state * self.symbols + symbol]
    }
    /// ln Pr{from->*}
    pub fn transitions(&self, from: usize) -> &[f64] {
        &self.transition[from * self.states..(from + 1) * self.states]
    }
    /// ln Pr{*|state}
    pub fn emissions(&self, state: usize) -> &[f64] {
        &self.emission[state * self.symbols..(state + 1) * self.symbols]
    }
    pub fn initial_distribution(&self) -> &[f64] {
        &self.initial
    }
    pub fn terminal_distribution(&self) -> &[f64] {
        &self.terminal
    }
    pub fn set_initial(&mut self, state: usize, value: f64) {
        debug_assert!(state < self.states);
        self.initial[state] = value;
    }
    pub fn set_terminal(&mut self, state: usize, value: f64) {
        debug_assert!(state < self.states);
        self.terminal[state] = value;
    }
    pub fn set_transition(&mut self, from: usize, to: usize, value: f64) {
        debug_assert!(from < self.states && to < self.states);
        self.transition[from * self.states + to] = value;
    }
    pub fn set_emission(&mut self, state: usize, symbol: usize, value: f64) {
        debug_assert!(state < self.states && symbol < self.symbols);
        self.emission[state * self.symbols + symbol] = value;
    }
    /// Scale each row, p, and q to sum to one. All-zero rows are left as they are.
    pub fn normalize(&mut self) {
        normalize_log(&mut self.initial);
        normalize_log(&mut self.terminal);
        if self.states > 0 {
            self.transition
                .chunks_mut(self.states)
                .for_each(normalize_log);
        }
        if self.symbols > 0 {
            self.emission
                .chunks_mut(self.symbols)
                .for_each(normalize_log);
        }
    }
    /// Element-wise squared distance between the linear-space parameters.
    /// Return None if the two have different shapes.
    pub fn dist(&self, other: &Self) -> Option<f64> {
        let same = self.states == other.states && self.symbols == other.symbols;
        same.then(|| {
            let sq = |xs: &[f64], ys: &[f64]| -> f64 {
                xs.iter()
                    .zip(ys.iter())
                    .map(|(x, y)| (x.exp() - y.exp()).powi(2))
                    .sum()
            };
            sq(&self.initial, &other.initial)
                + sq(&self.terminal, &other.terminal)
                + sq(&self.transition, &other.transition)
                + sq(&self.emission, &other.emission)
        })
    }
    fn map_all<F: Fn(f64) -> f64>(&mut self, f: F) {
        self.initial
            .iter_mut()
            .chain(self.terminal.iter_mut())
            .chain(self.transition.iter_mut())
            .chain(self.emission.iter_mut())
            .for_each(|x| *x = f(*x));
    }
}

fn normalize_log(xs: &mut [f64]) {
    let sum = xs.iter().fold(f64::NEG_INFINITY, |acc, &x| log_add(acc, x));
    if sum == f64::NEG_INFINITY {
        return;
    }
    xs.iter_mut().for_each(|x| *x -= sum);
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Summary {
    pub model_probability: Option<f64>,
    pub best_path: Option<f64>,
}

/// Hidden Markov model with its caches.
/// The forward, backward, and Viterbi engines are methods of this struct, and
/// their results are computed lazily for the attached observations.
/// After mutating parameters through `set_*`, call [`Model::invalidate`].
#[derive(Debug)]
pub struct Model {
    params: Parameters,
    pseudo: f64,
    use_cache: bool,
    mask: Option<TrainingMask>,
    observations: Option<Arc<dyn Observations>>,
    caches: Arc<CacheSet>,
    generation: u64,
    summary: Mutex<Summary>,
}

impl Clone for Model {
    /// Copy of the parameters with its own, empty caches.
    fn clone(&self) -> Self {
        Self {
            params: self.params.clone(),
            pseudo: self.pseudo,
            use_cache: self.use_cache,
            mask: self.mask.clone(),
            observations: self.observations.clone(),
            caches: Arc::new(CacheSet::new(self.caches.workers())),
            generation: next_generation(),
            summary: Mutex::new(Summary::default()),
        }
    }
}

impl Model {
    pub fn new(params: Parameters, config: &ModelConfig) -> Self {
        Self {
            params,
            pseudo: config.pseudo,
            use_cache: config.use_cache,
            mask: None,
            observations: None,
            caches: Arc::new(CacheSet::new(config.workers)),
            generation: next_generation(),
            summary: Mutex::new(Summary::default()),
        }
    }
    /// Random model. Each row is drawn uniformly and then normalized.
    pub fn random<R: Rng>(states: usize, symbols: usize, config: &ModelConfig, rng: &mut R) -> Self {
        let mut draw = |len: usize| -> Vec<f64> {
            let xs: Vec<f64> = (0..len).map(|_| MIN_RAND + rng.gen::<f64>()).collect();
            let sum: f64 = xs.iter().sum();
            xs.iter().map(|x| log(x / sum)).collect()
        };
        let initial = draw(states);
        let terminal = draw(states);
        let transition: Vec<_> = (0..states).flat_map(|_| draw(states)).collect();
        let emission: Vec<_> = (0..states).flat_map(|_| draw(symbols)).collect();
        let params = Parameters {
            states,
            symbols,
            initial,
            terminal,
            transition,
            emission,
        };
        Self::new(params, config)
    }
    /// Model following a training mask. Cells neither learnable nor constant are zero,
    /// constant cells take their values, and learnable cells share, at random,
    /// the probability mass their row leaves after the constants.
    pub fn defined<R: Rng>(
        states: usize,
        symbols: usize,
        mask: TrainingMask,
        config: &ModelConfig,
        rng: &mut R,
    ) -> Result<Self> {
        mask.validate(states, symbols)?;
        let mut initial = vec![0f64; states];
        let mut terminal = vec![0f64; states];
        let mut transition = vec![0f64; states * states];
        let mut emission = vec![0f64; states * symbols];
        for (from, columns) in mask.transition_rows() {
            let fixed: f64 = mask
                .const_a()
                .iter()
                .filter(|&&(i, _, _)| i == from)
                .map(|x| x.2)
                .sum();
            let row = &mut transition[from * states..(from + 1) * states];
            fill_random(rng, &columns, fixed, row);
        }
        for (state, columns) in mask.emission_rows() {
            let fixed: f64 = mask
                .const_b()
                .iter()
                .filter(|&&(i, _, _)| i == state)
                .map(|x| x.2)
                .sum();
            let row = &mut emission[state * symbols..(state + 1) * symbols];
            fill_random(rng, &columns, fixed, row);
        }
        let fixed: f64 = mask.const_p().iter().map(|x| x.1).sum();
        fill_random(rng, mask.learn_p(), fixed, &mut initial);
        let fixed: f64 = mask.const_q().iter().map(|x| x.1).sum();
        fill_random(rng, mask.learn_q(), fixed, &mut terminal);
        for &(i, j, v) in mask.const_a() {
            transition[i * states + j] = v;
        }
        for &(i, k, v) in mask.const_b() {
            emission[i * symbols + k] = v;
        }
        for &(i, v) in mask.const_p() {
            initial[i] = v;
        }
        for &(i, v) in mask.const_q() {
            terminal[i] = v;
        }
        let params = Parameters::from_linear_elements(
            states,
            symbols,
            &initial,
            &terminal,
            &transition,
            &emission,
        )?;
        let mut model = Self::new(params, config);
        model.mask = Some(mask);
        Ok(model)
    }
    /// Model from linear-space probabilities.
    /// `transition[i][j]` is Pr{i->j} and `emission[i][k]` is Pr{k|i}.
    pub fn from_raw_elements(
        initial: &[f64],
        terminal: &[f64],
        transition: &[Vec<f64>],
        emission: &[Vec<f64>],
        config: &ModelConfig,
    ) -> Result<Self> {
        let states = initial.len();
        let symbols = emission.first().map(|row| row.len()).unwrap_or(0);
        if transition.iter().any(|row| row.len() != states) || transition.len() != states {
            return Err(Error::invalid("transition matrix should be N x N"));
        }
        if emission.iter().any(|row| row.len() != symbols) || emission.len() != states {
            return Err(Error::invalid("emission matrix should be N x M"));
        }
        let transition: Vec<_> = transition.iter().flatten().copied().collect();
        let emission: Vec<_> = emission.iter().flatten().copied().collect();
        let params = Parameters::from_linear_elements(
            states,
            symbols,
            initial,
            terminal,
            &transition,
            &emission,
        )?;
        Ok(Self::new(params, config))
    }
    /// Copy of this model sharing the cache storage.
    /// Tables written by one of them are never served to the other.
    pub fn clone_sharing_caches(&self) -> Self {
        Self {
            caches: Arc::clone(&self.caches),
            ..self.clone()
        }
    }
    pub fn shares_caches_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.caches, &other.caches)
    }
    pub fn parameters(&self) -> &Parameters {
        &self.params
    }
    /// Replace every parameter and invalidate. The shape should not change.
    pub fn set_parameters(&mut self, params: Parameters) {
        assert_eq!(self.states(), params.states);
        assert_eq!(self.symbols(), params.symbols);
        self.params = params;
        self.invalidate();
    }
    pub fn states(&self) -> usize {
        self.params.states
    }
    pub fn symbols(&self) -> usize {
        self.params.symbols
    }
    pub fn initial(&self, state: usize) -> f64 {
        self.params.initial(state)
    }
    pub fn terminal(&self, state: usize) -> f64 {
        self.params.terminal(state)
    }
    pub fn transition(&self, from: usize, to: usize) -> f64 {
        self.params.transition(from, to)
    }
    pub fn emission(&self, state: usize, symbol: usize) -> f64 {
        self.params.emission(state, symbol)
    }
    pub fn set_initial(&mut self, state: usize, value: f64) {
        self.params.set_initial(state, value);
    }
    pub fn set_terminal(&mut self, state: usize, value: f64) {
        self.params.set_terminal(state, value);
    }
    pub fn set_transition(&mut self, from: usize, to: usize, value: f64) {
        self.params.set_transition(from, to, value);
    }
    pub fn set_emission(&mut self, state: usize, symbol: usize, value: f64) {
        self.params.set_emission(state, symbol, value);
    }
    pub fn pseudo(&self) -> f64 {
        self.pseudo
    }
    pub fn set_pseudo(&mut self, pseudo: f64) {
        self.pseudo = pseudo;
    }
    pub fn workers(&self) -> usize {
        self.caches.workers()
    }
    pub fn use_cache(&self) -> bool {
        self.use_cache
    }
    pub fn mask(&self) -> Option<&TrainingMask> {
        self.mask.as_ref()
    }
    pub fn set_mask(&mut self, mask: Option<TrainingMask>) -> Result<()> {
        if let Some(mask) = mask.as_ref() {
            mask.validate(self.states(), self.symbols())?;
        }
        self.mask = mask;
        Ok(())
    }
    /// Attach observations. Every symbol should be less than the number of symbols.
    pub fn set_observations(&mut self, observations: Arc<dyn Observations>) -> Result<()> {
        let symbols = self.symbols();
        for dim in 0..observations.num_sequences() {
            for t in 0..observations.len(dim) {
                let x = observations.symbol(dim, t);
                if symbols <= x {
                    return Err(Error::invalid(format!(
                        "symbol {} at ({},{}) is out of the alphabet (< {})",
                        x, dim, t, symbols
                    )));
                }
            }
        }
        debug!(
            "Attach {} sequences (max length {})",
            observations.num_sequences(),
            observations.max_len()
        );
        self.observations = Some(observations);
        self.invalidate();
        Ok(())
    }
    pub fn observations(&self) -> Option<&Arc<dyn Observations>> {
        self.observations.as_ref()
    }
    pub(crate) fn share_observations(&mut self, other: &Self) {
        let same = match (self.observations.as_ref(), other.observations.as_ref()) {
            (Some(x), Some(y)) => Arc::ptr_eq(x, y),
            _ => false,
        };
        if !same {
            self.observations = other.observations.clone();
            self.invalidate();
        }
    }
    /// Attached observations. Calling an engine without them is a programming error.
    pub(crate) fn observation_set(&self) -> &dyn Observations {
        match self.observations.as_ref() {
            Some(obs) => obs.as_ref(),
            None => panic!("no observations are attached to the model"),
        }
    }
    pub fn num_sequences(&self) -> usize {
        self.observations
            .as_ref()
            .map(|obs| obs.num_sequences())
            .unwrap_or(0)
    }
    /// Forget every cached table and likelihood.
    pub fn invalidate(&mut self) {
        self.generation = next_generation();
        *self.summary_lock() = Summary::default();
    }
    /// Rescale every row to sum to one, see [`Parameters::normalize`].
    pub fn normalize(&mut self) {
        self.params.normalize();
        self.invalidate();
    }
    /// Set every parameter to ln(pseudo).
    pub fn clear(&mut self) {
        let pseudo = self.pseudo.ln();
        self.params.map_all(|_| pseudo);
        self.invalidate();
    }
    /// Set every learnable parameter to ln(pseudo).
    pub fn clear_defined(&mut self) {
        let pseudo = self.pseudo.ln();
        if let Some(mask) = self.mask.as_ref() {
            for &i in mask.learn_p() {
                self.params.set_initial(i, pseudo);
            }
            for &i in mask.learn_q() {
                self.params.set_terminal(i, pseudo);
            }
            for &(i, j) in mask.learn_a() {
                self.params.set_transition(i, j, pseudo);
            }
            for &(i, k) in mask.learn_b() {
                self.params.set_emission(i, k, pseudo);
            }
        }
        self.invalidate();
    }
    /// Copy the parameters of `other`. Shapes should be the same.
    pub fn copy_from(&mut self, other: &Self) {
        assert_eq!(self.states(), other.states());
        assert_eq!(self.symbols(), other.symbols());
        self.params.clone_from(&other.params);
        self.invalidate();
    }
    /// Parameters with probability below `value` are set to `ALMOST_NEG_INFTY`, then normalize.
    pub fn chop(&mut self, value: f64) {
        self.params.map_all(|x| match x.exp() < value {
            true => ALMOST_NEG_INFTY,
            false => x,
        });
        self.normalize();
    }
    /// Squared distance between the linear-space parameters of two models.
    pub fn dist(&self, other: &Self) -> Option<f64> {
        self.params.dist(&other.params)
    }
    /// Put `other` after this model. The states of `other` are numbered from `self.states()`.
    /// Ending in state i is replaced by a jump into state j of `other` with
    /// ln Pr{i->j} = q(i) + p'(j), so every path starts here and ends in `other`.
    /// Rows are not normalized.
    pub fn append_model(&mut self, other: &Model) -> Result<()> {
        if self.symbols() != other.symbols() {
            return Err(Error::invalid(format!(
                "cannot append a model of {} symbols to one of {} symbols",
                other.symbols(),
                self.symbols()
            )));
        }
        let (head, tail) = (self.states(), other.states());
        let states = head + tail;
        let mut initial = vec![f64::NEG_INFINITY; states];
        let mut terminal = vec![f64::NEG_INFINITY; states];
        let mut transition = vec![f64::NEG_INFINITY; states * states];
        initial[..head].copy_from_slice(self.params.initial_distribution());
        terminal[head..].copy_from_slice(other.params.terminal_distribution());
        for i in 0..head {
            let row = &mut transition[i * states..(i + 1) * states];
            row[..head].copy_from_slice(self.params.transitions(i));
            for (j, cell) in row[head..].iter_mut().enumerate() {
                *cell = self.terminal(i) + other.initial(j);
            }
        }
        for i in 0..tail {
            let row = &mut transition[(head + i) * states..(head + i + 1) * states];
            row[head..].copy_from_slice(other.params.transitions(i));
        }
        let mut emission = self.params.emission.clone();
        emission.extend_from_slice(&other.params.emission);
        let symbols = self.symbols();
        self.params = Parameters::from_parts(states, symbols, initial, terminal, transition, emission);
        debug!("Appended {} states after {} states", tail, head);
        self.invalidate();
        Ok(())
    }
    /// Add `num` states after the existing ones, then normalize.
    /// Every cell touching a new state, p, q, and the new emission rows included,
    /// is `default`. If `default` is zero, each of them is drawn at random instead.
    pub fn add_states<R: Rng>(&mut self, num: usize, default: f64, rng: &mut R) {
        let (old, symbols) = (self.states(), self.symbols());
        let states = old + num;
        let mut value = || match default == 0f64 {
            true => log(MIN_RAND_DEFINED + MAX_RAND_ADDED * rng.gen::<f64>()),
            false => log(default),
        };
        let mut initial = self.params.initial.clone();
        let mut terminal = self.params.terminal.clone();
        initial.extend((0..num).map(|_| value()));
        terminal.extend((0..num).map(|_| value()));
        let mut transition = Vec::with_capacity(states * states);
        for i in 0..states {
            if i < old {
                transition.extend_from_slice(self.params.transitions(i));
                transition.extend((0..num).map(|_| value()));
            } else {
                transition.extend((0..states).map(|_| value()));
            }
        }
        let mut emission = self.params.emission.clone();
        emission.extend((0..num * symbols).map(|_| value()));
        self.params = Parameters::from_parts(states, symbols, initial, terminal, transition, emission);
        self.normalize();
    }
    pub(crate) fn stamp(&self, dim: usize) -> Stamp {
        Stamp {
            generation: self.generation,
            dim,
        }
    }
    /// The cache slot of `dim`, or a fresh scratch slot if caching is disabled.
    pub(crate) fn slot(&self, dim: usize) -> SlotRef<'_> {
        if self.use_cache {
            SlotRef::Cached(self.caches.lock(dim))
        } else {
            SlotRef::Scratch(Box::default())
        }
    }
    pub(crate) fn harness(&self) -> Harness {
        Harness::new(self.workers())
    }
    pub(crate) fn summary_lock(&self) -> std::sync::MutexGuard<'_, Summary> {
        self.summary
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// Put random weights on `columns` of `row`, summing up to 1 - fixed.
fn fill_random<R: Rng>(rng: &mut R, columns: &[usize], fixed: f64, row: &mut [f64]) {
    let free = (1f64 - fixed).max(0f64);
    let weights: Vec<f64> = columns
        .iter()
        .map(|_| MIN_RAND_DEFINED + rng.gen::<f64>())
        .collect();
    let sum: f64 = weights.iter().sum();
    for (&j, w) in columns.iter().zip(weights) {
        row[j] = free * w / sum;
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let to_str = |xs: &[f64]| -> String {
            let xs: Vec<_> = xs.iter().map(|x| format!("{:.3}", x.exp())).collect();
            xs.join("\t")
        };
        writeln!(f, "States:{}", self.states())?;
        writeln!(f, "Symbols:{}", self.symbols())?;
        writeln!(f, "Initial:{}", to_str(self.params.initial_distribution()))?;
        writeln!(f, "Terminal:{}", to_str(self.params.terminal_distribution()))?;
        writeln!(f, "Transition:")?;
        for from in 0..self.states() {
            writeln!(f, "{}", to_str(self.params.transitions(from)))?;
        }
        writeln!(f, "Emission:")?;
        for state in 0..self.states() {
            writeln!(f, "{}", to_str(self.params.emissions(state)))?;
        }
        Ok(())
    }
}
