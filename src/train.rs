//! Iterative training until the aggregate score stops changing.
use crate::model::Model;

/// Re-estimation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    BaumWelch,
    /// Baum-Welch on p, q, and the transitions only.
    BaumWelchTransitions,
    Viterbi,
}

impl std::str::FromStr for Algorithm {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baum-welch" | "bw" => Ok(Algorithm::BaumWelch),
            "baum-welch-trans" | "bw-trans" => Ok(Algorithm::BaumWelchTransitions),
            "viterbi" | "vit" => Ok(Algorithm::Viterbi),
            _ => Err(format!("{} is not an algorithm", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Maximum number of rounds.
    pub iterations: usize,
    /// Two aggregates closer than this are regarded as equal.
    pub epsilon: f64,
    /// Stop after this many consecutive rounds without change.
    pub patience: usize,
    pub algorithm: Algorithm,
    /// If true, only the learnable parameters of the training mask are estimated.
    pub defined: bool,
}

impl TrainConfig {
    pub fn new(iterations: usize, epsilon: f64, patience: usize, algorithm: Algorithm, defined: bool) -> Self {
        Self {
            iterations,
            epsilon,
            patience,
            algorithm,
            defined,
        }
    }
}

impl std::default::Default for TrainConfig {
    fn default() -> Self {
        Self::new(100, 0.000_001, 5, Algorithm::BaumWelch, false)
    }
}

#[derive(Debug, Clone)]
pub struct TrainReport {
    pub iterations: usize,
    /// Aggregate score of the model fed into each round.
    pub likelihoods: Vec<f64>,
    pub converged: bool,
}

#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainConfig,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }
    fn step(&self, target: &mut Model, train: &Model) -> f64 {
        match (self.config.algorithm, self.config.defined) {
            (Algorithm::BaumWelch, false) => target.estimate_baum_welch(train),
            (Algorithm::BaumWelch, true) => target.estimate_baum_welch_defined(train),
            (Algorithm::BaumWelchTransitions, _) => target.estimate_baum_welch_trans(train),
            (Algorithm::Viterbi, false) => target.estimate_viterbi(train),
            (Algorithm::Viterbi, true) => target.estimate_viterbi_defined(train),
        }
    }
    /// Train `model` on its observations. Returns the last estimated model.
    /// The model and its working copy share the cache storage.
    pub fn run(&self, model: Model) -> (Model, TrainReport) {
        let mut train = model;
        let mut target = train.clone_sharing_caches();
        let mut likelihoods: Vec<f64> = vec![];
        let (mut stable, mut converged) = (0, false);
        for i in 0..self.config.iterations {
            let lk = self.step(&mut target, &train);
            std::mem::swap(&mut target, &mut train);
            info!("ITER\t{}\t{:.6}", i, lk);
            if let Some(&prev) = likelihoods.last() {
                // Two -inf aggregates are equal, but their difference is NaN.
                if prev == lk || (prev - lk).abs() < self.config.epsilon {
                    stable += 1;
                } else {
                    stable = 0;
                }
            }
            likelihoods.push(lk);
            if self.config.patience <= stable {
                converged = true;
                break;
            }
        }
        let report = TrainReport {
            iterations: likelihoods.len(),
            likelihoods,
            converged,
        };
        debug!("Trained {} rounds. Converged:{}", report.iterations, report.converged);
        (train, report)
    }
}
