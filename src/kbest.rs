//! k-best Viterbi decoding.
//! Each state keeps its `nbest` best partial paths at every time step. Without constraints
//! a transition goes from `t-1` to `t`. A transition carrying a [`LengthPenalty`] may instead
//! reach back to any earlier step whose position distance lies in the penalty's range;
//! the steps in between are skipped, and the penalty of the distance is added.
use crate::error::{Error, Result};
use crate::model::Model;

/// Emission scores below this value prune the state at that step.
const PRUNE_THRESHOLD: f64 = -1e20;

/// A decoded path with its log-score. `times[k]` is the step at which `states[k]` was visited.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPath {
    pub score: f64,
    pub states: Vec<usize>,
    pub times: Vec<usize>,
}

/// Piecewise-linear log-penalty over segment lengths, defined on `[min_len, max_len]`.
/// Outside of `limits` the penalty is the nearest endpoint value.
#[derive(Debug, Clone, PartialEq)]
pub struct LengthPenalty {
    limits: Vec<usize>,
    penalties: Vec<f64>,
    min_len: usize,
    max_len: usize,
}

impl LengthPenalty {
    pub fn new(limits: Vec<usize>, penalties: Vec<f64>, min_len: usize, max_len: usize) -> Result<Self> {
        if limits.len() != penalties.len() {
            return Err(Error::invalid(format!(
                "{} limits and {} penalties",
                limits.len(),
                penalties.len()
            )));
        }
        if limits.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::invalid("limits should be strictly increasing"));
        }
        if min_len == 0 || max_len < min_len {
            return Err(Error::invalid(format!(
                "length range [{},{}] is empty",
                min_len, max_len
            )));
        }
        Ok(Self {
            limits,
            penalties,
            min_len,
            max_len,
        })
    }
    /// No penalty on `[min_len, max_len]`.
    pub fn flat(min_len: usize, max_len: usize) -> Result<Self> {
        Self::new(vec![], vec![], min_len, max_len)
    }
    pub fn min_len(&self) -> usize {
        self.min_len
    }
    pub fn max_len(&self) -> usize {
        self.max_len
    }
    pub fn lookup(&self, len: usize) -> f64 {
        if len < self.min_len || self.max_len < len {
            return f64::NEG_INFINITY;
        }
        let (limits, penalties) = (&self.limits, &self.penalties);
        match limits.binary_search(&len) {
            _ if limits.is_empty() => 0f64,
            Ok(idx) => penalties[idx],
            Err(0) => penalties[0],
            Err(idx) if idx == limits.len() => penalties[idx - 1],
            Err(idx) => {
                let (x0, x1) = (limits[idx - 1] as f64, limits[idx] as f64);
                let (y0, y1) = (penalties[idx - 1], penalties[idx]);
                y0 + (y1 - y0) * (len as f64 - x0) / (x1 - x0)
            }
        }
    }
}

/// Optional length penalties for each transition of an N-state model.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionConstraint {
    states: usize,
    penalties: Vec<Option<LengthPenalty>>,
}

impl TransitionConstraint {
    pub fn new(states: usize) -> Self {
        Self {
            states,
            penalties: vec![None; states * states],
        }
    }
    pub fn states(&self) -> usize {
        self.states
    }
    pub fn set(&mut self, from: usize, to: usize, penalty: LengthPenalty) {
        debug_assert!(from < self.states && to < self.states);
        self.penalties[from * self.states + to] = Some(penalty);
    }
    pub fn get(&self, from: usize, to: usize) -> Option<&LengthPenalty> {
        self.penalties[from * self.states + to].as_ref()
    }
    /// The largest number of steps a transition may span. At least one.
    pub fn max_look_back(&self) -> usize {
        self.penalties
            .iter()
            .filter_map(|p| p.as_ref().map(|p| p.max_len))
            .max()
            .unwrap_or(1)
            .max(1)
    }
}

#[derive(Debug, Clone, Copy)]
struct BackPointer {
    state: usize,
    rank: usize,
    time: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f64,
    from: BackPointer,
}

fn sort_descending(candidates: &mut [Candidate]) {
    // Stable, so that ties keep the smaller predecessor.
    candidates.sort_by(|x, y| y.score.total_cmp(&x.score));
}

impl Model {
    /// Emission log-scores of the `dim`-th sequence as a T x N table, indexed by `t * N + state`.
    pub fn emission_scores(&self, dim: usize) -> Vec<f64> {
        let obs = self.observation_set();
        (0..obs.len(dim))
            .flat_map(|t| {
                let x = obs.symbol(dim, t);
                (0..self.states()).map(move |j| self.emission(j, x))
            })
            .collect()
    }
    /// The `nbest` most probable state paths of the `dim`-th sequence, best first.
    /// An empty sequence has no path.
    pub fn best_paths(&self, dim: usize, nbest: usize) -> Vec<ScoredPath> {
        let scores = self.emission_scores(dim);
        let positions: Vec<usize> = (0..self.observation_set().len(dim)).collect();
        self.kbest(&scores, &positions, None, nbest)
    }
    /// k-best decoding over the T x N emission `scores` at the strictly increasing `positions`.
    /// Transitions with a penalty in `constraint` may span several steps.
    pub fn best_paths_constrained(
        &self,
        scores: &[f64],
        positions: &[usize],
        constraint: Option<&TransitionConstraint>,
        nbest: usize,
    ) -> Result<Vec<ScoredPath>> {
        let states = self.states();
        if scores.len() != positions.len() * states {
            return Err(Error::invalid(format!(
                "{} scores for {} positions and {} states",
                scores.len(),
                positions.len(),
                states
            )));
        }
        if positions.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::invalid("positions should be strictly increasing"));
        }
        if let Some(constraint) = constraint {
            if constraint.states() != states {
                return Err(Error::invalid(format!(
                    "constraint for {} states, model has {}",
                    constraint.states(),
                    states
                )));
            }
        }
        Ok(self.kbest(scores, positions, constraint, nbest))
    }
    fn kbest(
        &self,
        scores: &[f64],
        positions: &[usize],
        constraint: Option<&TransitionConstraint>,
        nbest: usize,
    ) -> Vec<ScoredPath> {
        let (len, states) = (positions.len(), self.states());
        if len == 0 || nbest == 0 {
            return vec![];
        }
        let look_back = constraint.map(|c| c.max_look_back()).unwrap_or(1);
        let depth = look_back.min(len - 1) + 1;
        // delta[(t % depth) * states * nbest + state * nbest + rank]
        let ring = states * nbest;
        let mut delta = vec![f64::NEG_INFINITY; depth * ring];
        let mut pointers: Vec<BackPointer> = (0..len)
            .flat_map(|t| {
                let prev = t.saturating_sub(1);
                std::iter::repeat(BackPointer {
                    state: 0,
                    rank: 0,
                    time: prev,
                })
                .take(ring)
            })
            .collect();
        // Predecessors with a non-zero transition.
        let predecessors: Vec<Vec<usize>> = (0..states)
            .map(|j| {
                (0..states)
                    .filter(|&i| self.transition(i, j).is_finite())
                    .collect()
            })
            .collect();
        // Initialize.
        for j in 0..states {
            delta[j * nbest] = self.initial(j) + scores[j];
        }
        // Recursion.
        let mut candidates = Vec::with_capacity(states * nbest * look_back);
        for t in 1..len {
            let current = (t % depth) * ring;
            delta[current..current + ring]
                .iter_mut()
                .for_each(|x| *x = f64::NEG_INFINITY);
            for j in 0..states {
                let score = scores[t * states + j];
                if score < PRUNE_THRESHOLD {
                    for rank in 0..nbest {
                        delta[current + j * nbest + rank] = score;
                    }
                    continue;
                }
                candidates.clear();
                for &i in predecessors[j].iter() {
                    let trans = self.transition(i, j);
                    let penalty = constraint.and_then(|c| c.get(i, j));
                    let steps = match penalty {
                        Some(_) => look_back.min(t),
                        None => 1,
                    };
                    for step in 1..=steps {
                        let prev = t - step;
                        let pen = match penalty {
                            Some(penalty) => penalty.lookup(positions[t] - positions[prev]),
                            None => 0f64,
                        };
                        if pen == f64::NEG_INFINITY {
                            continue;
                        }
                        let offset = (prev % depth) * ring + i * nbest;
                        for rank in 0..nbest {
                            let score = delta[offset + rank] + trans + pen;
                            if score == f64::NEG_INFINITY {
                                continue;
                            }
                            let from = BackPointer {
                                state: i,
                                rank,
                                time: prev,
                            };
                            candidates.push(Candidate { score, from });
                        }
                    }
                }
                sort_descending(&mut candidates);
                for (rank, cand) in candidates.iter().take(nbest).enumerate() {
                    delta[current + j * nbest + rank] = cand.score + score;
                    pointers[t * ring + j * nbest + rank] = cand.from;
                }
            }
        }
        // Terminate.
        let last = ((len - 1) % depth) * ring;
        let mut ends: Vec<Candidate> = (0..states)
            .flat_map(|i| (0..nbest).map(move |rank| (i, rank)))
            .map(|(i, rank)| Candidate {
                score: delta[last + i * nbest + rank] + self.terminal(i),
                from: BackPointer {
                    state: i,
                    rank,
                    time: len - 1,
                },
            })
            .collect();
        sort_descending(&mut ends);
        ends.truncate(nbest);
        ends.iter()
            .map(|end| {
                let (mut states_rev, mut times_rev) = (vec![], vec![]);
                let mut here = end.from;
                loop {
                    states_rev.push(here.state);
                    times_rev.push(here.time);
                    if here.time == 0 {
                        break;
                    }
                    here = pointers[here.time * ring + here.state * nbest + here.rank];
                }
                states_rev.reverse();
                times_rev.reverse();
                ScoredPath {
                    score: end.score,
                    states: states_rev,
                    times: times_rev,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelConfig;
    use crate::observation::SequenceSet;
    use rand::SeedableRng;
    use rand_xoshiro::Xoroshiro128PlusPlus;
    use std::sync::Arc;
    fn path_score(model: &Model, path: &[usize], xs: &[usize]) -> f64 {
        let mut score = model.initial(path[0]) + model.emission(path[0], xs[0]);
        for t in 1..xs.len() {
            score += model.transition(path[t - 1], path[t]) + model.emission(path[t], xs[t]);
        }
        score + model.terminal(path[xs.len() - 1])
    }
    #[test]
    fn single_best_equals_viterbi() {
        let mut rng: Xoroshiro128PlusPlus = SeedableRng::seed_from_u64(4234);
        for states in 1..6 {
            let mut model = Model::random(states, 4, &ModelConfig::default(), &mut rng);
            let seqs: Vec<_> = (0..5)
                .map(|i| crate::gen_seq::random_symbols(&mut rng, 1 + 17 * i, 4))
                .collect();
            model.set_observations(Arc::new(SequenceSet::new(seqs))).unwrap();
            for dim in 0..5 {
                let (lk, path) = model.decode(dim);
                let best = model.best_paths(dim, 1);
                assert_eq!(best.len(), 1);
                assert_eq!(best[0].score, lk);
                assert_eq!(best[0].states, path);
                let times: Vec<_> = (0..path.len()).collect();
                assert_eq!(best[0].times, times);
            }
        }
    }
    #[test]
    fn kbest_prunes_impossible_emission() {
        // State 0 never emits 1.
        let mut model = Model::from_raw_elements(
            &[0.5, 0.5],
            &[0.5, 0.5],
            &[vec![0.5, 0.5], vec![0.5, 0.5]],
            &[vec![1.0, 0.0], vec![0.5, 0.5]],
            &ModelConfig::default(),
        )
        .unwrap();
        let xs = vec![0, 1, 0];
        model
            .set_observations(Arc::new(SequenceSet::new(vec![xs.clone()])))
            .unwrap();
        let paths = model.best_paths(0, 3);
        assert_eq!(paths.len(), 3);
        for path in paths.iter() {
            assert_eq!(path.states[1], 1, "{:?}", path.states);
            assert!((path.score - path_score(&model, &path.states, &xs)).abs() < 1e-12);
        }
        for w in paths.windows(2) {
            assert!(w[1].score <= w[0].score);
        }
        let (lk, best) = model.decode(0);
        assert_eq!(paths[0].states, best);
        assert_eq!(paths[0].states, vec![0, 1, 0]);
        assert!((paths[0].score - lk).abs() < 1e-12);
        assert!((lk - (1f64 / 32f64).ln()).abs() < 1e-12);
        let mut seconds = vec![paths[1].states.clone(), paths[2].states.clone()];
        seconds.sort();
        assert_eq!(seconds, vec![vec![0, 1, 1], vec![1, 1, 0]]);
        for path in paths[1..].iter() {
            assert!((path.score - (1f64 / 64f64).ln()).abs() < 1e-12);
        }
        // Only four paths are possible.
        let paths = model.best_paths(0, 5);
        assert_eq!(paths.len(), 5);
        assert!((paths[3].score - (1f64 / 128f64).ln()).abs() < 1e-12);
        assert_eq!(paths[3].states, vec![1, 1, 1]);
        assert_eq!(paths[4].score, f64::NEG_INFINITY);
    }
    #[test]
    fn kbest_matches_enumeration() {
        let mut rng: Xoroshiro128PlusPlus = SeedableRng::seed_from_u64(32);
        let (states, len, nbest) = (3, 4, 5);
        let mut model = Model::random(states, 4, &ModelConfig::default(), &mut rng);
        let xs = crate::gen_seq::random_symbols(&mut rng, len, 4);
        model
            .set_observations(Arc::new(SequenceSet::new(vec![xs.clone()])))
            .unwrap();
        let mut all: Vec<f64> = (0..states.pow(len as u32))
            .map(|code| {
                let path: Vec<_> = (0..len)
                    .map(|t| code / states.pow(t as u32) % states)
                    .collect();
                path_score(&model, &path, &xs)
            })
            .collect();
        all.sort_by(|x, y| y.partial_cmp(x).unwrap());
        let paths = model.best_paths(0, nbest);
        assert_eq!(paths.len(), nbest);
        for (path, &expected) in paths.iter().zip(all.iter()) {
            assert!((path.score - expected).abs() < 1e-9, "{},{}", path.score, expected);
            let score = path_score(&model, &path.states, &xs);
            assert!((path.score - score).abs() < 1e-9, "{},{}", path.score, score);
        }
        for w in paths.windows(2) {
            assert!(w[1].score <= w[0].score);
            assert_ne!(w[0].states, w[1].states);
        }
    }
    #[test]
    fn empty_inputs() {
        let mut model = crate::forward::tests::sticky_model();
        model
            .set_observations(Arc::new(SequenceSet::new(vec![vec![], vec![0, 1]])))
            .unwrap();
        assert!(model.best_paths(0, 3).is_empty());
        assert!(model.best_paths(1, 0).is_empty());
    }
    #[test]
    fn length_penalty_lookup() {
        let penalty = LengthPenalty::new(vec![2, 4], vec![-1.0, -3.0], 1, 6).unwrap();
        assert_eq!(penalty.lookup(0), f64::NEG_INFINITY);
        assert_eq!(penalty.lookup(1), -1.0);
        assert_eq!(penalty.lookup(2), -1.0);
        assert!((penalty.lookup(3) + 2.0).abs() < 1e-12);
        assert_eq!(penalty.lookup(6), -3.0);
        assert_eq!(penalty.lookup(7), f64::NEG_INFINITY);
        assert!(LengthPenalty::new(vec![3, 2], vec![0.0, 0.0], 1, 4).is_err());
        assert!(LengthPenalty::flat(3, 2).is_err());
    }
    #[test]
    fn constrained_transition_skips_steps() {
        let model = Model::from_raw_elements(
            &[1.0, 0.0],
            &[0.5, 0.5],
            &[vec![0.5, 0.5], vec![0.5, 0.5]],
            &[vec![1.0], vec![1.0]],
            &ModelConfig::default(),
        )
        .unwrap();
        // Both states are poor at steps 1 and 2.
        let scores = vec![0.0, -50.0, -50.0, -50.0, -50.0, -50.0, -50.0, 0.0];
        let positions = vec![0, 1, 2, 3];
        let plain = model
            .best_paths_constrained(&scores, &positions, None, 1)
            .unwrap();
        assert_eq!(plain[0].states.len(), 4);
        assert!(plain[0].score < -99.0);
        let mut constraint = TransitionConstraint::new(2);
        constraint.set(0, 1, LengthPenalty::flat(1, 3).unwrap());
        assert_eq!(constraint.max_look_back(), 3);
        let jumped = model
            .best_paths_constrained(&scores, &positions, Some(&constraint), 2)
            .unwrap();
        assert_eq!(jumped[0].states, vec![0, 1]);
        assert_eq!(jumped[0].times, vec![0, 3]);
        let expected = 2.0 * 0.5f64.ln();
        assert!((jumped[0].score - expected).abs() < 1e-12);
        assert!(jumped[1].score < jumped[0].score);
        assert!(model
            .best_paths_constrained(&scores, &[0, 2, 1, 3], None, 1)
            .is_err());
        assert!(model
            .best_paths_constrained(&scores[1..], &positions, None, 1)
            .is_err());
    }
}
