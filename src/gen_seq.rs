//! This module is to generate some random sequences to assess the engines.
//! Usually, it would not be used in the real-applications.
use crate::error::{Error, Result};
use crate::model::Model;
use rand::seq::SliceRandom;
use rand::Rng;

/// Random DNA sequence of length `len`.
pub fn generate_seq<T: Rng>(rng: &mut T, len: usize) -> Vec<u8> {
    let bases = b"ACTG";
    (0..len)
        .filter_map(|_| bases.choose(rng))
        .copied()
        .collect()
}

/// Uniformly random symbols in `[0, symbols)`.
pub fn random_symbols<T: Rng>(rng: &mut T, len: usize, symbols: usize) -> Vec<usize> {
    (0..len).map(|_| rng.gen_range(0..symbols)).collect()
}

/// Sample a state path and its emissions of length `len` from `model`.
/// The path starts from the initial distribution and follows the transitions;
/// the end distribution is not used since the length is given.
pub fn sample<T: Rng>(model: &Model, rng: &mut T, len: usize) -> Result<(Vec<usize>, Vec<usize>)> {
    let (states, symbols) = (model.states(), model.symbols());
    let choose = |rng: &mut T, weights: &[f64]| -> Result<usize> {
        let indices: Vec<usize> = (0..weights.len()).collect();
        indices
            .choose_weighted(rng, |&i| weights[i].exp())
            .map(|&i| i)
            .map_err(|why| Error::invalid(format!("cannot sample:{}", why)))
    };
    let params = model.parameters();
    let mut path = Vec::with_capacity(len);
    let mut emissions = Vec::with_capacity(len);
    for t in 0..len {
        let state = match t {
            0 => choose(rng, params.initial_distribution())?,
            _ => choose(rng, params.transitions(path[t - 1]))?,
        };
        debug_assert!(state < states);
        let symbol = choose(rng, params.emissions(state))?;
        debug_assert!(symbol < symbols);
        path.push(state);
        emissions.push(symbol);
    }
    Ok((path, emissions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelConfig;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    #[test]
    fn random_symbols_in_range() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(34);
        let xs = random_symbols(&mut rng, 1000, 3);
        assert_eq!(xs.len(), 1000);
        assert!(xs.iter().all(|&x| x < 3));
        let seq = generate_seq(&mut rng, 100);
        assert!(seq.iter().all(|x| b"ACGT".contains(x)));
    }
    #[test]
    fn sample_follows_zero_transitions() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(9);
        // State 0 always moves to 1, which only emits symbol 1.
        let model = Model::from_raw_elements(
            &[1.0, 0.0],
            &[0.5, 0.5],
            &[vec![0.0, 1.0], vec![0.0, 1.0]],
            &[vec![1.0, 0.0], vec![0.0, 1.0]],
            &ModelConfig::default(),
        )
        .unwrap();
        let (path, xs) = sample(&model, &mut rng, 20).unwrap();
        assert_eq!(path[0], 0);
        assert!(path[1..].iter().all(|&s| s == 1));
        assert_eq!(xs[0], 0);
        assert!(xs[1..].iter().all(|&x| x == 1));
    }
}
