//! Which parameters are free to learn and which are pinned to constants.
//! The "defined" initializers and estimators only touch the cells listed here.
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Training mask.
/// Every list is kept sorted by its primary index (and then by the secondary one),
/// so that the cells sharing a row are contiguous.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMask {
    learn_a: Vec<(usize, usize)>,
    learn_b: Vec<(usize, usize)>,
    learn_p: Vec<usize>,
    learn_q: Vec<usize>,
    const_a: Vec<(usize, usize, f64)>,
    const_b: Vec<(usize, usize, f64)>,
    const_p: Vec<(usize, f64)>,
    const_q: Vec<(usize, f64)>,
}

impl TrainingMask {
    pub fn new() -> Self {
        Self::default()
    }
    /// Mark every parameter of a `states` x `symbols` model as learnable.
    pub fn full(states: usize, symbols: usize) -> Self {
        let learn_a = (0..states)
            .flat_map(|i| (0..states).map(move |j| (i, j)))
            .collect();
        let learn_b = (0..states)
            .flat_map(|i| (0..symbols).map(move |k| (i, k)))
            .collect();
        Self {
            learn_a,
            learn_b,
            learn_p: (0..states).collect(),
            learn_q: (0..states).collect(),
            ..Self::default()
        }
    }
    /// Build a mask from raw lists. Lists are sorted and deduplicated.
    #[allow(clippy::too_many_arguments)]
    pub fn from_raw_elements(
        mut learn_a: Vec<(usize, usize)>,
        mut learn_b: Vec<(usize, usize)>,
        mut learn_p: Vec<usize>,
        mut learn_q: Vec<usize>,
        mut const_a: Vec<(usize, usize, f64)>,
        mut const_b: Vec<(usize, usize, f64)>,
        mut const_p: Vec<(usize, f64)>,
        mut const_q: Vec<(usize, f64)>,
    ) -> Self {
        learn_a.sort_unstable();
        learn_a.dedup();
        learn_b.sort_unstable();
        learn_b.dedup();
        learn_p.sort_unstable();
        learn_p.dedup();
        learn_q.sort_unstable();
        learn_q.dedup();
        const_a.sort_by_key(|&(i, j, _)| (i, j));
        const_b.sort_by_key(|&(i, j, _)| (i, j));
        const_p.sort_by_key(|&(i, _)| i);
        const_q.sort_by_key(|&(i, _)| i);
        Self {
            learn_a,
            learn_b,
            learn_p,
            learn_q,
            const_a,
            const_b,
            const_p,
            const_q,
        }
    }
    pub fn learn_transition(mut self, from: usize, to: usize) -> Self {
        insert_sorted(&mut self.learn_a, (from, to));
        self
    }
    pub fn learn_emission(mut self, state: usize, symbol: usize) -> Self {
        insert_sorted(&mut self.learn_b, (state, symbol));
        self
    }
    pub fn learn_initial(mut self, state: usize) -> Self {
        insert_sorted(&mut self.learn_p, state);
        self
    }
    pub fn learn_terminal(mut self, state: usize) -> Self {
        insert_sorted(&mut self.learn_q, state);
        self
    }
    pub fn const_transition(mut self, from: usize, to: usize, prob: f64) -> Self {
        self.const_a.retain(|&(i, j, _)| (i, j) != (from, to));
        self.const_a.push((from, to, prob));
        self.const_a.sort_by_key(|&(i, j, _)| (i, j));
        self
    }
    pub fn const_emission(mut self, state: usize, symbol: usize, prob: f64) -> Self {
        self.const_b.retain(|&(i, k, _)| (i, k) != (state, symbol));
        self.const_b.push((state, symbol, prob));
        self.const_b.sort_by_key(|&(i, k, _)| (i, k));
        self
    }
    pub fn const_initial(mut self, state: usize, prob: f64) -> Self {
        self.const_p.retain(|&(i, _)| i != state);
        self.const_p.push((state, prob));
        self.const_p.sort_by_key(|&(i, _)| i);
        self
    }
    pub fn const_terminal(mut self, state: usize, prob: f64) -> Self {
        self.const_q.retain(|&(i, _)| i != state);
        self.const_q.push((state, prob));
        self.const_q.sort_by_key(|&(i, _)| i);
        self
    }
    pub fn learn_a(&self) -> &[(usize, usize)] {
        &self.learn_a
    }
    pub fn learn_b(&self) -> &[(usize, usize)] {
        &self.learn_b
    }
    pub fn learn_p(&self) -> &[usize] {
        &self.learn_p
    }
    pub fn learn_q(&self) -> &[usize] {
        &self.learn_q
    }
    pub fn const_a(&self) -> &[(usize, usize, f64)] {
        &self.const_a
    }
    pub fn const_b(&self) -> &[(usize, usize, f64)] {
        &self.const_b
    }
    pub fn const_p(&self) -> &[(usize, f64)] {
        &self.const_p
    }
    pub fn const_q(&self) -> &[(usize, f64)] {
        &self.const_q
    }
    /// Learnable transition cells grouped by their source state.
    pub fn transition_rows(&self) -> Vec<(usize, Vec<usize>)> {
        group_by_row(&self.learn_a)
    }
    /// Learnable emission cells grouped by their state.
    pub fn emission_rows(&self) -> Vec<(usize, Vec<usize>)> {
        group_by_row(&self.learn_b)
    }
    /// Check every index against the model shape. A cell may not be both learnable and constant.
    pub fn validate(&self, states: usize, symbols: usize) -> Result<()> {
        let check = |what: &str, idx: usize, bound: usize| {
            if idx < bound {
                Ok(())
            } else {
                Err(Error::invalid(format!(
                    "{} index {} is out of range (< {})",
                    what, idx, bound
                )))
            }
        };
        for &(i, j) in self.learn_a.iter() {
            check("learn_a", i, states)?;
            check("learn_a", j, states)?;
        }
        for &(i, k) in self.learn_b.iter() {
            check("learn_b", i, states)?;
            check("learn_b", k, symbols)?;
        }
        for &i in self.learn_p.iter().chain(self.learn_q.iter()) {
            check("learn_p/learn_q", i, states)?;
        }
        for &(i, j, v) in self.const_a.iter() {
            check("const_a", i, states)?;
            check("const_a", j, states)?;
            check_prob(v)?;
            if self.learn_a.binary_search(&(i, j)).is_ok() {
                return Err(Error::invalid(format!("a[{}][{}] is learnable and constant", i, j)));
            }
        }
        for &(i, k, v) in self.const_b.iter() {
            check("const_b", i, states)?;
            check("const_b", k, symbols)?;
            check_prob(v)?;
            if self.learn_b.binary_search(&(i, k)).is_ok() {
                return Err(Error::invalid(format!("b[{}][{}] is learnable and constant", i, k)));
            }
        }
        for &(i, v) in self.const_p.iter() {
            check("const_p", i, states)?;
            check_prob(v)?;
            if self.learn_p.binary_search(&i).is_ok() {
                return Err(Error::invalid(format!("p[{}] is learnable and constant", i)));
            }
        }
        for &(i, v) in self.const_q.iter() {
            check("const_q", i, states)?;
            check_prob(v)?;
            if self.learn_q.binary_search(&i).is_ok() {
                return Err(Error::invalid(format!("q[{}] is learnable and constant", i)));
            }
        }
        Ok(())
    }
    pub fn num_learnable(&self) -> usize {
        self.learn_a.len() + self.learn_b.len() + self.learn_p.len() + self.learn_q.len()
    }
}

fn check_prob(v: f64) -> Result<()> {
    if (0f64..=1f64).contains(&v) {
        Ok(())
    } else {
        Err(Error::invalid(format!("{} is not a probability", v)))
    }
}

fn insert_sorted<T: Ord>(xs: &mut Vec<T>, x: T) {
    if let Err(pos) = xs.binary_search(&x) {
        xs.insert(pos, x);
    }
}

// The cells should be sorted.
fn group_by_row(cells: &[(usize, usize)]) -> Vec<(usize, Vec<usize>)> {
    let mut rows: Vec<(usize, Vec<usize>)> = vec![];
    for &(i, j) in cells {
        match rows.last_mut() {
            Some((row, columns)) if *row == i => columns.push(j),
            _ => rows.push((i, vec![j])),
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn rows_are_grouped() {
        let mask = TrainingMask::new()
            .learn_transition(1, 0)
            .learn_transition(0, 2)
            .learn_transition(0, 1)
            .learn_transition(0, 1);
        assert_eq!(mask.learn_a(), &[(0, 1), (0, 2), (1, 0)]);
        let rows = mask.transition_rows();
        assert_eq!(rows, vec![(0, vec![1, 2]), (1, vec![0])]);
    }
    #[test]
    fn validate_range() {
        let mask = TrainingMask::new().learn_emission(0, 4);
        assert!(mask.validate(2, 4).is_err());
        assert!(mask.validate(2, 5).is_ok());
    }
    #[test]
    fn validate_overlap() {
        let mask = TrainingMask::new()
            .learn_initial(0)
            .const_initial(0, 0.5);
        assert!(mask.validate(2, 2).is_err());
        let mask = TrainingMask::new()
            .learn_initial(0)
            .const_initial(1, 0.5);
        assert!(mask.validate(2, 2).is_ok());
    }
    #[test]
    fn full_mask() {
        let mask = TrainingMask::full(3, 4);
        assert_eq!(mask.num_learnable(), 9 + 12 + 3 + 3);
        assert!(mask.validate(3, 4).is_ok());
        assert_eq!(mask.emission_rows().len(), 3);
    }
}
