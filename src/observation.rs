//! Observation sequences consumed by the engines.
use crate::error::{Error, Result};

/// A fixed, in-memory set of symbol sequences. Symbols should be in `[0, M)` for a model with M symbols.
/// A sequence is addressed by its dimension `dim`.
pub trait Observations: std::fmt::Debug + Send + Sync {
    fn num_sequences(&self) -> usize;
    fn len(&self, dim: usize) -> usize;
    fn symbol(&self, dim: usize, t: usize) -> usize;
    fn max_len(&self) -> usize {
        (0..self.num_sequences())
            .map(|dim| self.len(dim))
            .max()
            .unwrap_or(0)
    }
}

const fn base_table() -> [u8; 256] {
    let mut slots = [u8::MAX; 256];
    slots[b'A' as usize] = 0;
    slots[b'C' as usize] = 1;
    slots[b'G' as usize] = 2;
    slots[b'T' as usize] = 3;
    slots[b'a' as usize] = 0;
    slots[b'c' as usize] = 1;
    slots[b'g' as usize] = 2;
    slots[b't' as usize] = 3;
    slots
}
const BASE_TABLE: [u8; 256] = base_table();

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceSet {
    sequences: Vec<Vec<usize>>,
}

impl SequenceSet {
    pub fn new(sequences: Vec<Vec<usize>>) -> Self {
        Self { sequences }
    }
    /// Map DNA sequences to symbols (A=0,C=1,G=2,T=3, case-insensitive).
    pub fn from_dna<T: std::borrow::Borrow<[u8]>>(seqs: &[T]) -> Result<Self> {
        let sequences = seqs
            .iter()
            .enumerate()
            .map(|(dim, seq)| {
                seq.borrow()
                    .iter()
                    .enumerate()
                    .map(|(t, &base)| match BASE_TABLE[base as usize] {
                        u8::MAX => Err(Error::invalid(format!(
                            "sequence {} has an invalid base {} at {}",
                            dim, base as char, t
                        ))),
                        x => Ok(x as usize),
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { sequences })
    }
    pub fn push(&mut self, seq: Vec<usize>) {
        self.sequences.push(seq);
    }
    pub fn sequences(&self) -> &[Vec<usize>] {
        &self.sequences
    }
    /// One plus the largest symbol, or zero when there is no symbol at all.
    pub fn alphabet_size(&self) -> usize {
        self.sequences
            .iter()
            .flat_map(|xs| xs.iter())
            .max()
            .map(|&x| x + 1)
            .unwrap_or(0)
    }
}

impl Observations for SequenceSet {
    fn num_sequences(&self) -> usize {
        self.sequences.len()
    }
    fn len(&self, dim: usize) -> usize {
        self.sequences[dim].len()
    }
    fn symbol(&self, dim: usize, t: usize) -> usize {
        self.sequences[dim][t]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn dna_to_symbols() {
        let set = SequenceSet::from_dna(&[b"ACGT".to_vec(), b"ttga".to_vec()]).unwrap();
        assert_eq!(set.num_sequences(), 2);
        assert_eq!(set.sequences()[0], vec![0, 1, 2, 3]);
        assert_eq!(set.sequences()[1], vec![3, 3, 2, 0]);
        assert_eq!(set.max_len(), 4);
        assert_eq!(set.alphabet_size(), 4);
    }
    #[test]
    fn invalid_base() {
        assert!(SequenceSet::from_dna(&[b"ACNT".to_vec()]).is_err());
    }
}
