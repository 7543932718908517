//! Dumps of models, likelihoods, paths, and derivatives.
//! Binary dumps are streams of little-endian `f32`. A model dump is framed by
//! `(+inf, tag)` pairs: tag 1 opens the full layout, tag 2 the masked layout,
//! and tag 3 the trailer holding the parameter counts, `N`, and `M`.
use crate::error::{Error, Result};
use crate::logspace::finite_or_sentinel;
use crate::model::{Model, Parameters};
use std::io::{Read, Write};

const TAG_FULL: f32 = 1f32;
const TAG_MASKED: f32 = 2f32;
const TAG_TRAILER: f32 = 3f32;
const TRAILER_LEN: usize = 8;

/// A model read back from a binary dump. Values are log probabilities.
#[derive(Debug, Clone, PartialEq)]
pub enum BinaryModel {
    Full(Parameters),
    /// The learnable parameters only. Initial and terminal values are in the order of
    /// the mask's lists; the others carry their indices.
    Masked {
        states: usize,
        symbols: usize,
        initial: Vec<f64>,
        terminal: Vec<f64>,
        transition: Vec<(usize, usize, f64)>,
        emission: Vec<(usize, usize, f64)>,
    },
}

impl BinaryModel {
    // Number of derivatives per record in a derivatives dump ending with this model.
    fn num_parameters(&self) -> usize {
        match self {
            BinaryModel::Full(params) => {
                let (n, m) = (params.states(), params.symbols());
                2 * n + n * n + n * m
            }
            BinaryModel::Masked {
                initial,
                terminal,
                transition,
                emission,
                ..
            } => initial.len() + terminal.len() + transition.len() + emission.len(),
        }
    }
}

fn write_f32<W: Write>(wtr: &mut W, x: f64) -> Result<()> {
    wtr.write_all(&(x as f32).to_le_bytes())?;
    Ok(())
}

fn write_all_f32<W: Write>(wtr: &mut W, xs: &[f64]) -> Result<()> {
    xs.iter().try_for_each(|&x| write_f32(wtr, x))
}

/// Read every `f32` of the stream.
pub fn read_floats<R: Read>(mut reader: R) -> Result<Vec<f32>> {
    let mut bytes = vec![];
    reader.read_to_end(&mut bytes)?;
    if bytes.len() % 4 != 0 {
        return Err(Error::invalid(format!(
            "{} bytes is not a stream of f32",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|x| f32::from_le_bytes([x[0], x[1], x[2], x[3]]))
        .collect())
}

/// Binary dump of the model. Only the learnable parameters are written if the model has a mask.
pub fn write_model_bin<W: Write>(wtr: &mut W, model: &Model) -> Result<()> {
    let params = model.parameters();
    let (n, m) = (model.states(), model.symbols());
    let counts = match model.mask() {
        None => {
            write_all_f32(wtr, &[f64::INFINITY, TAG_FULL as f64])?;
            write_all_f32(wtr, params.initial_distribution())?;
            write_all_f32(wtr, params.terminal_distribution())?;
            for i in 0..n {
                write_all_f32(wtr, params.transitions(i))?;
            }
            for i in 0..n {
                write_all_f32(wtr, params.emissions(i))?;
            }
            [n, n, n * n, n * m]
        }
        Some(mask) => {
            write_all_f32(wtr, &[f64::INFINITY, TAG_MASKED as f64])?;
            for &i in mask.learn_p() {
                write_f32(wtr, params.initial(i))?;
            }
            for &i in mask.learn_q() {
                write_f32(wtr, params.terminal(i))?;
            }
            for &(i, j) in mask.learn_a() {
                write_all_f32(wtr, &[i as f64, j as f64, params.transition(i, j)])?;
            }
            for &(i, k) in mask.learn_b() {
                write_all_f32(wtr, &[i as f64, k as f64, params.emission(i, k)])?;
            }
            let (lp, lq) = (mask.learn_p().len(), mask.learn_q().len());
            [lp, lq, mask.learn_a().len(), mask.learn_b().len()]
        }
    };
    debug!("Wrote {:?} parameters", counts);
    write_all_f32(wtr, &[f64::INFINITY, TAG_TRAILER as f64])?;
    let trailer = [counts[0], counts[1], counts[2], counts[3], n, m];
    trailer.iter().try_for_each(|&x| write_f32(wtr, x as f64))
}

fn malformed<S: Into<String>>(message: S) -> Error {
    Error::invalid(format!("malformed model dump: {}", message.into()))
}

fn to_count(x: f32) -> Result<usize> {
    match x {
        x if 0f32 <= x && x.fract() == 0f32 => Ok(x as usize),
        x => Err(malformed(format!("{} is not a count", x))),
    }
}

// Parse a model dump occupying the whole of `xs`.
fn parse_model_bin(xs: &[f32]) -> Result<BinaryModel> {
    if xs.len() < 2 + TRAILER_LEN {
        return Err(malformed(format!("only {} values", xs.len())));
    }
    let (body, trailer) = xs.split_at(xs.len() - TRAILER_LEN);
    if trailer[0] != f32::INFINITY || trailer[1] != TAG_TRAILER {
        return Err(malformed("no trailer"));
    }
    let counts: Vec<usize> = trailer[2..]
        .iter()
        .map(|&x| to_count(x))
        .collect::<Result<_>>()?;
    let (n, m) = (counts[4], counts[5]);
    if body[0] != f32::INFINITY {
        return Err(malformed("no header"));
    }
    let (tag, body) = (body[1], &body[2..]);
    let log = |x: &f32| *x as f64;
    if tag == TAG_FULL {
        if counts[..4] != [n, n, n * n, n * m] || body.len() != 2 * n + n * n + n * m {
            return Err(malformed(format!("{:?} does not fit {} values", counts, body.len())));
        }
        let (p, rest) = body.split_at(n);
        let (q, rest) = rest.split_at(n);
        let (a, b) = rest.split_at(n * n);
        let params = Parameters::from_log_elements(
            n,
            m,
            p.iter().map(log).collect(),
            q.iter().map(log).collect(),
            a.iter().map(log).collect(),
            b.iter().map(log).collect(),
        )?;
        Ok(BinaryModel::Full(params))
    } else if tag == TAG_MASKED {
        let (lp, lq, la, lb) = (counts[0], counts[1], counts[2], counts[3]);
        if body.len() != lp + lq + 3 * la + 3 * lb {
            return Err(malformed(format!("{:?} does not fit {} values", counts, body.len())));
        }
        let (p, rest) = body.split_at(lp);
        let (q, rest) = rest.split_at(lq);
        let (a, b) = rest.split_at(3 * la);
        let cells = |xs: &[f32]| -> Result<Vec<(usize, usize, f64)>> {
            xs.chunks_exact(3)
                .map(|x| Ok((to_count(x[0])?, to_count(x[1])?, x[2] as f64)))
                .collect()
        };
        Ok(BinaryModel::Masked {
            states: n,
            symbols: m,
            initial: p.iter().map(log).collect(),
            terminal: q.iter().map(log).collect(),
            transition: cells(a)?,
            emission: cells(b)?,
        })
    } else {
        Err(malformed(format!("unknown tag {}", tag)))
    }
}

/// Read a binary model dump.
pub fn read_model_bin<R: Read>(reader: R) -> Result<BinaryModel> {
    parse_model_bin(&read_floats(reader)?)
}

/// Per-dimension derivatives of the likelihood, each record led by `P(d)`, followed by the model dump.
pub fn write_model_derivatives_bin<W: Write>(wtr: &mut W, model: &Model) -> Result<()> {
    if model.mask().is_none() {
        warn!("No definitions loaded. Writing derivatives of all the parameters.");
    }
    let harness = model.harness();
    for batch in harness.batches(model.num_sequences()) {
        harness.prefetch_forward(model, batch.clone());
        for dim in batch {
            write_f32(wtr, model.model_probability(dim))?;
            write_all_f32(wtr, &model.model_derivatives(dim))?;
        }
    }
    write_model_bin(wtr, model)
}

/// Per-dimension path derivatives, each record led by the best-path log-probability,
/// followed by the model dump.
pub fn write_path_derivatives_bin<W: Write>(wtr: &mut W, model: &Model) -> Result<()> {
    if model.mask().is_none() {
        warn!("No definitions loaded. Writing derivatives of all the parameters.");
    }
    let harness = model.harness();
    for batch in harness.batches(model.num_sequences()) {
        harness.prefetch_path(model, batch.clone());
        for dim in batch {
            write_f32(wtr, model.best_path(dim))?;
            write_all_f32(wtr, &model.path_derivatives(dim))?;
        }
    }
    write_model_bin(wtr, model)
}

/// Split a derivatives dump into its records and the trailing model.
pub fn read_derivatives_bin<R: Read>(reader: R) -> Result<(Vec<Vec<f32>>, BinaryModel)> {
    let xs = read_floats(reader)?;
    if xs.len() < TRAILER_LEN {
        return Err(malformed(format!("only {} values", xs.len())));
    }
    let counts: Vec<usize> = xs[xs.len() - TRAILER_LEN + 2..]
        .iter()
        .map(|&x| to_count(x))
        .collect::<Result<_>>()?;
    let (n, m) = (counts[4], counts[5]);
    // The layout tag is not known yet; try the full one first.
    let full = 2 + 2 * n + n * n + n * m + TRAILER_LEN;
    let masked = 2 + counts[0] + counts[1] + 3 * (counts[2] + counts[3]) + TRAILER_LEN;
    let model_len = [full, masked]
        .iter()
        .copied()
        .find(|&len| {
            len <= xs.len()
                && xs[xs.len() - len] == f32::INFINITY
                && parse_model_bin(&xs[xs.len() - len..]).is_ok()
        })
        .ok_or_else(|| malformed("no model at the end"))?;
    let (records, model) = xs.split_at(xs.len() - model_len);
    let model = parse_model_bin(model)?;
    let width = 1 + model.num_parameters();
    if records.len() % width != 0 {
        return Err(malformed(format!(
            "{} values are not records of {}",
            records.len(),
            width
        )));
    }
    let records = records.chunks_exact(width).map(|x| x.to_vec()).collect();
    Ok((records, model))
}

/// One `f32` log-likelihood per dimension.
pub fn write_likelihood_bin<W: Write>(wtr: &mut W, model: &Model) -> Result<()> {
    let harness = model.harness();
    for batch in harness.batches(model.num_sequences()) {
        harness.prefetch_forward(model, batch.clone());
        for dim in batch {
            write_f32(wtr, model.model_probability(dim))?;
        }
    }
    Ok(())
}

/// Log-likelihoods as a text array `P=[...];`.
pub fn write_likelihood<W: Write>(wtr: &mut W, model: &Model) -> Result<()> {
    writeln!(wtr, "% likelihood of model per observation")?;
    writeln!(wtr, "% P[O|model]=[ P[O|model]_1 P[O|model]_2 ... P[O|model]_dim ]")?;
    write!(wtr, "P=[")?;
    for dim in 0..model.num_sequences() {
        write!(wtr, "{:e} ", finite_or_sentinel(model.model_probability(dim)))?;
    }
    writeln!(wtr, "];")?;
    Ok(())
}

/// The best path of every dimension with its log-probability.
pub fn write_path<W: Write>(wtr: &mut W, model: &Model) -> Result<()> {
    let harness = model.harness();
    for batch in harness.batches(model.num_sequences()) {
        harness.prefetch_path(model, batch.clone());
        for dim in batch {
            let (lk, path) = model.decode(dim);
            let path: Vec<_> = path.iter().map(|s| s.to_string()).collect();
            writeln!(wtr, "{}. path probability:{:e}", dim, finite_or_sentinel(lk))?;
            writeln!(wtr, "state sequence:\n{}\n", path.join(" "))?;
        }
    }
    Ok(())
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
    fn to_f32(xs: &[f64]) -> Vec<f32> {
        xs.iter().map(|&x| x as f32).collect()
    }
    #[test]
    fn binary_round_trip() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(23);
        let mut model = Model::random(3, 5, &ModelConfig::default(), &mut rng);
        model.set_emission(2, 4, f64::NEG_INFINITY);
        let mut buf = vec![];
        write_model_bin(&mut buf, &model).unwrap();
        assert_eq!(buf.len(), 4 * (2 + 6 + 9 + 15 + 8));
        let params = match read_model_bin(buf.as_slice()).unwrap() {
            BinaryModel::Full(params) => params,
            x => panic!("{:?}", x),
        };
        let original = model.parameters();
        assert_eq!(params.states(), 3);
        assert_eq!(params.symbols(), 5);
        assert_eq!(
            to_f32(params.initial_distribution()),
            to_f32(original.initial_distribution())
        );
        for i in 0..3 {
            assert_eq!(to_f32(params.transitions(i)), to_f32(original.transitions(i)));
            assert_eq!(to_f32(params.emissions(i)), to_f32(original.emissions(i)));
        }
        assert_eq!(params.emission(2, 4), f64::NEG_INFINITY);
    }
    #[test]
    fn masked_binary_layout() {
        let mut model = sticky_model();
        let mask = TrainingMask::new()
            .learn_transition(0, 1)
            .learn_emission(1, 2)
            .learn_terminal(0);
        model.set_mask(Some(mask)).unwrap();
        let mut buf = vec![];
        write_model_bin(&mut buf, &model).unwrap();
        let xs = read_floats(buf.as_slice()).unwrap();
        assert_eq!(xs[0], f32::INFINITY);
        assert_eq!(xs[1], 2f32);
        assert_eq!(xs.len(), 2 + 1 + 3 + 3 + 8);
        assert_eq!(&xs[xs.len() - 6..], &[0f32, 1f32, 1f32, 1f32, 2f32, 4f32]);
        match read_model_bin(buf.as_slice()).unwrap() {
            BinaryModel::Masked {
                states,
                symbols,
                initial,
                terminal,
                transition,
                emission,
            } => {
                assert_eq!((states, symbols), (2, 4));
                assert!(initial.is_empty());
                assert_eq!(terminal, vec![model.terminal(0) as f32 as f64]);
                assert_eq!(transition, vec![(0, 1, model.transition(0, 1) as f32 as f64)]);
                assert_eq!(emission.len(), 1);
                assert_eq!((emission[0].0, emission[0].1), (1, 2));
            }
            x => panic!("{:?}", x),
        }
        assert!(read_model_bin(&buf[..buf.len() - 4]).is_err());
    }
    #[test]
    fn derivatives_dump() {
        let mut model = sticky_model();
        let seqs = vec![vec![0, 0, 1], vec![3, 2, 1, 0], vec![1, 1]];
        model.set_observations(Arc::new(SequenceSet::new(seqs))).unwrap();
        let mut buf = vec![];
        write_model_derivatives_bin(&mut buf, &model).unwrap();
        let (records, dumped) = read_derivatives_bin(buf.as_slice()).unwrap();
        assert_eq!(records.len(), 3);
        assert!(matches!(dumped, BinaryModel::Full(_)));
        for (dim, record) in records.iter().enumerate() {
            assert_eq!(record.len(), 1 + 2 + 2 + 4 + 8);
            assert_eq!(record[0], model.model_probability(dim) as f32);
            assert_eq!(record[1], model.model_derivative_p(0, dim) as f32);
        }
        let mask = TrainingMask::new().learn_transition(1, 0).learn_initial(1);
        model.set_mask(Some(mask)).unwrap();
        let mut buf = vec![];
        write_path_derivatives_bin(&mut buf, &model).unwrap();
        let (records, dumped) = read_derivatives_bin(buf.as_slice()).unwrap();
        assert_eq!(records.len(), 3);
        assert!(matches!(dumped, BinaryModel::Masked { .. }));
        assert_eq!(records[0].len(), 3);
        assert_eq!(records[0][0], model.best_path(0) as f32);
        assert_eq!(records[0][1], model.path_derivative_p(1, 0) as f32);
    }
    #[test]
    fn likelihood_dumps() {
        let mut model = sticky_model();
        let seqs = vec![vec![0, 0, 1], vec![], vec![1, 1]];
        model.set_observations(Arc::new(SequenceSet::new(seqs))).unwrap();
        let mut buf = vec![];
        write_likelihood_bin(&mut buf, &model).unwrap();
        let xs = read_floats(buf.as_slice()).unwrap();
        assert_eq!(xs.len(), 3);
        assert_eq!(xs[0], model.model_probability(0) as f32);
        assert_eq!(xs[1], f32::NEG_INFINITY);
        let mut buf = vec![];
        write_likelihood(&mut buf, &model).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("P=["));
        assert!(text.contains("-1e3"));
        let mut buf = vec![];
        write_path(&mut buf, &model).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("0. path probability:"));
        assert!(text.contains("state sequence:\n0 0 1\n"));
    }
}
