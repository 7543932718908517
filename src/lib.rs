//! Log-space discrete hidden Markov models.
//! Forward/backward/Viterbi engines with per-sequence caches, Baum-Welch and Viterbi
//! re-estimation (optionally restricted by a training mask), k-best decoding,
//! likelihood derivatives, and the text and binary formats around them.
#[macro_use]
extern crate log;
pub mod backward;
pub mod cache;
pub mod derivatives;
pub mod dump;
pub mod error;
pub mod estimate;
pub mod fasta;
pub mod forward;
pub mod gen_seq;
pub mod kbest;
pub mod logspace;
pub mod mask;
pub mod model;
pub mod model_file;
pub mod observation;
pub mod parallel;
pub mod train;
pub mod viterbi;

pub use derivatives::ParameterIndex;
pub use error::{Error, Result};
pub use kbest::{LengthPenalty, ScoredPath, TransitionConstraint};
pub use mask::TrainingMask;
pub use model::{Model, ModelConfig, Parameters};
pub use observation::{Observations, SequenceSet};
pub use train::{Algorithm, TrainConfig, TrainReport, Trainer};
