//! # crftag Trainer
//!
//! Dataset loading, training configuration and the SGD training loop for
//! the BiLSTM-CRF tagger in `crftag-core`, plus the entry points used by
//! the `crftag` command-line tool.

pub mod config;
pub mod dataset;
pub mod trainer;

pub use config::TrainConfig;
pub use dataset::{DatasetError, Example, builtin_dataset, load_dataset};
pub use trainer::{TrainReport, Trainer, run_prediction, run_training};
