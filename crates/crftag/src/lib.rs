//! # crftag
//!
//! BiLSTM-CRF sequence tagging. The model lives in [`crftag_core`]; dataset
//! loading and the training loop live in [`crftag_trainer`].

pub use crftag_core;
pub use crftag_trainer;

pub use crftag_core::{BiLstmCrf, ModelConfig, Prediction, Tag, Tagger, TaggerError, Vocabulary};
pub use crftag_trainer::{TrainConfig, TrainReport, Trainer};
