//! # crftag Core
//!
//! BiLSTM-CRF sequence labeling on top of candle: the BIO tag set, word
//! vocabulary, the model itself, the CRF layer with its Viterbi decoder,
//! and an SGD optimizer with weight decay.
//!
//! ## Quick Start
//!
//! ```rust
//! use candle_core::Device;
//! use crftag_core::{ModelConfig, Tagger, Vocabulary};
//!
//! let sentence = ["georgia", "tech", "is", "a", "university"];
//! let vocab = Vocabulary::from_sentences([&sentence[..]]);
//! let tagger = Tagger::new(vocab, ModelConfig::new(0), &Device::Cpu).unwrap();
//!
//! let prediction = tagger.predict(&sentence).unwrap();
//! assert_eq!(prediction.tags.len(), sentence.len());
//! ```
pub mod crf;
pub mod error;
pub mod model;
pub mod optim;
pub mod tagger;
pub mod tags;
pub mod vocab;

// Re-export primary API
pub use crf::{Crf, ViterbiDecoder};
pub use error::{Result, TaggerError};
pub use model::{BiLstmCrf, ModelConfig, Prediction};
pub use optim::{Sgd, SgdConfig};
pub use tagger::Tagger;
pub use tags::Tag;
pub use vocab::{UNK_TOKEN, Vocabulary};
