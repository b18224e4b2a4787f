//! # Tagger
//!
//! A [`BiLstmCrf`] bundled with the [`Vocabulary`] it was trained with, so
//! raw tokens can be tagged and the pair saved and restored together.

use std::path::Path;

use candle_core::{Device, Tensor};

use crate::error::{Result, TaggerError};
use crate::model::{BiLstmCrf, ModelConfig, Prediction};
use crate::tags::Tag;
use crate::vocab::Vocabulary;

/// File holding the vocabulary inside a model directory.
pub const VOCAB_FILE: &str = "vocab.json";

pub struct Tagger {
    vocab: Vocabulary,
    model: BiLstmCrf,
}

impl Tagger {
    /// Create an untrained tagger sized for `vocab`. The config's
    /// `vocab_size` is overwritten with the vocabulary length.
    pub fn new(vocab: Vocabulary, config: ModelConfig, device: &Device) -> Result<Self> {
        let config = ModelConfig {
            vocab_size: vocab.len(),
            ..config
        };
        let model = BiLstmCrf::new(config, device)?;
        Ok(Self { vocab, model })
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn model(&self) -> &BiLstmCrf {
        &self.model
    }

    /// Scalar loss for a labeled sentence.
    pub fn loss<S: AsRef<str>>(&self, tokens: &[S], tags: &[Tag]) -> Result<Tensor> {
        self.model
            .neg_log_likelihood(&self.vocab.encode(tokens), tags)
    }

    /// Best tag sequence for a sentence.
    pub fn predict<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Prediction> {
        if tokens.is_empty() {
            return Err(TaggerError::EmptyInput);
        }
        self.model.forward(&self.vocab.encode(tokens))
    }

    /// Tag a sentence and pair every token with its tag.
    pub fn tag<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<(String, Tag)>> {
        let prediction = self.predict(tokens)?;
        Ok(tokens
            .iter()
            .map(|t| t.as_ref().to_string())
            .zip(prediction.tags)
            .collect())
    }

    /// Save weights, model config and vocabulary into `dir`.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        self.model.save(dir)?;
        std::fs::write(dir.join(VOCAB_FILE), self.vocab.to_json()?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(dir: P, device: &Device) -> Result<Self> {
        let dir = dir.as_ref();
        let vocab_path = dir.join(VOCAB_FILE);
        let json = std::fs::read_to_string(&vocab_path).map_err(|e| {
            TaggerError::Persist(format!("failed to read {}: {}", vocab_path.display(), e))
        })?;
        let vocab = Vocabulary::from_json(&json)?;
        let model = BiLstmCrf::load(dir, device)?;

        if model.config().vocab_size != vocab.len() {
            return Err(TaggerError::Persist(format!(
                "vocabulary has {} words but the model expects {}",
                vocab.len(),
                model.config().vocab_size
            )));
        }
        Ok(Self { vocab, model })
    }
}
