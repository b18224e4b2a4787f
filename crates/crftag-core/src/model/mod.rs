//! # BiLSTM-CRF Model
//!
//! Word embeddings feed a bidirectional LSTM; a linear layer turns each
//! hidden state into per-tag emission scores, and a CRF scores whole tag
//! sequences on top of them.

pub mod bilstm;
pub mod config;

use std::path::Path;

use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{Embedding, Linear, Module, VarBuilder, VarMap};
use serde::{Deserialize, Serialize};

use crate::crf::Crf;
use crate::error::{Result, TaggerError};
use crate::tags::Tag;

pub use bilstm::BiLstm;
pub use config::ModelConfig;

/// File holding the model weights inside a model directory.
pub const WEIGHTS_FILE: &str = "model.safetensors";
/// File holding the [`ModelConfig`] inside a model directory.
pub const CONFIG_FILE: &str = "config.json";

/// Best tag sequence for a sentence and its CRF path score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub score: f32,
    pub tags: Vec<Tag>,
}

/// Sequence tagger: embedding, BiLSTM, linear projection and CRF.
pub struct BiLstmCrf {
    config: ModelConfig,
    varmap: VarMap,
    device: Device,
    embedding: Embedding,
    encoder: BiLstm,
    hidden2tag: Linear,
    crf: Crf,
}

impl BiLstmCrf {
    /// Create a randomly initialized model.
    pub fn new(config: ModelConfig, device: &Device) -> Result<Self> {
        config.validate()?;

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);

        let embedding = candle_nn::embedding(
            config.vocab_size,
            config.embedding_dim,
            vb.pp("word_embeds"),
        )?;
        let encoder = BiLstm::new(config.embedding_dim, config.hidden_dim / 2, vb.pp("lstm"))?;
        let hidden2tag = candle_nn::linear(encoder.output_dim(), Tag::NUM_TAGS, vb.pp("hidden2tag"))?;
        let crf = Crf::new(vb.pp("crf"), config.strict_bio)?;

        tracing::debug!(
            vocab_size = config.vocab_size,
            embedding_dim = config.embedding_dim,
            hidden_dim = config.hidden_dim,
            "initialized BiLSTM-CRF"
        );

        Ok(Self {
            config,
            varmap,
            device: device.clone(),
            embedding,
            encoder,
            hidden2tag,
            crf,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn crf(&self) -> &Crf {
        &self.crf
    }

    /// Trainable variables, for building an optimizer.
    pub fn vars(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }

    fn word_tensor(&self, word_ids: &[u32]) -> Result<Tensor> {
        if word_ids.is_empty() {
            return Err(TaggerError::EmptyInput);
        }
        if let Some(&index) = word_ids
            .iter()
            .find(|&&id| id as usize >= self.config.vocab_size)
        {
            return Err(TaggerError::WordIndexOutOfRange {
                index,
                vocab_size: self.config.vocab_size,
            });
        }
        Ok(Tensor::new(word_ids, &self.device)?)
    }

    /// Per-token emission scores, shape `[seq_len, NUM_TAGS]`.
    pub fn emissions(&self, word_ids: &[u32]) -> Result<Tensor> {
        let ids = self.word_tensor(word_ids)?;
        let embeds = self.embedding.forward(&ids)?;
        let hidden = self.encoder.forward(&embeds)?;
        Ok(self.hidden2tag.forward(&hidden)?)
    }

    /// Scalar CRF loss for one labeled sentence.
    pub fn neg_log_likelihood(&self, word_ids: &[u32], tags: &[Tag]) -> Result<Tensor> {
        if word_ids.len() != tags.len() {
            return Err(TaggerError::LengthMismatch {
                tokens: word_ids.len(),
                tags: tags.len(),
            });
        }
        let emissions = self.emissions(word_ids)?;
        self.crf.neg_log_likelihood(&emissions, tags)
    }

    /// Decode the best tag sequence.
    pub fn forward(&self, word_ids: &[u32]) -> Result<Prediction> {
        let emissions = self.emissions(word_ids)?;
        let (score, tags) = self.crf.decode(&emissions)?;
        Ok(Prediction { score, tags })
    }

    /// Write weights and config into `dir`, creating it if needed.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        self.varmap.save(dir.join(WEIGHTS_FILE))?;
        std::fs::write(
            dir.join(CONFIG_FILE),
            serde_json::to_string_pretty(&self.config)?,
        )?;
        tracing::info!(path = %dir.display(), "model saved");
        Ok(())
    }

    /// Rebuild a model written by [`BiLstmCrf::save`].
    pub fn load<P: AsRef<Path>>(dir: P, device: &Device) -> Result<Self> {
        let dir = dir.as_ref();
        let config_path = dir.join(CONFIG_FILE);
        let config_str = std::fs::read_to_string(&config_path).map_err(|e| {
            TaggerError::Persist(format!("failed to read {}: {}", config_path.display(), e))
        })?;
        let config: ModelConfig = serde_json::from_str(&config_str)?;

        let mut model = Self::new(config, device)?;
        let weights = dir.join(WEIGHTS_FILE);
        if !weights.exists() {
            return Err(TaggerError::Persist(format!(
                "weights not found at {}",
                weights.display()
            )));
        }
        model.varmap.load(&weights)?;
        tracing::info!(path = %dir.display(), "model loaded");
        Ok(model)
    }
}
