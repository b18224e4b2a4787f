use serde::{Deserialize, Serialize};

use crate::error::{Result, TaggerError};

/// Shape of a [`BiLstmCrf`](super::BiLstmCrf) model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Rows in the embedding table, `<UNK>` included.
    pub vocab_size: usize,
    /// Width of a word embedding.
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
    /// Concatenated width of both LSTM directions. Must be even.
    #[serde(default = "default_hidden_dim")]
    pub hidden_dim: usize,
    /// Forbid `O -> I` and `START -> I` transitions.
    #[serde(default)]
    pub strict_bio: bool,
}

fn default_embedding_dim() -> usize {
    5
}

fn default_hidden_dim() -> usize {
    4
}

impl ModelConfig {
    pub fn new(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            embedding_dim: default_embedding_dim(),
            hidden_dim: default_hidden_dim(),
            strict_bio: false,
        }
    }

    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    pub fn with_hidden_dim(mut self, dim: usize) -> Self {
        self.hidden_dim = dim;
        self
    }

    pub fn with_strict_bio(mut self, strict: bool) -> Self {
        self.strict_bio = strict;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.vocab_size == 0 {
            return Err(TaggerError::InvalidConfig("vocab_size must be > 0".into()));
        }
        if self.embedding_dim == 0 {
            return Err(TaggerError::InvalidConfig(
                "embedding_dim must be > 0".into(),
            ));
        }
        if self.hidden_dim == 0 || self.hidden_dim % 2 != 0 {
            return Err(TaggerError::InvalidConfig(format!(
                "hidden_dim must be a positive even number, got {}",
                self.hidden_dim
            )));
        }
        Ok(())
    }
}
