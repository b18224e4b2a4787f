//! Training configuration.

use std::path::Path;

use anyhow::{Context, ensure};
use crftag_core::{ModelConfig, SgdConfig};
use serde::{Deserialize, Serialize};

/// Hyperparameters for a training run. Every field has a default, so a
/// config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub weight_decay: f64,
    pub embedding_dim: usize,
    pub hidden_dim: usize,
    /// Forbid `O -> I` and `START -> I` transitions in the CRF.
    pub strict_bio: bool,
    /// Visit sentences in a new random order each epoch.
    pub shuffle: bool,
    pub seed: u64,
    /// Log the mean loss every this many epochs.
    pub log_every: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 300,
            learning_rate: 0.01,
            weight_decay: 1e-4,
            embedding_dim: 5,
            hidden_dim: 4,
            strict_bio: false,
            shuffle: false,
            seed: 42,
            log_every: 50,
        }
    }
}

impl TrainConfig {
    /// Read a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: TrainConfig = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.epochs > 0, "epochs must be > 0");
        ensure!(
            self.learning_rate > 0.0,
            "learning_rate must be positive, got {}",
            self.learning_rate
        );
        ensure!(
            self.weight_decay >= 0.0,
            "weight_decay must not be negative, got {}",
            self.weight_decay
        );
        ensure!(
            self.hidden_dim > 0 && self.hidden_dim % 2 == 0,
            "hidden_dim must be a positive even number, got {}",
            self.hidden_dim
        );
        ensure!(self.embedding_dim > 0, "embedding_dim must be > 0");
        Ok(())
    }

    /// Model shape for a vocabulary of `vocab_size` rows.
    pub fn model_config(&self, vocab_size: usize) -> ModelConfig {
        ModelConfig::new(vocab_size)
            .with_embedding_dim(self.embedding_dim)
            .with_hidden_dim(self.hidden_dim)
            .with_strict_bio(self.strict_bio)
    }

    pub fn sgd_config(&self) -> SgdConfig {
        SgdConfig {
            learning_rate: self.learning_rate,
            weight_decay: self.weight_decay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TrainConfig::default();
        assert_eq!(config.epochs, 300);
        assert_eq!(config.learning_rate, 0.01);
        assert_eq!(config.weight_decay, 1e-4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: TrainConfig = serde_json::from_str(r#"{"epochs": 10, "shuffle": true}"#).unwrap();
        assert_eq!(config.epochs, 10);
        assert!(config.shuffle);
        assert_eq!(config.hidden_dim, 4);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            TrainConfig {
                epochs: 0,
                ..TrainConfig::default()
            },
            TrainConfig {
                learning_rate: 0.0,
                ..TrainConfig::default()
            },
            TrainConfig {
                weight_decay: -1.0,
                ..TrainConfig::default()
            },
            TrainConfig {
                hidden_dim: 3,
                ..TrainConfig::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn test_model_and_sgd_config() {
        let config = TrainConfig {
            hidden_dim: 8,
            strict_bio: true,
            ..TrainConfig::default()
        };
        let model = config.model_config(12);
        assert_eq!(model.vocab_size, 12);
        assert_eq!(model.hidden_dim, 8);
        assert!(model.strict_bio);
        assert_eq!(config.sgd_config().weight_decay, 1e-4);
    }
}
