//! Training loop for the BiLSTM-CRF model.

use std::path::Path;

use anyhow::{Context, bail};
use candle_core::Device;
use candle_nn::Optimizer;
use crftag_core::{Prediction, Sgd, Tag, Tagger, Vocabulary};
use serde::Serialize;

use crate::config::TrainConfig;
use crate::dataset::{Example, builtin_dataset, load_dataset};

/// Summary of a finished training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainReport {
    /// Mean sentence loss of every epoch, in order.
    pub epoch_losses: Vec<f32>,
    /// Prediction for the first training sentence before any update.
    pub before: Prediction,
    /// Prediction for the same sentence after the last epoch.
    pub after: Prediction,
    /// Token accuracy over the training set after the last epoch.
    pub accuracy: f32,
}

pub struct Trainer {
    config: TrainConfig,
    examples: Vec<Example>,
    tagger: Tagger,
    optimizer: Sgd,
    rng: oorandom::Rand64,
}

impl Trainer {
    /// Build the vocabulary over `examples` and a fresh model for it.
    pub fn new(config: TrainConfig, examples: Vec<Example>) -> anyhow::Result<Self> {
        config.validate()?;
        if examples.is_empty() {
            bail!("training set is empty");
        }
        for (idx, example) in examples.iter().enumerate() {
            if example.tokens.is_empty() {
                bail!("example {} has no tokens", idx);
            }
            if example.tokens.len() != example.tags.len() {
                bail!(
                    "example {} has {} tokens but {} tags",
                    idx,
                    example.tokens.len(),
                    example.tags.len()
                );
            }
        }

        let vocab = Vocabulary::from_sentences(examples.iter().map(|e| e.tokens.as_slice()));
        let tagger = Tagger::new(vocab, config.model_config(0), &Device::Cpu)?;
        let optimizer = Sgd::new(tagger.model().vars(), config.sgd_config())?;
        let rng = oorandom::Rand64::new(config.seed as u128);

        tracing::info!(
            sentences = examples.len(),
            vocab_size = tagger.vocab().len(),
            "trainer ready"
        );

        Ok(Self {
            config,
            examples,
            tagger,
            optimizer,
            rng,
        })
    }

    pub fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Prediction for the first training sentence.
    pub fn precheck(&self) -> anyhow::Result<Prediction> {
        let first = &self.examples[0];
        Ok(self.tagger.predict(&first.tokens)?)
    }

    /// Sentence order for the next epoch.
    fn epoch_order(&mut self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.examples.len()).collect();
        if self.config.shuffle {
            for i in (1..indices.len()).rev() {
                let j = self.rng.rand_range(0..(i as u64 + 1)) as usize;
                indices.swap(i, j);
            }
        }
        indices
    }

    /// One pass over the training set. Returns the mean sentence loss.
    pub fn train_epoch(&mut self) -> anyhow::Result<f32> {
        let order = self.epoch_order();
        let mut total = 0.0f32;

        for idx in &order {
            let example = &self.examples[*idx];
            let loss = self.tagger.loss(&example.tokens, &example.tags)?;
            total += loss.to_scalar::<f32>()?;
            self.optimizer.backward_step(&loss)?;
        }

        Ok(total / order.len() as f32)
    }

    /// Run every configured epoch.
    pub fn train(&mut self) -> anyhow::Result<TrainReport> {
        let before = self.precheck()?;
        tracing::info!(score = before.score, tags = %format_tags(&before), "before training");

        let epochs = self.config.epochs;
        let log_every = self.config.log_every.max(1);
        let mut epoch_losses = Vec::with_capacity(epochs);

        for epoch in 0..epochs {
            let loss = self.train_epoch()?;
            epoch_losses.push(loss);

            if (epoch + 1) % log_every == 0 || epoch + 1 == epochs {
                tracing::info!(epoch = epoch + 1, epochs, loss, "epoch complete");
            }
        }

        let after = self.precheck()?;
        tracing::info!(score = after.score, tags = %format_tags(&after), "after training");

        let accuracy = self.evaluate(&self.examples)?;
        tracing::info!(accuracy = accuracy * 100.0, "training set accuracy (%)");

        Ok(TrainReport {
            epoch_losses,
            before,
            after,
            accuracy,
        })
    }

    /// Fraction of tokens tagged correctly.
    pub fn evaluate(&self, examples: &[Example]) -> anyhow::Result<f32> {
        let mut correct = 0usize;
        let mut total = 0usize;

        for example in examples {
            if example.tokens.is_empty() {
                continue;
            }
            let prediction = self.tagger.predict(&example.tokens)?;
            correct += prediction
                .tags
                .iter()
                .zip(&example.tags)
                .filter(|(pred, gold)| pred == gold)
                .count();
            total += example.tags.len();
        }

        Ok(if total > 0 {
            correct as f32 / total as f32
        } else {
            0.0
        })
    }

    pub fn save<P: AsRef<Path>>(&self, dir: P) -> anyhow::Result<()> {
        let dir = dir.as_ref();
        self.tagger
            .save(dir)
            .with_context(|| format!("failed to save model to {}", dir.display()))
    }
}

fn format_tags(prediction: &Prediction) -> String {
    prediction
        .tags
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Train on `data` (or the builtin corpus) and optionally save the result.
pub fn run_training(
    config: TrainConfig,
    data: Option<&Path>,
    output: Option<&Path>,
) -> anyhow::Result<TrainReport> {
    let examples = match data {
        Some(path) => {
            if !path.exists() {
                bail!("Training data not found: {}", path.display());
            }
            load_dataset(path)?
        }
        None => builtin_dataset(),
    };

    tracing::info!(epochs = config.epochs, "starting BiLSTM-CRF training");
    let mut trainer = Trainer::new(config, examples)?;
    let report = trainer.train()?;

    if let Some(dir) = output {
        trainer.save(dir)?;
    }

    Ok(report)
}

/// Load a saved tagger and tag one sentence. Returns the path score and
/// each token paired with its tag.
pub fn run_prediction<S: AsRef<str>>(
    model_dir: &Path,
    tokens: &[S],
) -> anyhow::Result<(f32, Vec<(String, Tag)>)> {
    let tagger = Tagger::load(model_dir, &Device::Cpu)
        .with_context(|| format!("failed to load model from {}", model_dir.display()))?;
    let prediction = tagger.predict(tokens)?;
    let tagged = tokens
        .iter()
        .map(|t| t.as_ref().to_string())
        .zip(prediction.tags)
        .collect();
    Ok((prediction.score, tagged))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(shuffle: bool) -> TrainConfig {
        TrainConfig {
            epochs: 2,
            shuffle,
            ..TrainConfig::default()
        }
    }

    fn examples() -> Vec<Example> {
        let mut data = builtin_dataset();
        data.push(Example::from_whitespace("apple made money", "B O O").unwrap());
        data.push(Example::from_whitespace("georgia reported", "B O").unwrap());
        data
    }

    #[test]
    fn test_epoch_order_keeps_dataset_order() {
        let mut trainer = Trainer::new(config(false), examples()).unwrap();
        assert_eq!(trainer.epoch_order(), vec![0, 1, 2, 3]);
        assert_eq!(trainer.epoch_order(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_shuffled_order_is_permutation() {
        let mut trainer = Trainer::new(config(true), examples()).unwrap();
        for _ in 0..5 {
            let mut order = trainer.epoch_order();
            order.sort_unstable();
            assert_eq!(order, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn test_vocab_covers_training_words() {
        let trainer = Trainer::new(config(false), builtin_dataset()).unwrap();
        let vocab = trainer.tagger().vocab();
        // 11 + 6 distinct words plus <UNK>
        assert_eq!(vocab.len(), 18);
        assert_eq!(vocab.get("the"), Some(1));
        assert_eq!(vocab.get("georgia"), Some(12));
    }

    #[test]
    fn test_rejects_empty_training_set() {
        assert!(Trainer::new(config(false), Vec::new()).is_err());
    }

    #[test]
    fn test_rejects_bad_examples_before_training() {
        let mut data = builtin_dataset();
        data.push(Example::new(Vec::new(), Vec::new()));
        let err = Trainer::new(config(false), data).err().unwrap();
        assert!(err.to_string().contains("example 2 has no tokens"), "{err}");

        let mut data = builtin_dataset();
        data.insert(
            1,
            Example::new(vec!["apple".into(), "money".into()], vec![Tag::Begin]),
        );
        let err = Trainer::new(config(false), data).err().unwrap();
        assert!(
            err.to_string().contains("example 1 has 2 tokens but 1 tags"),
            "{err}"
        );
    }

    #[test]
    fn test_evaluate_is_a_fraction() {
        let trainer = Trainer::new(config(false), examples()).unwrap();
        let acc = trainer.evaluate(&examples()).unwrap();
        assert!((0.0..=1.0).contains(&acc));
    }
}
