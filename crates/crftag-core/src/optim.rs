//! Stochastic gradient descent with L2 weight decay.

use candle_core::backprop::GradStore;
use candle_core::Var;
use candle_nn::Optimizer;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SgdConfig {
    pub learning_rate: f64,
    pub weight_decay: f64,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            weight_decay: 1e-4,
        }
    }
}

/// Plain SGD where each step applies `w -= lr * (grad + weight_decay * w)`.
///
/// Gradients come fresh from every `backward` call, so nothing accumulates
/// between steps.
#[derive(Debug)]
pub struct Sgd {
    vars: Vec<Var>,
    config: SgdConfig,
}

impl Optimizer for Sgd {
    type Config = SgdConfig;

    fn new(vars: Vec<Var>, config: SgdConfig) -> candle_core::Result<Self> {
        let vars = vars
            .into_iter()
            .filter(|var| var.dtype().is_float())
            .collect();
        Ok(Self { vars, config })
    }

    fn step(&mut self, grads: &GradStore) -> candle_core::Result<()> {
        let SgdConfig {
            learning_rate,
            weight_decay,
        } = self.config;

        for var in &self.vars {
            if let Some(grad) = grads.get(var) {
                let grad = if weight_decay != 0.0 {
                    grad.add(&var.affine(weight_decay, 0.0)?)?
                } else {
                    grad.clone()
                };
                var.set(&var.sub(&grad.affine(learning_rate, 0.0)?)?)?;
            }
        }
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.config.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.config.learning_rate = lr;
    }
}
