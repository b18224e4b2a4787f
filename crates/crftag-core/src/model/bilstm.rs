//! Bidirectional LSTM encoder.

use candle_core::Tensor;
use candle_nn::{LSTM, LSTMConfig, RNN, VarBuilder};

use crate::error::Result;

/// Two single-layer LSTMs, one reading the sentence left to right and one
/// right to left, with their hidden states concatenated per token.
pub struct BiLstm {
    forward: LSTM,
    backward: LSTM,
    hidden_per_direction: usize,
}

impl BiLstm {
    pub fn new(in_dim: usize, hidden_per_direction: usize, vb: VarBuilder) -> Result<Self> {
        let forward = candle_nn::lstm(
            in_dim,
            hidden_per_direction,
            LSTMConfig::default(),
            vb.pp("forward"),
        )?;
        let backward = candle_nn::lstm(
            in_dim,
            hidden_per_direction,
            LSTMConfig::default(),
            vb.pp("backward"),
        )?;

        Ok(Self {
            forward,
            backward,
            hidden_per_direction,
        })
    }

    /// Width of one output row.
    pub fn output_dim(&self) -> usize {
        self.hidden_per_direction * 2
    }

    /// Encode `[seq_len, in_dim]` into `[seq_len, 2 * hidden_per_direction]`.
    ///
    /// Both directions start from zero state.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let seq_len = xs.dim(0)?;
        let input = xs.unsqueeze(0)?;

        let states = self.forward.seq(&input)?;
        let left_to_right = self.forward.states_to_tensor(&states)?;

        let reversed: Vec<u32> = (0..seq_len as u32).rev().collect();
        let reversed = Tensor::from_vec(reversed, seq_len, xs.device())?;
        let states = self.backward.seq(&input.index_select(&reversed, 1)?)?;
        let right_to_left = self
            .backward
            .states_to_tensor(&states)?
            .index_select(&reversed, 1)?;

        Ok(Tensor::cat(&[&left_to_right, &right_to_left], 2)?.squeeze(0)?)
    }
}
