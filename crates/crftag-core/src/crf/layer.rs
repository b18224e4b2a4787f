//! # Linear-Chain CRF Layer
//!
//! Scores tag sequences as emissions plus learned transitions. Training
//! minimizes `log Z - score(gold)`, where `log Z` comes from the forward
//! algorithm over every possible path.

use candle_core::{Device, Tensor};
use candle_nn::{Init, VarBuilder};

use crate::crf::viterbi::ViterbiDecoder;
use crate::error::{Result, TaggerError};
use crate::tags::Tag;

/// Score given to forbidden transitions.
pub const IMPOSSIBLE: f32 = -10000.0;

/// CRF layer with a learned `[from][to]` transition matrix.
pub struct Crf {
    transitions: Tensor,
    mask: Tensor,
    decoder: ViterbiDecoder,
}

impl Crf {
    /// Create the layer, registering `transitions` under `vb`.
    pub fn new(vb: VarBuilder, strict_bio: bool) -> Result<Self> {
        let n = Tag::NUM_TAGS;
        let transitions = vb.get_with_hints(
            (n, n),
            "transitions",
            Init::Randn {
                mean: 0.0,
                stdev: 1.0,
            },
        )?;
        let mask = Self::constraint_mask(strict_bio, vb.device())?;

        Ok(Self {
            transitions,
            mask,
            decoder: ViterbiDecoder::default(),
        })
    }

    /// Additive mask: 0 where a transition is allowed, [`IMPOSSIBLE`] where not.
    fn constraint_mask(strict_bio: bool, device: &Device) -> Result<Tensor> {
        let n = Tag::NUM_TAGS;
        let mut mask = vec![0.0f32; n * n];
        for &from in Tag::all_tags() {
            for &to in Tag::all_tags() {
                if !Tag::is_valid_transition(from, to, strict_bio) {
                    mask[from.index() * n + to.index()] = IMPOSSIBLE;
                }
            }
        }
        Ok(Tensor::from_vec(mask, (n, n), device)?)
    }

    /// Learned transitions with forbidden moves pinned to [`IMPOSSIBLE`].
    pub fn transitions(&self) -> Result<Tensor> {
        Ok(self.transitions.add(&self.mask)?)
    }

    /// Transition scores as a `[from][to]` matrix.
    pub fn transition_matrix(&self) -> Result<Vec<Vec<f32>>> {
        Ok(self.transitions()?.to_vec2::<f32>()?)
    }

    /// Log of the summed exponentiated scores of all paths (forward algorithm).
    ///
    /// `emissions` has shape `[seq_len, NUM_TAGS]`; the result is a scalar.
    pub fn log_partition(&self, emissions: &Tensor) -> Result<Tensor> {
        let n = Tag::NUM_TAGS;
        let (seq_len, _) = emissions.dims2()?;
        let transitions = self.transitions()?;

        let mut init = vec![IMPOSSIBLE; n];
        init[Tag::Start.index()] = 0.0;
        let mut alpha = Tensor::from_vec(init, n, emissions.device())?;

        for t in 0..seq_len {
            let feat = emissions.get(t)?;
            // scores[from][to] = alpha[from] + transitions[from][to]
            let scores = transitions.broadcast_add(&alpha.unsqueeze(1)?)?;
            alpha = log_sum_exp(&scores, 0)?.add(&feat)?;
        }

        let to_stop = transitions.narrow(1, Tag::Stop.index(), 1)?.squeeze(1)?;
        log_sum_exp(&alpha.add(&to_stop)?, 0)
    }

    /// Score of one tag path, START and STOP transitions included.
    pub fn gold_score(&self, emissions: &Tensor, tags: &[Tag]) -> Result<Tensor> {
        let n = Tag::NUM_TAGS;
        let (seq_len, _) = emissions.dims2()?;
        if tags.len() != seq_len {
            return Err(TaggerError::LengthMismatch {
                tokens: seq_len,
                tags: tags.len(),
            });
        }
        if let Some(tag) = tags.iter().find(|t| t.is_boundary()) {
            return Err(TaggerError::ReservedTag(tag.to_string()));
        }

        let device = emissions.device();
        let tag_ids: Vec<u32> = tags.iter().map(|t| t.index() as u32).collect();
        let tag_ids = Tensor::from_vec(tag_ids, (seq_len, 1), device)?;
        let emitted = emissions.gather(&tag_ids, 1)?.sum_all()?;

        let mut flat_idx = Vec::with_capacity(seq_len + 1);
        let mut prev = Tag::Start.index();
        for tag in tags {
            flat_idx.push((prev * n + tag.index()) as u32);
            prev = tag.index();
        }
        flat_idx.push((prev * n + Tag::Stop.index()) as u32);
        let flat_idx = Tensor::from_vec(flat_idx, seq_len + 1, device)?;
        let moved = self
            .transitions()?
            .flatten_all()?
            .index_select(&flat_idx, 0)?
            .sum_all()?;

        Ok(emitted.add(&moved)?)
    }

    /// `log Z - score(tags)`, a non-negative scalar loss.
    pub fn neg_log_likelihood(&self, emissions: &Tensor, tags: &[Tag]) -> Result<Tensor> {
        let gold = self.gold_score(emissions, tags)?;
        Ok(self.log_partition(emissions)?.sub(&gold)?)
    }

    /// Best path for the given emissions.
    pub fn decode(&self, emissions: &Tensor) -> Result<(f32, Vec<Tag>)> {
        let emissions = emissions.to_vec2::<f32>()?;
        let (score, path) = self
            .decoder
            .decode(&emissions, &self.transition_matrix()?)?;
        let tags = path
            .into_iter()
            .map(|idx| {
                Tag::from_index(idx)
                    .ok_or_else(|| TaggerError::Decode(format!("invalid tag index: {}", idx)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((score, tags))
    }
}

/// Numerically stable `log(sum(exp(x)))` along `dim`, which is removed.
pub fn log_sum_exp(x: &Tensor, dim: usize) -> Result<Tensor> {
    let max = x.max_keepdim(dim)?;
    let summed = x.broadcast_sub(&max)?.exp()?.sum_keepdim(dim)?.log()?;
    Ok(summed.add(&max)?.squeeze(dim)?)
}
