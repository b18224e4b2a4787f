//! # Viterbi Decoding for CRF
//!
//! Finds the highest scoring tag sequence given per-token emission scores
//! and a transition matrix. Paths start at the START tag and end at the
//! STOP tag; both are scored but never emitted.

use crate::error::{Result, TaggerError};
use crate::tags::Tag;

/// Viterbi decoder for CRF tag sequences.
#[derive(Debug, Clone)]
pub struct ViterbiDecoder {
    num_tags: usize,
    start: usize,
    stop: usize,
}

impl ViterbiDecoder {
    /// Create a decoder over the given number of tags with explicit
    /// boundary tag indices.
    pub fn new(num_tags: usize, start: usize, stop: usize) -> Self {
        Self {
            num_tags,
            start,
            stop,
        }
    }

    /// Tags a token position may take.
    fn token_tags(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_tags).filter(move |&t| t != self.start && t != self.stop)
    }

    /// Decode the best path.
    ///
    /// # Arguments
    /// * `emission_scores` - `[seq_len][num_tags]` emission scores
    /// * `transition_matrix` - `[num_tags][num_tags]`, indexed `[from][to]`
    ///
    /// # Returns
    /// The path score (STOP transition included) and one tag index per token.
    pub fn decode(
        &self,
        emission_scores: &[Vec<f32>],
        transition_matrix: &[Vec<f32>],
    ) -> Result<(f32, Vec<usize>)> {
        let seq_len = emission_scores.len();
        if seq_len == 0 {
            return Ok((0.0, Vec::new()));
        }

        if transition_matrix.len() != self.num_tags
            || transition_matrix.iter().any(|row| row.len() != self.num_tags)
        {
            return Err(TaggerError::Decode(format!(
                "transition matrix must be {0}x{0}",
                self.num_tags
            )));
        }
        if let Some((pos, row)) = emission_scores
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.num_tags)
        {
            return Err(TaggerError::Decode(format!(
                "emission dimension mismatch at position {}: expected {}, got {}",
                pos,
                self.num_tags,
                row.len()
            )));
        }

        let mut dp = vec![vec![f32::NEG_INFINITY; self.num_tags]; seq_len];
        let mut backptr = vec![vec![0usize; self.num_tags]; seq_len];

        for tag in self.token_tags() {
            dp[0][tag] = transition_matrix[self.start][tag] + emission_scores[0][tag];
        }

        for pos in 1..seq_len {
            for curr in self.token_tags() {
                let mut best_score = f32::NEG_INFINITY;
                let mut best_prev = 0;

                for prev in self.token_tags() {
                    let score = dp[pos - 1][prev] + transition_matrix[prev][curr];
                    if score > best_score {
                        best_score = score;
                        best_prev = prev;
                    }
                }

                dp[pos][curr] = best_score + emission_scores[pos][curr];
                backptr[pos][curr] = best_prev;
            }
        }

        let mut best_final_tag = 0;
        let mut best_final_score = f32::NEG_INFINITY;
        for tag in self.token_tags() {
            let score = dp[seq_len - 1][tag] + transition_matrix[tag][self.stop];
            if score > best_final_score {
                best_final_score = score;
                best_final_tag = tag;
            }
        }

        let mut path = Vec::with_capacity(seq_len);
        path.push(best_final_tag);
        let mut curr = best_final_tag;
        for pos in (1..seq_len).rev() {
            curr = backptr[pos][curr];
            path.push(curr);
        }
        path.reverse();

        Ok((best_final_score, path))
    }
}

impl Default for ViterbiDecoder {
    fn default() -> Self {
        Self::new(Tag::NUM_TAGS, Tag::Start.index(), Tag::Stop.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = Tag::NUM_TAGS;

    fn flat_transitions() -> Vec<Vec<f32>> {
        let mut matrix = vec![vec![0.0f32; N]; N];
        for from in 0..N {
            for to in 0..N {
                let (f, t) = (Tag::from_index(from).unwrap(), Tag::from_index(to).unwrap());
                if !Tag::is_valid_transition(f, t, false) {
                    matrix[from][to] = -10000.0;
                }
            }
        }
        matrix
    }

    fn emission(b: f32, i: f32, o: f32) -> Vec<f32> {
        vec![b, i, o, 0.0, 0.0]
    }

    /// Exhaustive search over B/I/O paths for cross-checking.
    fn brute_force(em: &[Vec<f32>], tr: &[Vec<f32>]) -> (f32, Vec<usize>) {
        let labels = [0usize, 1, 2];
        let mut best = (f32::NEG_INFINITY, Vec::new());
        let total = labels.len().pow(em.len() as u32);
        for code in 0..total {
            let mut c = code;
            let path: Vec<usize> = (0..em.len())
                .map(|_| {
                    let t = labels[c % 3];
                    c /= 3;
                    t
                })
                .collect();
            let mut score = tr[3][path[0]] + em[0][path[0]];
            for p in 1..path.len() {
                score += tr[path[p - 1]][path[p]] + em[p][path[p]];
            }
            score += tr[path[path.len() - 1]][4];
            if score > best.0 {
                best = (score, path);
            }
        }
        best
    }

    #[test]
    fn test_viterbi_follows_emissions() {
        let decoder = ViterbiDecoder::default();
        let emissions = vec![
            emission(2.0, 0.0, 0.0),
            emission(0.0, 2.0, 0.0),
            emission(0.0, 0.0, 2.0),
        ];
        let (score, path) = decoder.decode(&emissions, &flat_transitions()).unwrap();
        assert_eq!(path, vec![0, 1, 2]);
        assert!((score - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_viterbi_uses_transitions() {
        let decoder = ViterbiDecoder::default();
        let mut transitions = flat_transitions();
        // O -> I is heavily penalized, so the tie at position 1 resolves to O.
        transitions[2][1] = -5.0;
        let emissions = vec![emission(0.0, 0.0, 1.0), emission(0.0, 1.0, 1.0)];
        let (_, path) = decoder.decode(&emissions, &transitions).unwrap();
        assert_eq!(path, vec![2, 2]);
    }

    #[test]
    fn test_viterbi_matches_brute_force() {
        let decoder = ViterbiDecoder::default();
        let mut transitions = flat_transitions();
        let weights = [0.3, -0.7, 1.1, 0.4, -0.2, 0.9, -1.3, 0.5, 0.8];
        for (k, w) in weights.iter().enumerate() {
            transitions[k / 3][k % 3] = *w;
        }
        transitions[3][0] = 0.6;
        transitions[3][2] = -0.4;
        transitions[1][4] = 0.7;
        let emissions = vec![
            emission(0.1, 0.9, -0.3),
            emission(-0.5, 0.2, 0.4),
            emission(1.2, -0.8, 0.0),
            emission(0.3, 0.3, 0.6),
        ];

        let (score, path) = decoder.decode(&emissions, &transitions).unwrap();
        let (expected_score, expected_path) = brute_force(&emissions, &transitions);
        assert_eq!(path, expected_path);
        assert!((score - expected_score).abs() < 1e-5);
    }

    #[test]
    fn test_viterbi_never_emits_boundary_tags() {
        let decoder = ViterbiDecoder::default();
        let emissions = vec![vec![0.0, 0.0, 0.0, 50.0, 50.0]; 3];
        let (_, path) = decoder.decode(&emissions, &flat_transitions()).unwrap();
        assert!(path.iter().all(|&t| t < 3));
    }

    #[test]
    fn test_viterbi_empty() {
        let decoder = ViterbiDecoder::default();
        let (score, path) = decoder.decode(&[], &flat_transitions()).unwrap();
        assert!(path.is_empty());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_viterbi_dimension_mismatch() {
        let decoder = ViterbiDecoder::default();
        let emissions = vec![vec![1.0, 0.0, 0.0]];
        let err = decoder.decode(&emissions, &flat_transitions()).unwrap_err();
        assert!(matches!(err, TaggerError::Decode(_)));
    }
}
