//! Word vocabulary for the embedding layer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Token used for words never seen during training.
pub const UNK_TOKEN: &str = "<UNK>";

/// Maps words to embedding rows.
///
/// Row 0 is always [`UNK_TOKEN`]; observed words are numbered from 1 in
/// the order they are first seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    words: Vec<String>,
    #[serde(skip)]
    word_to_idx: HashMap<String, u32>,
}

impl Vocabulary {
    pub fn new() -> Self {
        let mut vocab = Self {
            words: Vec::new(),
            word_to_idx: HashMap::new(),
        };
        vocab.insert(UNK_TOKEN);
        vocab
    }

    /// Build a vocabulary over every word of every sentence.
    pub fn from_sentences<'a, I, S>(sentences: I) -> Self
    where
        I: IntoIterator<Item = &'a [S]>,
        S: AsRef<str> + 'a,
    {
        let mut vocab = Self::new();
        for sentence in sentences {
            for word in sentence {
                vocab.insert(word.as_ref());
            }
        }
        vocab
    }

    /// Add a word if it is new and return its index either way.
    pub fn insert(&mut self, word: &str) -> u32 {
        if let Some(&idx) = self.word_to_idx.get(word) {
            return idx;
        }
        let idx = self.words.len() as u32;
        self.words.push(word.to_string());
        self.word_to_idx.insert(word.to_string(), idx);
        idx
    }

    pub fn get(&self, word: &str) -> Option<u32> {
        self.word_to_idx.get(word).copied()
    }

    /// Index of a word, falling back to the unknown-word row.
    pub fn index_of(&self, word: &str) -> u32 {
        self.get(word).unwrap_or(0)
    }

    pub fn encode<S: AsRef<str>>(&self, sentence: &[S]) -> Vec<u32> {
        sentence.iter().map(|w| self.index_of(w.as_ref())).collect()
    }

    pub fn word(&self, idx: u32) -> Option<&str> {
        self.words.get(idx as usize).map(String::as_str)
    }

    /// Number of embedding rows, `<UNK>` included.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True when no word besides `<UNK>` is known.
    pub fn is_empty(&self) -> bool {
        self.words.len() <= 1
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Restore a vocabulary written by [`Vocabulary::to_json`].
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut vocab: Vocabulary = serde_json::from_str(json)?;
        vocab.word_to_idx = vocab
            .words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as u32))
            .collect();
        Ok(vocab)
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_first_seen_order() {
        let a = words("georgia tech is a university in georgia");
        let b = words("tech money");
        let vocab = Vocabulary::from_sentences([a.as_slice(), b.as_slice()]);

        assert_eq!(vocab.get(UNK_TOKEN), Some(0));
        assert_eq!(vocab.get("georgia"), Some(1));
        assert_eq!(vocab.get("tech"), Some(2));
        assert_eq!(vocab.get("in"), Some(6));
        assert_eq!(vocab.get("money"), Some(7));
        assert_eq!(vocab.len(), 8);
    }

    #[test]
    fn test_encode_unknown_words() {
        let s = words("the wall street");
        let vocab = Vocabulary::from_sentences([s.as_slice()]);
        assert_eq!(vocab.encode(&words("street the journal")), vec![3, 1, 0]);
    }

    #[test]
    fn test_empty_vocab() {
        let vocab = Vocabulary::new();
        assert!(vocab.is_empty());
        assert_eq!(vocab.len(), 1);
        assert_eq!(vocab.word(0), Some(UNK_TOKEN));
    }

    #[test]
    fn test_json_restores_lookup() {
        let s = words("apple corporation made money");
        let vocab = Vocabulary::from_sentences([s.as_slice()]);
        let restored = Vocabulary::from_json(&vocab.to_json().unwrap()).unwrap();
        assert_eq!(restored, vocab);
        assert_eq!(restored.get("made"), Some(3));
    }
}
