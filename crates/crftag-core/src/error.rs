use thiserror::Error;

/// Errors that can occur while building, running or persisting a tagger.
#[derive(Debug, Error)]
pub enum TaggerError {
    /// A sentence with no tokens was passed to the model.
    #[error("input sentence is empty")]
    EmptyInput,

    /// Token and tag sequences have different lengths.
    #[error("sequence length mismatch: {tokens} tokens but {tags} tags")]
    LengthMismatch {
        /// Number of tokens in the sentence.
        tokens: usize,
        /// Number of tags supplied for it.
        tags: usize,
    },

    /// A tag string is not part of the tag set.
    #[error("unknown tag: {0:?}")]
    UnknownTag(String),

    /// A tag that may only be used internally by the CRF was supplied as data.
    #[error("tag {0} is reserved for the CRF and cannot label a token")]
    ReservedTag(String),

    /// A word id does not fit the embedding table.
    #[error("word index {index} out of range for vocabulary of {vocab_size}")]
    WordIndexOutOfRange {
        /// Offending word id.
        index: u32,
        /// Number of rows in the embedding table.
        vocab_size: usize,
    },

    /// The model configuration is unusable.
    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),

    /// Viterbi decoding received inconsistent inputs.
    #[error("decode error: {0}")]
    Decode(String),

    /// Saved model files could not be read or written.
    #[error("failed to persist model: {0}")]
    Persist(String),

    /// Candle tensor operation failed.
    #[error("tensor error: {0}")]
    Candle(String),
}

impl From<candle_core::Error> for TaggerError {
    fn from(err: candle_core::Error) -> Self {
        TaggerError::Candle(err.to_string())
    }
}

impl From<std::io::Error> for TaggerError {
    fn from(err: std::io::Error) -> Self {
        TaggerError::Persist(err.to_string())
    }
}

impl From<serde_json::Error> for TaggerError {
    fn from(err: serde_json::Error) -> Self {
        TaggerError::Persist(err.to_string())
    }
}

/// Result type alias for tagger operations.
pub type Result<T> = std::result::Result<T, TaggerError>;
