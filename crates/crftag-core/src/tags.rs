//! # BIO Tag Set
//!
//! Tags for chunk labeling with the BIO (Begin-Inside-Outside) scheme, plus
//! the two boundary tags the CRF uses to score sentence starts and ends.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TaggerError;

/// A tag in the CRF label space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    #[serde(rename = "B")]
    Begin,
    #[serde(rename = "I")]
    Inside,
    #[serde(rename = "O")]
    Outside,
    #[serde(rename = "<START>")]
    Start,
    #[serde(rename = "<STOP>")]
    Stop,
}

impl Tag {
    /// Total number of tags, boundary tags included.
    pub const NUM_TAGS: usize = 5;

    /// Tags that may label a token.
    pub const LABELS: [Tag; 3] = [Tag::Begin, Tag::Inside, Tag::Outside];

    /// All tags in index order.
    pub fn all_tags() -> &'static [Tag] {
        &[Tag::Begin, Tag::Inside, Tag::Outside, Tag::Start, Tag::Stop]
    }

    /// Row/column of this tag in emission and transition tensors.
    pub fn index(&self) -> usize {
        match self {
            Tag::Begin => 0,
            Tag::Inside => 1,
            Tag::Outside => 2,
            Tag::Start => 3,
            Tag::Stop => 4,
        }
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Tag::Begin),
            1 => Some(Tag::Inside),
            2 => Some(Tag::Outside),
            3 => Some(Tag::Start),
            4 => Some(Tag::Stop),
            _ => None,
        }
    }

    /// True for START and STOP.
    pub fn is_boundary(&self) -> bool {
        matches!(self, Tag::Start | Tag::Stop)
    }

    /// Parse a tag that labels a token. Boundary tags are rejected.
    pub fn parse_label(s: &str) -> Result<Self, TaggerError> {
        let tag: Tag = s.parse()?;
        if tag.is_boundary() {
            return Err(TaggerError::ReservedTag(tag.to_string()));
        }
        Ok(tag)
    }

    /// Check if the CRF may move from `from` to `to`.
    ///
    /// Nothing enters START, nothing leaves STOP, and an empty path
    /// (START straight to STOP) is not a sentence. With `strict`, an
    /// `I` must continue a chunk, so `O -> I` and `START -> I` are
    /// forbidden as well.
    pub fn is_valid_transition(from: Tag, to: Tag, strict: bool) -> bool {
        match (from, to) {
            (_, Tag::Start) => false,
            (Tag::Stop, _) => false,
            (Tag::Start, Tag::Stop) => false,
            (Tag::Outside, Tag::Inside) | (Tag::Start, Tag::Inside) => !strict,
            _ => true,
        }
    }
}

impl FromStr for Tag {
    type Err = TaggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "B" => Ok(Tag::Begin),
            "I" => Ok(Tag::Inside),
            "O" => Ok(Tag::Outside),
            "<START>" => Ok(Tag::Start),
            "<STOP>" => Ok(Tag::Stop),
            other => Err(TaggerError::UnknownTag(other.to_string())),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Begin => write!(f, "B"),
            Tag::Inside => write!(f, "I"),
            Tag::Outside => write!(f, "O"),
            Tag::Start => write!(f, "<START>"),
            Tag::Stop => write!(f, "<STOP>"),
        }
    }
}
