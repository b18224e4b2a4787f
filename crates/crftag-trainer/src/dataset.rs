//! Data loading for BIO-tagged training data.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crftag_core::Tag;
use serde::Deserialize;
use thiserror::Error;

/// A labeled sentence: one tag per token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub tokens: Vec<String>,
    pub tags: Vec<Tag>,
}

impl Example {
    pub fn new(tokens: Vec<String>, tags: Vec<Tag>) -> Self {
        Self { tokens, tags }
    }

    /// Build from whitespace-separated tokens and tags.
    pub fn from_whitespace(sentence: &str, tags: &str) -> Result<Self, DatasetError> {
        let tokens: Vec<String> = sentence.split_whitespace().map(String::from).collect();
        let tags = tags
            .split_whitespace()
            .map(|t| parse_tag(t, 0))
            .collect::<Result<Vec<_>, _>>()?;
        check_lengths(&tokens, &tags, 0)?;
        Ok(Self { tokens, tags })
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: unknown tag {tag:?}")]
    UnknownTag { line: usize, tag: String },

    #[error("line {line}: {tokens} tokens but {tags} tags")]
    LengthMismatch {
        line: usize,
        tokens: usize,
        tags: usize,
    },

    #[error("line {line}: malformed entry: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("dataset contains no sentences")]
    Empty,
}

/// The two-sentence toy corpus.
pub fn builtin_dataset() -> Vec<Example> {
    [
        (
            "the wall street journal reported today that apple corporation made money",
            "B I I I O O O B I O O",
        ),
        ("georgia tech is a university in georgia", "B I O O O O B"),
    ]
    .into_iter()
    .map(|(sentence, tags)| {
        Example::from_whitespace(sentence, tags).expect("builtin corpus is well-formed")
    })
    .collect()
}

/// Load a dataset, picking the format from the file extension:
/// `.jsonl` for JSON lines, anything else for tab-separated BIO text.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Vec<Example>, DatasetError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let examples = match path.extension().and_then(|e| e.to_str()) {
        Some("jsonl") => parse_jsonl(reader)?,
        _ => parse_bio(reader)?,
    };
    if examples.is_empty() {
        return Err(DatasetError::Empty);
    }

    tracing::info!(
        path = %path.display(),
        sentences = examples.len(),
        "loaded dataset"
    );
    Ok(examples)
}

fn parse_tag(tag: &str, line: usize) -> Result<Tag, DatasetError> {
    Tag::parse_label(tag).map_err(|_| DatasetError::UnknownTag {
        line,
        tag: tag.to_string(),
    })
}

fn check_lengths(tokens: &[String], tags: &[Tag], line: usize) -> Result<(), DatasetError> {
    if tokens.len() != tags.len() {
        return Err(DatasetError::LengthMismatch {
            line,
            tokens: tokens.len(),
            tags: tags.len(),
        });
    }
    Ok(())
}

/// Parse `token<TAB>tag` lines; blank lines separate sentences and `#`
/// starts a comment line.
pub fn parse_bio<R: BufRead>(reader: R) -> Result<Vec<Example>, DatasetError> {
    let mut examples = Vec::new();
    let mut tokens = Vec::new();
    let mut tags = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let line = line.trim();

        if line.is_empty() {
            if !tokens.is_empty() {
                examples.push(Example::new(
                    std::mem::take(&mut tokens),
                    std::mem::take(&mut tags),
                ));
            }
            continue;
        }

        // `#` lines without a tab are comments; `#1<TAB>B` is a token.
        if line.starts_with('#') && !line.contains('\t') {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() != 2 || parts[0].is_empty() {
            return Err(DatasetError::Malformed {
                line: line_no,
                reason: format!("expected `token<TAB>tag`, got {:?}", line),
            });
        }

        tags.push(parse_tag(parts[1].trim(), line_no)?);
        tokens.push(parts[0].to_string());
    }

    // Don't forget the last sentence
    if !tokens.is_empty() {
        examples.push(Example::new(tokens, tags));
    }

    Ok(examples)
}

#[derive(Deserialize)]
struct JsonSample {
    tokens: Vec<String>,
    ner_tags: Vec<String>,
}

/// Parse one `{"tokens": [...], "ner_tags": [...]}` object per line.
pub fn parse_jsonl<R: BufRead>(reader: R) -> Result<Vec<Example>, DatasetError> {
    let mut examples = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let sample: JsonSample =
            serde_json::from_str(&line).map_err(|e| DatasetError::Malformed {
                line: line_no,
                reason: e.to_string(),
            })?;
        let tags = sample
            .ner_tags
            .iter()
            .map(|t| parse_tag(t, line_no))
            .collect::<Result<Vec<_>, _>>()?;
        check_lengths(&sample.tokens, &tags, line_no)?;
        if sample.tokens.is_empty() {
            continue;
        }

        examples.push(Example::new(sample.tokens, tags));
    }

    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_builtin_dataset() {
        let data = builtin_dataset();
        assert_eq!(data.len(), 2);
        for example in &data {
            assert_eq!(example.tokens.len(), example.tags.len());
        }
        assert_eq!(data[0].tokens.len(), 11);
        assert_eq!(data[1].tags[6], Tag::Begin);
    }

    #[test]
    fn test_parse_bio() {
        let text = "# comment\ngeorgia\tB\ntech\tI\n\n\nis\tO\n";
        let data = parse_bio(Cursor::new(text)).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].tokens, vec!["georgia", "tech"]);
        assert_eq!(data[0].tags, vec![Tag::Begin, Tag::Inside]);
        assert_eq!(data[1].tags, vec![Tag::Outside]);
    }

    #[test]
    fn test_parse_bio_keeps_hash_tokens() {
        let data = parse_bio(Cursor::new("# header\n#1\tB\nranked\tO\n")).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].tokens, vec!["#1", "ranked"]);
        assert_eq!(data[0].tags, vec![Tag::Begin, Tag::Outside]);
    }

    #[test]
    fn test_parse_bio_errors_carry_line() {
        let err = parse_bio(Cursor::new("a\tB\nb\tX\n")).unwrap_err();
        assert!(matches!(err, DatasetError::UnknownTag { line: 2, .. }));

        let err = parse_bio(Cursor::new("a B\n")).unwrap_err();
        assert!(matches!(err, DatasetError::Malformed { line: 1, .. }));

        let err = parse_bio(Cursor::new("a\t<STOP>\n")).unwrap_err();
        assert!(matches!(err, DatasetError::UnknownTag { line: 1, .. }));
    }

    #[test]
    fn test_parse_jsonl() {
        let text = concat!(
            r#"{"tokens": ["apple", "corporation"], "ner_tags": ["B", "I"]}"#,
            "\n\n",
            r#"{"tokens": ["made", "money"], "ner_tags": ["O", "O"]}"#,
            "\n"
        );
        let data = parse_jsonl(Cursor::new(text)).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[1].tags, vec![Tag::Outside, Tag::Outside]);
    }

    #[test]
    fn test_parse_jsonl_length_mismatch() {
        let text = r#"{"tokens": ["a", "b"], "ner_tags": ["O"]}"#;
        let err = parse_jsonl(Cursor::new(text)).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::LengthMismatch {
                line: 1,
                tokens: 2,
                tags: 1
            }
        ));
    }

    #[test]
    fn test_from_whitespace() {
        let ex = Example::from_whitespace("a b", "B I").unwrap();
        assert_eq!(ex.tags, vec![Tag::Begin, Tag::Inside]);
        assert!(Example::from_whitespace("a b", "B").is_err());
    }
}
