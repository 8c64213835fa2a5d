//! Field annotation grammar
//!
//! A field's annotations are a semicolon-separated list of tokens. Each token
//! is either a bare keyword or a `key:value` pair:
//!
//! ```text
//! hash | range
//! type:<string|number|binary|boolean|stringset>
//! gsi:<IndexName> | lsi:<IndexName>
//! keyPairs:<HashField>=<RangeField>
//! ```
//!
//! Token order within a field does not matter. Whitespace around tokens is
//! ignored and empty tokens are skipped.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{BlueprintError, Result};

/// Longest attribute or index name accepted
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("identifier pattern is valid"));

static PLACEHOLDER_SAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("placeholder pattern is valid"));

/// A single parsed annotation token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// Field is the table's hash key
    Hash,
    /// Field is the table's range key
    Range,
    /// Declared attribute type, kept verbatim until extraction resolves it
    Type(String),
    /// Field participates in the named global secondary index
    GlobalIndex(String),
    /// Field participates in the named local secondary index
    LocalIndex(String),
    /// Key pair of the index named on the same field
    KeyPair { hash: String, range: Option<String> },
}

/// Parse the annotation list of `field`
///
/// # Example
/// ```
/// use dynamo_blueprint::annotation::{parse_annotations, Annotation};
///
/// let tags = parse_annotations("PK", "type:number;hash").unwrap();
/// assert_eq!(tags, vec![Annotation::Type("number".to_string()), Annotation::Hash]);
/// ```
pub fn parse_annotations(field: &str, tags: &str) -> Result<Vec<Annotation>> {
    tags.split(';')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| parse_token(field, token))
        .collect()
}

fn parse_token(field: &str, token: &str) -> Result<Annotation> {
    let Some((key, value)) = token.split_once(':') else {
        return match token {
            "hash" => Ok(Annotation::Hash),
            "range" => Ok(Annotation::Range),
            _ => Err(BlueprintError::malformed(field, token)),
        };
    };

    let value = value.trim();
    if value.is_empty() {
        return Err(BlueprintError::malformed(field, token));
    }

    match key.trim() {
        "type" => Ok(Annotation::Type(value.to_string())),
        "gsi" => {
            validate_identifier(value)?;
            Ok(Annotation::GlobalIndex(value.to_string()))
        }
        "lsi" => {
            validate_identifier(value)?;
            Ok(Annotation::LocalIndex(value.to_string()))
        }
        "keyPairs" => parse_key_pair(field, token, value),
        _ => Err(BlueprintError::malformed(field, token)),
    }
}

fn parse_key_pair(field: &str, token: &str, value: &str) -> Result<Annotation> {
    let (hash, range) = match value.split_once('=') {
        Some((hash, range)) => (hash.trim(), range.trim()),
        None => (value, ""),
    };

    if hash.is_empty() {
        return Err(BlueprintError::malformed(field, token));
    }
    validate_identifier(hash)?;

    let range = if range.is_empty() {
        None
    } else {
        validate_identifier(range)?;
        Some(range.to_string())
    };

    Ok(Annotation::KeyPair {
        hash: hash.to_string(),
        range,
    })
}

/// Validate an attribute or index name
///
/// Names must be non-empty, at most 255 characters, and contain only ASCII
/// letters, digits, `_`, `.` and `-`.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BlueprintError::invalid_identifier("Identifier cannot be empty"));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(BlueprintError::invalid_identifier(format!(
            "Identifier '{}' exceeds {} characters",
            name, MAX_IDENTIFIER_LENGTH
        )));
    }

    if !IDENTIFIER.is_match(name) {
        return Err(BlueprintError::invalid_identifier(format!(
            "Identifier '{}' may only contain letters, digits, '_', '.' and '-'",
            name
        )));
    }

    Ok(())
}

/// Whether a field name can be embedded in `#name` / `:name` placeholders
pub fn is_placeholder_safe(name: &str) -> bool {
    PLACEHOLDER_SAFE.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // parse_annotations Tests
    // =========================================================================

    #[test]
    fn test_parse_bare_keywords() {
        let tags = parse_annotations("PK", "hash").unwrap();
        assert_eq!(tags, vec![Annotation::Hash]);

        let tags = parse_annotations("SK", "range").unwrap();
        assert_eq!(tags, vec![Annotation::Range]);
    }

    #[test]
    fn test_parse_full_index_field() {
        let tags =
            parse_annotations("Owner", "type:string;gsi:CourseOwnerIndex;keyPairs:PK=Owner")
                .unwrap();

        assert_eq!(
            tags,
            vec![
                Annotation::Type("string".to_string()),
                Annotation::GlobalIndex("CourseOwnerIndex".to_string()),
                Annotation::KeyPair {
                    hash: "PK".to_string(),
                    range: Some("Owner".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_parse_local_index() {
        let tags = parse_annotations("ParentModule", "lsi:ModuleLessonsIndex").unwrap();
        assert_eq!(
            tags,
            vec![Annotation::LocalIndex("ModuleLessonsIndex".to_string())]
        );
    }

    #[test]
    fn test_parse_ignores_whitespace_and_empty_tokens() {
        let tags = parse_annotations("PK", " hash ;; type:number ;").unwrap();
        assert_eq!(
            tags,
            vec![Annotation::Hash, Annotation::Type("number".to_string())]
        );
    }

    #[test]
    fn test_parse_empty_string() {
        assert!(parse_annotations("PK", "").unwrap().is_empty());
    }

    #[test]
    fn test_parse_key_pair_without_range() {
        let tags = parse_annotations("Title", "keyPairs:Title").unwrap();
        assert_eq!(
            tags,
            vec![Annotation::KeyPair {
                hash: "Title".to_string(),
                range: None,
            }]
        );

        let tags = parse_annotations("Title", "keyPairs:Title=").unwrap();
        assert!(matches!(&tags[0], Annotation::KeyPair { range: None, .. }));
    }

    #[test]
    fn test_parse_unknown_keyword_fails() {
        let err = parse_annotations("PK", "hash;primary").unwrap_err();
        assert!(matches!(
            err,
            BlueprintError::MalformedAnnotation { ref annotation, .. } if annotation == "primary"
        ));
    }

    #[test]
    fn test_parse_unknown_key_fails() {
        assert!(parse_annotations("PK", "index:Foo").is_err());
    }

    #[test]
    fn test_parse_empty_value_fails() {
        assert!(parse_annotations("PK", "gsi:").is_err());
        assert!(parse_annotations("PK", "keyPairs:=SK").is_err());
    }

    #[test]
    fn test_parse_invalid_index_name_fails() {
        let err = parse_annotations("PK", "gsi:bad name").unwrap_err();
        assert!(matches!(err, BlueprintError::InvalidIdentifier(_)));
    }

    // =========================================================================
    // validate_identifier Tests
    // =========================================================================

    #[test]
    fn test_validate_identifier_valid() {
        assert!(validate_identifier("PK").is_ok());
        assert!(validate_identifier("Course.Owner-Index_2").is_ok());
    }

    #[test]
    fn test_validate_identifier_invalid() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("has space").is_err());
        assert!(validate_identifier("semi;colon").is_err());
        assert!(validate_identifier(&"a".repeat(256)).is_err());
    }

    #[test]
    fn test_placeholder_safe() {
        assert!(is_placeholder_safe("Title"));
        assert!(is_placeholder_safe("created_at"));
        assert!(!is_placeholder_safe("created-at"));
        assert!(!is_placeholder_safe("a.b"));
        assert!(!is_placeholder_safe(""));
    }
}
