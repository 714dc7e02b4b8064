//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid configuration, malformed example files, unknown category/relation
//! lookups, IO, and generic errors.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed example file: {0}")]
    ParseExample(String),

    #[error("unknown category id {id}")]
    UnknownCategory { id: usize },

    #[error("category {category} has no relation to {relation}")]
    UnknownRelation { category: usize, relation: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_uses_other_variant() {
        let err: Error = String::from("boom").into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn unknown_relation_names_both_ids() {
        let err = Error::UnknownRelation {
            category: 3,
            relation: 7,
        };
        assert_eq!(err.to_string(), "category 3 has no relation to 7");
    }
}
