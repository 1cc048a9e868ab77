//! Flip request/result shapes and the errors a flip can end in.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod source;

pub use source::{FnSource, RandomIntegerSource};

/// One `flip_coin` invocation after argument defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipRequest {
    pub sides: i64,
    #[serde(default, rename = "sideNames", skip_serializing_if = "Option::is_none")]
    pub side_names: Option<Vec<String>>,
}

impl FlipRequest {
    pub fn new(sides: i64) -> Self {
        Self { sides, side_names: None }
    }

    pub fn with_names<I, S>(sides: i64, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sides,
            side_names: Some(names.into_iter().map(Into::into).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipResult {
    pub text: String,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl FlipResult {
    pub fn ok(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: false }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: true }
    }
}

#[derive(Debug, Error)]
pub enum FlipError {
    #[error("Number of side names ({names}) must match number of sides ({sides})")]
    SideNameMismatch { names: usize, sides: i64 },
    #[error("Error flipping coin: unsupported number of sides {0}")]
    UnsupportedSides(String),
    #[error("Error flipping coin: {0}")]
    Source(#[from] SourceError),
}

/// Failures of a [`RandomIntegerSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream status {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid integer in response: {0:?}")]
    Parse(String),
    #[error("random source returned {value} outside [{min}, {max}]")]
    OutOfRange { value: i64, min: i64, max: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_message_names_both_counts() {
        let e = FlipError::SideNameMismatch { names: 2, sides: 3 };
        assert_eq!(
            e.to_string(),
            "Number of side names (2) must match number of sides (3)"
        );
    }

    #[test]
    fn source_errors_are_prefixed() {
        let e: FlipError = SourceError::Parse("abc".into()).into();
        assert_eq!(
            e.to_string(),
            "Error flipping coin: invalid integer in response: \"abc\""
        );
    }

    #[test]
    fn request_uses_camel_case_side_names() {
        let req: FlipRequest =
            serde_json::from_str(r#"{"sides":2,"sideNames":["Yes","No"]}"#).unwrap();
        assert_eq!(req, FlipRequest::with_names(2, ["Yes", "No"]));
    }

    #[test]
    fn result_serializes_is_error_flag() {
        let v = serde_json::to_value(FlipResult::error("boom")).unwrap();
        assert_eq!(v["isError"], true);
        assert_eq!(v["text"], "boom");
    }
}
