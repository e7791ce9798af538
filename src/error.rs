//! Error types raised while turning a filter string into a query.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Malformed filter text. Never repaired, always surfaced.
    #[error("{message}: {fragment}")]
    Syntax { message: String, fragment: String },

    /// The record store does not know the named relation.
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),

    /// The attribute catalog failed to answer a lookup.
    #[error("Attribute catalog error: {0}")]
    Catalog(String),
}

impl FilterError {
    pub fn syntax(message: impl Into<String>, fragment: impl Into<String>) -> Self {
        FilterError::Syntax {
            message: message.into(),
            fragment: fragment.into(),
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, FilterError::Syntax { .. })
    }

    /// The body a request handler sends back with a 400 response.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: "Filter Error".to_string(),
            message: self.to_string(),
        }
    }
}

/// `{ "error": ..., "message": ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}
