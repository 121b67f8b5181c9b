use thiserror::Error;

/// Main error type for browse operations
#[derive(Error, Debug)]
pub enum BrowseError {
    #[error("unable to translate query kind: {kind}")]
    TranslationFailure { kind: &'static str },

    #[error("{operation} not supported for facet {facet}")]
    UnsupportedOperation {
        facet: String,
        operation: &'static str,
    },

    #[error("Unknown facet: {0}")]
    UnknownFacet(String),

    #[error("Duplicate facet handler: {0}")]
    DuplicateFacet(String),

    #[error("Facet {facet} depends on unregistered facet {dependency}")]
    UnknownDependency { facet: String, dependency: String },

    #[error("Failed to load facet {facet}: {reason}")]
    FacetLoad { facet: String, reason: String },

    #[error("Failed to load segment {segment}: {reason}")]
    SegmentLoad { segment: String, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type alias for browse operations
pub type Result<T> = std::result::Result<T, BrowseError>;

impl BrowseError {
    /// Check if this error was caused by the request rather than the index setup
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            BrowseError::TranslationFailure { .. }
                | BrowseError::UnsupportedOperation { .. }
                | BrowseError::UnknownFacet(_)
                | BrowseError::InvalidRequest(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BrowseError::TranslationFailure { kind: "prefix" };
        assert_eq!(err.to_string(), "unable to translate query kind: prefix");

        let err = BrowseError::UnsupportedOperation {
            facet: "combo".to_string(),
            operation: "facet counting",
        };
        assert_eq!(err.to_string(), "facet counting not supported for facet combo");
    }

    #[test]
    fn test_request_errors() {
        assert!(BrowseError::UnknownFacet("color".to_string()).is_request_error());
        assert!(BrowseError::TranslationFailure { kind: "range" }.is_request_error());
        assert!(!BrowseError::DuplicateFacet("color".to_string()).is_request_error());
        assert!(!BrowseError::SegmentLoad {
            segment: "segment_1".to_string(),
            reason: "boom".to_string(),
        }
        .is_request_error());
    }
}
