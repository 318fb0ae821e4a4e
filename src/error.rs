//! Error types for the content interpreter.
//!
//! Library-level failures (lexing, decoding, resolving, operand handling) are
//! reported through [`Error`]. Per-operator outcomes are not errors; see
//! [`crate::interp::PdfResult`].

use crate::object::ObjectRef;

/// Result type alias for interpreter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while tokenizing or interpreting content.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// Parse error at specific byte offset
    #[error("Failed to parse content at byte {offset}: {reason}")]
    ParseError {
        /// Byte offset where error occurred
        offset: usize,
        /// Reason for parse failure
        reason: String,
    },

    /// Referenced object not present in the document
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectRef),

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Unexpected end of the token stream
    #[error("End of content reached unexpectedly")]
    UnexpectedEof,

    /// An operator needed more operands than the stack holds
    #[error("Operand stack underflow")]
    Underflow,

    /// `Q` without a matching `q`
    #[error("Unbalanced graphics state restore: state stack is empty")]
    Unbalanced,

    /// A bounded sequence (dash array, blend modes) would grow past its limit
    #[error("Capacity exceeded: at most {capacity} entries allowed")]
    CapacityExceeded {
        /// Maximum number of entries
        capacity: usize,
    },

    /// A named resource is missing from the current resource dictionary
    #[error("Missing resource /{name} in /{category}")]
    MissingResource {
        /// Resource category (Font, XObject, ExtGState, ...)
        category: String,
        /// Resource name
        name: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stream decoding error
    #[error("Stream decoding error: {0}")]
    Decode(String),

    /// Unsupported stream filter
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Image error
    #[error("Image error: {0}")]
    Image(String),

    /// Recursion depth limit exceeded while following references
    #[error("Recursion depth limit exceeded (max: {0})")]
    RecursionLimitExceeded(u32),
}

impl Error {
    /// Build an [`Error::InvalidObjectType`] from a type name pair.
    pub fn wrong_type(expected: &str, found: &str) -> Self {
        Error::InvalidObjectType {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error() {
        let err = Error::ParseError {
            offset: 1234,
            reason: "invalid token".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("1234"));
        assert!(msg.contains("invalid token"));
    }

    #[test]
    fn test_object_not_found_error() {
        let err = Error::ObjectNotFound(ObjectRef::new(10, 0));
        let msg = format!("{}", err);
        assert!(msg.contains("10 0 R"));
    }

    #[test]
    fn test_wrong_type_error() {
        let err = Error::wrong_type("Name", "Integer");
        let msg = format!("{}", err);
        assert!(msg.contains("Name"));
        assert!(msg.contains("Integer"));
    }

    #[test]
    fn test_capacity_error_mentions_limit() {
        let err = Error::CapacityExceeded { capacity: 256 };
        assert!(format!("{}", err).contains("256"));
    }

    #[test]
    fn test_missing_resource_error() {
        let err = Error::MissingResource {
            category: "XObject".to_string(),
            name: "Im1".to_string(),
        };
        assert_eq!(format!("{}", err), "Missing resource /Im1 in /XObject");
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
