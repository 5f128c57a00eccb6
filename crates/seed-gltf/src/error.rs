//! Error types for seed-gltf.

use std::fmt;

use thiserror::Error;

/// Result type for seed-gltf operations.
pub type Result<T> = std::result::Result<T, GltfError>;

/// Broad failure category an error belongs to.
///
/// Format, reference and contract errors are always fatal. Content errors
/// can be repaired when validating in fix mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed container framing, truncated stream, unparseable JSON.
    Format,
    /// Dangling index, duplicated unique reference, unsupported extension.
    Reference,
    /// Numeric domain violation or byte range overrun.
    Content,
    /// Caller misuse of the API.
    Contract,
    /// Operating system I/O failure.
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Format => "format",
            ErrorCategory::Reference => "reference",
            ErrorCategory::Content => "content",
            ErrorCategory::Contract => "contract",
            ErrorCategory::Io => "io",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while reading, decoding, validating or writing glTF.
#[derive(Debug, Error)]
pub enum GltfError {
    /// Malformed GLB framing, truncated stream, or bad document header.
    #[error("format error: {message}")]
    Format {
        /// Error message.
        message: String,
        /// Byte offset where the error occurred.
        offset: Option<usize>,
    },

    /// A reference that does not resolve, or a duplicate where uniqueness is required.
    #[error("reference error in {target}: {message}")]
    Reference {
        /// Path of the offending object, e.g. `accessors[3]`.
        target: String,
        /// Error message.
        message: String,
    },

    /// Decoded content violates a numeric or structural constraint.
    #[error("content error in {target}: {message}")]
    Content {
        /// Path of the offending object.
        target: String,
        /// Error message.
        message: String,
    },

    /// The caller asked for something the current state does not allow.
    #[error("contract violation: {0}")]
    Contract(String),

    /// Element index past the end of an array.
    #[error("index {index} out of range for {count} items")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Number of items available.
        count: usize,
    },

    /// An accessor was requested as a shape or encoding it does not have.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// What the caller asked for.
        expected: String,
        /// What the accessor declares.
        found: String,
    },

    /// A byte range does not fit inside its backing storage.
    #[error("bounds error: {0}")]
    Bounds(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decoding error.
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl GltfError {
    /// Create a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
            offset: None,
        }
    }

    /// Create a format error at a byte offset.
    pub fn format_at(message: impl Into<String>, offset: usize) -> Self {
        Self::Format {
            message: message.into(),
            offset: Some(offset),
        }
    }

    /// Create a reference error scoped to a target object.
    pub fn reference(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Reference {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a content error scoped to a target object.
    pub fn content(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Content {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a contract error.
    pub fn contract(message: impl Into<String>) -> Self {
        Self::Contract(message.into())
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(expected: impl fmt::Display, found: impl fmt::Display) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// The taxonomy bucket this error falls into.
    pub fn category(&self) -> ErrorCategory {
        match self {
            GltfError::Format { .. } | GltfError::Json(_) | GltfError::Base64(_) => {
                ErrorCategory::Format
            }
            GltfError::Reference { .. } => ErrorCategory::Reference,
            GltfError::Content { .. } | GltfError::Bounds(_) => ErrorCategory::Content,
            GltfError::Contract(_)
            | GltfError::OutOfRange { .. }
            | GltfError::TypeMismatch { .. } => ErrorCategory::Contract,
            GltfError::Io(_) => ErrorCategory::Io,
        }
    }

    /// True when the input was malformed at the container or JSON level.
    pub fn is_format(&self) -> bool {
        self.category() == ErrorCategory::Format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(GltfError::format("x").category(), ErrorCategory::Format);
        assert_eq!(
            GltfError::reference("nodes[0]", "x").category(),
            ErrorCategory::Reference
        );
        assert_eq!(
            GltfError::content("accessors[1]", "x").category(),
            ErrorCategory::Content
        );
        assert_eq!(GltfError::contract("x").category(), ErrorCategory::Contract);
        assert_eq!(
            GltfError::OutOfRange { index: 3, count: 2 }.category(),
            ErrorCategory::Contract
        );

        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(GltfError::from(json).is_format());
    }

    #[test]
    fn test_display() {
        let err = GltfError::reference("meshes[0].primitives[1]", "accessor 9 does not exist");
        insta::assert_snapshot!(
            err.to_string(),
            @"reference error in meshes[0].primitives[1]: accessor 9 does not exist"
        );

        let err = GltfError::OutOfRange { index: 4, count: 4 };
        assert_eq!(err.to_string(), "index 4 out of range for 4 items");
    }
}
