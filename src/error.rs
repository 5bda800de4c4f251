//! Error types for schema resolution, loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while parsing a textual type descriptor such as `map<string, Pet>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type name \"{input}\": {message}")]
pub struct TypeNameError {
    pub input: String,
    pub message: String,
}

/// Errors during schema resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    InvalidTypeName(#[from] TypeNameError),

    // Resolution errors (exit code 2)
    #[error("unknown type: {name}")]
    UnknownType { name: String },

    #[error("type {name} is ignored and has no schema")]
    IgnoredType { name: String },

    #[error("discriminator mapping \"{tag}\" references unresolvable type {target}")]
    UnresolvedMapping { tag: String, target: String },

    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },
}

/// Errors during validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid field.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl ResolveError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ResolveError::FileNotFound { .. } | ResolveError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            ResolveError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Resolve(e) => e.exit_code(),
            ValidateError::Invalid { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_error_exit_codes() {
        let err = ResolveError::FileNotFound {
            path: PathBuf::from("catalog.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = ResolveError::UnknownType {
            name: "com.acme.Missing".into(),
        };
        assert_eq!(err.exit_code(), 2);

        let err = ResolveError::UnresolvedMapping {
            tag: "dog".into(),
            target: "com.acme.Dog".into(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn validate_error_exit_codes() {
        let err = ValidateError::Invalid {
            errors: vec![SchemaError {
                path: "/name".into(),
                message: "missing required field".into(),
            }],
        };
        assert_eq!(err.exit_code(), 1);

        let err = ValidateError::from(ResolveError::ReadError {
            path: PathBuf::from("payload.json"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "denied"),
        });
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn unresolved_mapping_message_names_tag_and_target() {
        let err = ResolveError::UnresolvedMapping {
            tag: "cat".into(),
            target: "com.acme.Cat".into(),
        };
        assert_eq!(
            err.to_string(),
            "discriminator mapping \"cat\" references unresolvable type com.acme.Cat"
        );
    }

    #[test]
    fn type_name_error_is_transparent() {
        let err: ResolveError = TypeNameError {
            input: "list<".into(),
            message: "unexpected end of input".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "invalid type name \"list<\": unexpected end of input"
        );
    }
}
