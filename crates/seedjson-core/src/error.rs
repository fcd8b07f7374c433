//! Error types for parsing and typed reconstruction.

use thiserror::Error;

/// Errors that can occur while turning JSON text into a typed value.
///
/// Every error is fatal: the first one raised by the tokenizer, the parser or
/// any seed aborts the whole deserialization and no partial value is returned.
#[derive(Error, Debug)]
pub enum SeedError {
    /// Lexical or syntactic violation (bad escape, bad number, missing or extra
    /// comma, unterminated literal, unexpected token).
    /// Positions are 1-based.
    #[error("malformed JSON at line {line}, column {column}: {message}")]
    MalformedInput {
        line: usize,
        column: usize,
        message: String,
    },

    /// The document nests deeper than `Options::max_depth`.
    #[error("nesting depth limit of {limit} exceeded at line {line}, column {column}")]
    DepthLimitExceeded {
        limit: usize,
        line: usize,
        column: usize,
    },

    /// A scalar was found where a composite was declared, or vice versa.
    #[error("type mismatch in {owner}: {detail}")]
    TypeMismatch { owner: String, detail: String },

    /// A container reached the resolver without a known element/value type.
    #[error("unsupported type {type_name}: container element type is not known")]
    UnsupportedType { type_name: String },

    /// A required constructor parameter received neither a scalar nor a composite.
    #[error("missing argument `{parameter}` for {type_name}")]
    MissingArgument {
        type_name: String,
        parameter: String,
    },

    /// A JSON member name matched no constructor parameter.
    #[error("unknown property `{name}` for {type_name}")]
    UnknownProperty { type_name: String, name: String },

    /// A scalar converter rejected the value it was given.
    #[error("invalid value: expected {expected}, found {found}")]
    InvalidValue { expected: String, found: String },

    /// Callback events arrived in an order the stack machine cannot follow.
    #[error("callback protocol violation: {detail}")]
    Protocol { detail: &'static str },

    /// Reading the input source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SeedError {
    pub(crate) fn malformed(line: usize, column: usize, message: impl Into<String>) -> Self {
        SeedError::MalformedInput {
            line,
            column,
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(owner: &str, detail: impl Into<String>) -> Self {
        SeedError::TypeMismatch {
            owner: owner.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid(expected: impl Into<String>, found: impl Into<String>) -> Self {
        SeedError::InvalidValue {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Convenience alias used throughout seedjson-core.
pub type Result<T> = std::result::Result<T, SeedError>;
