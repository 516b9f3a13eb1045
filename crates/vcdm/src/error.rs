//! # Decoding and Validation Errors

use std::fmt;

use thiserror::Error;

/// Result type for credential decoding and validation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while decoding, validating, or resolving credentials.
#[derive(Error, Debug)]
pub enum Error {
    /// A required field is absent.
    #[error("missing required field `{field}`")]
    MissingField {
        /// Path of the missing field.
        field: String,
    },

    /// A field holds a value of the wrong JSON type.
    #[error("field `{field}` must be {expected}")]
    WrongType {
        /// Path of the offending field.
        field: String,

        /// Description of the expected shape.
        expected: &'static str,
    },

    /// A one-or-many field received an empty array where at least one entry
    /// is required.
    #[error("field `{field}` must contain at least one entry")]
    EmptyCollection {
        /// Path of the offending field.
        field: String,
    },

    /// One or more fields failed post-construction validation.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The envelope's data URI is not of the form `data:<mimetype>,<payload>`.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The envelope's media type has no registered decoder.
    #[error("unsupported enveloped credential: `{mimetype}` not recognized")]
    UnsupportedEnvelopeFormat {
        /// The unrecognized media type.
        mimetype: String,
    },

    /// An SD-JWT header claim does not hold the expected value.
    #[error("invalid `{header}` header: expected `{expected}`, found `{found}`")]
    InvalidHeaderAssertion {
        /// Header claim name.
        header: &'static str,

        /// Expected value.
        expected: &'static str,

        /// Value found in the header.
        found: String,
    },

    /// A disclosure digest could not be applied to the payload.
    #[error("digest resolution failed: {0}")]
    DigestResolution(String),

    /// The SD-JWT compact serialization or one of its disclosures is
    /// malformed.
    #[error("malformed SD-JWT: {0}")]
    MalformedSdJwt(String),

    /// The digest algorithm is not supported by the hasher.
    #[error("unsupported digest algorithm `{0}`")]
    UnsupportedAlgorithm(String),

    /// JSON (de)serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::MissingField { field: field.into() }
    }

    pub(crate) fn wrong_type(field: impl Into<String>, expected: &'static str) -> Self {
        Self::WrongType {
            field: field.into(),
            expected,
        }
    }

    /// Prefix the field path of a field-scoped error with `parent`.
    #[must_use]
    pub(crate) fn nested(self, parent: &str) -> Self {
        match self {
            Self::MissingField { field } => Self::MissingField { field: join(parent, &field) },
            Self::WrongType { field, expected } => Self::WrongType {
                field: join(parent, &field),
                expected,
            },
            Self::EmptyCollection { field } => Self::EmptyCollection { field: join(parent, &field) },
            Self::Validation(errors) => Self::Validation(errors.nested(parent)),
            other => other,
        }
    }

    /// The path of the offending field, for field-scoped errors.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field }
            | Self::WrongType { field, .. }
            | Self::EmptyCollection { field } => Some(field),
            _ => None,
        }
    }
}

/// Join a parent path and a child field: `a` + `b` is `a.b`, `a` + `[0]` is
/// `a[0]`, and either side may be empty.
pub(crate) fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        return child.to_string();
    }
    if child.is_empty() {
        return parent.to_string();
    }
    if child.starts_with('[') {
        format!("{parent}{child}")
    } else {
        format!("{parent}.{child}")
    }
}

/// A single field that failed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    /// Path of the offending field, e.g. `credentialSubject[1].id`.
    pub field: String,

    /// What is wrong with the field.
    pub message: String,
}

/// Every field that failed validation, collected in one pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Record a failing field.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Returns `true` when no field has failed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the failing fields.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// The paths of every failing field.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.field.as_str()).collect()
    }

    /// Convert to `Ok(())` when empty, or [`Error::Validation`] otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if any field has failed.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() { Ok(()) } else { Err(Error::Validation(self)) }
    }

    fn nested(self, parent: &str) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|e| FieldError {
                    field: join(parent, &e.field),
                    message: e.message,
                })
                .collect(),
        )
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "`{}` {}", e.field, e.message)?;
        }
        Ok(())
    }
}

/// Construct an `Error::MalformedSdJwt` error from a string or existing error
/// value.
macro_rules! malformed {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::Error::MalformedSdJwt(format!($fmt, $($arg)*))
    };
    ($err:expr $(,)?) => {
        $crate::error::Error::MalformedSdJwt(format!($err))
    };
}
pub(crate) use malformed;

/// Construct an `Error::MalformedEnvelope` error from a string or existing
/// error value.
macro_rules! envelope {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::Error::MalformedEnvelope(format!($fmt, $($arg)*))
    };
    ($err:expr $(,)?) => {
        $crate::error::Error::MalformedEnvelope(format!($err))
    };
}
pub(crate) use envelope;
