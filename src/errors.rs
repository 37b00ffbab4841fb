//! Error types for interception and the attribute runtime.
//!
//! Two families live here:
//!
//! - [`InterposeError`]: failures of the engine itself (resolving a target,
//!   misusing a record, a failed expectation, a bad configuration).
//! - [`Fault`]: errors raised *inside* the attribute runtime while code under
//!   test calls functions, methods and properties. A substitute configured
//!   with [`set_exception`](crate::Interception::set_exception) raises one.
//!
//! # Error Codes
//!
//! Error codes are assigned by category:
//! - E001-E009: target resolution
//! - E010-E019: record misuse
//! - E020-E029: validation
//! - E030-E039: restoration
//! - E040-E049: group close
//! - E050-E059: configuration
//!
//! # Example
//!
//! ```rust
//! use interpose::errors::{ErrorCode, InterposeError};
//!
//! let err = InterposeError::missing_attribute("os", "cpu_count");
//! assert_eq!(err.code(), ErrorCode::RESOLUTION_MISSING_ATTRIBUTE);
//! assert!(!err.is_validation());
//! ```

use crate::expectation::ValidationFailure;
use serde::Serialize;
use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T, E = InterposeError> = std::result::Result<T, E>;

/// Structured error code for documentation and programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ErrorCode(&'static str);

impl ErrorCode {
    /// Resolution error - reference kind cannot be patched
    pub const RESOLUTION_UNSUPPORTED: ErrorCode = ErrorCode("E001");
    /// Resolution error - module is not registered
    pub const RESOLUTION_UNKNOWN_MODULE: ErrorCode = ErrorCode("E002");
    /// Resolution error - owner lacks the attribute
    pub const RESOLUTION_MISSING_ATTRIBUTE: ErrorCode = ErrorCode("E003");

    /// Misuse - record already holds a patch
    pub const REPATCH: ErrorCode = ErrorCode("E010");

    /// Validation - call count or arguments did not match
    pub const VALIDATION_MISMATCH: ErrorCode = ErrorCode("E020");
    /// Validation - substitute cannot be introspected
    pub const VALIDATION_UNSUPPORTED: ErrorCode = ErrorCode("E021");

    /// Restoration - patch was not active
    pub const RESTORATION_INACTIVE: ErrorCode = ErrorCode("E030");

    /// Group - one or more members failed
    pub const GROUP_FAILED: ErrorCode = ErrorCode("E040");

    /// Config - invalid or unreadable configuration
    pub const CONFIG_INVALID: ErrorCode = ErrorCode("E050");

    /// Get the error code string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failures raised by the interception engine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InterposeError {
    /// The target could not be mapped to an (owner, attribute) pair.
    #[error("[{code}] cannot resolve target: {message}")]
    Resolution { code: ErrorCode, message: String },

    /// A second attribute was resolved on a record that already patches one.
    #[error("already patched: <Interception('{path}')>")]
    Repatch { path: String },

    /// Recorded calls did not satisfy the declared expectation.
    #[error("{0}")]
    Validation(ValidationFailure),

    /// An expectation was declared on a substitute that records nothing.
    #[error("not support validate for {substitute} (patched at {path})")]
    UnsupportedExpectation { path: String, substitute: String },

    /// The patch was already stopped or never started.
    #[error("patch for {path} is not active")]
    Restoration { path: String },

    /// Several group members failed validation.
    #[error("{}", render_group(.0))]
    Group(Vec<InterposeError>),

    /// Configuration could not be read or parsed.
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

fn render_group(errors: &[InterposeError]) -> String {
    let mut out = format!("{} interception(s) failed validation:", errors.len());
    for err in errors {
        out.push_str("\n  - ");
        out.push_str(&err.to_string());
    }
    out
}

impl InterposeError {
    /// Reference kind that has no patch point.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Resolution {
            code: ErrorCode::RESOLUTION_UNSUPPORTED,
            message: message.into(),
        }
    }

    /// Module name that is not registered with the runtime.
    pub fn unknown_module(name: impl AsRef<str>) -> Self {
        Self::Resolution {
            code: ErrorCode::RESOLUTION_UNKNOWN_MODULE,
            message: format!("no module named '{}'", name.as_ref()),
        }
    }

    /// Owner that does not carry the attribute being patched.
    pub fn missing_attribute(owner: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self::Resolution {
            code: ErrorCode::RESOLUTION_MISSING_ATTRIBUTE,
            message: format!(
                "{} does not have the attribute '{}'",
                owner.as_ref(),
                name.as_ref()
            ),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get the structured error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Resolution { code, .. } => *code,
            Self::Repatch { .. } => ErrorCode::REPATCH,
            Self::Validation(_) => ErrorCode::VALIDATION_MISMATCH,
            Self::UnsupportedExpectation { .. } => ErrorCode::VALIDATION_UNSUPPORTED,
            Self::Restoration { .. } => ErrorCode::RESTORATION_INACTIVE,
            Self::Group(_) => ErrorCode::GROUP_FAILED,
            Self::Config { .. } => ErrorCode::CONFIG_INVALID,
        }
    }

    /// True for count/argument mismatches, including groups made only of them.
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Validation(_) => true,
            Self::Group(errors) => errors.iter().all(Self::is_validation),
            _ => false,
        }
    }

    /// Every validation failure carried by this error, flattening groups.
    pub fn validation_failures(&self) -> Vec<&ValidationFailure> {
        match self {
            Self::Validation(failure) => vec![failure],
            Self::Group(errors) => errors.iter().flat_map(Self::validation_failures).collect(),
            _ => Vec::new(),
        }
    }
}

impl From<ValidationFailure> for InterposeError {
    fn from(failure: ValidationFailure) -> Self {
        Self::Validation(failure)
    }
}

/// Error raised while code runs against the attribute runtime.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    /// An explicit error, e.g. from a function body or a substitute.
    #[error("{kind}: {message}")]
    Raised { kind: String, message: String },

    #[error("'{owner}' object has no attribute '{name}'")]
    MissingAttribute { owner: String, name: String },

    #[error("'{0}' object is not callable")]
    NotCallable(String),

    #[error("can't set attribute '{0}'")]
    ReadOnly(String),

    /// A return sequence ran out of values.
    #[error("{0} has no more values to return")]
    Exhausted(String),
}

impl Fault {
    /// Build a raised error of the given kind.
    ///
    /// ```rust
    /// use interpose::Fault;
    ///
    /// let fault = Fault::raised("TimeoutError", "upstream took too long");
    /// assert_eq!(fault.to_string(), "TimeoutError: upstream took too long");
    /// ```
    pub fn raised(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Raised {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn missing_attribute(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::MissingAttribute {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl From<anyhow::Error> for Fault {
    fn from(error: anyhow::Error) -> Self {
        Self::raised("Error", format!("{:#}", error))
    }
}
