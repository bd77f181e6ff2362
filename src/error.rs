//! Error types for provider configuration decoding.
//!
//! Most problems found while decoding are reported as
//! [`Diagnostic`](crate::diagnostics::Diagnostic)s. The types here cover the
//! remaining cases: failures of the collaborators a decoder calls, and the
//! fatal condition that aborts a single decode call.

use crate::diagnostics::Diagnostics;
use crate::syntax::SourceRange;
use thiserror::Error;

/// A value could not be converted to the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// A string was required.
    #[error("string required, but have {found}")]
    StringRequired {
        /// The type name of the value that was found.
        found: &'static str,
    },
}

/// A version constraint string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    /// The constraint string, or one of its comma-separated parts, was empty.
    #[error("empty version constraint")]
    Empty,

    /// A constraint did not match the `<operator> <version>` grammar.
    #[error("malformed constraint: {0}")]
    Malformed(String),

    /// A version inside a constraint was not a valid version.
    #[error("malformed version: {0}")]
    Version(String),
}

/// A condition that prevents a decode call from producing any result.
///
/// These are not problems with the configuration the user wrote, so they are
/// kept apart from the recoverable diagnostics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Evaluating an entry's expression failed unexpectedly.
    #[error("failed to evaluate required_providers entry {entry:?} at {range}")]
    Evaluation {
        /// The attribute name of the entry.
        entry: String,
        /// The range of the expression that failed to evaluate.
        range: SourceRange,
        /// Diagnostics returned by the evaluator.
        diagnostics: Diagnostics,
    },
}

impl DecodeError {
    /// The diagnostics carried by this error.
    pub fn diagnostics(&self) -> &Diagnostics {
        match self {
            Self::Evaluation { diagnostics, .. } => diagnostics,
        }
    }
}
