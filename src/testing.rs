//! Testing utilities for code that consumes decoded provider configuration.
//!
//! # Example
//!
//! ```
//! use hemmer_provider_config::provider::decode_provider_block;
//! use hemmer_provider_config::syntax::{Block, SourceRange};
//! use hemmer_provider_config::testing::assert_no_errors;
//!
//! let range = SourceRange::synthetic("main.hcl");
//! let block = Block::new("provider", range.clone()).with_label("aws", range);
//! let (provider, diags) = decode_provider_block(&block);
//!
//! assert_no_errors(&diags);
//! assert_eq!(provider.name, "aws");
//! ```

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::DecodeError;

/// Error type for test helpers.
#[derive(Debug)]
pub enum TestError {
    /// Decoding finished with error diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// Decoding aborted.
    Decode(DecodeError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Decoding failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    writeln!(f, "  {}", diag)?;
                }
                Ok(())
            },
            TestError::Decode(e) => write!(f, "Decode error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<DecodeError> for TestError {
    fn from(e: DecodeError) -> Self {
        TestError::Decode(e)
    }
}

/// Check diagnostics and return an error if there are any errors.
pub fn check_diagnostics(diagnostics: &Diagnostics) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.errors().cloned().collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

/// Unwrap the output of a fallible decode call, failing on a fatal error or
/// on any error diagnostic.
pub fn expect_decoded<T>(result: Result<(T, Diagnostics), DecodeError>) -> Result<T, TestError> {
    let (value, diagnostics) = result?;
    check_diagnostics(&diagnostics)?;
    Ok(value)
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &Diagnostics) {
    let errors: Vec<_> = diagnostics.errors().collect();

    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain at least one error.
///
/// # Panics
///
/// Panics if there are no error diagnostics.
pub fn assert_has_errors(diagnostics: &Diagnostics) {
    assert!(
        diagnostics.has_errors(),
        "Expected at least one error, but got none"
    );
}

/// Assert that diagnostics contain exactly `expected` errors.
///
/// # Panics
///
/// Panics if the number of error diagnostics differs.
pub fn assert_error_count(diagnostics: &Diagnostics, expected: usize) {
    let errors: Vec<_> = diagnostics.errors().collect();

    assert_eq!(
        errors.len(),
        expected,
        "Expected {} error(s), but got {}: {:?}",
        expected,
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain an error with the given summary substring.
///
/// # Panics
///
/// Panics if no error diagnostic contains the given substring.
pub fn assert_error_contains(diagnostics: &Diagnostics, substring: &str) {
    let has_matching_error = diagnostics.errors().any(|d| d.summary.contains(substring));

    assert!(
        has_matching_error,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics.errors().map(|d| &d.summary).collect::<Vec<_>>()
    );
}
