//! Name validation helpers.
//!
//! # Example
//!
//! ```
//! use hemmer_provider_config::validation::{is_valid_identifier, type_name_from_source};
//!
//! assert!(is_valid_identifier("us_west"));
//! assert!(!is_valid_identifier("1bad"));
//! assert_eq!(type_name_from_source("hashicorp/aws"), "aws");
//! ```

/// Detail text explaining what a valid name looks like.
pub const BAD_IDENTIFIER_DETAIL: &str = "A name must start with a letter or underscore and may \
     contain only letters, digits, underscores, and dashes.";

/// Check whether `name` is a valid bare identifier in the configuration
/// language.
///
/// An identifier starts with a letter or underscore, followed by any number
/// of letters, digits, underscores or dashes.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {},
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// Derive a provider type name from a source address.
///
/// The type name is the final `/`-separated segment, so
/// `registry.example.com/hashicorp/consul` yields `consul`. An address
/// without any `/` is returned unchanged.
pub fn type_name_from_source(source: &str) -> &str {
    source.rsplit('/').next().unwrap_or(source)
}
