//! Version constraints declared in configuration.

use crate::constraint::{Constraints, Version};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::syntax::{Attribute, SourceRange, Value};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// A parsed version constraint together with where it was declared.
///
/// An empty constraint set means "any version".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConstraint {
    /// The constraint terms.
    pub required: Constraints,
    /// Range of the attribute that declared the constraint.
    pub decl_range: SourceRange,
}

impl VersionConstraint {
    /// A constraint that accepts every version.
    pub fn unconstrained(decl_range: SourceRange) -> Self {
        Self {
            required: Constraints::unconstrained(),
            decl_range,
        }
    }

    /// Whether no terms were given.
    pub fn is_unconstrained(&self) -> bool {
        self.required.is_empty()
    }

    /// Whether `version` is acceptable.
    pub fn allows(&self, version: &Version) -> bool {
        self.required.check(version)
    }
}

/// Decode a version constraint from an attribute such as `version = "~> 1.0"`.
///
/// Always returns a usable constraint. When the value cannot be used, the
/// constraint is unconstrained and the returned diagnostics say why:
///
/// - evaluation failures are passed through as-is;
/// - non-string values produce an "Invalid version constraint" error;
/// - null and not-yet-known values are treated as unconstrained silently;
/// - strings that are not valid constraint syntax produce an
///   "Invalid version constraint" error.
pub fn decode_version_constraint(attr: &Attribute) -> (VersionConstraint, Diagnostics) {
    let value = match attr.expr.evaluate() {
        Ok(value) => value,
        Err(diags) => {
            trace!(attribute = %attr.name, "version constraint expression failed to evaluate");
            return (VersionConstraint::unconstrained(attr.range.clone()), diags);
        },
    };
    constraint_from_value(&value, &attr.name, attr.range.clone(), &attr.expr.range)
}

/// Build a constraint from an already-evaluated value.
///
/// `name` is used in messages, `decl_range` is recorded on the result and
/// `subject` is where diagnostics point.
pub(crate) fn constraint_from_value(
    value: &Value,
    name: &str,
    decl_range: SourceRange,
    subject: &SourceRange,
) -> (VersionConstraint, Diagnostics) {
    let mut ret = VersionConstraint::unconstrained(decl_range);
    let mut diags = Diagnostics::new();

    let value = match value.convert_to_string() {
        Ok(value) => value,
        Err(err) => {
            trace!(attribute = %name, error = %err, "version constraint is not a string");
            diags.push(
                Diagnostic::error("Invalid version constraint")
                    .with_detail(format!("A string value is required for {}.", name))
                    .with_subject(subject.clone()),
            );
            return (ret, diags);
        },
    };

    let text = match &value {
        Value::String(text) => text,
        // Null means no constraint. Unknown means an error was already
        // reported upstream for this expression.
        _ => return (ret, diags),
    };

    match Constraints::parse(text) {
        Ok(required) => ret.required = required,
        Err(err) => {
            trace!(attribute = %name, error = %err, "invalid version constraint syntax");
            diags.push(
                Diagnostic::error("Invalid version constraint")
                    .with_detail("This string does not use correct version constraint syntax.")
                    .with_subject(subject.clone()),
            );
        },
    }

    (ret, diags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Expression, Pos};
    use crate::testing::{assert_error_contains, assert_error_count, assert_no_errors};
    use serde_json::json;

    fn attr_range() -> SourceRange {
        SourceRange::new("main.hcl", Pos::new(2, 3, 20), Pos::new(2, 24, 41))
    }

    fn expr_range() -> SourceRange {
        SourceRange::new("main.hcl", Pos::new(2, 13, 30), Pos::new(2, 24, 41))
    }

    fn version_attr(value: impl Into<Value>) -> Attribute {
        Attribute::new("version", Expression::literal(value, expr_range())).with_range(attr_range())
    }

    #[test]
    fn test_decode_valid_constraint() {
        let (vc, diags) = decode_version_constraint(&version_attr("~> 1.0.0"));

        assert_no_errors(&diags);
        assert!(diags.is_empty());
        assert_eq!(vc.decl_range, attr_range());
        assert_eq!(vc.required.to_string(), "~> 1.0.0");
        assert!(vc.allows(&Version::parse("1.0.5").unwrap()));
        assert!(!vc.allows(&Version::parse("1.1.0").unwrap()));
    }

    #[test]
    fn test_decode_non_string() {
        let (vc, diags) = decode_version_constraint(&version_attr(json!(["1.0"])));

        assert!(vc.is_unconstrained());
        assert_error_count(&diags, 1);
        assert_eq!(diags[0].summary, "Invalid version constraint");
        assert_eq!(
            diags[0].detail.as_deref(),
            Some("A string value is required for version.")
        );
        assert_eq!(diags[0].subject, Some(expr_range()));
    }

    #[test]
    fn test_decode_number_converts() {
        let (vc, diags) = decode_version_constraint(&version_attr(2i64));

        assert!(diags.is_empty());
        assert!(vc.allows(&Version::parse("2.0.0").unwrap()));
        assert!(!vc.allows(&Version::parse("2.0.1").unwrap()));
    }

    #[test]
    fn test_decode_bool_is_syntax_error() {
        let (vc, diags) = decode_version_constraint(&version_attr(true));

        assert!(vc.is_unconstrained());
        assert_error_count(&diags, 1);
        assert_eq!(
            diags[0].detail.as_deref(),
            Some("This string does not use correct version constraint syntax.")
        );
    }

    #[test]
    fn test_decode_null_and_unknown_are_unconstrained() {
        for value in [Value::Null, Value::Unknown] {
            let (vc, diags) = decode_version_constraint(&version_attr(value));
            assert!(vc.is_unconstrained());
            assert!(diags.is_empty());
            assert_eq!(vc.decl_range, attr_range());
        }
    }

    #[test]
    fn test_decode_syntax_error() {
        let (vc, diags) = decode_version_constraint(&version_attr("not-a-version"));

        assert!(vc.is_unconstrained());
        assert_error_count(&diags, 1);
        assert_error_contains(&diags, "Invalid version constraint");
        assert_eq!(diags[0].subject, Some(expr_range()));
    }

    #[test]
    fn test_decode_propagates_evaluation_failure() {
        let upstream: Diagnostics = Diagnostic::error("Variables not allowed").into();
        let attr = Attribute::new("version", Expression::failed(upstream.clone(), expr_range()));

        let (vc, diags) = decode_version_constraint(&attr);

        assert!(vc.is_unconstrained());
        assert_eq!(diags, upstream);
    }

    #[test]
    fn test_unconstrained_differs_from_constrained() {
        let none = VersionConstraint::unconstrained(attr_range());
        let (some, _) = decode_version_constraint(&version_attr(">= 1.0"));

        assert!(none.is_unconstrained());
        assert!(!some.is_unconstrained());
        assert_ne!(none, some);
    }
}
