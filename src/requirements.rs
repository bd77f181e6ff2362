//! Decoding of `required_providers` blocks.
//!
//! Each attribute of the block declares one provider requirement, in one of
//! two shapes:
//!
//! ```hcl
//! required_providers {
//!   # A bare version constraint. The key is the provider type name.
//!   google = "~> 3.0"
//!
//!   # An object with optional `source` and `version` attributes.
//!   aws = {
//!     source  = "hashicorp/aws"
//!     version = "~> 1.0.0"
//!   }
//! }
//! ```
//!
//! How the key of an object entry is interpreted depends on the selected
//! [`RequirementSchema`].

use crate::addrs::ProviderAddr;
use crate::config::{DecoderOptions, RequirementSchema, UnsupportedEntryPolicy};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::DecodeError;
use crate::syntax::{Attribute, Block, SourceRange, Value};
use crate::validation::type_name_from_source;
use crate::version::{constraint_from_value, VersionConstraint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument, trace};

/// A declared dependency on a provider, without configuring it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRequirement {
    /// The attribute name the requirement was declared under.
    pub key: String,
    /// The provider type name.
    pub name: String,
    /// The alias, set only when the key names an alias rather than the type.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
    /// The source address; empty when not given.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    /// The version constraints, in declaration order.
    #[serde(default)]
    pub version_constraints: Vec<VersionConstraint>,
    /// Range of the declaring attribute.
    pub decl_range: SourceRange,
}

impl ProviderRequirement {
    fn new(key: &str, decl_range: SourceRange) -> Self {
        Self {
            key: key.to_string(),
            name: key.to_string(),
            alias: String::new(),
            source: String::new(),
            version_constraints: Vec::new(),
            decl_range,
        }
    }

    /// The provider configuration address this requirement corresponds to.
    pub fn addr(&self) -> ProviderAddr {
        ProviderAddr::new(&self.name, &self.alias)
    }
}

/// The requirements decoded from one `required_providers` block, in source
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredProviders(Vec<ProviderRequirement>);

impl RequiredProviders {
    /// Look up a requirement by the attribute name it was declared under.
    pub fn by_key(&self, key: &str) -> Option<&ProviderRequirement> {
        self.0.iter().find(|r| r.key == key)
    }

    /// Look up a requirement by its decoded type name and alias.
    pub fn by_address(&self, name: &str, alias: &str) -> Option<&ProviderRequirement> {
        self.0.iter().find(|r| r.name == name && r.alias == alias)
    }

    /// Iterate over the requirements.
    pub fn iter(&self) -> std::slice::Iter<'_, ProviderRequirement> {
        self.0.iter()
    }

    /// Number of requirements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no requirements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the collection, returning the requirements.
    pub fn into_vec(self) -> Vec<ProviderRequirement> {
        self.0
    }
}

impl IntoIterator for RequiredProviders {
    type Item = ProviderRequirement;
    type IntoIter = std::vec::IntoIter<ProviderRequirement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RequiredProviders {
    type Item = &'a ProviderRequirement;
    type IntoIter = std::slice::Iter<'a, ProviderRequirement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The shape of a single entry, decided once from its evaluated value.
#[derive(Debug)]
enum Entry<'a> {
    /// A primitive value, read as a version constraint string.
    StringConstraint,
    /// An object with `source` and/or `version` attributes.
    Structured(&'a BTreeMap<String, Value>),
    /// Anything else.
    Unsupported(&'a Value),
}

impl<'a> Entry<'a> {
    fn classify(value: &'a Value) -> Self {
        match value {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => Entry::StringConstraint,
            Value::Object(attrs) => Entry::Structured(attrs),
            Value::List(_) | Value::Null | Value::Unknown => Entry::Unsupported(value),
        }
    }
}

/// Decode a `required_providers` block.
///
/// Returns one requirement per successfully decoded entry together with the
/// diagnostics for every entry. An entry with errors never affects its
/// siblings.
///
/// # Errors
///
/// Returns [`DecodeError::Evaluation`] if an entry's expression cannot be
/// evaluated at all. Entries are expected to be constant, so this indicates a
/// problem the caller must handle rather than a user mistake.
#[instrument(skip_all, fields(block_type = %block.block_type, schema = ?options.schema))]
pub fn decode_required_providers(
    block: &Block,
    options: &DecoderOptions,
) -> Result<(RequiredProviders, Diagnostics), DecodeError> {
    let (attrs, mut diags) = block.body.just_attributes();
    let mut reqs = Vec::with_capacity(attrs.len());

    for attr in attrs {
        let value = attr
            .expr
            .evaluate()
            .map_err(|diagnostics| DecodeError::Evaluation {
                entry: attr.name.clone(),
                range: attr.expr.range.clone(),
                diagnostics,
            })?;

        match Entry::classify(&value) {
            Entry::StringConstraint => {
                trace!(entry = %attr.name, "version constraint string entry");
                let (vc, entry_diags) = constraint_from_value(
                    &value,
                    &attr.name,
                    attr.range.clone(),
                    &attr.expr.range,
                );
                if !entry_diags.has_errors() {
                    let mut req = ProviderRequirement::new(&attr.name, attr.range.clone());
                    req.version_constraints.push(vc);
                    reqs.push(req);
                }
                diags.append(entry_diags);
            },
            Entry::Structured(fields) => {
                trace!(entry = %attr.name, "structured entry");
                let (req, entry_diags) = decode_structured_entry(attr, fields, options.schema);
                reqs.push(req);
                diags.append(entry_diags);
            },
            Entry::Unsupported(value) => {
                trace!(entry = %attr.name, found = value.type_name(), "unsupported entry");
                if let Some(diag) = unsupported_entry(attr, value, options.unsupported_entries) {
                    diags.push(diag);
                }
            },
        }
    }

    debug!(
        requirements = reqs.len(),
        diagnostics = diags.len(),
        "decoded required_providers block"
    );
    Ok((RequiredProviders(reqs), diags))
}

fn decode_structured_entry(
    attr: &Attribute,
    fields: &BTreeMap<String, Value>,
    schema: RequirementSchema,
) -> (ProviderRequirement, Diagnostics) {
    let mut req = ProviderRequirement::new(&attr.name, attr.range.clone());
    let mut diags = Diagnostics::new();

    if let Some(version) = fields.get("version") {
        let (vc, version_diags) =
            constraint_from_value(version, "version", attr.range.clone(), &attr.expr.range);
        if !version_diags.has_errors() {
            req.version_constraints.push(vc);
        }
        diags.append(version_diags);
    }

    if let Some(source) = fields.get("source") {
        match source.convert_to_string() {
            Ok(Value::String(source)) => {
                if schema == RequirementSchema::SourceDerived {
                    let type_name = type_name_from_source(&source);
                    if type_name.is_empty() {
                        diags.push(
                            Diagnostic::error("Invalid provider source address")
                                .with_detail(format!(
                                    "The source address {:?} must end with a provider type name.",
                                    source
                                ))
                                .with_subject(attr.expr.range.clone()),
                        );
                    } else {
                        req.name = type_name.to_string();
                        req.alias = attr.name.clone();
                    }
                }
                req.source = source;
            },
            Ok(_) => {},
            Err(_) => {
                diags.push(
                    Diagnostic::error("Invalid source constraint")
                        .with_detail("A string value is required for source.")
                        .with_subject(attr.expr.range.clone()),
                );
            },
        }
    }

    (req, diags)
}

fn unsupported_entry(
    attr: &Attribute,
    value: &Value,
    policy: UnsupportedEntryPolicy,
) -> Option<Diagnostic> {
    // An unknown value means an error was already reported for it.
    if matches!(value, Value::Unknown) || policy == UnsupportedEntryPolicy::Ignore {
        return None;
    }
    Some(
        Diagnostic::error("Invalid required_providers entry")
            .with_detail(format!(
                "The entry for \"{}\" must be a version constraint string or an object with \
                 source and version attributes, but have {}.",
                attr.name,
                value.type_name()
            ))
            .with_subject(attr.expr.range.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Version;
    use crate::syntax::{Body, Expression, Pos};
    use crate::testing::{
        assert_error_contains, assert_error_count, assert_no_errors, expect_decoded,
    };
    use serde_json::json;
    use std::collections::HashSet;

    fn range(line: usize) -> SourceRange {
        SourceRange::new(
            "versions.hcl",
            Pos::new(line, 5, line * 50),
            Pos::new(line, 40, line * 50 + 35),
        )
    }

    fn expr_range(line: usize) -> SourceRange {
        SourceRange::new(
            "versions.hcl",
            Pos::new(line, 11, line * 50 + 6),
            Pos::new(line, 40, line * 50 + 35),
        )
    }

    fn entry(name: &str, value: impl Into<Value>, line: usize) -> Attribute {
        Attribute::new(name, Expression::literal(value, expr_range(line))).with_range(range(line))
    }

    fn block(attrs: Vec<Attribute>) -> Block {
        let body = attrs.into_iter().fold(Body::new(), Body::with_attribute);
        Block::new("required_providers", range(1)).with_body(body)
    }

    fn decode(block: &Block) -> (RequiredProviders, Diagnostics) {
        decode_required_providers(block, &DecoderOptions::default()).unwrap()
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_structured_entry_with_source() {
        let block = block(vec![entry(
            "aws",
            json!({"version": "~> 1.0.0", "source": "hashicorp/aws"}),
            2,
        )]);

        let reqs = expect_decoded(decode_required_providers(&block, &DecoderOptions::default()))
            .unwrap();

        assert_eq!(reqs.len(), 1);
        let req = reqs.by_key("aws").unwrap();
        assert_eq!(req.name, "aws");
        assert_eq!(req.alias, "aws");
        assert_eq!(req.source, "hashicorp/aws");
        assert_eq!(req.version_constraints.len(), 1);

        let vc = &req.version_constraints[0];
        assert_eq!(vc.required.to_string(), "~> 1.0.0");
        assert_eq!(vc.decl_range, range(2));
        assert!(vc.allows(&v("1.0.0")));
        assert!(vc.allows(&v("1.0.7")));
        assert!(!vc.allows(&v("1.1.0")));
    }

    #[test]
    fn test_type_name_derived_from_source() {
        let block = block(vec![entry(
            "consul",
            json!({"source": "tf.example.com/hashicorp/consul", "version": "~> 1.2.0"}),
            2,
        )]);

        let (reqs, diags) = decode(&block);

        assert!(diags.is_empty());
        let req = reqs.by_address("consul", "consul").unwrap();
        assert_eq!(req.key, "consul");
        assert_eq!(req.source, "tf.example.com/hashicorp/consul");
        assert_eq!(req.addr(), ProviderAddr::new("consul", "consul"));
    }

    #[test]
    fn test_key_becomes_alias() {
        let block = block(vec![entry("west", json!({"source": "hashicorp/aws"}), 2)]);

        let (reqs, diags) = decode(&block);

        assert!(diags.is_empty());
        let req = reqs.by_key("west").unwrap();
        assert_eq!(req.name, "aws");
        assert_eq!(req.alias, "west");
        assert!(req.version_constraints.is_empty());
        assert_eq!(req.addr().module_unique_key(), "aws.west");
    }

    #[test]
    fn test_structured_entry_without_source() {
        let block = block(vec![entry("aws", json!({"version": ">= 2.0"}), 2)]);

        let (reqs, diags) = decode(&block);

        assert!(diags.is_empty());
        let req = reqs.by_key("aws").unwrap();
        assert_eq!(req.name, "aws");
        assert_eq!(req.alias, "");
        assert_eq!(req.source, "");
        assert_eq!(req.version_constraints[0].required.to_string(), ">= 2.0");
    }

    #[test]
    fn test_string_entry() {
        let block = block(vec![entry("aws", "~> 1.0.0", 2)]);

        let (reqs, diags) = decode(&block);

        assert_no_errors(&diags);
        assert_eq!(reqs.len(), 1);
        let req = reqs.by_key("aws").unwrap();
        assert_eq!(req.name, "aws");
        assert_eq!(req.alias, "");
        assert_eq!(req.source, "");
        assert_eq!(req.version_constraints.len(), 1);
        assert!(req.version_constraints[0].allows(&v("1.0.3")));
    }

    #[test]
    fn test_number_entry_is_a_constraint() {
        let block = block(vec![entry("aws", 2i64, 2)]);

        let (reqs, diags) = decode(&block);

        assert!(diags.is_empty());
        assert!(reqs.by_key("aws").unwrap().version_constraints[0].allows(&v("2.0.0")));
    }

    #[test]
    fn test_malformed_string_entry_is_isolated() {
        let block = block(vec![
            entry("aws", "not-a-version", 2),
            entry("google", "~> 3.0", 3),
            entry("consul", json!({"source": "hashicorp/consul"}), 4),
        ]);

        let (reqs, diags) = decode(&block);

        assert_error_count(&diags, 1);
        assert_eq!(diags[0].summary, "Invalid version constraint");
        assert_eq!(diags[0].subject, Some(expr_range(2)));

        assert!(reqs.by_key("aws").is_none());
        assert_eq!(reqs.len(), 2);
        assert!(reqs.by_key("google").is_some());
        assert!(reqs.by_key("consul").is_some());
    }

    #[test]
    fn test_malformed_structured_version() {
        let block = block(vec![
            entry("aws", json!({"source": "hashicorp/aws", "version": "not-a-version"}), 2),
            entry("google", "~> 3.0", 3),
        ]);

        let (reqs, diags) = decode(&block);

        assert_error_count(&diags, 1);
        assert_eq!(diags[0].subject, Some(expr_range(2)));
        let aws = reqs.by_key("aws").unwrap();
        assert!(aws.version_constraints.is_empty());
        assert_eq!(aws.source, "hashicorp/aws");
        assert!(reqs.by_key("google").is_some());
    }

    #[test]
    fn test_structured_version_must_be_string() {
        let block = block(vec![entry("aws", json!({"version": ["1.0"]}), 2)]);

        let (reqs, diags) = decode(&block);

        assert_error_count(&diags, 1);
        assert_eq!(
            diags[0].detail.as_deref(),
            Some("A string value is required for version.")
        );
        assert!(reqs.by_key("aws").unwrap().version_constraints.is_empty());
    }

    #[test]
    fn test_structured_null_version_is_unconstrained() {
        let block = block(vec![entry("aws", json!({"version": null}), 2)]);

        let (reqs, diags) = decode(&block);

        assert!(diags.is_empty());
        let req = reqs.by_key("aws").unwrap();
        assert_eq!(req.version_constraints.len(), 1);
        assert!(req.version_constraints[0].is_unconstrained());
    }

    #[test]
    fn test_source_must_be_string() {
        let block = block(vec![entry("aws", json!({"source": {"ns": "hashicorp"}}), 2)]);

        let (reqs, diags) = decode(&block);

        assert_error_count(&diags, 1);
        assert_error_contains(&diags, "Invalid source constraint");
        let req = reqs.by_key("aws").unwrap();
        assert_eq!(req.name, "aws");
        assert_eq!(req.source, "");
    }

    #[test]
    fn test_source_without_type_name() {
        let block = block(vec![entry("aws", json!({"source": "hashicorp/"}), 2)]);

        let (reqs, diags) = decode(&block);

        assert_error_count(&diags, 1);
        assert_error_contains(&diags, "Invalid provider source address");
        let req = reqs.by_key("aws").unwrap();
        assert_eq!(req.name, "aws");
        assert_eq!(req.alias, "");
        assert_eq!(req.source, "hashicorp/");
    }

    #[test]
    fn test_key_is_type_schema() {
        let block = block(vec![
            entry("west", json!({"source": "hashicorp/aws", "version": "~> 2.0"}), 2),
            entry("google", "~> 3.0", 3),
        ]);
        let options = DecoderOptions::new().with_schema(RequirementSchema::KeyIsType);

        let (reqs, diags) = decode_required_providers(&block, &options).unwrap();

        assert!(diags.is_empty());
        let west = reqs.by_key("west").unwrap();
        assert_eq!(west.name, "west");
        assert_eq!(west.alias, "");
        assert_eq!(west.source, "hashicorp/aws");
        assert_eq!(west.version_constraints.len(), 1);
        assert!(reqs.by_address("aws", "west").is_none());
        assert_eq!(reqs.by_key("google").unwrap().name, "google");
    }

    #[test]
    fn test_unsupported_entries_are_errors_by_default() {
        let block = block(vec![
            entry("aws", json!(["~> 1.0"]), 2),
            entry("google", Value::Null, 3),
            entry("consul", Value::Unknown, 4),
            entry("null", "~> 1.0", 5),
        ]);

        let (reqs, diags) = decode(&block);

        assert_error_count(&diags, 2);
        assert_eq!(diags[0].summary, "Invalid required_providers entry");
        assert_eq!(diags[0].subject, Some(expr_range(2)));
        assert!(diags[0].detail.as_deref().unwrap_or_default().ends_with("but have list."));
        assert_eq!(diags[1].subject, Some(expr_range(3)));
        assert_eq!(reqs.len(), 1);
        assert!(reqs.by_key("null").is_some());
    }

    #[test]
    fn test_unsupported_entries_can_be_ignored() {
        let block = block(vec![
            entry("aws", json!(["~> 1.0"]), 2),
            entry("google", Value::Null, 3),
        ]);
        let options =
            DecoderOptions::new().with_unsupported_entries(UnsupportedEntryPolicy::Ignore);

        let (reqs, diags) = decode_required_providers(&block, &options).unwrap();

        assert!(diags.is_empty());
        assert!(reqs.is_empty());
    }

    #[test]
    fn test_evaluation_failure_is_fatal() {
        let failing = Attribute::new(
            "aws",
            Expression::failed(Diagnostic::error("Variables not allowed"), expr_range(3)),
        );
        let block = block(vec![entry("google", "~> 3.0", 2), failing]);

        let err = decode_required_providers(&block, &DecoderOptions::default()).unwrap_err();

        match &err {
            DecodeError::Evaluation { entry, range, .. } => {
                assert_eq!(entry, "aws");
                assert_eq!(range, &expr_range(3));
            },
        }
        assert_eq!(err.diagnostics()[0].summary, "Variables not allowed");
    }

    #[test]
    fn test_nested_block_is_reported() {
        let block = Block::new("required_providers", range(1)).with_body(
            Body::new()
                .with_attribute(entry("aws", "~> 1.0", 2))
                .with_block(Block::new("aws", range(3))),
        );

        let (reqs, diags) = decode(&block);

        assert_error_count(&diags, 1);
        assert_error_contains(&diags, "Unexpected block");
        assert_eq!(reqs.len(), 1);
    }

    #[test]
    fn test_order_and_keys() {
        let block = block(vec![
            entry("zeta", "1.0", 2),
            entry("alpha", "2.0", 3),
            entry("west", json!({"source": "hashicorp/aws"}), 4),
            entry("aws", json!({"source": "hashicorp/aws"}), 5),
        ]);

        let (reqs, _) = decode(&block);

        let keys: Vec<_> = reqs.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "west", "aws"]);

        let unique: HashSet<_> = reqs.iter().map(|r| r.addr().module_unique_key()).collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_empty_block() {
        let (reqs, diags) = decode(&block(vec![]));
        assert!(reqs.is_empty());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_serialize_requirement() {
        let block = block(vec![entry("aws", "~> 1.0", 2)]);
        let (reqs, _) = decode(&block);

        let json = serde_json::to_value(&reqs).unwrap();
        assert_eq!(json[0]["key"], "aws");
        assert_eq!(json[0]["name"], "aws");
        assert!(json[0].get("alias").is_none());
        assert_eq!(json[0]["version_constraints"][0]["required"], "~> 1.0");
    }
}
