//! Decoding of `provider` configuration blocks.
//!
//! A provider block configures one instance of a provider type:
//!
//! ```hcl
//! provider "aws" {
//!   alias   = "west"
//!   version = "~> 2.0"
//!   region  = "us-west-2"
//! }
//! ```
//!
//! `alias` and `version` are interpreted here. Everything else (`region`
//! above) is provider-specific and is passed through untouched in
//! [`Provider::config`]. A handful of argument names and every nested block
//! are reserved for future use and rejected.

use crate::addrs::ProviderAddr;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::syntax::{Attribute, Block, Body, BodySchema, SourceRange, Value};
use crate::validation::{is_valid_identifier, BAD_IDENTIFIER_DETAIL};
use crate::version::{decode_version_constraint, VersionConstraint};
use tracing::{debug, instrument, trace};

/// Argument names reserved in provider blocks.
pub const RESERVED_ARGUMENTS: [&str; 4] = ["count", "depends_on", "for_each", "source"];

/// Block types recognized in provider blocks. They have no meaning yet and
/// are rejected like any other nested block.
pub const RESERVED_BLOCK_TYPES: [&str; 2] = ["lifecycle", "locals"];

/// A `provider` block: one configuration of a provider type.
#[derive(Debug, Clone, PartialEq)]
pub struct Provider {
    /// The provider type name, from the block label.
    pub name: String,
    /// Range of the block label.
    pub name_range: SourceRange,
    /// The configuration alias; empty for the default configuration.
    pub alias: String,
    /// Range of the alias expression, if an alias was given.
    pub alias_range: Option<SourceRange>,
    /// The version constraint. Unconstrained when not given.
    pub version: VersionConstraint,
    /// The provider-specific remainder of the block body.
    pub config: Body,
    /// Range of the block header.
    pub decl_range: SourceRange,
}

impl Provider {
    /// The address of this configuration within its module.
    pub fn addr(&self) -> ProviderAddr {
        ProviderAddr::new(&self.name, &self.alias)
    }

    /// The key used to detect duplicate configurations within a module.
    pub fn module_unique_key(&self) -> String {
        self.addr().module_unique_key()
    }
}

/// The attributes and blocks a provider block decoder extracts.
pub fn provider_block_schema() -> BodySchema {
    let schema = BodySchema::new()
        .with_attribute("alias")
        .with_attribute("version");
    let schema = RESERVED_ARGUMENTS
        .iter()
        .fold(schema, |schema, name| schema.with_attribute(*name));
    RESERVED_BLOCK_TYPES
        .iter()
        .fold(schema, |schema, block_type| schema.with_block(*block_type))
}

/// Decode a `provider` block.
///
/// Always produces a [`Provider`]. Problems are reported in the returned
/// diagnostics; the record may be incomplete when they contain errors.
#[instrument(skip_all, fields(labels = ?block.labels))]
pub fn decode_provider_block(block: &Block) -> (Provider, Diagnostics) {
    let mut diags = Diagnostics::new();
    let (content, config) = block.body.partial_content(&provider_block_schema());

    let (name, name_range) = match (block.labels.first(), block.label_ranges.first()) {
        (Some(name), Some(range)) => (name.clone(), range.clone()),
        _ => {
            diags.push(
                Diagnostic::error("Missing name for provider")
                    .with_detail("All provider blocks must have 1 label (name).")
                    .with_subject(block.def_range.clone()),
            );
            (String::new(), block.def_range.clone())
        },
    };
    if let Some(extra) = block.label_ranges.get(1) {
        diags.push(
            Diagnostic::error("Extraneous label for provider")
                .with_detail("Only 1 label (name) is expected for provider blocks.")
                .with_subject(extra.clone()),
        );
    }

    let mut provider = Provider {
        name,
        name_range,
        alias: String::new(),
        alias_range: None,
        version: VersionConstraint::unconstrained(block.def_range.clone()),
        config,
        decl_range: block.def_range.clone(),
    };

    if let Some(attr) = content.attributes.get("alias") {
        provider.alias_range = Some(attr.expr.range.clone());
        let (alias, alias_diags) = decode_alias(attr);
        diags.append(alias_diags);
        provider.alias = alias;
    }

    if let Some(attr) = content.attributes.get("version") {
        let (version, version_diags) = decode_version_constraint(attr);
        diags.append(version_diags);
        provider.version = version;
    }

    for name in RESERVED_ARGUMENTS {
        if let Some(attr) = content.attributes.get(name) {
            trace!(argument = name, "reserved argument in provider block");
            diags.push(
                Diagnostic::error("Reserved argument name in provider block")
                    .with_detail(format!(
                        "The provider argument name \"{}\" is reserved for use by Hemmer in a future version.",
                        name
                    ))
                    .with_subject(attr.name_range.clone()),
            );
        }
    }

    // Every nested block is reserved, not only the ones named in the schema.
    for nested in &block.body.blocks {
        trace!(block_type = %nested.block_type, "reserved block type in provider block");
        diags.push(
            Diagnostic::error("Reserved block type name in provider block")
                .with_detail(format!(
                    "The block type name \"{}\" is reserved for use by Hemmer in a future version.",
                    nested.block_type
                ))
                .with_subject(nested.type_range.clone()),
        );
    }

    debug!(
        name = %provider.name,
        alias = %provider.alias,
        diagnostics = diags.len(),
        "decoded provider block"
    );
    (provider, diags)
}

fn decode_alias(attr: &Attribute) -> (String, Diagnostics) {
    let mut diags = Diagnostics::new();
    let value = match attr.expr.evaluate() {
        Ok(value) => value,
        Err(eval_diags) => return (String::new(), eval_diags),
    };

    match value.convert_to_string() {
        Ok(Value::String(alias)) => {
            if !is_valid_identifier(&alias) {
                diags.push(
                    Diagnostic::error("Invalid provider configuration alias")
                        .with_detail(format!(
                            "An alias must be a valid name. {}",
                            BAD_IDENTIFIER_DETAIL
                        ))
                        .with_subject(attr.expr.range.clone()),
                );
            }
            (alias, diags)
        },
        Ok(Value::Unknown) => (String::new(), diags),
        Ok(_) | Err(_) => {
            diags.push(
                Diagnostic::error("Invalid provider configuration alias")
                    .with_detail(format!(
                        "A string value is required for alias, but have {}.",
                        value.type_name()
                    ))
                    .with_subject(attr.expr.range.clone()),
            );
            (String::new(), diags)
        },
    }
}
