//! Options controlling how `required_providers` blocks are decoded.

use serde::{Deserialize, Serialize};

/// How the key of a structured `required_providers` entry is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementSchema {
    /// The entry key is always the provider type name. A `source`, if given,
    /// is recorded but does not affect the name, and no alias is set.
    KeyIsType,
    /// When a `source` is given, the entry key is an alias and the type name
    /// is the final segment of the source address. Without a `source` the
    /// entry key is the type name.
    #[default]
    SourceDerived,
}

/// What to do with an entry whose value is neither a string nor an object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedEntryPolicy {
    /// Report an error diagnostic for the entry.
    #[default]
    Error,
    /// Skip the entry without a diagnostic.
    Ignore,
}

/// Options for [`decode_required_providers`](crate::requirements::decode_required_providers).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderOptions {
    /// Interpretation of structured entries.
    pub schema: RequirementSchema,
    /// Handling of entries with unsupported value types.
    pub unsupported_entries: UnsupportedEntryPolicy,
}

impl DecoderOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the requirement schema.
    pub fn with_schema(mut self, schema: RequirementSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Set the policy for unsupported entries.
    pub fn with_unsupported_entries(mut self, policy: UnsupportedEntryPolicy) -> Self {
        self.unsupported_entries = policy;
        self
    }
}
