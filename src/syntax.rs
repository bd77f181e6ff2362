//! In-memory model of already-parsed configuration.
//!
//! The configuration language parser and expression evaluator live outside
//! this crate. They hand over blocks, attributes and evaluated values using
//! the types in this module, with a [`SourceRange`] attached to every
//! syntactic element so diagnostics can point at precise positions.
//!
//! # Example
//!
//! ```
//! use hemmer_provider_config::syntax::{Attribute, Block, Body, Expression, SourceRange};
//!
//! let range = SourceRange::synthetic("main.hcl");
//! let block = Block::new("provider", range.clone())
//!     .with_label("aws", range.clone())
//!     .with_body(
//!         Body::new()
//!             .with_attribute(Attribute::new("alias", Expression::literal("west", range.clone())))
//!             .with_attribute(Attribute::new("region", Expression::literal("us-west-2", range))),
//!     );
//!
//! assert_eq!(block.labels, vec!["aws".to_string()]);
//! assert_eq!(block.body.attributes.len(), 2);
//! ```

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::ConversionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A position in a source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pos {
    /// One-based line number.
    pub line: usize,
    /// One-based column number, counted in characters.
    pub column: usize,
    /// Zero-based byte offset.
    pub byte: usize,
}

impl Pos {
    /// Create a new position.
    pub fn new(line: usize, column: usize, byte: usize) -> Self {
        Self { line, column, byte }
    }
}

/// A span of source text within one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    /// The file the range belongs to.
    pub filename: String,
    /// Start position (inclusive).
    pub start: Pos,
    /// End position (exclusive).
    pub end: Pos,
}

impl SourceRange {
    /// Create a range between two positions.
    pub fn new(filename: impl Into<String>, start: Pos, end: Pos) -> Self {
        Self {
            filename: filename.into(),
            start,
            end,
        }
    }

    /// A zero-width range at the start of a file, for values that were not
    /// read from source text.
    pub fn synthetic(filename: impl Into<String>) -> Self {
        let start = Pos::new(1, 1, 0);
        Self::new(filename, start, start)
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            write!(
                f,
                "{}:{},{}-{}",
                self.filename, self.start.line, self.start.column, self.end.column
            )
        } else {
            write!(
                f,
                "{}:{},{}-{},{}",
                self.filename, self.start.line, self.start.column, self.end.line, self.end.column
            )
        }
    }
}

/// A dynamically-typed value produced by evaluating an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Value {
    /// The null value.
    Null,
    /// A value that is not known yet, typically because an earlier error
    /// was already reported for the expression that produced it.
    Unknown,
    /// A string.
    String(String),
    /// A number.
    Number(f64),
    /// A boolean.
    Bool(bool),
    /// An ordered sequence of values.
    List(Vec<Value>),
    /// A structural object with named attributes.
    Object(BTreeMap<String, Value>),
}

/// The runtime shape of a [`Value`], as seen by decoders that dispatch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A string, number or bool.
    Primitive,
    /// An object.
    Object,
    /// A list.
    List,
    /// The null value.
    Null,
    /// A value that is not fully known.
    Unknown,
}

impl Value {
    /// The runtime shape of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => ValueKind::Primitive,
            Value::Object(_) => ValueKind::Object,
            Value::List(_) => ValueKind::List,
            Value::Null => ValueKind::Null,
            Value::Unknown => ValueKind::Unknown,
        }
    }

    /// A short name for the type of this value, for use in messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Unknown => "unknown",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    /// Whether this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value and everything nested in it is known.
    pub fn is_wholly_known(&self) -> bool {
        match self {
            Value::Unknown => false,
            Value::List(items) => items.iter().all(Value::is_wholly_known),
            Value::Object(attrs) => attrs.values().all(Value::is_wholly_known),
            _ => true,
        }
    }

    /// Returns the string content if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the named attribute if this is an object that has it.
    pub fn get_attr(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(attrs) => attrs.get(name),
            _ => None,
        }
    }

    /// Convert this value to the string type.
    ///
    /// Numbers and bools convert to their canonical text. Null and unknown
    /// values pass through unchanged, since they are valid members of every
    /// type. Lists and objects cannot be converted.
    pub fn convert_to_string(&self) -> Result<Value, ConversionError> {
        match self {
            Value::String(_) | Value::Null | Value::Unknown => Ok(self.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            Value::List(_) | Value::Object(_) => Err(ConversionError::StringRequired {
                found: self.type_name(),
            }),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            },
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            },
        }
    }
}

/// How an expression evaluates.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// The expression evaluated to a value.
    Literal(Value),
    /// Evaluation failed with the given diagnostics.
    Failed(Diagnostics),
}

/// An expression together with its source range.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// The evaluation outcome.
    pub kind: ExprKind,
    /// Where the expression appears in source.
    pub range: SourceRange,
}

impl Expression {
    /// An expression that evaluates to `value`.
    pub fn literal(value: impl Into<Value>, range: SourceRange) -> Self {
        Self {
            kind: ExprKind::Literal(value.into()),
            range,
        }
    }

    /// An expression whose evaluation fails with `diagnostics`.
    pub fn failed(diagnostics: impl Into<Diagnostics>, range: SourceRange) -> Self {
        Self {
            kind: ExprKind::Failed(diagnostics.into()),
            range,
        }
    }

    /// Evaluate the expression without any variables in scope.
    pub fn evaluate(&self) -> Result<Value, Diagnostics> {
        match &self.kind {
            ExprKind::Literal(value) => Ok(value.clone()),
            ExprKind::Failed(diags) => Err(diags.clone()),
        }
    }
}

/// A `name = expression` pair inside a body.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// The attribute name.
    pub name: String,
    /// The value expression.
    pub expr: Expression,
    /// Range of the whole attribute.
    pub range: SourceRange,
    /// Range of the attribute name.
    pub name_range: SourceRange,
}

impl Attribute {
    /// Create an attribute whose ranges default to the expression range.
    pub fn new(name: impl Into<String>, expr: Expression) -> Self {
        let range = expr.range.clone();
        Self {
            name: name.into(),
            name_range: range.clone(),
            range,
            expr,
        }
    }

    /// Set the range of the whole attribute.
    pub fn with_range(mut self, range: SourceRange) -> Self {
        self.range = range;
        self
    }

    /// Set the range of the attribute name.
    pub fn with_name_range(mut self, range: SourceRange) -> Self {
        self.name_range = range;
        self
    }
}

/// The contents of a block: attributes and nested blocks in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    /// Attributes in source order.
    pub attributes: Vec<Attribute>,
    /// Nested blocks in source order.
    pub blocks: Vec<Block>,
}

impl Body {
    /// Create an empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, attr: Attribute) -> Self {
        self.attributes.push(attr);
        self
    }

    /// Add a nested block.
    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Split the body according to `schema`.
    ///
    /// Attributes and blocks named by the schema are moved into the returned
    /// [`BodyContent`]; everything else is left, untouched, in the returned
    /// remainder body.
    pub fn partial_content(&self, schema: &BodySchema) -> (BodyContent, Body) {
        let mut content = BodyContent::default();
        let mut remain = Body::new();

        for attr in &self.attributes {
            if schema.has_attribute(&attr.name) {
                content.attributes.insert(attr.name.clone(), attr.clone());
            } else {
                remain.attributes.push(attr.clone());
            }
        }
        for block in &self.blocks {
            if schema.has_block(&block.block_type) {
                content.blocks.push(block.clone());
            } else {
                remain.blocks.push(block.clone());
            }
        }

        (content, remain)
    }

    /// Interpret the body as a flat list of attributes with arbitrary names.
    ///
    /// Nested blocks are not allowed in such a body and are reported as
    /// errors.
    pub fn just_attributes(&self) -> (&[Attribute], Diagnostics) {
        let diags = self
            .blocks
            .iter()
            .map(|block| {
                Diagnostic::error("Unexpected block")
                    .with_detail(format!(
                        "Unexpected \"{}\" block; Blocks are not allowed here.",
                        block.block_type
                    ))
                    .with_subject(block.type_range.clone())
            })
            .collect();
        (&self.attributes, diags)
    }
}

/// A block: a type, zero or more labels, and a body.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// The block type, e.g. `provider`.
    pub block_type: String,
    /// The block labels.
    pub labels: Vec<String>,
    /// Ranges of each label, parallel to `labels`.
    pub label_ranges: Vec<SourceRange>,
    /// The block body.
    pub body: Body,
    /// Range of the block header, used as the block's declaration range.
    pub def_range: SourceRange,
    /// Range of the block type keyword.
    pub type_range: SourceRange,
}

impl Block {
    /// Create a block with an empty body and no labels.
    pub fn new(block_type: impl Into<String>, range: SourceRange) -> Self {
        Self {
            block_type: block_type.into(),
            labels: Vec::new(),
            label_ranges: Vec::new(),
            body: Body::new(),
            type_range: range.clone(),
            def_range: range,
        }
    }

    /// Add a label.
    pub fn with_label(mut self, label: impl Into<String>, range: SourceRange) -> Self {
        self.labels.push(label.into());
        self.label_ranges.push(range);
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Set the range of the block type keyword.
    pub fn with_type_range(mut self, range: SourceRange) -> Self {
        self.type_range = range;
        self
    }
}

/// The attribute names and block types a decoder recognizes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodySchema {
    /// Recognized attribute names.
    pub attributes: Vec<String>,
    /// Recognized block types.
    pub blocks: Vec<String>,
}

impl BodySchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recognize an attribute name.
    pub fn with_attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(name.into());
        self
    }

    /// Recognize a block type.
    pub fn with_block(mut self, block_type: impl Into<String>) -> Self {
        self.blocks.push(block_type.into());
        self
    }

    /// Whether `name` is a recognized attribute.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }

    /// Whether `block_type` is a recognized block type.
    pub fn has_block(&self, block_type: &str) -> bool {
        self.blocks.iter().any(|b| b == block_type)
    }
}

/// The parts of a body extracted by [`Body::partial_content`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyContent {
    /// Recognized attributes, by name.
    pub attributes: BTreeMap<String, Attribute>,
    /// Recognized blocks, in source order.
    pub blocks: Vec<Block>,
}
