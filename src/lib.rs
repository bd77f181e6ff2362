//! Hemmer Provider Configuration
//!
//! This crate decodes the `provider` and `required_providers` blocks of a
//! Hemmer configuration into strongly-typed records. It sits between the
//! configuration language parser, which supplies parsed blocks and evaluated
//! values, and the rest of the configuration pipeline.
//!
//! # Overview
//!
//! - **Provider blocks** ([`decode_provider_block`]): validates the block,
//!   extracts `alias` and `version`, rejects reserved names and passes the
//!   provider-specific remainder through untouched.
//! - **Required providers** ([`decode_required_providers`]): decodes each
//!   entry as either a version constraint string or a `{ source, version }`
//!   object into a [`ProviderRequirement`].
//! - **Version constraints** ([`constraint`], [`version`]): parses constraint
//!   strings such as `>= 1.2, < 2.0` and `~> 1.0.0`.
//! - **Addressing** ([`ProviderAddr`]): the identity of a provider
//!   configuration and its unique key within a module.
//!
//! Decoding never stops at the first problem. Every decoder returns its best
//! result together with all [`Diagnostics`] it found, each pointing at a
//! source range.
//!
//! # Quick Start
//!
//! ```
//! use hemmer_provider_config::syntax::{Attribute, Block, Body, Expression, SourceRange};
//! use hemmer_provider_config::{decode_required_providers, DecoderOptions};
//! use serde_json::json;
//!
//! let range = SourceRange::synthetic("versions.hcl");
//! let block = Block::new("required_providers", range.clone()).with_body(
//!     Body::new()
//!         .with_attribute(Attribute::new(
//!             "aws",
//!             Expression::literal(
//!                 json!({"source": "hashicorp/aws", "version": "~> 1.0.0"}),
//!                 range.clone(),
//!             ),
//!         ))
//!         .with_attribute(Attribute::new("google", Expression::literal("~> 3.0", range))),
//! );
//!
//! let (reqs, diags) = decode_required_providers(&block, &DecoderOptions::default())?;
//! assert!(!diags.has_errors());
//!
//! let aws = reqs.by_key("aws").unwrap();
//! assert_eq!((aws.name.as_str(), aws.alias.as_str()), ("aws", "aws"));
//! assert_eq!(aws.source, "hashicorp/aws");
//! # Ok::<(), hemmer_provider_config::DecodeError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod addrs;
pub mod config;
pub mod constraint;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod provider;
pub mod requirements;
pub mod syntax;
pub mod testing;
pub mod validation;
pub mod version;

// Re-export main types at crate root
pub use addrs::{ProviderAddr, ProviderRef};
pub use config::{DecoderOptions, RequirementSchema, UnsupportedEntryPolicy};
pub use constraint::{Constraints, Version};
pub use diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics};
pub use error::{ConstraintError, ConversionError, DecodeError};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{decode_provider_block, Provider};
pub use requirements::{decode_required_providers, ProviderRequirement, RequiredProviders};
pub use version::{decode_version_constraint, VersionConstraint};

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
