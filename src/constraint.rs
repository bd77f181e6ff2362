//! Version constraint grammar.
//!
//! A constraint string is a comma-separated list of `<operator> <version>`
//! terms, all of which must hold:
//!
//! | Operator | Meaning |
//! |---|---|
//! | `=` (or none) | exactly this version |
//! | `!=` | anything but this version |
//! | `>`, `>=`, `<`, `<=` | ordered comparison |
//! | `~>` | this version or newer, where only the rightmost specified segment may increase |
//!
//! Versions have one or more numeric segments, an optional `-prerelease`
//! and an optional `+metadata`. Prerelease versions only satisfy a term whose
//! own version is a prerelease of the same release.
//!
//! ```
//! use hemmer_provider_config::constraint::{Constraints, Version};
//!
//! let constraints: Constraints = "~> 1.0.0".parse().unwrap();
//! assert!(constraints.check(&Version::parse("1.0.9").unwrap()));
//! assert!(!constraints.check(&Version::parse("1.1.0").unwrap()));
//! ```

use crate::error::ConstraintError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// Versions are padded with zero segments up to at least major.minor.patch.
const MIN_SEGMENTS: usize = 3;

/// A version number.
#[derive(Debug, Clone)]
pub struct Version {
    segments: Vec<u64>,
    specified: usize,
    prerelease: Option<String>,
    metadata: Option<String>,
}

impl Version {
    /// Parse a version such as `1.2`, `v1.2.3` or `1.2.3-beta.1+build.5`.
    pub fn parse(input: &str) -> Result<Self, ConstraintError> {
        let malformed = || ConstraintError::Version(input.to_string());

        let text = input.trim();
        let text = text.strip_prefix('v').unwrap_or(text);

        let (text, metadata) = match text.split_once('+') {
            Some((rest, meta)) => (rest, Some(meta)),
            None => (text, None),
        };
        let (core, prerelease) = match text.split_once('-') {
            Some((rest, pre)) => (rest, Some(pre)),
            None => (text, None),
        };

        let mut segments = Vec::with_capacity(MIN_SEGMENTS);
        for part in core.split('.') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            segments.push(part.parse().map_err(|_| malformed())?);
        }
        let specified = segments.len();
        if segments.len() < MIN_SEGMENTS {
            segments.resize(MIN_SEGMENTS, 0);
        }

        for label in [prerelease, metadata].into_iter().flatten() {
            if !is_valid_label(label) {
                return Err(malformed());
            }
        }

        Ok(Self {
            segments,
            specified,
            prerelease: prerelease.map(str::to_string),
            metadata: metadata.map(str::to_string),
        })
    }

    /// The numeric segments, padded with zeros to at least major, minor
    /// and patch.
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    /// The prerelease label, if any.
    pub fn prerelease(&self) -> Option<&str> {
        self.prerelease.as_deref()
    }

    /// The build metadata, if any. Metadata does not take part in ordering.
    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label
            .split('.')
            .all(|id| {
                !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
            })
}

// Missing trailing segments compare as zero, so 1.2.3 == 1.2.3.0.
fn compare_segments(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

fn compare_prerelease(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            },
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_segments(&self.segments, &other.segments)
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_prerelease(a, b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl FromStr for Version {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments[..self.specified].iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        if let Some(pre) = &self.prerelease {
            write!(f, "-{}", pre)?;
        }
        if let Some(meta) = &self.metadata {
            write!(f, "+{}", meta)?;
        }
        Ok(())
    }
}

/// A comparison operator in a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    Greater,
    /// `<`
    Less,
    /// `>=`
    GreaterOrEqual,
    /// `<=`
    LessOrEqual,
    /// `~>`
    Pessimistic,
}

impl Operator {
    // Two-character operators must come before their one-character prefixes.
    const ALL: [(&'static str, Operator); 7] = [
        (">=", Operator::GreaterOrEqual),
        ("<=", Operator::LessOrEqual),
        ("!=", Operator::NotEqual),
        ("~>", Operator::Pessimistic),
        (">", Operator::Greater),
        ("<", Operator::Less),
        ("=", Operator::Equal),
    ];

    /// The operator's symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
            Operator::Pessimistic => "~>",
        }
    }
}

/// A single `<operator> <version>` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    operator: Operator,
    version: Version,
}

impl Constraint {
    /// Parse a single term such as `>= 1.2`.
    pub fn parse(input: &str) -> Result<Self, ConstraintError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(ConstraintError::Empty);
        }

        let (operator, rest) = Operator::ALL
            .iter()
            .find_map(|(symbol, op)| text.strip_prefix(symbol).map(|rest| (*op, rest)))
            .unwrap_or((Operator::Equal, text));

        let rest = rest.trim_start();
        if rest.is_empty() || rest.starts_with(['=', '<', '>', '!', '~']) {
            return Err(ConstraintError::Malformed(text.to_string()));
        }

        let version = Version::parse(rest)?;
        Ok(Self { operator, version })
    }

    /// The comparison operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The version the operator compares against.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Whether `version` satisfies this term.
    pub fn check(&self, version: &Version) -> bool {
        if !self.prerelease_allowed(version) {
            return false;
        }
        let c = &self.version;
        match self.operator {
            Operator::Equal => version == c,
            Operator::NotEqual => version != c,
            Operator::Greater => version > c,
            Operator::Less => version < c,
            Operator::GreaterOrEqual => version >= c,
            Operator::LessOrEqual => version <= c,
            Operator::Pessimistic => {
                let fixed = c.specified.saturating_sub(1);
                version >= c
                    && (0..fixed).all(|i| {
                        version.segments.get(i).copied().unwrap_or(0) == c.segments[i]
                    })
            },
        }
    }

    fn prerelease_allowed(&self, version: &Version) -> bool {
        match (version.is_prerelease(), self.version.is_prerelease()) {
            (true, true) => {
                compare_segments(&version.segments, &self.version.segments) == Ordering::Equal
            },
            (true, false) => false,
            // A release never satisfies a pessimistic bound on a prerelease.
            (false, true) => self.operator != Operator::Pessimistic,
            (false, false) => true,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operator.symbol(), self.version)
    }
}

/// A set of terms that must all hold. The empty set accepts every version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints(Vec<Constraint>);

impl Constraints {
    /// The empty, unconstrained set.
    pub fn unconstrained() -> Self {
        Self::default()
    }

    /// Parse a comma-separated constraint string.
    pub fn parse(input: &str) -> Result<Self, ConstraintError> {
        input
            .split(',')
            .map(Constraint::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Whether `version` satisfies every term.
    pub fn check(&self, version: &Version) -> bool {
        self.0.iter().all(|c| c.check(version))
    }

    /// Whether there are no terms.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the terms in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Constraint> {
        self.0.iter()
    }
}

impl FromStr for Constraints {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Constraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, constraint) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", constraint)?;
        }
        Ok(())
    }
}

impl Serialize for Constraints {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Constraints {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        if text.trim().is_empty() {
            return Ok(Self::unconstrained());
        }
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
