//! Identifiers for the two axes of an estimate
//!
//! Both are opaque labels: the engine preserves caller order but never
//! interprets the text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A time bucket, typically a fiscal quarter (e.g. `Q1_FY25`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(pub String);

/// A product type (e.g. `H100`, `v5e`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variant(pub String);

impl Period {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Variant {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Period {
    fn from(s: &str) -> Self {
        Period(s.to_string())
    }
}

impl From<String> for Period {
    fn from(s: String) -> Self {
        Period(s)
    }
}

impl From<&str> for Variant {
    fn from(s: &str) -> Self {
        Variant(s.to_string())
    }
}

impl From<String> for Variant {
    fn from(s: String) -> Self {
        Variant(s)
    }
}
