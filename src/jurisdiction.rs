//! Jurisdiction registry: the closed set of filing jurisdictions.
//!
//! Maps two-letter jurisdiction codes to display names and validates codes
//! before any session work begins. Filing URLs and selectors are *not* kept
//! here; those are discovered at runtime by the research and selector
//! discovery engines.

use crate::error::{FilingError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Supported jurisdictions in listing order: the 50 US states plus DC
const JURISDICTIONS: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

/// Insertion-ordered lookup table built once on first use
static REGISTRY: LazyLock<IndexMap<&'static str, &'static str>> =
    LazyLock::new(|| JURISDICTIONS.iter().copied().collect());

/// Check whether a jurisdiction code is in the supported set (case-insensitive)
pub fn is_supported(code: &str) -> bool {
    REGISTRY.contains_key(code.to_ascii_uppercase().as_str())
}

/// All supported jurisdiction codes, in registry order
pub fn list_supported() -> Vec<&'static str> {
    REGISTRY.keys().copied().collect()
}

/// Display name for a jurisdiction code
pub fn display_name(code: &str) -> Result<&'static str> {
    REGISTRY
        .get(code.to_ascii_uppercase().as_str())
        .copied()
        .ok_or_else(|| FilingError::UnsupportedJurisdiction(code.to_string()))
}

/// A validated two-letter jurisdiction code, normalized to uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JurisdictionCode(String);

impl JurisdictionCode {
    /// Validate and normalize a raw code
    pub fn new(code: &str) -> Result<Self> {
        let normalized = code.trim().to_ascii_uppercase();
        if REGISTRY.contains_key(normalized.as_str()) {
            Ok(Self(normalized))
        } else {
            Err(FilingError::UnsupportedJurisdiction(code.to_string()))
        }
    }

    /// The uppercase two-letter code
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display name from the registry
    pub fn display_name(&self) -> &'static str {
        // Membership was checked at construction
        REGISTRY.get(self.0.as_str()).copied().unwrap_or("Unknown")
    }
}

impl fmt::Display for JurisdictionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for JurisdictionCode {
    type Err = FilingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for JurisdictionCode {
    type Error = FilingError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<JurisdictionCode> for String {
    fn from(code: JurisdictionCode) -> Self {
        code.0
    }
}
