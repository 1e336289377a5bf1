//! Identifier types for stands, regimes and planning periods.

use std::fmt;

/// A planning period, identified by its calendar year.
pub type Year = i32;

/// Identifier of a stand (a spatial management unit).
///
/// # Example
///
/// ```
/// use multiforest_core::StandId;
///
/// let id = StandId::from("stand-7");
/// assert_eq!(id.as_str(), "stand-7");
/// assert_eq!(id.to_string(), "stand-7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StandId(String);

impl StandId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StandId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StandId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for StandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Label of a management regime.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RegimeId(String);

impl RegimeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RegimeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RegimeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for RegimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
