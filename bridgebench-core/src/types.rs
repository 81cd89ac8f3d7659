// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! All types validate their invariants at creation time, so anything that
//! reaches the bridge or the exerciser is already well formed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;

/// Maximum length of an object identifier.
const MAX_OBJECT_ID_LEN: usize = 64;

/// Identifier of an object exported over the bridge.
/// Must be non-empty, alphanumeric with hyphens/underscores, max 64 chars.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Name under which the callee exports its entry point.
    pub const ENTRY_POINT: &'static str = "entry_point";

    /// Create a new ObjectId with validation.
    pub fn new(id: impl Into<String>) -> Result<Self, HardValidationError> {
        let id = id.into();

        if id.is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "object_id",
                value: id,
                reason: "Object ID cannot be empty".to_string(),
            });
        }

        if id.len() > MAX_OBJECT_ID_LEN {
            return Err(HardValidationError::InvalidFieldValue {
                field: "object_id",
                value: id.clone(),
                reason: format!(
                    "Object ID too long: {} chars (max {})",
                    id.len(),
                    MAX_OBJECT_ID_LEN
                ),
            });
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(HardValidationError::InvalidFieldValue {
                field: "object_id",
                value: id,
                reason: "Object ID must contain only alphanumeric characters, hyphens, and underscores".to_string(),
            });
        }

        Ok(Self(id))
    }

    /// The well-known id of the callee entry point.
    pub fn entry_point() -> Self {
        Self(Self::ENTRY_POINT.to_string())
    }

    /// Id for the n-th object generated by a registry.
    pub(crate) fn generated(n: u64) -> Self {
        Self(format!("o{}", n))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

/// Validated network port.
/// Must be in range 1-65535 (0 is reserved).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Default bridge port.
    pub const DEFAULT: u16 = 25333;

    /// Create a new Port with validation.
    pub fn new(port: u16) -> Result<Self, HardValidationError> {
        if port == 0 {
            return Err(HardValidationError::InvalidPort {
                port,
                reason: "Port 0 is reserved and cannot be used".to_string(),
            });
        }
        Ok(Self(port))
    }

    /// Get the inner port value.
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl Default for Port {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = HardValidationError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Seed for the deterministic byte generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(i64);

impl Seed {
    /// Seed used when none is given.
    pub const DEFAULT: Seed = Seed(17);

    pub const fn new(seed: i64) -> Self {
        Self(seed)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl Default for Seed {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Seed {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<i64> for Seed {
    fn from(seed: i64) -> Self {
        Self(seed)
    }
}

/// How the server schedules incoming calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerMode {
    /// Shared multi-threaded runtime, one task per incoming call.
    #[default]
    PerCall,
    /// One dedicated thread per connection; all its calls run there.
    Pinned,
}

impl ServerMode {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PerCall => "per_call",
            Self::Pinned => "pinned",
        }
    }
}

impl fmt::Display for ServerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ServerMode {
    type Err = HardValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "per_call" => Ok(Self::PerCall),
            "pinned" => Ok(Self::Pinned),
            _ => Err(HardValidationError::InvalidFieldValue {
                field: "mode",
                value: s.to_string(),
                reason: "expected 'per_call' or 'pinned'".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_valid() {
        assert!(ObjectId::new("entry_point").is_ok());
        assert!(ObjectId::new("o12").is_ok());
        assert!(ObjectId::new("my-callback").is_ok());
    }

    #[test]
    fn test_object_id_invalid() {
        assert!(ObjectId::new("").is_err());
        assert!(ObjectId::new("a".repeat(65)).is_err());
        assert!(ObjectId::new("obj@name").is_err());
        assert!(ObjectId::new("obj name").is_err());
    }

    #[test]
    fn test_object_id_deserialize_validates() {
        let ok: ObjectId = serde_json::from_str("\"o1\"").unwrap();
        assert_eq!(ok, ObjectId::generated(1));
        assert!(serde_json::from_str::<ObjectId>("\"bad id\"").is_err());
    }

    #[test]
    fn test_port_valid() {
        assert!(Port::new(8080).is_ok());
        assert!(Port::new(65535).is_ok());
        assert_eq!(Port::default().value(), 25333);
    }

    #[test]
    fn test_port_invalid() {
        assert!(Port::new(0).is_err());
    }

    #[test]
    fn test_seed_parse() {
        assert_eq!("17".parse::<Seed>().unwrap(), Seed::DEFAULT);
        assert_eq!("-3".parse::<Seed>().unwrap().value(), -3);
        assert!("seventeen".parse::<Seed>().is_err());
    }

    #[test]
    fn test_server_mode_parse() {
        assert_eq!("pinned".parse::<ServerMode>().unwrap(), ServerMode::Pinned);
        assert_eq!("per-call".parse::<ServerMode>().unwrap(), ServerMode::PerCall);
        assert_eq!("PER_CALL".parse::<ServerMode>().unwrap(), ServerMode::PerCall);
        assert!("threaded".parse::<ServerMode>().is_err());
    }
}
