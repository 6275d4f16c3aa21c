//! Manual pocket mappings
//!
//! Operator overrides that take precedence over the pocket recorded in the
//! tool library. Three states are kept apart:
//! - no override for a tool (key absent, [`MappingState::Unset`])
//! - an explicit "not in magazine" override ([`PocketOverride::NotInMagazine`])
//! - an explicit pocket ([`PocketOverride::Pocket`])
//!
//! On the wire `NotInMagazine` is written as `-1`. Older settings files wrote
//! `null` for the same thing, so both decode to `NotInMagazine`.

use crate::data::tools::ToolId;
use crate::error::MappingError;
use serde::de::IgnoredAny;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Wire value for [`PocketOverride::NotInMagazine`]
pub const NOT_IN_MAGAZINE: i64 = -1;

/// An explicit operator override for one tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PocketOverride {
    /// Force the tool into this pocket
    Pocket(u32),
    /// Force the tool to be treated as a manual tool change
    NotInMagazine,
}

impl PocketOverride {
    /// The pocket, if this override names one
    pub fn pocket(self) -> Option<u32> {
        match self {
            Self::Pocket(pocket) => Some(pocket),
            Self::NotInMagazine => None,
        }
    }

    /// Build an override from an optional pocket (`None` → not in magazine)
    pub fn from_pocket(pocket: Option<u32>) -> Self {
        pocket.map_or(Self::NotInMagazine, Self::Pocket)
    }

    /// Decode a raw numeric wire value
    pub fn from_wire(value: i64) -> Result<Self, MappingError> {
        match value {
            NOT_IN_MAGAZINE => Ok(Self::NotInMagazine),
            n if n >= 1 && n <= i64::from(u32::MAX) => Ok(Self::Pocket(n as u32)),
            n => Err(MappingError::InvalidPocketValue { value: n }),
        }
    }

    /// Encode to the numeric wire value
    pub fn to_wire(self) -> i64 {
        match self {
            Self::Pocket(pocket) => i64::from(pocket),
            Self::NotInMagazine => NOT_IN_MAGAZINE,
        }
    }

    fn from_raw(raw: Option<RawOverride>) -> Result<Self, MappingError> {
        match raw {
            None => Ok(Self::NotInMagazine),
            Some(RawOverride::Number(n)) => Self::from_wire(n),
            Some(RawOverride::Text(text)) => {
                let text = text.trim();
                if text.is_empty() || text.eq_ignore_ascii_case("none") {
                    Ok(Self::NotInMagazine)
                } else {
                    let n = text
                        .parse::<i64>()
                        .map_err(|_| MappingError::UnparsablePocket {
                            value: text.to_string(),
                        })?;
                    Self::from_wire(n)
                }
            }
            Some(RawOverride::Other(_)) => Err(MappingError::UnparsablePocket {
                value: "non-numeric value".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for PocketOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pocket(pocket) => write!(f, "pocket {}", pocket),
            Self::NotInMagazine => write!(f, "not in magazine"),
        }
    }
}

/// Lenient form of a mapping value as it may appear in settings files and
/// dialog payloads.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawOverride {
    Number(i64),
    Text(String),
    Other(IgnoredAny),
}

impl Serialize for PocketOverride {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_wire())
    }
}

impl<'de> Deserialize<'de> for PocketOverride {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<RawOverride>::deserialize(deserializer)?;
        Self::from_raw(raw).map_err(serde::de::Error::custom)
    }
}

/// Three-state view of the override for one tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingState {
    /// No override recorded
    Unset,
    /// Explicitly not in the magazine
    NotInMagazine,
    /// Explicitly in this pocket
    Pocket(u32),
}

impl From<Option<PocketOverride>> for MappingState {
    fn from(value: Option<PocketOverride>) -> Self {
        match value {
            None => Self::Unset,
            Some(PocketOverride::NotInMagazine) => Self::NotInMagazine,
            Some(PocketOverride::Pocket(pocket)) => Self::Pocket(pocket),
        }
    }
}

/// Tool identifier → override, ordered by identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualMappings {
    entries: BTreeMap<ToolId, PocketOverride>,
}

impl ManualMappings {
    /// Create an empty mapping set
    pub fn new() -> Self {
        Self::default()
    }

    /// Override for a tool, if any
    pub fn get(&self, id: ToolId) -> Option<PocketOverride> {
        self.entries.get(&id).copied()
    }

    /// Three-state lookup
    pub fn state(&self, id: ToolId) -> MappingState {
        self.get(id).into()
    }

    /// Check whether an override exists for a tool
    pub fn contains(&self, id: ToolId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Record an override, returning the previous one
    pub fn set(&mut self, id: ToolId, value: PocketOverride) -> Option<PocketOverride> {
        self.entries.insert(id, value)
    }

    /// Drop the override for a tool
    pub fn remove(&mut self, id: ToolId) -> Option<PocketOverride> {
        self.entries.remove(&id)
    }

    /// Tools whose override names the given pocket
    pub fn tools_in_pocket(&self, pocket: u32) -> Vec<ToolId> {
        self.entries
            .iter()
            .filter(|(_, value)| value.pocket() == Some(pocket))
            .map(|(&id, _)| id)
            .collect()
    }

    /// Copy of `self` with `other`'s entries layered on top
    pub fn overlay(&self, other: &ManualMappings) -> ManualMappings {
        let mut merged = self.clone();
        merged
            .entries
            .extend(other.entries.iter().map(|(&id, &value)| (id, value)));
        merged
    }

    /// Iterate in identifier order
    pub fn iter(&self) -> impl Iterator<Item = (ToolId, PocketOverride)> + '_ {
        self.entries.iter().map(|(&id, &value)| (id, value))
    }

    /// Number of overrides
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no overrides
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(ToolId, PocketOverride)> for ManualMappings {
    fn from_iter<I: IntoIterator<Item = (ToolId, PocketOverride)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// Keys are written as decimal strings so the map is valid in both JSON and TOML.
impl Serialize for ManualMappings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, value) in &self.entries {
            map.serialize_entry(&id.0.to_string(), value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ManualMappings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Option<RawOverride>>::deserialize(deserializer)?;
        let mut entries = BTreeMap::new();
        for (key, value) in raw {
            let id = match key.trim().parse::<u32>() {
                Ok(id) if id > 0 => ToolId(id),
                _ => {
                    tracing::warn!("Ignoring manual mapping with invalid tool key {:?}", key);
                    continue;
                }
            };
            match PocketOverride::from_raw(value) {
                Ok(value) => {
                    entries.insert(id, value);
                }
                Err(e) => tracing::warn!("Ignoring manual mapping for {}: {}", id, e),
            }
        }
        Ok(Self { entries })
    }
}
