//! Tool library module - persisted tool records and pocket lookups
//!
//! This module provides:
//! - Tool identifiers as referenced by CAM-generated programs
//! - The persisted tool record (with its optional magazine pocket)
//! - The tool library collection with lookup by identifier and by pocket

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Tool identifier
///
/// The tool number as written by the CAM package (`T12` → `ToolId(12)`).
/// Not necessarily equal to the pocket the tool lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolId(
    /// The numeric tool identifier.
    pub u32,
);

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl From<u32> for ToolId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Tool types known to the host tool table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ToolType {
    /// Flat end mill
    #[default]
    Flat,
    /// Ball or bull nose end mill
    Ball,
    /// V-bit, chamfer, countersink
    VBit,
    /// Drill, reamer, counterbore
    Drill,
    /// Face mill / surfacing bit
    Surfacing,
    /// Thread mill or tap
    ThreadMill,
    /// Touch probe
    Probe,
    /// Any type this build does not know about
    #[serde(other)]
    Other,
}

impl std::fmt::Display for ToolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flat => write!(f, "Flat End Mill"),
            Self::Ball => write!(f, "Ball End Mill"),
            Self::VBit => write!(f, "V-Bit"),
            Self::Drill => write!(f, "Drill"),
            Self::Surfacing => write!(f, "Surfacing"),
            Self::ThreadMill => write!(f, "Thread Mill"),
            Self::Probe => write!(f, "Probe"),
            Self::Other => write!(f, "Other"),
        }
    }
}

/// Tool length and position offsets
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolOffsets {
    /// Tool length offset
    pub tlo: f64,
    /// X offset
    pub x: f64,
    /// Y offset
    pub y: f64,
    /// Z offset
    pub z: f64,
}

/// Free-form tool metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolMetadata {
    /// Notes and tips
    pub notes: String,
    /// Image reference
    pub image: String,
    /// Vendor SKU / product id
    pub sku: String,
}

/// One persisted tool library record
///
/// Fields the host owns but this crate does not model are kept in `extra`
/// so that a whole-collection rewrite hands them back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRecord {
    /// Tool identifier (the CAM tool number)
    pub id: ToolId,
    /// Magazine pocket, `None` when the tool is not loaded in the magazine
    #[serde(default, alias = "toolNumber")]
    pub pocket_number: Option<u32>,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Tool type
    #[serde(default, rename = "type")]
    pub tool_type: ToolType,
    /// Cutting diameter in mm
    #[serde(default)]
    pub diameter: f64,
    /// Offsets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offsets: Option<ToolOffsets>,
    /// Metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ToolMetadata>,
    /// Host-owned fields not modelled here
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolRecord {
    /// Create a new record with no pocket assignment
    pub fn new(id: impl Into<ToolId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pocket_number: None,
            name: name.into(),
            tool_type: ToolType::default(),
            diameter: 0.0,
            offsets: None,
            metadata: None,
            extra: Map::new(),
        }
    }

    /// Builder: assign a pocket
    pub fn with_pocket(mut self, pocket: u32) -> Self {
        self.pocket_number = Some(pocket);
        self
    }

    /// Name to show to an operator, falling back to the tool number
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            format!("Tool {}", self.id.0)
        } else {
            self.name.clone()
        }
    }
}

/// Tool library - ordered collection of tool records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolLibrary {
    records: Vec<ToolRecord>,
    index: HashMap<ToolId, usize>,
}

impl ToolLibrary {
    /// Create a new empty tool library
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a library from persisted records.
    ///
    /// Record order is kept. When an identifier appears twice only the first
    /// record is indexed; the duplicate is still written back on save.
    pub fn from_records(records: Vec<ToolRecord>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if index.contains_key(&record.id) {
                tracing::warn!("Duplicate tool {} in library, keeping first entry", record.id);
                continue;
            }
            index.insert(record.id, position);
        }
        Self { records, index }
    }

    /// Get a tool by identifier
    pub fn get(&self, id: ToolId) -> Option<&ToolRecord> {
        self.index.get(&id).map(|&position| &self.records[position])
    }

    /// Check whether the library knows this tool
    pub fn contains(&self, id: ToolId) -> bool {
        self.index.contains_key(&id)
    }

    /// Persisted pocket of a tool (`None` if unknown or not in magazine)
    pub fn pocket_of(&self, id: ToolId) -> Option<u32> {
        self.get(id).and_then(|record| record.pocket_number)
    }

    /// Tools currently recorded in the given pocket
    pub fn occupants_of(&self, pocket: u32) -> Vec<ToolId> {
        self.iter()
            .filter(|record| record.pocket_number == Some(pocket))
            .map(|record| record.id)
            .collect()
    }

    /// Set the pocket of a tool. Returns the previous value, or `None` if the
    /// tool is not in the library.
    pub fn set_pocket(&mut self, id: ToolId, pocket: Option<u32>) -> Option<Option<u32>> {
        let position = *self.index.get(&id)?;
        let record = &mut self.records[position];
        let previous = record.pocket_number;
        record.pocket_number = pocket;
        Some(previous)
    }

    /// Pockets assigned to more than one tool
    pub fn duplicate_pockets(&self) -> Vec<(u32, Vec<ToolId>)> {
        let mut by_pocket: std::collections::BTreeMap<u32, Vec<ToolId>> = Default::default();
        for record in self.iter() {
            if let Some(pocket) = record.pocket_number {
                by_pocket.entry(pocket).or_default().push(record.id);
            }
        }
        by_pocket
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .collect()
    }

    /// Iterate over the indexed records in persisted order
    pub fn iter(&self) -> impl Iterator<Item = &ToolRecord> {
        self.records
            .iter()
            .enumerate()
            .filter(|(position, record)| self.index.get(&record.id) == Some(position))
            .map(|(_, record)| record)
    }

    /// All records in persisted order, duplicates included
    pub fn records(&self) -> &[ToolRecord] {
        &self.records
    }

    /// Consume the library, returning the records for saving
    pub fn into_records(self) -> Vec<ToolRecord> {
        self.records
    }

    /// Number of distinct tools
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if library is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl FromIterator<ToolRecord> for ToolLibrary {
    fn from_iter<I: IntoIterator<Item = ToolRecord>>(iter: I) -> Self {
        Self::from_records(iter.into_iter().collect())
    }
}
