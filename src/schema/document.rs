/// Persisted schema document: the shape written by curation saves and
/// read back for analysis and sequence extraction.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use super::step::{Edge, Step};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("schema file contains no schemas")]
    Empty,
}

/// A schema-level slot, promoted from a refvar shared across steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refvar: Option<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A temporal order relation between steps. Only `Before` contributes
/// edges to the event graph; the other relations are carried through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Order {
    Before(Edge),
    Container {
        container: String,
        contained: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
    },
    Overlaps {
        overlaps: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
    },
}

/// Free-form tracking payload attached by the curation front end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrivateData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tracking: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PrivateData {
    pub fn is_empty(&self) -> bool {
        self.tracking.is_empty() && self.author.is_none() && self.extra.is_empty()
    }
}

/// Identifying text for a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaHeader {
    pub schema_id: String,
    pub schema_name: String,
    pub schema_dscpt: String,
    pub schema_version: String,
}

/// A complete event schema. Fields are read-only once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    schema_id: String,
    schema_name: String,
    schema_dscpt: String,
    schema_version: String,
    #[serde(default)]
    slots: Vec<Slot>,
    #[serde(default)]
    steps: Vec<Step>,
    #[serde(default)]
    order: Vec<Order>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    private_data: Option<PrivateData>,
}

impl Schema {
    pub fn new(
        header: SchemaHeader,
        slots: Vec<Slot>,
        steps: Vec<Step>,
        order: Vec<Order>,
        private_data: PrivateData,
    ) -> Self {
        Self {
            schema_id: header.schema_id,
            schema_name: header.schema_name,
            schema_dscpt: header.schema_dscpt,
            schema_version: header.schema_version,
            slots,
            steps,
            order,
            comment: None,
            private_data: (!private_data.is_empty()).then_some(private_data),
        }
    }

    pub fn id(&self) -> &str {
        &self.schema_id
    }

    pub fn name(&self) -> &str {
        &self.schema_name
    }

    pub fn description(&self) -> &str {
        &self.schema_dscpt
    }

    pub fn version(&self) -> &str {
        &self.schema_version
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn order(&self) -> &[Order] {
        &self.order
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn private_data(&self) -> Option<&PrivateData> {
        self.private_data.as_ref()
    }

    /// The `before` edges of this schema, in document order.
    pub fn before_edges(&self) -> impl Iterator<Item = &Edge> {
        self.order.iter().filter_map(|o| match o {
            Order::Before(edge) => Some(edge),
            _ => None,
        })
    }

    /// File stem used when the schema is written out: `<id>_<version>`.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.schema_id, self.schema_version)
    }

    /// Human-readable rendering of the version stamp: `YYYY-MM-DD, HH:MM:SS`.
    pub fn version_display(&self) -> Option<String> {
        let parts: Vec<&str> = self.schema_version.split('-').collect();
        if parts.len() < 6 {
            return None;
        }
        Some(format!("{}, {}", parts[..3].join("-"), parts[3..6].join(":")))
    }

    /// Serialize this schema as a single-element YAML schema list.
    pub fn to_yaml(&self) -> Result<String, SchemaError> {
        schemas_to_yaml(std::slice::from_ref(self))
    }
}

/// Build a version stamp from a timestamp: the `YYYY-MM-DD HH:MM:SS.ffffff`
/// rendering with spaces, colons and periods replaced by `-`. The fraction
/// is left out when it is zero.
pub fn version_stamp(timestamp: NaiveDateTime) -> String {
    let rendered = if timestamp.nanosecond() / 1_000 == 0 {
        timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        format!(
            "{}.{:06}",
            timestamp.format("%Y-%m-%d %H:%M:%S"),
            timestamp.nanosecond() / 1_000 % 1_000_000
        )
    };
    rendered.replace([' ', ':', '.'], "-")
}

/// Replace characters in a refvar that cause trouble in file names.
pub fn clean_refvar(refvar: &str) -> String {
    refvar.replace([' ', '/'], "_")
}

/// Parse a YAML document holding a list of schemas.
pub fn load_schemas(input: &str) -> Result<Vec<Schema>, SchemaError> {
    Ok(serde_yaml::from_str(input)?)
}

/// Load a list of schemas from a YAML file.
pub fn load_schemas_from_file(path: &Path) -> Result<Vec<Schema>, SchemaError> {
    let contents = std::fs::read_to_string(path)?;
    load_schemas(&contents)
}

/// Load the first schema of a YAML schema file.
pub fn load_first_schema(path: &Path) -> Result<Schema, SchemaError> {
    load_schemas_from_file(path)?
        .into_iter()
        .next()
        .ok_or(SchemaError::Empty)
}

pub fn schemas_to_yaml(schemas: &[Schema]) -> Result<String, SchemaError> {
    Ok(serde_yaml::to_string(schemas)?)
}
