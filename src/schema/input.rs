/// Curation payloads as submitted by the front end, and their conversion
/// into strict steps and edges.
///
/// The front end sends loosely-shaped records: args may omit `refvar`,
/// send `reference: null`, or leave constraints out entirely. Everything
/// is checked here so the graph algorithms never re-check field presence.

use serde::{Deserialize, Serialize};

use super::document::{PrivateData, SchemaHeader};
use super::step::{Arg, Edge, Step};
use crate::core::validate::ValidationError;

/// One argument as sent by the front end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArgInput {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub refvar: Option<String>,
    #[serde(default)]
    pub constraints: Option<Vec<String>>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// One event as sent by the front end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventInput {
    #[serde(default)]
    pub event_text: Option<String>,
    #[serde(default)]
    pub event_primitive: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<ArgInput>>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub reference: Option<String>,
}

/// A `source` → `target` ordering link drawn in the front end's graph view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInput {
    pub source: String,
    pub target: String,
}

/// A complete save request for one schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    pub schema_id: String,
    pub schema_name: String,
    pub schema_dscpt: String,
    #[serde(default)]
    pub events: Vec<EventInput>,
    #[serde(default)]
    pub links: Vec<LinkInput>,
    #[serde(default)]
    pub tracking: Vec<serde_json::Value>,
    #[serde(default)]
    pub author: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl ArgInput {
    fn into_arg(self, step: &str) -> Result<Arg, ValidationError> {
        let role = non_empty(self.role).ok_or_else(|| ValidationError::MissingField {
            step: step.to_string(),
            field: "role",
        })?;
        Ok(Arg {
            role,
            refvar: non_empty(self.refvar),
            constraints: self.constraints.unwrap_or_default(),
            reference: self.reference,
            comment: self.comment,
        })
    }
}

impl TryFrom<EventInput> for Step {
    type Error = ValidationError;

    fn try_from(event: EventInput) -> Result<Self, Self::Error> {
        let id = non_empty(event.event_text).ok_or_else(|| ValidationError::MissingField {
            step: String::new(),
            field: "event_text",
        })?;
        let primitive =
            non_empty(event.event_primitive).ok_or_else(|| ValidationError::MissingField {
                step: id.clone(),
                field: "event_primitive",
            })?;
        let slots = event
            .args
            .unwrap_or_default()
            .into_iter()
            .map(|arg| arg.into_arg(&id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Step {
            id,
            primitive,
            slots,
            comment: event.comment,
            required: event.required,
            reference: event.reference,
        })
    }
}

impl From<LinkInput> for Edge {
    fn from(link: LinkInput) -> Self {
        Edge::new(link.source, link.target)
    }
}

impl Submission {
    /// Split into the header, strict steps and edges, and tracking payload.
    pub fn into_parts(
        self,
        schema_version: String,
    ) -> Result<(SchemaHeader, Vec<Step>, Vec<Edge>, PrivateData), ValidationError> {
        let steps = self
            .events
            .into_iter()
            .map(Step::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let edges = self.links.into_iter().map(Edge::from).collect();
        let header = SchemaHeader {
            schema_id: self.schema_id,
            schema_name: self.schema_name,
            schema_dscpt: self.schema_dscpt,
            schema_version,
        };
        let private_data = PrivateData {
            tracking: self.tracking,
            author: self.author,
            ..PrivateData::default()
        };
        Ok((header, steps, edges, private_data))
    }
}
