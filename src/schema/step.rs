use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A slot binding on a step: the role it fills, the shared variable it
/// names (if any), and the coarse entity types allowed to fill it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arg {
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

impl Arg {
    /// Returns the shared variable name, treating an empty name as absent.
    pub fn refvar(&self) -> Option<&str> {
        self.refvar.as_deref().filter(|r| !r.is_empty())
    }

    /// Constraints as a set: order and repetition are irrelevant when
    /// comparing two args that share a refvar.
    pub fn constraint_set(&self) -> BTreeSet<&str> {
        self.constraints.iter().map(String::as_str).collect()
    }
}

/// One event instance in a schema graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub primitive: String,
    #[serde(default)]
    pub slots: Vec<Arg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Step {
    /// Steps are required unless explicitly marked optional.
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(true)
    }

    /// Iterates the non-empty refvars bound on this step, in slot order.
    pub fn refvars(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().filter_map(Arg::refvar)
    }
}

/// A `before` relation: the step named by `before` precedes the one
/// named by `after`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub before: String,
    pub after: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Edge {
    pub fn new(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
            comment: None,
        }
    }
}
