/// Sequence extraction: bounded simple paths through a schema's
/// `before` ordering, used as context for suggestion generation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::info;

use crate::core::graph::StepGraph;
use crate::schema::document::Schema;
use crate::schema::recommendation::SequenceSet;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Bounds on extracted sequences. Lengths count steps, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceOptions {
    pub min_len: usize,
    pub max_len: usize,
    pub starting_steps_only: bool,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self {
            min_len: 1,
            max_len: 4,
            starting_steps_only: true,
        }
    }
}

/// Extract every simple path of `min_len..=max_len` steps through the
/// schema's `before` edges.
///
/// Start nodes are the steps with no predecessor when
/// `starting_steps_only` is set, otherwise every step in the ordering.
/// Steps that appear in no `before` edge are not part of the ordering.
/// The ordering is trusted to be acyclic; paths never repeat a step
/// either way.
///
/// The result is sorted so that identical schemas always produce
/// identical sequence lists.
pub fn extract_sequences(schema: &Schema, options: &SequenceOptions) -> SequenceSet {
    let graph = StepGraph::from_edges(schema.before_edges());

    let starts = if options.starting_steps_only {
        graph.starting_nodes()
    } else {
        (0..graph.len()).collect()
    };

    let mut sequences: Vec<Vec<String>> = Vec::new();
    if options.min_len <= 1 {
        sequences.extend(starts.iter().map(|&n| vec![graph.id(n).to_string()]));
    }
    for &start in &starts {
        sequences.extend(
            graph
                .simple_paths_from(start, options.max_len)
                .into_iter()
                .filter(|p| p.len() >= options.min_len)
                .map(|p| p.into_iter().map(|n| graph.id(n).to_string()).collect()),
        );
    }
    sequences.sort();

    info!(
        schema_id = schema.id(),
        starts = starts.len(),
        sequences = sequences.len(),
        "extracted sequences"
    );

    SequenceSet {
        schema_id: schema.id().to_string(),
        name: schema.name().to_string(),
        description: schema.description().to_string(),
        sequences,
    }
}

/// Render a step sequence as a numbered-list prompt whose next item the
/// generator is expected to fill in.
///
/// `"<description> Describe steps of <name>. 1. a. 2. b. 3. "`
pub fn sequence_to_prompt(schema_name: &str, schema_dscpt: &str, sequence: &[String]) -> String {
    let description = WHITESPACE_RUN.replace_all(schema_dscpt, " ");
    let mut text = format!(
        "{} Describe steps of {}. ",
        description,
        schema_name.replace('_', " ")
    );
    let numbered: Vec<String> = sequence
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}.", i + 1, step))
        .chain(std::iter::once(format!("{}. ", sequence.len() + 1)))
        .collect();
    text.push_str(&numbered.join(" "));
    text
}
