/// The curation pipeline: Submission → Schema, Schema → Recommendations.
///
/// Wires together validation, slot derivation, sequence extraction,
/// prompt construction, output cleanup, filtering and quota allocation.

use chrono::NaiveDateTime;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::cleanup::clean_generated;
use crate::core::config::{ConfigError, CuratorConfig};
use crate::core::filter::{
    embedded_bad_words, load_bad_words, Criteria, FilterError, FilterPolicy,
};
use crate::core::quota;
use crate::core::sequence::{self, sequence_to_prompt};
use crate::core::slots::derive_slots;
use crate::core::validate::{validate, ValidationError};
use crate::schema::document::{version_stamp, Order, Schema, SchemaError};
use crate::schema::input::Submission;
use crate::schema::recommendation::{RecommendationSet, SequenceSet, SuggestionGroups};

#[derive(Debug, Error)]
pub enum CuratorError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("suggestion generator failed: {0}")]
    Generator(String),
}

/// Produces raw candidate continuations for a prompt.
///
/// Candidates are returned as generated; the engine cleans and filters
/// them.
pub trait SuggestionGenerator {
    fn generate(&self, prompt: &str) -> Result<Vec<String>, CuratorError>;
}

impl<F> SuggestionGenerator for F
where
    F: Fn(&str) -> Result<Vec<String>, CuratorError>,
{
    fn generate(&self, prompt: &str) -> Result<Vec<String>, CuratorError> {
        self(prompt)
    }
}

/// Validate a submission and assemble it into a schema stamped with
/// `schema_version`.
///
/// Nothing is built unless the ordering is acyclic and every refvar is
/// used consistently.
pub fn build_schema(
    submission: Submission,
    schema_version: String,
) -> Result<Schema, ValidationError> {
    let (header, steps, edges, private_data) = submission.into_parts(schema_version)?;
    validate(&steps, &edges)?;

    let slots = derive_slots(&steps);
    let order = edges.into_iter().map(Order::Before).collect::<Vec<_>>();
    info!(
        schema_id = header.schema_id.as_str(),
        steps = steps.len(),
        slots = slots.len(),
        edges = order.len(),
        "built schema"
    );
    Ok(Schema::new(header, slots, steps, order, private_data))
}

/// The top-level curation engine. Built via `CuratorEngine::builder()`.
#[derive(Debug, Clone)]
pub struct CuratorEngine {
    config: CuratorConfig,
    bad_words: Arc<FxHashSet<String>>,
}

/// Builder for constructing a `CuratorEngine`.
#[derive(Debug, Default)]
pub struct CuratorEngineBuilder {
    config_path: Option<String>,
    bad_words_path: Option<String>,
    /// Directly provided config (for testing without files).
    config: Option<CuratorConfig>,
    /// Directly provided denylist (for testing without files).
    bad_words: Option<FxHashSet<String>>,
}

impl CuratorEngine {
    pub fn builder() -> CuratorEngineBuilder {
        CuratorEngineBuilder::default()
    }

    pub fn config(&self) -> &CuratorConfig {
        &self.config
    }

    /// Filter settings for batch recommendation.
    pub fn policy(&self) -> FilterPolicy {
        self.policy_keeping(self.config.keep_per_group)
    }

    fn policy_keeping(&self, keep: usize) -> FilterPolicy {
        FilterPolicy {
            keep,
            similarity_threshold: self.config.similarity_threshold,
            bad_words: Arc::clone(&self.bad_words),
        }
    }

    /// Validate and build a schema from a curator's save request, stamping
    /// it with a version derived from `saved_at`.
    pub fn save_schema(
        &self,
        submission: Submission,
        saved_at: NaiveDateTime,
    ) -> Result<Schema, CuratorError> {
        Ok(build_schema(submission, version_stamp(saved_at))?)
    }

    pub fn extract_sequences(&self, schema: &Schema) -> SequenceSet {
        sequence::extract_sequences(schema, &self.config.sequence_options())
    }

    /// Filter cleaned suggestions per group against the steps already in
    /// the schema.
    pub fn filter_suggestions(
        &self,
        raw: SuggestionGroups,
        existing: &BTreeSet<String>,
    ) -> SuggestionGroups {
        self.policy().filter_groups(raw, existing)
    }

    /// Trim grouped suggestions to the configured budget.
    pub fn allocate(&self, groups: SuggestionGroups) -> SuggestionGroups {
        quota::allocate(groups, self.config.budget)
    }

    /// Filter and budget suggestions that were already generated and
    /// cleaned, keyed by the step they follow.
    pub fn recommend_from_suggestions(
        &self,
        schema: &Schema,
        suggestions: SuggestionGroups,
    ) -> RecommendationSet {
        let existing: BTreeSet<String> = schema.steps().iter().map(|s| s.id.clone()).collect();
        let kept = self.filter_suggestions(suggestions, &existing);
        let events = self.allocate(kept);
        info!(
            schema_id = schema.id(),
            groups = events.len(),
            suggestions = events.total(),
            "recommendations ready"
        );
        RecommendationSet::new(schema.id(), schema.name(), events)
    }

    /// Generate recommendations for every step that ends an extracted
    /// sequence.
    ///
    /// One prompt is built per sequence. Candidates are cleaned and grouped
    /// under the sequence's last step, so a step reached by several
    /// sequences pools the candidates of all of them.
    pub fn recommend(
        &self,
        schema: &Schema,
        generator: &dyn SuggestionGenerator,
    ) -> Result<RecommendationSet, CuratorError> {
        let sequences = self.extract_sequences(schema);
        let mut raw = SuggestionGroups::new();

        for (i, sequence) in sequences.sequences.iter().enumerate() {
            let Some(last) = sequence.last() else {
                continue;
            };
            let prompt = sequence_to_prompt(schema.name(), schema.description(), sequence);
            let candidates = generator.generate(&prompt)?;
            debug!(
                sequence = i + 1,
                of = sequences.sequences.len(),
                candidates = candidates.len(),
                "generated"
            );
            raw.extend(last, candidates.iter().map(|c| clean_generated(c)));
        }

        Ok(self.recommend_from_suggestions(schema, raw))
    }

    /// Suggest what could follow `events` in an unsaved schema.
    ///
    /// Candidates are filtered against `events` themselves, capped at
    /// `interactive_keep`, and returned sorted.
    pub fn suggest_next(
        &self,
        schema_name: &str,
        schema_dscpt: &str,
        events: &[String],
        generator: &dyn SuggestionGenerator,
    ) -> Result<Vec<String>, CuratorError> {
        let prompt = sequence_to_prompt(schema_name, schema_dscpt, events);
        let candidates: Vec<String> = generator
            .generate(&prompt)?
            .iter()
            .map(|c| clean_generated(c))
            .collect();

        let existing: BTreeSet<String> = events.iter().cloned().collect();
        let mut suggestions = self
            .policy_keeping(self.config.interactive_keep)
            .criteria(&existing)
            .apply(candidates);
        suggestions.sort();
        Ok(suggestions)
    }
}

impl CuratorEngineBuilder {
    pub fn config_file(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    pub fn bad_words_file(mut self, path: &str) -> Self {
        self.bad_words_path = Some(path.to_string());
        self
    }

    /// Provide the config directly (for testing without files).
    pub fn with_config(mut self, config: CuratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Provide the denylist directly (for testing without files).
    pub fn with_bad_words(mut self, words: FxHashSet<String>) -> Self {
        self.bad_words = Some(words);
        self
    }

    pub fn build(self) -> Result<CuratorEngine, CuratorError> {
        // A directly provided config wins over a config file.
        let config = match (self.config, self.config_path) {
            (Some(config), _) => {
                config.check()?;
                config
            }
            (None, Some(path)) => CuratorConfig::load_from_ron(Path::new(&path))?,
            (None, None) => CuratorConfig::default(),
        };

        let bad_words = match (self.bad_words, self.bad_words_path) {
            (Some(words), _) => Arc::new(words),
            (None, Some(path)) => Arc::new(load_bad_words(Path::new(&path))?),
            (None, None) => match config.bad_words_file {
                Some(ref path) => Arc::new(load_bad_words(Path::new(path))?),
                None => embedded_bad_words(),
            },
        };

        Ok(CuratorEngine { config, bad_words })
    }
}
