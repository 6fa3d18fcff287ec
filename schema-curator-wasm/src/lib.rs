//! WASM bindings for schema-curator: powers the curation front end.
//!
//! Every call takes and returns JSON (or YAML for schema documents) so the
//! front end never sees Rust types.

use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use wasm_bindgen::prelude::*;

use schema_curator::core::cleanup::clean_generated;
use schema_curator::core::config::CuratorConfig;
use schema_curator::core::pipeline::{CuratorEngine, CuratorError};
use schema_curator::core::sequence::sequence_to_prompt;
use schema_curator::core::validate::validate;
use schema_curator::schema::document::{load_schemas, Schema};
use schema_curator::schema::input::Submission;
use schema_curator::schema::recommendation::SuggestionGroups;

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct SavedSchema {
    file_name: String,
    schema_version: String,
    version_display: Option<String>,
    yaml: String,
}

#[derive(serde::Serialize)]
struct ValidationReport {
    valid: bool,
    message: Option<String>,
    detail: Option<String>,
}

#[derive(serde::Deserialize)]
struct FilterRequest {
    suggestions: SuggestionGroups,
    #[serde(default)]
    existing: BTreeSet<String>,
}

#[derive(serde::Deserialize)]
struct NextRequest {
    schema_name: String,
    schema_dscpt: String,
    #[serde(default)]
    events: Vec<String>,
    /// Raw generator output for the prompt built from `events`.
    #[serde(default)]
    predictions: Vec<String>,
}

const SAVED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

// ---------------------------------------------------------------------------
// JSON-in / JSON-out operations, shared by the bindings and native tests
// ---------------------------------------------------------------------------
fn validate_json(submission_json: &str) -> Result<String, String> {
    let submission: Submission =
        serde_json::from_str(submission_json).map_err(|e| format!("Invalid submission JSON: {e}"))?;
    let report = match submission
        .into_parts(String::new())
        .and_then(|(_, steps, edges, _)| validate(&steps, &edges))
    {
        Ok(()) => ValidationReport {
            valid: true,
            message: None,
            detail: None,
        },
        Err(e) => ValidationReport {
            valid: false,
            message: Some(e.user_message().to_string()),
            detail: Some(e.to_string()),
        },
    };
    to_json(&report)
}

fn save_schema_json(
    engine: &CuratorEngine,
    submission_json: &str,
    saved_at: &str,
) -> Result<String, String> {
    let submission: Submission =
        serde_json::from_str(submission_json).map_err(|e| format!("Invalid submission JSON: {e}"))?;
    let saved_at = NaiveDateTime::parse_from_str(saved_at, SAVED_AT_FORMAT)
        .map_err(|e| format!("Invalid timestamp '{saved_at}': {e}"))?;
    let schema = engine.save_schema(submission, saved_at).map_err(describe)?;
    let yaml = schema.to_yaml().map_err(|e| format!("Serialization error: {e}"))?;
    to_json(&SavedSchema {
        file_name: format!("{}.yaml", schema.file_stem()),
        schema_version: schema.version().to_string(),
        version_display: schema.version_display(),
        yaml,
    })
}

fn sequences_json(engine: &CuratorEngine, schema_yaml: &str) -> Result<String, String> {
    let schema = first_schema(schema_yaml)?;
    to_json(&engine.extract_sequences(&schema))
}

fn filter_json(engine: &CuratorEngine, request_json: &str) -> Result<String, String> {
    let request: FilterRequest =
        serde_json::from_str(request_json).map_err(|e| format!("Invalid filter JSON: {e}"))?;
    let kept = engine.filter_suggestions(request.suggestions, &request.existing);
    to_json(&engine.allocate(kept))
}

fn recommend_json(
    engine: &CuratorEngine,
    schema_yaml: &str,
    suggestions_json: &str,
) -> Result<String, String> {
    let schema = first_schema(schema_yaml)?;
    let suggestions: SuggestionGroups = serde_json::from_str(suggestions_json)
        .map_err(|e| format!("Invalid suggestions JSON: {e}"))?;
    to_json(&engine.recommend_from_suggestions(&schema, suggestions))
}

fn next_json(engine: &CuratorEngine, request_json: &str) -> Result<String, String> {
    let request: NextRequest =
        serde_json::from_str(request_json).map_err(|e| format!("Invalid request JSON: {e}"))?;
    let predictions = request.predictions;
    let generator = move |_: &str| -> Result<Vec<String>, CuratorError> { Ok(predictions.clone()) };
    let suggestions = engine
        .suggest_next(
            &request.schema_name,
            &request.schema_dscpt,
            &request.events,
            &generator,
        )
        .map_err(describe)?;
    to_json(&suggestions)
}

fn prompt_json(request_json: &str) -> Result<String, String> {
    let request: NextRequest =
        serde_json::from_str(request_json).map_err(|e| format!("Invalid request JSON: {e}"))?;
    Ok(sequence_to_prompt(
        &request.schema_name,
        &request.schema_dscpt,
        &request.events,
    ))
}

fn first_schema(schema_yaml: &str) -> Result<Schema, String> {
    load_schemas(schema_yaml)
        .map_err(|e| format!("Invalid schema YAML: {e}"))?
        .into_iter()
        .next()
        .ok_or_else(|| "Schema YAML holds no schemas".to_string())
}

fn describe(e: CuratorError) -> String {
    match e {
        CuratorError::Validation(v) => v.user_message().to_string(),
        other => format!("Curation error: {other}"),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {e}"))
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// A curation session holding one configured engine.
#[wasm_bindgen]
pub struct CuratorSession {
    engine: CuratorEngine,
}

#[wasm_bindgen]
impl CuratorSession {
    /// Create a session, optionally from RON configuration text.
    #[wasm_bindgen(constructor)]
    pub fn new(config_ron: Option<String>) -> Result<CuratorSession, JsError> {
        let config = match config_ron {
            Some(text) => CuratorConfig::parse_ron(&text)
                .map_err(|e| JsError::new(&format!("Invalid config: {e}")))?,
            None => CuratorConfig::default(),
        };
        let engine = CuratorEngine::builder()
            .with_config(config)
            .build()
            .map_err(|e| JsError::new(&format!("Engine error: {e}")))?;
        Ok(CuratorSession { engine })
    }

    /// Check a submission without saving it. Returns
    /// `{"valid": bool, "message": ..., "detail": ...}`.
    pub fn validate(submission_json: &str) -> Result<String, JsError> {
        validate_json(submission_json).map_err(|e| JsError::new(&e))
    }

    /// Build a schema from a submission. `saved_at` is an ISO-8601 local
    /// timestamp such as `2021-03-04T05:06:07.890123`. Returns
    /// `{"file_name", "schema_version", "version_display", "yaml"}`.
    pub fn save_schema(&self, submission_json: &str, saved_at: &str) -> Result<String, JsError> {
        save_schema_json(&self.engine, submission_json, saved_at).map_err(|e| JsError::new(&e))
    }

    /// Sequences of the first schema in a YAML document, as JSON.
    pub fn sequences(&self, schema_yaml: &str) -> Result<String, JsError> {
        sequences_json(&self.engine, schema_yaml).map_err(|e| JsError::new(&e))
    }

    /// Filter and budget `{"suggestions": {...}, "existing": [...]}`.
    pub fn filter_suggestions(&self, request_json: &str) -> Result<String, JsError> {
        filter_json(&self.engine, request_json).map_err(|e| JsError::new(&e))
    }

    /// Build the recommendation document for a schema from cleaned
    /// suggestions grouped by step.
    pub fn recommend(&self, schema_yaml: &str, suggestions_json: &str) -> Result<String, JsError> {
        recommend_json(&self.engine, schema_yaml, suggestions_json).map_err(|e| JsError::new(&e))
    }

    /// Sorted next-step suggestions for an unsaved sequence of events.
    pub fn suggest_next(&self, request_json: &str) -> Result<String, JsError> {
        next_json(&self.engine, request_json).map_err(|e| JsError::new(&e))
    }

    /// The generator prompt for a sequence of events.
    pub fn prompt(request_json: &str) -> Result<String, JsError> {
        prompt_json(request_json).map_err(|e| JsError::new(&e))
    }

    /// Clean one raw generator output.
    pub fn clean(text: &str) -> String {
        clean_generated(text)
    }
}
