//! Curation algorithms: graph validation, slot derivation, sequence
//! extraction, generated-text cleanup, suggestion filtering and quota
//! allocation, plus the engine that wires them together.

pub mod cleanup;
pub mod config;
pub mod filter;
pub mod graph;
pub mod pipeline;
pub mod quota;
pub mod sequence;
pub mod slots;
pub mod validate;

pub use config::{ConfigError, CuratorConfig};
pub use filter::{Criteria, FilterError, FilterPolicy};
pub use pipeline::{build_schema, CuratorEngine, CuratorError, SuggestionGenerator};
pub use validate::ValidationError;
