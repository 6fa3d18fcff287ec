//! Event schema data model: steps and their args, ordering relations,
//! derived slots, and the documents exchanged with collaborators.

pub mod document;
pub mod input;
pub mod recommendation;
pub mod step;

pub use document::{Order, PrivateData, Schema, SchemaError, SchemaHeader, Slot};
pub use input::{ArgInput, EventInput, LinkInput, Submission};
pub use recommendation::{RecommendationSet, SequenceSet, SuggestionGroups};
pub use step::{Arg, Edge, Step};
