//! Schema Curator: validation and suggestion tooling for curated event
//! schemas.
//!
//! Checks that a curator's step graph is acyclic and uses its shared
//! variables consistently, promotes shared variables to schema slots,
//! extracts bounded step sequences as generation context, and cleans,
//! filters and budgets the candidate next steps a text generator offers.

pub mod core;
pub mod schema;
