//! Resolution engine: versions, graph, merge, composition, scaling, validation.

pub mod compose;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod graph;
pub mod merge;
pub mod resolver;
pub mod scale;
pub mod store;
pub mod types;
pub mod validate;
pub mod version;
