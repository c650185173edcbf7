//! Storage backends
//!
//! The pipeline writes through the `PredicateSink` trait. `SqliteSink` is
//! the bundled implementation for local, persistent graphs.

mod sqlite;

pub use sqlite::{NounKind, SqliteSink};
