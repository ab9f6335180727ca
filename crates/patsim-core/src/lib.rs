//! # patsim Core
//!
//! Compares how two (optionally acronym-related) search terms behave in a
//! patent search engine.
//!
//! The terms are expanded into boolean query variants, each query is run
//! through an injected [`Retriever`](retrieval::Retriever), and the
//! resulting identifier sets are scored pairwise with Jaccard and Dice
//! distance. The crate does no I/O of its own; retrieval backends and output
//! formats live with the caller (see the `patsim` CLI).
//!
//! ## Modules
//!
//! - [`expansion`] - Boolean query expansion and URL query encoding
//! - [`similarity`] - Jaccard/Dice distances and the fixed-order distance vector
//! - [`retrieval`] - Retriever trait, result sets, in-memory retriever
//! - [`analysis`] - Per-line orchestration producing an [`OutputRecord`](record::OutputRecord)
//! - [`record`] - Output record types
//! - [`config`] - Analysis configuration and shared constants
//! - [`error`] - Line-scoped error types

pub mod analysis;
pub mod config;
pub mod error;
pub mod expansion;
pub mod record;
pub mod retrieval;
pub mod similarity;

pub use analysis::{split_terms, Analyzer};
pub use config::{AnalysisConfig, VariantSet};
pub use error::{AnalysisError, DistanceError, ExpansionError, RetrievalError};
pub use record::OutputRecord;
pub use retrieval::{InMemoryRetriever, ResultSet, Retriever};
