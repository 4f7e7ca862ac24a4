//! emergence-common — Shared types, errors, and configuration used across all Emergence crates.

pub mod config;
pub mod entities;
pub mod error;

// Re-export commonly used types
pub use config::{InputConfig, MissingScorePolicy, OutputConfig, RankingConfig, ScoringConfig};
pub use entities::{
    EmStatus, EvaluationYear, Indicator, IndicatorKind, MergedTaxonRecord, Model, Region,
    StatusColumn, StatusColumns, TaxonIndicatorRecord, TaxonName,
};
pub use error::{EmergenceError, Result};
