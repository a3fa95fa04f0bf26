//! FAIR-compliance indicator evaluation.
//!
//! A [`metadata::MetadataCollection`] harvested from a repository is scored
//! against the RDA FAIR Data Maturity Model indicators under a per-repository
//! [`config::RuleConfig`], producing a [`report::EvaluationReport`].

pub mod config;
pub mod error;
pub mod evaluation;
pub mod metadata;
pub mod report;
pub mod telemetry;
pub mod vocabulary;
