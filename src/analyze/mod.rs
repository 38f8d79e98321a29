// src/analyze/mod.rs
//! Market-impact classification: prompt, model call, verdict validation.

pub mod ai_adapter;
pub mod prompt;
pub mod verdict;

pub use crate::analyze::ai_adapter::{build_classifier, ImpactClassifier, ModelClassifier};
pub use crate::analyze::verdict::{parse_verdict, ClassificationResult, Direction};
