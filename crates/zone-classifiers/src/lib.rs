//! zone-classifiers: training kernel classifiers that label document zones.
//!
//! The crate turns segmented, labeled documents into feature vectors,
//! derives per-class penalty weights to counter class imbalance, and trains
//! weighted one-vs-one SVM models with an in-crate SMO solver. Models are
//! persisted as JSON and can be cross-validated over k sample groups.
pub mod classify;
pub mod config;
pub mod cross_validation;
pub mod error;
pub mod features;
pub mod io;
pub mod labels;
pub mod math;
pub mod models;
pub mod penalty;
pub mod preprocessing;
pub mod sample;
pub mod stats;
pub mod structure;
pub mod trainer;
