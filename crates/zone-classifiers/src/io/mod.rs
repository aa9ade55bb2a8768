//! Readers and writers for training inputs.
pub mod corpus;
pub mod samples;
