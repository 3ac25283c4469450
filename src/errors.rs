//! Error types for the layout pass
//!
//! Randomization itself never fails: any record can be given some valid
//! order. Errors come from the edges: a configuration that cannot be used,
//! or a host commit handed something that is not a permutation.

use thiserror::Error;

/// Errors raised while configuring or committing a layout
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Invalid randstruct configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse randstruct configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("New member order for '{record}' is not a permutation of {expected} members: {got:?}")]
    NotAPermutation {
        record: String,
        expected: usize,
        got: Vec<usize>,
    },
}

/// Result type for layout operations
pub type Result<T> = std::result::Result<T, LayoutError>;
