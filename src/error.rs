//! # Error Types
//!
//! This module defines the error type shared by the transposition pipeline.
//!
//! Most bad input is recovered locally: an unparseable chord label is skipped,
//! a degenerate coordinate range falls back to a denominator of 1 and a slash
//! chord that cannot be repaired loses its bass. The variants below cover the
//! conditions that cannot be recovered without producing musically wrong output.
//!
//! ## Error Types
//! - `InvalidKey` - a key label that does not resolve to a chromatic index
//! - `Recognition` - recognizer reply that is not the expected JSON shape
//! - `Config` - invalid YAML configuration
//! - `Anchor` - anchor pair text that cannot be read
//!
//! ## Usage
//! ```rust
//! use jianpu_transpose::{calculate_semitones, TransposeError};
//!
//! match calculate_semitones("C", "H") {
//!     Ok(semitones) => println!("Shift by {}", semitones),
//!     Err(TransposeError::InvalidKey { key, .. }) => eprintln!("Unknown key: {}", key),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransposeError {
    /// Key label that cannot be resolved after normalization.
    ///
    /// # Example
    /// ```
    /// # use jianpu_transpose::TransposeError;
    /// let err = TransposeError::InvalidKey {
    ///     key: "1=H".to_string(),
    ///     normalized: "H".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Invalid key: 1=H (normalized: H)");
    /// ```
    #[error("Invalid key: {key} (normalized: {normalized})")]
    InvalidKey { key: String, normalized: String },

    /// Recognizer reply that could not be decoded.
    ///
    /// # Example
    /// ```
    /// # use jianpu_transpose::TransposeError;
    /// let err = TransposeError::Recognition("expected value at line 1 column 1".to_string());
    /// assert_eq!(err.to_string(), "Invalid recognition result: expected value at line 1 column 1");
    /// ```
    #[error("Invalid recognition result: {0}")]
    Recognition(String),

    /// Invalid configuration document or value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Anchor pair that could not be read.
    #[error("Invalid anchor: {0}")]
    Anchor(String),
}
