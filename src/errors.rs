//! Fatal error kinds raised by the reconciliation engine.
//!
//! None of these are recoverable: the tool is a single-pass streaming
//! transform, so every variant aborts the run.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Invalid or contradictory configuration, detected before processing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An input stream is not sorted under the declared identifier order.
    #[error(
        "Input {source_name} went backwards from '{previous}' to '{current}' under {order} order; \
         sort it with `samtools sort -n` or try {suggestion} order"
    )]
    OrderViolation {
        source_name: String,
        previous: String,
        current: String,
        order: &'static str,
        suggestion: &'static str,
    },

    /// A tag required by the selected scorer is absent.
    #[error("Record {read} doesn't have a {tag} tag as required by the selected scorer")]
    MissingTag { tag: String, read: String },

    /// A header was registered against an output that has already been written to.
    #[error("Output {output} already wrote its header; cannot register another input header")]
    HeaderFrozen { output: String },
}
