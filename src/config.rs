//! Run configuration, validated before any input is opened.

use crate::destination::Destination;
use crate::errors::ReconcileError;
use crate::group::ComparisonKey;
use crate::order::NameOrder;
use crate::score::ScorerKind;
use anyhow::Result;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub first: PathBuf,
    pub second: PathBuf,
    pub outputs: Vec<(Destination, PathBuf)>,
    pub key: ComparisonKey,
    pub order: NameOrder,
    pub scorer: ScorerKind,
    pub first_prefix: String,
    pub second_prefix: String,
    /// BGZF worker threads per file; 1 disables worker threads.
    pub threads: usize,
}

impl Config {
    pub fn new(first: PathBuf, second: PathBuf) -> Self {
        Self {
            first,
            second,
            outputs: Vec::new(),
            key: ComparisonKey::Sequence,
            order: NameOrder::Natural,
            scorer: ScorerKind::Match,
            first_prefix: "A_".to_string(),
            second_prefix: "B_".to_string(),
            threads: 1,
        }
    }

    pub fn with_output(mut self, dest: Destination, path: impl Into<PathBuf>) -> Self {
        self.outputs.push((dest, path.into()));
        self
    }

    /// The legacy two-output mode is selected by requesting `matched`.
    pub fn is_legacy(&self) -> bool {
        self.outputs.iter().any(|(dest, _)| *dest == Destination::Matched)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| -> Result<()> { Err(ReconcileError::Configuration(msg).into()) };

        if self.outputs.is_empty() {
            return fail("at least one output must be requested".to_string());
        }
        if self.is_legacy() {
            let conflicting: Vec<_> = self
                .outputs
                .iter()
                .map(|(dest, _)| *dest)
                .filter(|dest| {
                    !matches!(
                        dest,
                        Destination::Matched | Destination::FirstOnly | Destination::SecondOnly
                    )
                })
                .map(|dest| dest.name())
                .collect();
            if !conflicting.is_empty() {
                return fail(format!(
                    "matched output cannot be combined with {}",
                    conflicting.join(", ")
                ));
            }
        }
        if self.first_prefix == self.second_prefix {
            return fail(format!(
                "reference name prefixes must differ (both are '{}')",
                self.first_prefix
            ));
        }
        if self.threads == 0 {
            return fail("threads must be at least 1".to_string());
        }
        Ok(())
    }
}
