//! Per-run state shared by every component.
//!
//! Strategy selection and the once-only warning state live here instead of
//! in globals, so independent runs (and tests) never observe each other.

use crate::classify::ClassifyMode;
use crate::config::Config;
use crate::group::ComparisonKey;
use crate::order::NameOrder;
use crate::score::AlignmentScorer;

pub struct Session {
    pub key: ComparisonKey,
    pub order: NameOrder,
    pub mode: ClassifyMode,
    /// Owns its own warn-once flags.
    pub scorer: Box<dyn AlignmentScorer>,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            key: config.key,
            order: config.order,
            mode: if config.is_legacy() { ClassifyMode::Legacy } else { ClassifyMode::BetterWorse },
            scorer: config.scorer.build(),
        }
    }
}
