//! bamcmprs - reconcile two BAM files of the same reads aligned against
//! different references.
//!
//! Both inputs must be sorted by read name. Reads found in only one input are
//! written to that input's `-only` output. Reads found in both are scored on
//! each side and written to `-better` / `-worse` outputs, or once to
//! `matched` in the two-output mode.
//!
//! # Example
//!
//! ```ignore
//! use bamcmprs::{Config, Destination, run};
//!
//! let config = Config::new("human.bam".into(), "mouse.bam".into())
//!     .with_output(Destination::FirstBetter, "human_clean.bam")
//!     .with_output(Destination::FirstOnly, "human_clean.bam");
//!
//! let stats = run(&config)?;
//! stats.log();
//! ```

pub mod args;
pub mod classify;
pub mod config;
pub mod destination;
pub mod errors;
pub mod group;
pub mod header;
pub mod io;
pub mod mate;
pub mod matcher;
pub mod order;
pub mod output;
pub mod reader;
pub mod reconcile;
pub mod score;
pub mod session;
pub mod utils;

// Re-export commonly used items
pub use args::Args;
pub use config::Config;
pub use destination::{Destination, Side};
pub use errors::ReconcileError;
pub use group::ComparisonKey;
pub use order::NameOrder;
pub use reconcile::{MergeReconciler, ReconcileStats};
pub use score::ScorerKind;
pub use session::Session;

use anyhow::Result;
use log::info;
use output::OutputRouter;
use reader::OrderedAlignmentReader;

/// Open the configured files and reconcile them.
pub fn run(config: &Config) -> Result<ReconcileStats> {
    config.validate()?;
    let session = Session::new(config);
    info!(
        "scoring with {}, pairing records by {:?}, names in {} order",
        session.scorer.name(),
        session.key,
        session.order.name()
    );

    let first = io::open_source(&config.first, config.threads)?;
    let first = OrderedAlignmentReader::new(first, config.order)?;
    let second = io::open_source(&config.second, config.threads)?;
    let second = OrderedAlignmentReader::new(second, config.order)?;
    let router = OutputRouter::new(
        &config.outputs,
        &config.first_prefix,
        &config.second_prefix,
        |path| io::create_sink(path, config.threads),
    )?;

    MergeReconciler::new(session, first, second, router)?.run()
}
