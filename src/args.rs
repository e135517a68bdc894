// Command-line argument parsing
use crate::config::Config;
use crate::destination::Destination;
use crate::group::ComparisonKey;
use crate::order::NameOrder;
use crate::score::ScorerKind;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "bamcmprs",
    about = "Reconcile two read-name sorted BAM files aligned against different references"
)]
pub struct Args {
    /// First input (BAM, or SAM if the name ends in .sam)
    #[arg(short = 'a', long)]
    pub first: PathBuf,
    /// Second input
    #[arg(short = 'b', long)]
    pub second: PathBuf,

    /// Reads present only in the first input
    #[arg(short = '1', long)]
    pub first_only: Option<PathBuf>,
    /// Reads present only in the second input
    #[arg(short = '2', long)]
    pub second_only: Option<PathBuf>,
    #[arg(long)]
    pub first_better: Option<PathBuf>,
    #[arg(long)]
    pub second_better: Option<PathBuf>,
    #[arg(long)]
    pub first_worse: Option<PathBuf>,
    #[arg(long)]
    pub second_worse: Option<PathBuf>,
    /// Reads present in both inputs, written once from the first input
    #[arg(short = 'm', long)]
    pub matched: Option<PathBuf>,

    #[arg(short = 's', long, value_enum, default_value_t = ScorerKind::Match)]
    pub scorer: ScorerKind,
    /// How records sharing a read name are paired up
    #[arg(short = 'k', long, value_enum, default_value_t = ComparisonKey::Sequence)]
    pub key: ComparisonKey,
    /// Read-name order both inputs are sorted in
    #[arg(short = 'n', long, value_enum, default_value_t = NameOrder::Natural)]
    pub order: NameOrder,

    /// Prefix for first-input reference names in combined headers
    #[arg(long, default_value = "A_")]
    pub first_prefix: String,
    /// Prefix for second-input reference names in combined headers
    #[arg(long, default_value = "B_")]
    pub second_prefix: String,

    /// BGZF worker threads per file
    #[arg(short = 't', long, default_value_t = 1)]
    pub threads: usize,
    /// Only log warnings and errors
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Args {
    /// Requested outputs in destination order.
    pub fn outputs(&self) -> Vec<(Destination, PathBuf)> {
        [
            (Destination::FirstOnly, &self.first_only),
            (Destination::SecondOnly, &self.second_only),
            (Destination::FirstBetter, &self.first_better),
            (Destination::SecondBetter, &self.second_better),
            (Destination::FirstWorse, &self.first_worse),
            (Destination::SecondWorse, &self.second_worse),
            (Destination::Matched, &self.matched),
        ]
        .into_iter()
        .filter_map(|(dest, path)| path.clone().map(|p| (dest, p)))
        .collect()
    }

    pub fn to_config(&self) -> Result<Config> {
        let config = Config {
            first: self.first.clone(),
            second: self.second.clone(),
            outputs: self.outputs(),
            key: self.key,
            order: self.order,
            scorer: self.scorer,
            first_prefix: self.first_prefix.clone(),
            second_prefix: self.second_prefix.clone(),
            threads: self.threads,
        };
        config.validate()?;
        Ok(config)
    }
}
