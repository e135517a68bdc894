//! The outer merge-join over read names.

use crate::destination::{Destination, Side};
use crate::group::{ReadGroup, collect_group};
use crate::matcher::match_groups;
use crate::output::OutputRouter;
use crate::reader::{OrderedAlignmentReader, record_name};
use crate::session::Session;
use anyhow::Result;
use log::{debug, info};
use std::cmp::Ordering;

/// Counters for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileStats {
    pub first_records: u64,
    pub second_records: u64,
    /// Read names present in both inputs.
    pub groups_matched: u64,
    pub subranges_compared: u64,
    /// Sides of a read group whose records went to more than one destination.
    pub groups_split: u64,
    pub legacy_first_better: u64,
    pub legacy_second_better: u64,
    /// Records routed to each destination, including unrequested ones.
    pub routed: [u64; Destination::COUNT],
}

impl ReconcileStats {
    pub fn routed(&self, dest: Destination) -> u64 {
        self.routed[dest.index()]
    }

    /// Log the summary at info level.
    pub fn log(&self) {
        info!(
            "read {} records from the first input and {} from the second",
            self.first_records, self.second_records
        );
        info!(
            "{} read names in both inputs, {} subranges compared, {} split groups unpaired",
            self.groups_matched, self.subranges_compared, self.groups_split
        );
        if self.legacy_first_better + self.legacy_second_better > 0 {
            info!(
                "matched subranges: first better {}, second better {}",
                self.legacy_first_better, self.legacy_second_better
            );
        }
        for dest in Destination::ALL {
            if self.routed(dest) > 0 {
                info!("  {dest}: {}", self.routed(dest));
            }
        }
    }
}

pub struct MergeReconciler {
    session: Session,
    first: OrderedAlignmentReader,
    second: OrderedAlignmentReader,
    router: OutputRouter,
    first_group: ReadGroup,
    second_group: ReadGroup,
    stats: ReconcileStats,
}

impl MergeReconciler {
    /// Register both input headers with the router; the readers must already
    /// hold their first record.
    pub fn new(
        session: Session,
        first: OrderedAlignmentReader,
        second: OrderedAlignmentReader,
        mut router: OutputRouter,
    ) -> Result<Self> {
        router.register_headers(first.header(), second.header())?;
        Ok(Self {
            session,
            first,
            second,
            router,
            first_group: ReadGroup::default(),
            second_group: ReadGroup::default(),
            stats: ReconcileStats::default(),
        })
    }

    /// Consume both inputs, writing every record to its destination.
    pub fn run(mut self) -> Result<ReconcileStats> {
        loop {
            let order = match (self.first.peek(), self.second.peek()) {
                (Some(a), Some(b)) => self.session.order.compare(record_name(a), record_name(b)),
                _ => break,
            };
            match order {
                Ordering::Equal => self.reconcile_group()?,
                Ordering::Less => self.pass_through(Side::First)?,
                Ordering::Greater => self.pass_through(Side::Second)?,
            }
        }

        // whichever side remains is drained to its -only output
        while !self.first.is_eof() {
            self.pass_through(Side::First)?;
        }
        while !self.second.is_eof() {
            self.pass_through(Side::Second)?;
        }

        self.router.finish()?;
        self.stats.first_records = self.first.records_read();
        self.stats.second_records = self.second.records_read();
        for dest in Destination::ALL {
            self.stats.routed[dest.index()] = self.router.routed(dest);
        }
        Ok(self.stats)
    }

    fn reconcile_group(&mut self) -> Result<()> {
        let key = self.session.key;
        collect_group(&mut self.first, key, &mut self.first_group)?;
        collect_group(&mut self.second, key, &mut self.second_group)?;
        if let Some(record) = self.first_group.records.first() {
            debug!(
                "matching {} first and {} second records for {}",
                self.first_group.len(),
                self.second_group.len(),
                record_name(record).escape_ascii()
            );
        }

        let summary = match_groups(
            &mut self.session,
            &mut self.first_group,
            &mut self.second_group,
            &mut self.router,
        )?;
        self.stats.groups_matched += 1;
        self.stats.subranges_compared += summary.subranges_compared;
        self.stats.groups_split += summary.groups_split;
        self.stats.legacy_first_better += summary.legacy_first_better;
        self.stats.legacy_second_better += summary.legacy_second_better;
        Ok(())
    }

    /// Move a single record of `side` to its `-only` destination.
    fn pass_through(&mut self, side: Side) -> Result<()> {
        let reader = match side {
            Side::First => &mut self.first,
            Side::Second => &mut self.second,
        };
        if let Some(record) = reader.next_record()? {
            self.router.write(side.only(), &record)?;
        }
        Ok(())
    }
}
