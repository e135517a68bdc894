//! Inner merge-join of two read groups sharing a read name.
//!
//! Both groups arrive sorted by the session's comparison key. Runs of equal
//! key are scored and classified against each other; a run present on only
//! one side goes to that side's `-only` destination. Every destination is
//! planned before anything is written, so a side whose records end up in
//! more than one destination can be unpaired first.

use crate::classify::{ClassifyMode, classify, is_split};
use crate::destination::{Destination, Side};
use crate::group::ReadGroup;
use crate::mate::unpair_records;
use crate::output::OutputRouter;
use crate::score::best_score;
use crate::session::Session;
use anyhow::Result;
use log::debug;
use std::cmp::Ordering;
use std::ops::Range;

/// Counters from matching one pair of read groups.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MatchSummary {
    pub subranges_compared: u64,
    pub groups_split: u64,
    pub legacy_first_better: u64,
    pub legacy_second_better: u64,
}

struct Plan {
    first: Vec<Option<Destination>>,
    second: Vec<Option<Destination>>,
    /// Subranges in comparison-key order.
    writes: Vec<(Side, Range<usize>)>,
}

impl Plan {
    fn new(first_len: usize, second_len: usize) -> Self {
        Self { first: vec![None; first_len], second: vec![None; second_len], writes: Vec::new() }
    }

    fn assign(&mut self, side: Side, range: Range<usize>, dest: Option<Destination>) {
        let slots = match side {
            Side::First => &mut self.first,
            Side::Second => &mut self.second,
        };
        slots[range.clone()].fill(dest);
        self.writes.push((side, range));
    }
}

/// Match, classify and write two same-name read groups.
pub fn match_groups(
    session: &mut Session,
    first: &mut ReadGroup,
    second: &mut ReadGroup,
    router: &mut OutputRouter,
) -> Result<MatchSummary> {
    let key = session.key;
    let mut summary = MatchSummary::default();
    let mut plan = Plan::new(first.len(), second.len());

    let (mut i, mut j) = (0, 0);
    while i < first.len() && j < second.len() {
        let i_end = first.subrange_end(i, key);
        let j_end = second.subrange_end(j, key);
        match key.compare(&first.records[i], &second.records[j]) {
            Ordering::Less => {
                plan.assign(Side::First, i..i_end, Some(Destination::FirstOnly));
                i = i_end;
            }
            Ordering::Greater => {
                plan.assign(Side::Second, j..j_end, Some(Destination::SecondOnly));
                j = j_end;
            }
            Ordering::Equal => {
                let a = &mut first.records[i..i_end];
                let b = &mut second.records[j..j_end];
                let first_score = best_score(&mut *session.scorer, a, Side::First)?;
                let second_score = best_score(&mut *session.scorer, b, Side::Second)?;
                let outcome = classify(session.mode, a, first_score, b, second_score);

                summary.subranges_compared += 1;
                if session.mode == ClassifyMode::Legacy {
                    if outcome.first_is_better {
                        summary.legacy_first_better += 1;
                    } else {
                        summary.legacy_second_better += 1;
                    }
                }
                plan.assign(Side::First, i..i_end, outcome.first);
                plan.assign(Side::Second, j..j_end, outcome.second);
                i = i_end;
                j = j_end;
            }
        }
    }
    if i < first.len() {
        plan.assign(Side::First, i..first.len(), Some(Destination::FirstOnly));
    }
    if j < second.len() {
        plan.assign(Side::Second, j..second.len(), Some(Destination::SecondOnly));
    }

    if is_split(&plan.first) {
        debug!("{}: first input records split across outputs", group_name(first));
        unpair_records(&mut first.records);
        summary.groups_split += 1;
    }
    if is_split(&plan.second) {
        debug!("{}: second input records split across outputs", group_name(second));
        unpair_records(&mut second.records);
        summary.groups_split += 1;
    }

    for (side, range) in plan.writes {
        let (records, dests) = match side {
            Side::First => (&first.records, &plan.first),
            Side::Second => (&second.records, &plan.second),
        };
        for idx in range {
            if let Some(dest) = dests[idx] {
                router.write(dest, &records[idx])?;
            }
        }
    }
    Ok(summary)
}

fn group_name(group: &ReadGroup) -> String {
    group
        .records
        .first()
        .and_then(|r| r.name())
        .map(|n| n.to_string())
        .unwrap_or_else(|| "*".to_string())
}
