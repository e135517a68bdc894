//! Read groups: all records of one input sharing a read name.

use crate::reader::{OrderedAlignmentReader, record_name};
use anyhow::Result;
use clap::ValueEnum;
use noodles::sam::alignment::RecordBuf;
use std::cmp::Ordering;

/// Secondary key ordering and matching records within a read group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ComparisonKey {
    /// The stored base sequence
    Sequence,
    /// The mate slot: unpaired, first or second segment
    Mate,
}

impl ComparisonKey {
    pub fn compare(self, a: &RecordBuf, b: &RecordBuf) -> Ordering {
        match self {
            ComparisonKey::Sequence => a.sequence().as_ref().cmp(b.sequence().as_ref()),
            ComparisonKey::Mate => mate_slot(a).cmp(&mate_slot(b)),
        }
    }
}

/// 1 for the first segment, 2 for the last, 0 otherwise.
pub fn mate_slot(record: &RecordBuf) -> u8 {
    let flags = record.flags();
    if flags.is_first_segment() {
        1
    } else if flags.is_last_segment() {
        2
    } else {
        0
    }
}

/// Records from one input sharing a read name, sorted by a [`ComparisonKey`].
#[derive(Debug, Default)]
pub struct ReadGroup {
    pub records: Vec<RecordBuf>,
}

impl ReadGroup {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// End (exclusive) of the run of records sharing the key of `records[start]`.
    pub fn subrange_end(&self, start: usize, key: ComparisonKey) -> usize {
        let mut end = start + 1;
        while end < self.records.len()
            && key.compare(&self.records[start], &self.records[end]) == Ordering::Equal
        {
            end += 1;
        }
        end
    }
}

/// Move every consecutive record named like the reader's current one into
/// `group`, then sort the group by `key`.
///
/// The sort is stable, so records sharing a key keep their input order. The
/// reader is left at the next read name or end of stream.
pub fn collect_group(
    reader: &mut OrderedAlignmentReader,
    key: ComparisonKey,
    group: &mut ReadGroup,
) -> Result<()> {
    group.clear();
    let Some(first) = reader.next_record()? else {
        return Ok(());
    };
    let name = record_name(&first).to_vec();
    group.records.push(first);

    while reader.peek_name() == Some(name.as_slice()) {
        if let Some(record) = reader.next_record()? {
            group.records.push(record);
        }
    }

    group.records.sort_by(|a, b| key.compare(a, b));
    Ok(())
}
