//! Sequential reading with sort-order enforcement.

use crate::errors::ReconcileError;
use crate::io::AlignmentSource;
use crate::order::NameOrder;
use anyhow::Result;
use bstr::{BString, ByteSlice};
use noodles::sam::alignment::RecordBuf;
use std::cmp::Ordering;

/// Name of a record, with missing names (`*`) treated as empty.
pub fn record_name(record: &RecordBuf) -> &[u8] {
    record.name().map(|n| n.as_bytes()).unwrap_or_default()
}

/// Wraps a source with one record of look-ahead.
///
/// Every record read is compared against the previous one under the active
/// order; going backwards is fatal.
pub struct OrderedAlignmentReader {
    source: Box<dyn AlignmentSource>,
    order: NameOrder,
    current: Option<RecordBuf>,
    previous_name: BString,
    records_read: u64,
}

impl OrderedAlignmentReader {
    /// Create the reader and load its first record.
    pub fn new(source: Box<dyn AlignmentSource>, order: NameOrder) -> Result<Self> {
        let mut reader = Self {
            source,
            order,
            current: None,
            previous_name: BString::default(),
            records_read: 0,
        };
        reader.load_next()?;
        Ok(reader)
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn header(&self) -> &noodles::sam::Header {
        self.source.header()
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    pub fn is_eof(&self) -> bool {
        self.current.is_none()
    }

    /// The record the reader is positioned at, or `None` at end of stream.
    pub fn peek(&self) -> Option<&RecordBuf> {
        self.current.as_ref()
    }

    pub fn peek_name(&self) -> Option<&[u8]> {
        self.current.as_ref().map(record_name)
    }

    /// Take the current record and advance to the next one.
    pub fn next_record(&mut self) -> Result<Option<RecordBuf>> {
        let taken = self.current.take();
        if taken.is_some() {
            self.load_next()?;
        }
        Ok(taken)
    }

    fn load_next(&mut self) -> Result<()> {
        let mut record = RecordBuf::default();
        if !self.source.read_record(&mut record)? {
            self.current = None;
            return Ok(());
        }
        self.records_read += 1;

        let name = record_name(&record);
        let backwards = self.order.compare(name, &self.previous_name) == Ordering::Less;
        if self.records_read > 1 && backwards {
            return Err(ReconcileError::OrderViolation {
                source_name: self.source.name().to_string(),
                previous: self.previous_name.to_string(),
                current: name.as_bstr().to_string(),
                order: self.order.name(),
                suggestion: self.order.alternate().name(),
            }
            .into());
        }
        self.previous_name.clear();
        self.previous_name.extend_from_slice(name);
        self.current = Some(record);
        Ok(())
    }
}
