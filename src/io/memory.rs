//! In-memory sources and sinks for driving the engine in unit tests.

use super::{AlignmentSink, AlignmentSource};
use anyhow::Result;
use noodles::sam::Header;
use noodles::sam::alignment::RecordBuf;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub struct MemorySource {
    name: String,
    header: Header,
    records: VecDeque<RecordBuf>,
}

impl MemorySource {
    pub fn new(name: &str, header: Header, records: Vec<RecordBuf>) -> Self {
        Self { name: name.to_string(), header, records: records.into() }
    }
}

impl AlignmentSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn header(&self) -> &Header {
        &self.header
    }

    fn read_record(&mut self, record: &mut RecordBuf) -> Result<bool> {
        match self.records.pop_front() {
            Some(next) => {
                *record = next;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Everything written to one in-memory output.
#[derive(Default)]
pub struct Captured {
    pub header: Option<Header>,
    pub records: Vec<RecordBuf>,
    pub finished: bool,
}

pub type Outputs = Rc<RefCell<HashMap<PathBuf, Captured>>>;

pub struct MemorySink {
    path: PathBuf,
    outputs: Outputs,
}

impl MemorySink {
    pub fn create(path: &Path, outputs: &Outputs) -> Self {
        outputs.borrow_mut().insert(path.to_path_buf(), Captured::default());
        Self { path: path.to_path_buf(), outputs: Rc::clone(outputs) }
    }
}

impl AlignmentSink for MemorySink {
    fn write_header(&mut self, header: &Header) -> Result<()> {
        let mut outputs = self.outputs.borrow_mut();
        let captured = outputs.entry(self.path.clone()).or_default();
        assert!(captured.header.is_none(), "header written twice to {}", self.path.display());
        captured.header = Some(header.clone());
        Ok(())
    }

    fn write_record(&mut self, _header: &Header, record: &RecordBuf) -> Result<()> {
        let mut outputs = self.outputs.borrow_mut();
        let captured = outputs.entry(self.path.clone()).or_default();
        assert!(
            captured.header.is_some(),
            "record written before header to {}",
            self.path.display()
        );
        captured.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let mut outputs = self.outputs.borrow_mut();
        outputs.entry(self.path.clone()).or_default().finished = true;
        Ok(())
    }
}
