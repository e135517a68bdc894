//! Output routing
//!
//! Destinations are resolved once, when the run is configured: destinations
//! naming the same path share a single [`OutputHandle`], so nothing is
//! reference-counted at runtime. A handle fed by both inputs writes a combined
//! header and shifts second-input reference ids past the first dictionary.
//! Paths are compared after resolving their parent directory, so `out.bam`
//! and `./out.bam` share a handle.

use crate::destination::{Destination, Side};
use crate::errors::ReconcileError;
use crate::header::{HeaderRenames, merge_headers};
use crate::io::AlignmentSink;
use anyhow::{Context, Result, bail};
use log::info;
use noodles::sam::Header;
use noodles::sam::alignment::RecordBuf;
use std::path::{Path, PathBuf};

/// One physical output and the input headers registered against it.
pub struct OutputHandle {
    path: PathBuf,
    sink: Box<dyn AlignmentSink>,
    sources: Vec<(Side, Header)>,
    prefixes: (String, String),
    /// Built on first write; no registration is accepted afterwards.
    header: Option<Header>,
    second_offset: usize,
    renames: HeaderRenames,
    records_written: u64,
}

impl OutputHandle {
    pub fn new(
        path: &Path,
        sink: Box<dyn AlignmentSink>,
        first_prefix: &str,
        second_prefix: &str,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            sink,
            sources: Vec::with_capacity(2),
            prefixes: (first_prefix.to_string(), second_prefix.to_string()),
            header: None,
            second_offset: 0,
            renames: HeaderRenames::default(),
            records_written: 0,
        }
    }

    pub fn is_combined(&self) -> bool {
        self.sources.len() == 2
    }

    /// Register the header of the input feeding this output.
    ///
    /// Registering the same input again is a no-op.
    pub fn register(&mut self, side: Side, header: &Header) -> Result<()> {
        if self.header.is_some() {
            let output = self.path.display().to_string();
            return Err(ReconcileError::HeaderFrozen { output }.into());
        }
        if self.sources.iter().any(|(s, _)| *s == side) {
            return Ok(());
        }
        self.sources.push((side, header.clone()));
        self.sources.sort_by_key(|(s, _)| s.index());
        Ok(())
    }

    fn ensure_header(&mut self) -> Result<()> {
        if self.header.is_some() {
            return Ok(());
        }
        let header = match self.sources.as_slice() {
            [(_, only)] => only.clone(),
            [(_, first), (_, second)] => {
                self.second_offset = first.reference_sequences().len();
                info!(
                    "{}: combining both input headers; second input references start at index {}",
                    self.path.display(),
                    self.second_offset
                );
                let (header, renames) =
                    merge_headers(first, second, &self.prefixes.0, &self.prefixes.1);
                self.renames = renames;
                header
            }
            _ => bail!("No input header registered for output {}", self.path.display()),
        };
        self.sink
            .write_header(&header)
            .with_context(|| format!("Failed to write header to {}", self.path.display()))?;
        self.header = Some(header);
        Ok(())
    }

    pub fn write(&mut self, side: Side, record: &RecordBuf) -> Result<()> {
        self.ensure_header()?;
        let header = self.header.as_ref().context("output header was not built")?;

        let result = if side == Side::Second && self.is_combined() {
            // shift a copy; the caller's record may still be written elsewhere
            let mut shifted = record.clone();
            let offset = self.second_offset;
            if let Some(id) = shifted.reference_sequence_id_mut() {
                *id += offset;
            }
            if let Some(id) = shifted.mate_reference_sequence_id_mut() {
                *id += offset;
            }
            self.renames.apply(&mut shifted);
            self.sink.write_record(header, &shifted)
        } else {
            self.sink.write_record(header, record)
        };
        result.with_context(|| format!("Failed to write record to {}", self.path.display()))?;
        self.records_written += 1;
        Ok(())
    }

    /// Write the header if nothing was written yet, then close the sink.
    pub fn finish(&mut self) -> Result<()> {
        self.ensure_header()?;
        self.sink
            .finish()
            .with_context(|| format!("Failed to finish output {}", self.path.display()))?;
        info!("wrote {} records to {}", self.records_written, self.path.display());
        Ok(())
    }
}

/// Identity of an output path: the canonical parent directory joined with
/// the file name. Falls back to the path itself if the parent cannot be
/// resolved; opening the sink reports that error.
fn output_key(path: &Path) -> PathBuf {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

/// Maps destinations to their (possibly shared) output handles.
pub struct OutputRouter {
    handles: Vec<OutputHandle>,
    routes: [Option<usize>; Destination::COUNT],
    routed: [u64; Destination::COUNT],
}

impl OutputRouter {
    /// Open one sink per distinct path; destinations sharing a path share the handle.
    pub fn new<F>(
        outputs: &[(Destination, PathBuf)],
        first_prefix: &str,
        second_prefix: &str,
        mut open: F,
    ) -> Result<Self>
    where
        F: FnMut(&Path) -> Result<Box<dyn AlignmentSink>>,
    {
        let mut handles: Vec<OutputHandle> = Vec::new();
        let mut keys: Vec<PathBuf> = Vec::new();
        let mut routes = [None; Destination::COUNT];

        for (dest, path) in outputs {
            if routes[dest.index()].is_some() {
                bail!(ReconcileError::Configuration(format!("{dest} output given more than once")));
            }
            let key = output_key(path);
            let idx = match keys.iter().position(|k| *k == key) {
                Some(idx) => idx,
                None => {
                    let sink = open(path)?;
                    keys.push(key);
                    handles.push(OutputHandle::new(path, sink, first_prefix, second_prefix));
                    handles.len() - 1
                }
            };
            info!("{dest} records go to {}", path.display());
            routes[dest.index()] = Some(idx);
        }

        Ok(Self { handles, routes, routed: [0; Destination::COUNT] })
    }

    pub fn is_requested(&self, dest: Destination) -> bool {
        self.routes[dest.index()].is_some()
    }

    /// Register each input's header with every handle fed by that input.
    pub fn register_headers(&mut self, first: &Header, second: &Header) -> Result<()> {
        for dest in Destination::ALL {
            if let Some(idx) = self.routes[dest.index()] {
                let header = match dest.side() {
                    Side::First => first,
                    Side::Second => second,
                };
                self.handles[idx].register(dest.side(), header)?;
            }
        }
        Ok(())
    }

    /// Write `record` to `dest`, or drop it if `dest` was not requested.
    pub fn write(&mut self, dest: Destination, record: &RecordBuf) -> Result<()> {
        self.routed[dest.index()] += 1;
        match self.routes[dest.index()] {
            Some(idx) => self.handles[idx].write(dest.side(), record),
            None => Ok(()),
        }
    }

    /// Records routed to `dest`, including those dropped because it was not requested.
    pub fn routed(&self, dest: Destination) -> u64 {
        self.routed[dest.index()]
    }

    pub fn finish(&mut self) -> Result<()> {
        for handle in &mut self.handles {
            handle.finish()?;
        }
        Ok(())
    }
}
