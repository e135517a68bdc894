//! Alignment file I/O
//!
//! Sequential record sources and header-then-records sinks over BAM and SAM
//! files. BGZF compression can use worker threads; the reconciliation logic
//! itself never sees them.

use anyhow::{Context, Result};
use log::warn;
use noodles::bam;
use noodles::bgzf::io::{
    MultithreadedReader, MultithreadedWriter, Reader as BgzfReader, Writer as BgzfWriter,
};
use noodles::sam;
use noodles::sam::Header;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::io::Write as SamWrite;
use noodles::sam::header::record::value::map::header::tag as header_tag;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::num::NonZero;
use std::path::Path;

#[cfg(test)]
pub mod memory;

/// A forward-only stream of alignment records.
pub trait AlignmentSource {
    /// Human-readable name used in log and error messages.
    fn name(&self) -> &str;

    fn header(&self) -> &Header;

    /// Read the next record into `record`, returning `false` at end of stream.
    fn read_record(&mut self, record: &mut RecordBuf) -> Result<bool>;
}

/// A sink that accepts one header followed by any number of records.
pub trait AlignmentSink {
    fn write_header(&mut self, header: &Header) -> Result<()>;

    fn write_record(&mut self, header: &Header, record: &RecordBuf) -> Result<()>;

    fn finish(&mut self) -> Result<()>;
}

/// Single- or multi-threaded BGZF decompression behind one `BufRead`.
pub enum BgzfReaderEnum {
    SingleThreaded(BgzfReader<File>),
    MultiThreaded(MultithreadedReader<File>),
}

impl Read for BgzfReaderEnum {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.read(buf),
            BgzfReaderEnum::MultiThreaded(r) => r.read(buf),
        }
    }
}

impl BufRead for BgzfReaderEnum {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.fill_buf(),
            BgzfReaderEnum::MultiThreaded(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.consume(amt),
            BgzfReaderEnum::MultiThreaded(r) => r.consume(amt),
        }
    }
}

/// Single- or multi-threaded BGZF compression behind one `Write`.
pub enum BgzfWriterEnum {
    SingleThreaded(BgzfWriter<File>),
    MultiThreaded(MultithreadedWriter<File>),
}

impl Write for BgzfWriterEnum {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            BgzfWriterEnum::SingleThreaded(w) => w.write(buf),
            BgzfWriterEnum::MultiThreaded(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            BgzfWriterEnum::SingleThreaded(w) => w.flush(),
            BgzfWriterEnum::MultiThreaded(w) => w.flush(),
        }
    }
}

impl BgzfWriterEnum {
    /// Flush remaining blocks and write the EOF marker.
    pub fn finish(self) -> io::Result<()> {
        match self {
            BgzfWriterEnum::SingleThreaded(mut w) => {
                w.try_finish()?;
                Ok(())
            }
            BgzfWriterEnum::MultiThreaded(mut w) => {
                w.finish()?;
                Ok(())
            }
        }
    }
}

fn is_sam_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("sam"))
}

pub struct BamSource {
    name: String,
    header: Header,
    reader: bam::io::Reader<BgzfReaderEnum>,
}

impl AlignmentSource for BamSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn header(&self) -> &Header {
        &self.header
    }

    fn read_record(&mut self, record: &mut RecordBuf) -> Result<bool> {
        let n = self
            .reader
            .read_record_buf(&self.header, record)
            .with_context(|| format!("Failed to read record from {}", self.name))?;
        Ok(n != 0)
    }
}

pub struct SamSource {
    name: String,
    header: Header,
    reader: sam::io::Reader<BufReader<File>>,
}

impl AlignmentSource for SamSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn header(&self) -> &Header {
        &self.header
    }

    fn read_record(&mut self, record: &mut RecordBuf) -> Result<bool> {
        let n = self
            .reader
            .read_record_buf(&self.header, record)
            .with_context(|| format!("Failed to read record from {}", self.name))?;
        Ok(n != 0)
    }
}

/// Open an input file, reading its header. `.sam` paths are read as text.
pub fn open_source(path: &Path, threads: usize) -> Result<Box<dyn AlignmentSource>> {
    let name = path.display().to_string();
    let file = File::open(path).with_context(|| format!("Failed to open input: {name}"))?;

    let source: Box<dyn AlignmentSource> = if is_sam_path(path) {
        let mut reader = sam::io::Reader::new(BufReader::new(file));
        let header =
            reader.read_header().with_context(|| format!("Failed to read header from: {name}"))?;
        Box::new(SamSource { name, header, reader })
    } else {
        let bgzf_reader = match NonZero::new(threads).filter(|n| n.get() > 1) {
            Some(worker_count) => BgzfReaderEnum::MultiThreaded(
                MultithreadedReader::with_worker_count(worker_count, file),
            ),
            None => BgzfReaderEnum::SingleThreaded(BgzfReader::new(file)),
        };
        let mut reader = bam::io::Reader::from(bgzf_reader);
        let header =
            reader.read_header().with_context(|| format!("Failed to read header from: {name}"))?;
        Box::new(BamSource { name, header, reader })
    };

    warn_if_not_queryname_sorted(source.name(), source.header());
    Ok(source)
}

/// The `@HD SO` value, if the header declares one.
pub fn sort_order(header: &Header) -> Option<String> {
    header
        .header()
        .and_then(|hd| hd.other_fields().get(&header_tag::SORT_ORDER))
        .map(|so| so.to_string())
}

fn warn_if_not_queryname_sorted(name: &str, header: &Header) {
    match sort_order(header).as_deref() {
        Some("queryname") => {}
        Some(other) => warn!("{name} declares sort order '{other}', expected queryname"),
        None => warn!("{name} does not declare a sort order; assuming it is sorted by read name"),
    }
}

pub struct BamSink {
    writer: Option<bam::io::Writer<BgzfWriterEnum>>,
}

impl AlignmentSink for BamSink {
    fn write_header(&mut self, header: &Header) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.write_header(header)?;
        }
        Ok(())
    }

    fn write_record(&mut self, header: &Header, record: &RecordBuf) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.write_alignment_record(header, record)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.into_inner().finish()?;
        }
        Ok(())
    }
}

pub struct SamSink {
    writer: sam::io::Writer<BufWriter<File>>,
}

impl AlignmentSink for SamSink {
    fn write_header(&mut self, header: &Header) -> Result<()> {
        self.writer.write_header(header)?;
        Ok(())
    }

    fn write_record(&mut self, header: &Header, record: &RecordBuf) -> Result<()> {
        self.writer.write_alignment_record(header, record)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.get_mut().flush()?;
        Ok(())
    }
}

/// Create an output file. `.sam` paths are written as text, anything else as BAM.
pub fn create_sink(path: &Path, threads: usize) -> Result<Box<dyn AlignmentSink>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output: {}", path.display()))?;

    if is_sam_path(path) {
        return Ok(Box::new(SamSink { writer: sam::io::Writer::new(BufWriter::new(file)) }));
    }

    let bgzf_writer = match NonZero::new(threads).filter(|n| n.get() > 1) {
        Some(worker_count) => BgzfWriterEnum::MultiThreaded(
            MultithreadedWriter::with_worker_count(worker_count, file),
        ),
        None => BgzfWriterEnum::SingleThreaded(BgzfWriter::new(file)),
    };
    Ok(Box::new(BamSink { writer: Some(bam::io::Writer::from(bgzf_writer)) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use noodles::sam::header::record::value::Map;
    use noodles::sam::header::record::value::map::Header as HeaderMap;

    #[test]
    fn test_sam_extension_detection() {
        assert!(is_sam_path(Path::new("out.sam")));
        assert!(is_sam_path(Path::new("OUT.SAM")));
        assert!(!is_sam_path(Path::new("out.bam")));
        assert!(!is_sam_path(Path::new("out")));
    }

    #[test]
    fn test_sort_order_read_from_header() {
        let hd = Map::<HeaderMap>::builder()
            .insert(header_tag::SORT_ORDER, bstr::BString::from("queryname"))
            .build()
            .unwrap();
        let header = Header::builder().set_header(hd).build();
        assert_eq!(sort_order(&header).as_deref(), Some("queryname"));
        assert_eq!(sort_order(&Header::default()), None);
    }

    #[test]
    fn test_bam_sink_then_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bam");

        let header = Header::default();
        let record = RecordBuf::builder().set_name("r1").build();
        let mut sink = create_sink(&path, 1).unwrap();
        sink.write_header(&header).unwrap();
        sink.write_record(&header, &record).unwrap();
        sink.finish().unwrap();

        let mut source = open_source(&path, 1).unwrap();
        let mut buf = RecordBuf::default();
        assert!(source.read_record(&mut buf).unwrap());
        assert_eq!(buf.name().map(|n| n.to_vec()), Some(b"r1".to_vec()));
        assert!(!source.read_record(&mut buf).unwrap());
    }
}
