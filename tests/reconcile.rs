//! End-to-end runs over BAM and SAM files in a temporary directory.

use bamcmprs::classify::{FIRST_SCORE_TAG, SECOND_SCORE_TAG};
use bamcmprs::io::{create_sink, open_source};
use bamcmprs::{Config, Destination, NameOrder, ReconcileError, run};
use bstr::BString;
use noodles::core::Position;
use noodles::sam::Header;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::record_buf::{Cigar, Sequence};
use noodles::sam::header::record::value::Map;
use noodles::sam::header::record::value::map::header::tag as header_tag;
use noodles::sam::header::record::value::map::{Header as HeaderMap, ReferenceSequence};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

fn header(refs: &[&str]) -> Header {
    let hd = Map::<HeaderMap>::builder()
        .insert(header_tag::SORT_ORDER, BString::from("queryname"))
        .build()
        .unwrap();
    let mut builder = Header::builder().set_header(hd);
    for name in refs {
        builder = builder.add_reference_sequence(
            *name,
            Map::<ReferenceSequence>::new(NonZeroUsize::new(1000).unwrap()),
        );
    }
    builder.build()
}

/// A 4M alignment of ACGT carrying an edit distance.
fn mapped(name: &str, ref_id: usize, nm: u8) -> RecordBuf {
    let mut record = RecordBuf::builder()
        .set_name(BString::from(name))
        .set_flags(Flags::empty())
        .set_reference_sequence_id(ref_id)
        .set_alignment_start(Position::try_from(10).unwrap())
        .set_cigar(Cigar::from(vec![Op::new(Kind::Match, 4)]))
        .set_sequence(Sequence::from(b"ACGT".to_vec()))
        .build();
    record.data_mut().insert(Tag::EDIT_DISTANCE, Value::from(nm));
    record
}

fn write_file(path: &Path, header: &Header, records: &[RecordBuf]) {
    let mut sink = create_sink(path, 1).unwrap();
    sink.write_header(header).unwrap();
    for record in records {
        sink.write_record(header, record).unwrap();
    }
    sink.finish().unwrap();
}

fn read_file(path: &Path) -> (Header, Vec<RecordBuf>) {
    read_file_with_threads(path, 1)
}

fn read_file_with_threads(path: &Path, threads: usize) -> (Header, Vec<RecordBuf>) {
    let mut source = open_source(path, threads).unwrap();
    let mut records = Vec::new();
    let mut record = RecordBuf::default();
    while source.read_record(&mut record).unwrap() {
        records.push(record.clone());
    }
    (source.header().clone(), records)
}

fn names(records: &[RecordBuf]) -> Vec<String> {
    records.iter().map(|r| r.name().map(|n| n.to_string()).unwrap_or_default()).collect()
}

fn int_tag(record: &RecordBuf, tag: Tag) -> Option<i64> {
    record.data().get(&tag).and_then(|v| v.as_int())
}

struct Inputs {
    _dir: tempfile::TempDir,
    root: PathBuf,
    first: PathBuf,
    second: PathBuf,
}

/// human.bam: r1 (exact), r2 (two mismatches), r3
/// mouse.bam: r1 (one mismatch), r2 (exact), r4
fn write_inputs() -> Inputs {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let first = root.join("human.bam");
    let second = root.join("mouse.bam");

    let human = [mapped("r1", 1, 0), mapped("r2", 0, 2), mapped("r3", 0, 0)];
    let mouse = [mapped("r1", 0, 1), mapped("r2", 0, 0), mapped("r4", 0, 0)];
    write_file(&first, &header(&["chr1", "chr2"]), &human);
    write_file(&second, &header(&["chrM"]), &mouse);

    Inputs { _dir: dir, root, first, second }
}

#[test]
fn test_reconcile_bam_files() {
    let inputs = write_inputs();
    let clean = inputs.root.join("clean.bam");
    let mixed = inputs.root.join("mixed.bam");
    let second_only = inputs.root.join("second_only.sam");

    let config = Config::new(inputs.first.clone(), inputs.second.clone())
        .with_output(Destination::FirstBetter, &clean)
        .with_output(Destination::FirstOnly, &clean)
        .with_output(Destination::FirstWorse, &mixed)
        .with_output(Destination::SecondBetter, &mixed)
        .with_output(Destination::SecondOnly, &second_only);

    let stats = run(&config).unwrap();
    assert_eq!((stats.first_records, stats.second_records), (3, 3));
    assert_eq!(stats.groups_matched, 2);
    assert_eq!(stats.subranges_compared, 2);
    assert_eq!(stats.groups_split, 0);
    // r1 from the second input lost, but second-worse was not requested
    assert_eq!(stats.routed(Destination::SecondWorse), 1);

    let (clean_header, clean_records) = read_file(&clean);
    assert_eq!(names(&clean_records), vec!["r1", "r3"]);
    assert_eq!(clean_header.reference_sequences().len(), 2);
    assert_eq!(int_tag(&clean_records[0], FIRST_SCORE_TAG), Some(4));
    assert_eq!(int_tag(&clean_records[0], SECOND_SCORE_TAG), Some(3));
    assert_eq!(int_tag(&clean_records[1], FIRST_SCORE_TAG), None);

    let (mixed_header, mixed_records) = read_file(&mixed);
    let refs: Vec<String> =
        mixed_header.reference_sequences().keys().map(|k| k.to_string()).collect();
    assert_eq!(refs, vec!["A_chr1", "A_chr2", "B_chrM"]);
    assert_eq!(names(&mixed_records), vec!["r2", "r2"]);
    assert_eq!(mixed_records[0].reference_sequence_id(), Some(0));
    assert_eq!(mixed_records[1].reference_sequence_id(), Some(2));
    assert_eq!(int_tag(&mixed_records[1], FIRST_SCORE_TAG), Some(2));
    assert_eq!(int_tag(&mixed_records[1], SECOND_SCORE_TAG), Some(4));

    let (_, second_only_records) = read_file(&second_only);
    assert_eq!(names(&second_only_records), vec!["r4"]);
}

#[test]
fn test_legacy_matched_output() {
    let inputs = write_inputs();
    let matched = inputs.root.join("matched.bam");
    let first_only = inputs.root.join("first_only.bam");

    let config = Config::new(inputs.first.clone(), inputs.second.clone())
        .with_output(Destination::Matched, &matched)
        .with_output(Destination::FirstOnly, &first_only);
    let stats = run(&config).unwrap();

    assert_eq!((stats.legacy_first_better, stats.legacy_second_better), (1, 1));
    let (header, records) = read_file(&matched);
    assert_eq!(names(&records), vec!["r1", "r2"]);
    let first_ref = header.reference_sequences().keys().next().map(|k| k.to_string());
    assert_eq!(first_ref.as_deref(), Some("chr1"));
    assert_eq!(names(&read_file(&first_only).1), vec!["r3"]);
}

#[test]
fn test_multithreaded_bgzf_run() {
    let inputs = write_inputs();
    let better = inputs.root.join("better.bam");
    let first_only = inputs.root.join("first_only.bam");
    let second_only = inputs.root.join("second_only.bam");

    let mut config = Config::new(inputs.first.clone(), inputs.second.clone())
        .with_output(Destination::FirstBetter, &better)
        .with_output(Destination::SecondBetter, &better)
        .with_output(Destination::FirstOnly, &first_only)
        .with_output(Destination::SecondOnly, &second_only);
    config.threads = 3;

    let stats = run(&config).unwrap();
    assert_eq!((stats.first_records, stats.second_records), (3, 3));
    assert_eq!(stats.groups_matched, 2);

    let (better_header, better_records) = read_file_with_threads(&better, 3);
    assert_eq!(better_header.reference_sequences().len(), 3);
    assert_eq!(names(&better_records), vec!["r1", "r2"]);
    // r1 won by the first input on chr2, r2 by the second on chrM
    assert_eq!(better_records[0].reference_sequence_id(), Some(1));
    assert_eq!(better_records[1].reference_sequence_id(), Some(2));
    assert_eq!(int_tag(&better_records[1], SECOND_SCORE_TAG), Some(4));

    assert_eq!(names(&read_file_with_threads(&first_only, 3).1), vec!["r3"]);
    assert_eq!(names(&read_file(&second_only).1), vec!["r4"]);
}

#[test]
fn test_unsorted_input_fails_with_both_names() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("a.bam");
    let second = dir.path().join("b.bam");
    write_file(&first, &header(&["chr1"]), &[mapped("r2", 0, 0), mapped("r10", 0, 0)]);
    write_file(&second, &header(&["chr1"]), &[]);

    let mut config =
        Config::new(first, second).with_output(Destination::FirstOnly, dir.path().join("out.bam"));
    config.order = NameOrder::Lexical;

    let err = run(&config).unwrap_err();
    let message = err.to_string();
    assert!(matches!(
        err.downcast_ref::<ReconcileError>(),
        Some(ReconcileError::OrderViolation { .. })
    ));
    assert!(message.contains("r2") && message.contains("r10"), "{message}");
}

#[test]
fn test_invalid_configuration_rejected_before_opening_inputs() {
    let config =
        Config::new(PathBuf::from("/nonexistent/a.bam"), PathBuf::from("/nonexistent/b.bam"));
    let err = run(&config).unwrap_err();
    assert!(matches!(err.downcast_ref::<ReconcileError>(), Some(ReconcileError::Configuration(_))));
}
