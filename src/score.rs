//! Alignment quality scoring
//!
//! One strategy is selected per run. A subrange of same-key records scores as
//! the best score of its members.

use crate::destination::Side;
use crate::errors::ReconcileError;
use anyhow::Result;
use clap::ValueEnum;
use log::warn;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;

/// Scoring strategies selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScorerKind {
    /// Matched bases from the CIGAR, corrected by NM or MD
    Match,
    /// The aligner's AS tag
    As,
    /// The mapping quality field
    Mapq,
    /// Any mapped second-input record beats the first input
    Balwayswins,
}

impl ScorerKind {
    pub fn build(self) -> Box<dyn AlignmentScorer> {
        match self {
            ScorerKind::Match => Box::new(MatchCountScorer::default()),
            ScorerKind::As => Box::new(AlignerTagScorer::new(*b"AS")),
            ScorerKind::Mapq => Box::new(MappingQualityScorer),
            ScorerKind::Balwayswins => Box::new(FixedPreferenceScorer),
        }
    }
}

pub trait AlignmentScorer {
    fn name(&self) -> &'static str;

    fn score(&mut self, record: &RecordBuf, side: Side) -> Result<i64>;
}

/// Best score over a contiguous run of same-key records.
pub fn best_score(
    scorer: &mut dyn AlignmentScorer,
    records: &[RecordBuf],
    side: Side,
) -> Result<i64> {
    let mut best = i64::MIN;
    for record in records {
        best = best.max(scorer.score(record, side)?);
    }
    Ok(if records.is_empty() { 0 } else { best })
}

fn read_name(record: &RecordBuf) -> String {
    record.name().map(|n| n.to_string()).unwrap_or_else(|| "*".to_string())
}

/// Counts bases aligned as matches.
///
/// `M`/`=` lengths count as matches and deletions are subtracted. When the
/// CIGAR cannot tell matches from mismatches, NM (or failing that, MD) is used
/// to remove mismatches.
#[derive(Debug, Default)]
pub struct MatchCountScorer {
    warned_nm_below_indels: bool,
    warned_no_evidence: bool,
}

impl MatchCountScorer {
    fn count(&mut self, record: &RecordBuf) -> i64 {
        let mut matches: i64 = 0;
        let mut indel_distance: i64 = 0;
        let mut explicit_mismatches = false;

        for op in record.cigar().as_ref() {
            let len = op.len() as i64;
            match op.kind() {
                Kind::Match => matches += len,
                Kind::SequenceMatch => {
                    matches += len;
                    explicit_mismatches = true;
                }
                Kind::SequenceMismatch => explicit_mismatches = true,
                Kind::Deletion => {
                    matches -= len;
                    indel_distance += len;
                }
                Kind::Insertion => indel_distance += len,
                _ => {}
            }
        }

        if !explicit_mismatches {
            let data = record.data();
            if let Some(nm) = data.get(&Tag::EDIT_DISTANCE).and_then(|v| v.as_int()) {
                if nm >= indel_distance {
                    matches -= nm - indel_distance;
                } else if !self.warned_nm_below_indels {
                    warn!(
                        "Record {} has NM {} below its CIGAR indel count {}; scores are left \
                         uncorrected for such records (reported once)",
                        read_name(record),
                        nm,
                        indel_distance
                    );
                    self.warned_nm_below_indels = true;
                }
            } else if let Some(Value::String(md)) = data.get(&Tag::MISMATCHED_POSITIONS) {
                matches -= md_mismatches(md);
            } else if !self.warned_no_evidence {
                warn!(
                    "Record {} has neither =/X CIGAR operators nor NM or MD tags; treating M as a \
                     perfect match (reported once)",
                    read_name(record)
                );
                self.warned_no_evidence = true;
            }
        }

        matches.max(0)
    }
}

/// Number of mismatched bases described by an MD string.
///
/// Digits are matched runs, `^` followed by letters is a deletion (already
/// subtracted via the CIGAR), and any other letter is a single mismatch.
pub fn md_mismatches(md: &[u8]) -> i64 {
    let mut mismatches = 0;
    let mut in_deletion = false;
    for &c in md {
        if c == b'^' {
            in_deletion = true;
        } else if c.is_ascii_digit() {
            in_deletion = false;
        } else if c.is_ascii_alphabetic() && !in_deletion {
            mismatches += 1;
        }
    }
    mismatches
}

impl AlignmentScorer for MatchCountScorer {
    fn name(&self) -> &'static str {
        "match"
    }

    fn score(&mut self, record: &RecordBuf, _side: Side) -> Result<i64> {
        if record.flags().is_unmapped() {
            return Ok(0);
        }
        Ok(self.count(record))
    }
}

/// Uses an integer tag written by the aligner, typically AS.
#[derive(Debug)]
pub struct AlignerTagScorer {
    name: [u8; 2],
    tag: Tag,
}

impl AlignerTagScorer {
    pub fn new(name: [u8; 2]) -> Self {
        Self { name, tag: Tag::new(name[0], name[1]) }
    }
}

impl AlignmentScorer for AlignerTagScorer {
    fn name(&self) -> &'static str {
        "as"
    }

    fn score(&mut self, record: &RecordBuf, _side: Side) -> Result<i64> {
        // the tag is only required on mapped records
        if record.flags().is_unmapped() {
            return Ok(0);
        }
        match record.data().get(&self.tag).and_then(|v| v.as_int()) {
            Some(score) => Ok(score),
            None => Err(ReconcileError::MissingTag {
                tag: String::from_utf8_lossy(&self.name).into_owned(),
                read: read_name(record),
            }
            .into()),
        }
    }
}

#[derive(Debug)]
pub struct MappingQualityScorer;

impl AlignmentScorer for MappingQualityScorer {
    fn name(&self) -> &'static str {
        "mapq"
    }

    fn score(&mut self, record: &RecordBuf, _side: Side) -> Result<i64> {
        if record.flags().is_unmapped() {
            return Ok(0);
        }
        Ok(record.mapping_quality().map(|mq| i64::from(mq.get())).unwrap_or(0))
    }
}

/// Removes from the first input anything the second input aligned at all.
///
/// A mapped second-input record scores 2, any first-input record 1 and an
/// unmapped second-input record 0.
#[derive(Debug)]
pub struct FixedPreferenceScorer;

impl AlignmentScorer for FixedPreferenceScorer {
    fn name(&self) -> &'static str {
        "balwayswins"
    }

    fn score(&mut self, record: &RecordBuf, side: Side) -> Result<i64> {
        Ok(match side {
            Side::First => 1,
            Side::Second if record.flags().is_unmapped() => 0,
            Side::Second => 2,
        })
    }
}
