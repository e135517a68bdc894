//! Classification of matched subranges.
//!
//! Ties go to the first input: the second input only wins on a strictly
//! greater score.

use crate::destination::Destination;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;

/// Score of the first input's subrange, written on every compared record.
pub const FIRST_SCORE_TAG: Tag = Tag::new(b's', b'1');
/// Score of the second input's subrange, written on every compared record.
pub const SECOND_SCORE_TAG: Tag = Tag::new(b's', b'2');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyMode {
    /// Winner goes to `-better`, loser to `-worse`.
    BetterWorse,
    /// The pair is written once, from the first input, to `matched`.
    Legacy,
}

/// Destinations chosen for one pair of equal-key subranges.
///
/// `None` means the records are consumed without being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub first: Option<Destination>,
    pub second: Option<Destination>,
    pub first_is_better: bool,
}

fn clamp_score(score: i64) -> i32 {
    i32::try_from(score).unwrap_or(if score < 0 { i32::MIN } else { i32::MAX })
}

/// Tag both subranges with both scores and pick their destinations.
pub fn classify(
    mode: ClassifyMode,
    first: &mut [RecordBuf],
    first_score: i64,
    second: &mut [RecordBuf],
    second_score: i64,
) -> Classification {
    let (s1, s2) = (clamp_score(first_score), clamp_score(second_score));
    for record in first.iter_mut().chain(second.iter_mut()) {
        let data = record.data_mut();
        data.insert(FIRST_SCORE_TAG, Value::from(s1));
        data.insert(SECOND_SCORE_TAG, Value::from(s2));
    }

    let first_is_better = first_score >= second_score;
    match mode {
        ClassifyMode::BetterWorse => {
            let (first, second) = if first_is_better {
                (Destination::FirstBetter, Destination::SecondWorse)
            } else {
                (Destination::FirstWorse, Destination::SecondBetter)
            };
            Classification { first: Some(first), second: Some(second), first_is_better }
        }
        ClassifyMode::Legacy => Classification {
            first: Some(Destination::Matched),
            second: None,
            first_is_better,
        },
    }
}

/// Whether one side's records of a read group were sent to more than one destination.
pub fn is_split(destinations: &[Option<Destination>]) -> bool {
    let mut seen: Option<Destination> = None;
    for dest in destinations.iter().flatten() {
        match seen {
            None => seen = Some(*dest),
            Some(prev) if prev != *dest => return true,
            Some(_) => {}
        }
    }
    false
}
