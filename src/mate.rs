//! Mate-pair consistency for read groups split across outputs.
//!
//! When records of one read go to different destinations, a record's mate
//! may not exist in the file it lands in. Pairing information is removed so
//! downstream tools never try to resolve it; the original mate slot is kept
//! in the `om` tag.

use crate::group::mate_slot;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;

/// Original mate slot of an unpaired record: 0 unpaired, 1 first, 2 second.
pub const ORIGINAL_MATE_TAG: Tag = Tag::new(b'o', b'm');

const PAIRING_FLAGS: Flags = Flags::SEGMENTED
    .union(Flags::MATE_UNMAPPED)
    .union(Flags::MATE_REVERSE_COMPLEMENTED)
    .union(Flags::FIRST_SEGMENT)
    .union(Flags::LAST_SEGMENT);

/// Strip pairing flags and mate coordinates from every record.
pub fn unpair_records(records: &mut [RecordBuf]) {
    for record in records {
        let slot = mate_slot(record);
        record.data_mut().insert(ORIGINAL_MATE_TAG, Value::from(i32::from(slot)));

        let mut flags = record.flags();
        flags.remove(PAIRING_FLAGS);
        *record.flags_mut() = flags;
        *record.mate_reference_sequence_id_mut() = None;
        *record.mate_alignment_start_mut() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noodles::core::Position;

    #[test]
    fn test_unpair_clears_mate_fields() {
        let mut rec = RecordBuf::builder()
            .set_flags(
                Flags::SEGMENTED
                    | Flags::PROPERLY_SEGMENTED
                    | Flags::LAST_SEGMENT
                    | Flags::MATE_REVERSE_COMPLEMENTED
                    | Flags::REVERSE_COMPLEMENTED,
            )
            .set_reference_sequence_id(0)
            .set_mate_reference_sequence_id(3)
            .set_mate_alignment_start(Position::try_from(500).unwrap())
            .build();

        unpair_records(std::slice::from_mut(&mut rec));

        let flags = rec.flags();
        assert!(!flags.is_segmented());
        assert!(!flags.is_last_segment());
        assert!(!flags.is_mate_reverse_complemented());
        assert!(flags.is_reverse_complemented());
        assert!(rec.mate_reference_sequence_id().is_none());
        assert!(rec.mate_alignment_start().is_none());
        assert_eq!(rec.reference_sequence_id(), Some(0));
        assert_eq!(rec.data().get(&ORIGINAL_MATE_TAG).and_then(|v| v.as_int()), Some(2));
    }

    #[test]
    fn test_unpaired_record_tagged_zero() {
        let mut records = vec![RecordBuf::builder().set_flags(Flags::empty()).build()];
        unpair_records(&mut records);
        assert_eq!(records[0].data().get(&ORIGINAL_MATE_TAG).and_then(|v| v.as_int()), Some(0));
    }
}
