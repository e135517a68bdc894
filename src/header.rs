//! Combined headers for outputs shared by both inputs.
//!
//! The reference dictionary of the first input comes first and keeps its
//! indices; the second input's dictionary follows, so its reference ids shift
//! by the first dictionary's length. Names are prefixed per input so the two
//! coordinate spaces cannot collide.
//!
//! Read groups and programs of the second input whose ID is already used by
//! the first input are kept under a `.1`, `.2`, ... suffixed ID, and records
//! of the second input are rewritten to match through [`HeaderRenames`].

use bstr::{BStr, BString};
use log::warn;
use noodles::sam::Header;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::header::record::value::map::program::tag as program_tag;
use std::collections::{HashMap, HashSet};

fn prefixed(prefix: &str, name: &[u8]) -> BString {
    let mut out = BString::from(prefix);
    out.extend_from_slice(name);
    out
}

/// `base` if it is free, otherwise `base` with the first free numeric suffix.
fn unique_id(taken: &HashSet<BString>, base: &[u8]) -> BString {
    if !taken.contains(BStr::new(base)) {
        return BString::from(base);
    }
    let mut i = 1;
    loop {
        let mut candidate = BString::from(base);
        candidate.extend_from_slice(format!(".{i}").as_bytes());
        if !taken.contains(&candidate) {
            return candidate;
        }
        i += 1;
    }
}

/// Second-input `RG` and `PG` IDs renamed while merging headers.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeaderRenames {
    pub read_groups: HashMap<BString, BString>,
    pub programs: HashMap<BString, BString>,
}

impl HeaderRenames {
    /// Point a second-input record's `RG`/`PG` tags at the renamed IDs.
    pub fn apply(&self, record: &mut RecordBuf) {
        let tables = [(Tag::READ_GROUP, &self.read_groups), (Tag::PROGRAM, &self.programs)];
        for (tag, renames) in tables {
            let renamed = match record.data().get(&tag) {
                Some(Value::String(id)) => renames.get(id).cloned(),
                _ => None,
            };
            if let Some(id) = renamed {
                record.data_mut().insert(tag, Value::String(id));
            }
        }
    }
}

/// Merge two headers into one whose dictionary spans both inputs.
///
/// The `@HD` line comes from `first`. Read groups and programs of `second`
/// follow those of `first`; colliding IDs are renamed and `PP` links are
/// updated to the renamed programs. Comments from both are kept in order.
pub fn merge_headers(
    first: &Header,
    second: &Header,
    first_prefix: &str,
    second_prefix: &str,
) -> (Header, HeaderRenames) {
    let mut builder = Header::builder();
    let mut renames = HeaderRenames::default();

    if let Some(hd) = first.header() {
        builder = builder.set_header(hd.clone());
    }

    for (name, seq) in first.reference_sequences() {
        builder = builder.add_reference_sequence(prefixed(first_prefix, name), seq.clone());
    }
    for (name, seq) in second.reference_sequences() {
        builder = builder.add_reference_sequence(prefixed(second_prefix, name), seq.clone());
    }

    let mut read_group_ids: HashSet<BString> = first.read_groups().keys().cloned().collect();
    for (id, rg) in first.read_groups() {
        builder = builder.add_read_group(id.clone(), rg.clone());
    }
    for (id, rg) in second.read_groups() {
        let new_id = unique_id(&read_group_ids, id);
        if new_id != *id {
            warn!("Read group {id} exists in both inputs; the second input's is renamed {new_id}");
            renames.read_groups.insert(id.clone(), new_id.clone());
        }
        read_group_ids.insert(new_id.clone());
        builder = builder.add_read_group(new_id, rg.clone());
    }

    let mut program_ids: HashSet<BString> = first.programs().as_ref().keys().cloned().collect();
    for (id, pg) in first.programs().as_ref() {
        builder = builder.add_program(id.clone(), pg.clone());
    }
    // assign every new ID first so PP links to later programs resolve too
    let mut second_programs = Vec::new();
    for (id, pg) in second.programs().as_ref() {
        let new_id = unique_id(&program_ids, id);
        if new_id != *id {
            renames.programs.insert(id.clone(), new_id.clone());
        }
        program_ids.insert(new_id.clone());
        second_programs.push((new_id, pg.clone()));
    }
    for (id, mut pg) in second_programs {
        let previous = pg.other_fields().get(&program_tag::PREVIOUS_PROGRAM_ID).cloned();
        if let Some(pp) = previous.and_then(|pp| renames.programs.get(&pp).cloned()) {
            pg.other_fields_mut().insert(program_tag::PREVIOUS_PROGRAM_ID, pp);
        }
        builder = builder.add_program(id, pg);
    }

    for comment in first.comments().iter().chain(second.comments()) {
        builder = builder.add_comment(comment.clone());
    }

    (builder.build(), renames)
}
