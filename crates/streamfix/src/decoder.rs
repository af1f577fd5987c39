//! The decode pass: drives the tag stream over one framed message and
//! populates the group tree according to the message table.

use crate::MAX_GROUP_SIZE;
use crate::SOH;
use crate::errors::ErrorKind;
use crate::group::{EMPTY_ROOT_SPEC, GroupNode, TagSlot};
use crate::parser::ParseResult;
use crate::spec::{GroupSpec, SpecTable, TagInfo};
use crate::tagstream::TagStream;

/// Decodes the framed message in `result`. All findings, including the
/// message type, land in the shared error slot and the group arena.
pub(crate) fn decode(table: SpecTable, result: &mut ParseResult) {
    let ParseResult {
        error,
        msg_type_code,
        body,
        frame,
        groups,
        ..
    } = result;
    let body: &[u8] = body;
    let mut ts = TagStream::new(body, *frame, error);

    if !ts.match_tag(35) {
        return;
    }
    let mt = ts.read_string();
    let mut e = error.get();
    e.msg_type = mt;
    error.set(e);

    let Some(message) = table(&body[mt.0 as usize..mt.1 as usize]) else {
        ts.set_error_ctx(ErrorKind::InvalidMessageType, 35, mt);
        // Reset the root so stale slots from the previous message cannot
        // be reached through this result.
        prepare_root(groups, &EMPTY_ROOT_SPEC);
        return;
    };
    *msg_type_code = message.msg_type_code;
    prepare_root(groups, &message.root);

    if ts.next_tag() != 0 {
        while process_tag(&mut ts, groups, 0) {}
    }

    let e = error.get();
    if e.code.is_none() && e.tag != 0 {
        // The loop stopped on a tag no table claims.
        ts.set_code(ErrorKind::UnexpectedTag);
    }
}

pub(crate) fn prepare_root(groups: &mut Vec<GroupNode>, spec: &'static GroupSpec) {
    groups.clear();
    groups.push(GroupNode::new(spec, 1));
}

/// Handles the pending tag within `gid` and fetches the next one.
/// Returns `false` when the tag does not belong to this group (the caller
/// decides whether that means end-of-group, end-of-message or an error) or
/// when an error has been recorded.
fn process_tag(ts: &mut TagStream<'_>, groups: &mut Vec<GroupNode>, gid: usize) -> bool {
    let tag = ts.current_tag();
    let Some(info) = (groups[gid].spec.tag_info)(tag) else {
        return false;
    };
    match info {
        TagInfo::String { index } => {
            if let Some(slot) = claim_slot(ts, groups, gid, index) {
                let span = ts.read_string();
                groups[gid].slots[slot] = TagSlot::Bytes(span.0, span.1);
                ts.next_tag();
            }
        }
        TagInfo::Length { data_tag } => read_binary(ts, groups, gid, data_tag),
        TagInfo::Binary { .. } => {
            // A data field is only valid right after its length field.
            ts.set_code(ErrorKind::InvalidTagOrder);
            return false;
        }
        TagInfo::Group { index } => read_group(ts, groups, gid, tag, index),
    }
    ts.error_code().is_none()
}

/// Resolves the slot for `index` in the current node, rejecting
/// duplicates. `None` means an error has been recorded.
fn claim_slot(ts: &TagStream<'_>, groups: &[GroupNode], gid: usize, index: u32) -> Option<usize> {
    let node = &groups[gid];
    if index >= node.spec.node_size {
        // The table handed out an index outside its own node size.
        ts.set_code(ErrorKind::InvalidParserState);
        return None;
    }
    let at = (node.node_base.get() + index) as usize;
    match node.slots.get(at) {
        Some(TagSlot::Empty) => Some(at),
        Some(_) => {
            ts.set_code(ErrorKind::DuplicateTag);
            None
        }
        None => {
            ts.set_code(ErrorKind::InvalidParserState);
            None
        }
    }
}

/// Reads a length/data pair: the pending tag carries the byte count, the
/// very next tag must be `data_tag`, and its payload (which may contain
/// SOH) spans exactly that many bytes.
fn read_binary(ts: &mut TagStream<'_>, groups: &mut Vec<GroupNode>, gid: usize, data_tag: u32) {
    let Some(TagInfo::Binary { index }) = (groups[gid].spec.tag_info)(data_tag) else {
        // The table paired the length with something that is not a data
        // field.
        ts.set_code(ErrorKind::InvalidParserState);
        return;
    };
    let Some(slot) = claim_slot(ts, groups, gid, index) else {
        return;
    };

    let len = ts.read_uint_value() as usize;
    if ts.error_code().is_some() {
        return;
    }
    if len == 0 {
        ts.next_tag();
        return;
    }

    let (len_tag, len_ctx) = ts.current_tag_and_context();
    if !ts.match_tag(data_tag) {
        return;
    }

    let start = ts.position();
    let end = start + len;
    if end > ts.frame_end() || ts.byte(end) != Some(SOH) {
        // The declared length does not land on a field boundary; blame the
        // length field.
        ts.set_error_ctx(ErrorKind::InvalidValue, len_tag, len_ctx);
        return;
    }
    groups[gid].slots[slot] = TagSlot::Bytes(start as u32, end as u32);
    ts.advance_to(end + 1);
    ts.next_tag();
}

/// Reads a repeating group: the pending tag carries the node count, the
/// next tag must be the group's delimiter, and each further occurrence of
/// the delimiter starts a new node.
fn read_group(ts: &mut TagStream<'_>, groups: &mut Vec<GroupNode>, gid: usize, tag: u32, index: u32) {
    let Some(child_spec) = (groups[gid].spec.group_info)(tag) else {
        // tag_info reported GROUP but group_info knows nothing about it.
        ts.set_code(ErrorKind::InvalidParserState);
        return;
    };
    let Some(slot) = claim_slot(ts, groups, gid, index) else {
        return;
    };

    let num_nodes = ts.read_uint_value();
    if ts.error_code().is_some() {
        return;
    }
    if num_nodes == 0 {
        // Declared empty; the slot stays vacant.
        ts.next_tag();
        return;
    }
    if num_nodes > MAX_GROUP_SIZE {
        ts.set_code(ErrorKind::InvalidValue);
        return;
    }

    let (count_tag, count_ctx) = ts.current_tag_and_context();
    let child = groups.len();
    groups.push(GroupNode::new(child_spec, num_nodes));

    if !ts.match_tag(child_spec.first_tag) {
        return;
    }

    while process_tag(ts, groups, child) {
        if ts.current_tag() == child_spec.first_tag {
            // The delimiter came around again: move to the next node.
            let node = &groups[child];
            let next = node.node_base.get() + child_spec.node_size;
            node.node_base.set(next);
            if next >= child_spec.node_size * num_nodes {
                ts.set_error_ctx(ErrorKind::InvalidGroupCount, count_tag, count_ctx);
                break;
            }
        }
    }

    groups[child].node_base.set(0);
    groups[gid].slots[slot] = TagSlot::Group(child as u32);
}
