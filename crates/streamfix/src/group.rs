//! The decoded message tree: an arena of group nodes plus the borrowing
//! handle callers navigate it with.

use std::cell::Cell;

use smallvec::SmallVec;

use crate::INITIAL_ROOT_SLOTS;
use crate::errors::{EMPTY_SPAN, ErrorDetails, ErrorKind, Span};
use crate::field_types::{self, FixVersion, TzTimestamp, UtcTimestamp};
use crate::parser::ParseResult;
use crate::spec::{GroupSpec, TagInfo};

/// Iterator sentinel: the node cursor has run past the last node.
pub(crate) const NODE_END: u32 = u32::MAX;

fn no_tags(_: u32) -> Option<TagInfo> {
    None
}

fn no_groups(_: u32) -> Option<&'static GroupSpec> {
    None
}

/// Placeholder table the root is reset to before a message spec is known.
/// Every lookup through it reports the tag as not belonging.
pub(crate) static EMPTY_ROOT_SPEC: GroupSpec = GroupSpec {
    node_size: INITIAL_ROOT_SLOTS,
    first_tag: 0,
    tag_info: no_tags,
    group_info: no_groups,
};

/// One storage slot of a group node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum TagSlot {
    /// The tag did not occur.
    #[default]
    Empty,
    /// Field bytes inside the message buffer (possibly zero-length).
    Bytes(u32, u32),
    /// Index of a child group in the arena.
    Group(u32),
}

/// One repeating group (or the message root, which is a group with a single
/// node). Nodes live in an arena owned by the [`ParseResult`]; slot `0` of
/// the arena is always the root.
#[derive(Debug)]
pub(crate) struct GroupNode {
    pub spec: &'static GroupSpec,
    pub num_nodes: u32,
    /// Cursor of the node iterator: `current_node * node_size`, or
    /// [`NODE_END`] once exhausted.
    pub node_base: Cell<u32>,
    pub slots: SmallVec<[TagSlot; 32]>,
}

impl GroupNode {
    pub fn new(spec: &'static GroupSpec, num_nodes: u32) -> Self {
        let mut slots = SmallVec::new();
        slots.resize((num_nodes * spec.node_size) as usize, TagSlot::Empty);
        Self {
            spec,
            num_nodes,
            node_base: Cell::new(0),
            slots,
        }
    }
}

/// A borrowed handle to one group of a parsed message.
///
/// The handle addresses the node the internal iterator currently points at.
/// The intended traversal is:
///
/// ```ignore
/// let group = root.get_group(268)?;
/// loop {
///     // ... read tags of the current node ...
///     if !group.has_more_nodes() { break; }
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Group<'a> {
    result: &'a ParseResult,
    id: u32,
}

impl<'a> PartialEq for Group<'a> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.result, other.result) && self.id == other.id
    }
}

impl<'a> Group<'a> {
    pub(crate) fn new(result: &'a ParseResult, id: u32) -> Self {
        Self { result, id }
    }

    fn node(&self) -> &'a GroupNode {
        &self.result.groups[self.id as usize]
    }

    /// Number of nodes in this group.
    pub fn size(&self) -> u32 {
        self.node().num_nodes
    }

    /// Advances the node iterator. Returns `true` while another node is in
    /// range; once exhausted, the iterator parks on a sentinel and every
    /// accessor reports [`ErrorKind::Other`] until [`Group::reset_iterator`].
    pub fn has_more_nodes(&self) -> bool {
        let node = self.node();
        let base = node.node_base.get();
        if base == NODE_END {
            return false;
        }
        let next = base + node.spec.node_size;
        if next < node.num_nodes * node.spec.node_size {
            node.node_base.set(next);
            true
        } else {
            node.node_base.set(NODE_END);
            false
        }
    }

    /// Rewinds the node iterator to the first node.
    pub fn reset_iterator(&self) {
        self.node().node_base.set(0);
    }

    /// The error slot shared by every group of this message.
    pub fn error(&self) -> Option<ErrorDetails<'a>> {
        self.result.error()
    }

    fn fail(&self, tag: u32, code: ErrorKind) -> ErrorKind {
        let mut e = self.result.error.get();
        e.code = Some(code);
        e.tag = tag;
        e.context = EMPTY_SPAN;
        self.result.error.set(e);
        code
    }

    fn found(&self, tag: u32, context: Span) {
        let mut e = self.result.error.get();
        e.code = None;
        e.tag = tag;
        e.context = context;
        self.result.error.set(e);
    }

    fn scalar_span(&self, tag: u32) -> Result<Span, ErrorKind> {
        let node = self.node();
        let base = node.node_base.get();
        if base == NODE_END {
            return Err(ErrorKind::Other);
        }
        let Some(info) = (node.spec.tag_info)(tag) else {
            return Err(self.fail(tag, ErrorKind::UnexpectedTag));
        };
        let index = match info {
            TagInfo::String { index } | TagInfo::Binary { index } => index,
            TagInfo::Length { .. } => return Err(self.fail(tag, ErrorKind::UnexpectedTag)),
            TagInfo::Group { .. } => return Err(self.fail(tag, ErrorKind::IncorrectValueFormat)),
        };
        match node.slots.get((base + index) as usize) {
            Some(&TagSlot::Bytes(start, end)) if end > start => {
                self.found(tag, (start, end));
                Ok((start, end))
            }
            Some(&TagSlot::Group(_)) => Err(self.fail(tag, ErrorKind::IncorrectValueFormat)),
            _ => Err(self.fail(tag, ErrorKind::RequiredTagMissing)),
        }
    }

    /// The raw bytes of a STRING or BINARY field in the current node.
    pub fn get_string(&self, tag: u32) -> Result<&'a [u8], ErrorKind> {
        let span = self.scalar_span(tag)?;
        Ok(self.result.bytes(span))
    }

    /// An owned copy of a STRING or BINARY field; the bytes must be UTF-8.
    pub fn copy_string(&self, tag: u32) -> Result<String, ErrorKind> {
        let value = self.get_string(tag)?;
        String::from_utf8(value.to_vec()).map_err(|_| self.fail(tag, ErrorKind::IncorrectValueFormat))
    }

    /// The child group stored under a GROUP tag in the current node.
    pub fn get_group(&self, tag: u32) -> Result<Group<'a>, ErrorKind> {
        let node = self.node();
        if node.node_base.get() == NODE_END {
            return Err(ErrorKind::Other);
        }
        let Some(info) = (node.spec.tag_info)(tag) else {
            return Err(self.fail(tag, ErrorKind::UnexpectedTag));
        };
        let index = match info {
            TagInfo::Group { index } => index,
            TagInfo::String { .. } | TagInfo::Binary { .. } => {
                return Err(self.fail(tag, ErrorKind::IncorrectValueFormat));
            }
            TagInfo::Length { .. } => return Err(self.fail(tag, ErrorKind::UnexpectedTag)),
        };
        match node.slots.get((node.node_base.get() + index) as usize) {
            Some(&TagSlot::Group(id)) => {
                self.found(tag, EMPTY_SPAN);
                Ok(Group::new(self.result, id))
            }
            _ => Err(self.fail(tag, ErrorKind::RequiredTagMissing)),
        }
    }

    /// A field as a signed integer.
    pub fn get_long(&self, tag: u32) -> Result<i64, ErrorKind> {
        let value = self.get_string(tag)?;
        field_types::parse_long(value).map_err(|e| self.fail(tag, e))
    }

    /// A field as a float, capped at fifteen significant digits.
    pub fn get_double(&self, tag: u32) -> Result<f64, ErrorKind> {
        let value = self.get_string(tag)?;
        field_types::parse_double(value).map_err(|e| self.fail(tag, e))
    }

    /// A single-byte field.
    pub fn get_char(&self, tag: u32) -> Result<char, ErrorKind> {
        let value = self.get_string(tag)?;
        field_types::parse_char(value).map_err(|e| self.fail(tag, e))
    }

    /// A `Y`/`N` field.
    pub fn get_boolean(&self, tag: u32) -> Result<bool, ErrorKind> {
        let value = self.get_string(tag)?;
        field_types::parse_boolean(value).map_err(|e| self.fail(tag, e))
    }

    /// A `YYYYMMDD-HH:MM:SS[.sss]` field.
    pub fn get_utc_timestamp(&self, tag: u32) -> Result<UtcTimestamp, ErrorKind> {
        let value = self.get_string(tag)?;
        field_types::parse_utc_timestamp(value).map_err(|e| self.fail(tag, e))
    }

    /// A `YYYYMMDD-HH:MM:SS[Z|±hh:mm]` field.
    pub fn get_tz_timestamp(&self, tag: u32) -> Result<TzTimestamp, ErrorKind> {
        let value = self.get_string(tag)?;
        field_types::parse_tz_timestamp(value).map_err(|e| self.fail(tag, e))
    }

    /// A `YYYY-MM-DD` local-market date; the time-of-day fields of the
    /// returned timestamp are zero.
    pub fn get_local_mkt_date(&self, tag: u32) -> Result<UtcTimestamp, ErrorKind> {
        let value = self.get_string(tag)?;
        field_types::parse_local_mkt_date(value).map_err(|e| self.fail(tag, e))
    }

    /// A protocol-version field (`ApplVerID` and friends).
    pub fn get_fix_version(&self, tag: u32) -> Result<FixVersion, ErrorKind> {
        let value = self.get_string(tag)?;
        field_types::parse_fix_version(value).map_err(|e| self.fail(tag, e))
    }
}
