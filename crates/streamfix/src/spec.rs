//! Message tables: the dispatch model the decoder is driven by.
//!
//! A dialect (FIX 4.4, FIXT 1.1, ...) is compiled down to plain lookup
//! functions: one mapping a tag to its kind and storage slot, one mapping a
//! group-count tag to the description of its nodes. Tables are expected to
//! be `static` data — typically generated, or hand-written for tests.

/// How a tag is stored within its message or group node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagInfo {
    /// A plain `tag=value` field stored at `index` within the node.
    String {
        /// Slot index, dense and unique within the node.
        index: u32,
    },
    /// The length half of a length/data pair. Carries no slot of its own;
    /// `data_tag` names the data field that must follow immediately.
    Length {
        /// Tag number of the paired data field.
        data_tag: u32,
    },
    /// The data half of a length/data pair. The payload may contain SOH.
    Binary {
        /// Slot index, dense and unique within the node.
        index: u32,
    },
    /// A repeating-group count field; the child group is stored at `index`.
    Group {
        /// Slot index, dense and unique within the node.
        index: u32,
    },
}

/// The tag universe of one message or repeating-group node.
#[derive(Debug, Clone, Copy)]
pub struct GroupSpec {
    /// Number of slots in one node.
    pub node_size: u32,
    /// The mandatory first tag of every node; each occurrence delimits a new
    /// node. Zero for a message root.
    pub first_tag: u32,
    /// Tag lookup for this node. `None` means the tag does not belong here.
    pub tag_info: fn(u32) -> Option<TagInfo>,
    /// Group lookup: for a tag reported as [`TagInfo::Group`], the child
    /// node description.
    pub group_info: fn(u32) -> Option<&'static GroupSpec>,
}

/// One message type: its root node plus the dialect-assigned integer code.
#[derive(Debug, Clone, Copy)]
pub struct MessageSpec {
    /// The root tag universe of the message.
    pub root: GroupSpec,
    /// Dialect-assigned code, reported through
    /// [`ParseResult::msg_type_code`](crate::ParseResult::msg_type_code).
    pub msg_type_code: i32,
}

/// A dialect: maps a `MsgType (35)` value to its message description.
pub type SpecTable = fn(&[u8]) -> Option<&'static MessageSpec>;
