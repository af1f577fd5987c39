//! Curated FIX 4.4 message tables for [`streamfix`].
//!
//! Covers the standard header/trailer plus the message types needed to
//! exercise every decoder feature: Heartbeat, NewOrderSingle and
//! MarketDataIncrementalRefresh with its `NoMDEntries` repeating group.
//! Tables for further message types follow the same pattern: a tag-info
//! function falling back to [`common_tag_info`], and slot indices starting
//! at [`COMMON_SLOTS`].

use streamfix::{GroupSpec, MessageSpec, Parser, SetupError, TagInfo};

/// Message type code for `35=0`.
pub const HEARTBEAT: i32 = 0;
/// Message type code for `35=D`.
pub const NEW_ORDER_SINGLE: i32 = 1;
/// Message type code for `35=X`.
pub const MARKET_DATA_INCREMENTAL_REFRESH: i32 = 2;

/// Slots reserved in every message for the standard header/trailer tags.
pub const COMMON_SLOTS: u32 = 9;

/// Standard header/trailer tags shared by every message. Slot indices
/// `0..COMMON_SLOTS` are reserved for these in every message table.
fn common_tag_info(tag: u32) -> Option<TagInfo> {
    match tag {
        34 => Some(TagInfo::String { index: 0 }),  // MsgSeqNum
        49 => Some(TagInfo::String { index: 1 }),  // SenderCompID
        50 => Some(TagInfo::String { index: 2 }),  // SenderSubID
        52 => Some(TagInfo::String { index: 3 }),  // SendingTime
        56 => Some(TagInfo::String { index: 4 }),  // TargetCompID
        57 => Some(TagInfo::String { index: 5 }),  // TargetSubID
        115 => Some(TagInfo::String { index: 6 }), // OnBehalfOfCompID
        128 => Some(TagInfo::String { index: 7 }), // DeliverToCompID
        212 => Some(TagInfo::Length { data_tag: 213 }), // XmlDataLen
        213 => Some(TagInfo::Binary { index: 8 }), // XmlData
        _ => None,
    }
}

fn no_groups(_: u32) -> Option<&'static GroupSpec> {
    None
}

// Heartbeat (35=0)

fn heartbeat_tag_info(tag: u32) -> Option<TagInfo> {
    match tag {
        112 => Some(TagInfo::String { index: 9 }), // TestReqID
        _ => common_tag_info(tag),
    }
}

static HEARTBEAT_MESSAGE: MessageSpec = MessageSpec {
    root: GroupSpec {
        node_size: COMMON_SLOTS + 1,
        first_tag: 0,
        tag_info: heartbeat_tag_info,
        group_info: no_groups,
    },
    msg_type_code: HEARTBEAT,
};

// NewOrderSingle (35=D)

fn new_order_single_tag_info(tag: u32) -> Option<TagInfo> {
    match tag {
        1 => Some(TagInfo::String { index: 9 }),   // Account
        11 => Some(TagInfo::String { index: 10 }), // ClOrdID
        21 => Some(TagInfo::String { index: 11 }), // HandlInst
        38 => Some(TagInfo::String { index: 12 }), // OrderQty
        40 => Some(TagInfo::String { index: 13 }), // OrdType
        44 => Some(TagInfo::String { index: 14 }), // Price
        54 => Some(TagInfo::String { index: 15 }), // Side
        55 => Some(TagInfo::String { index: 16 }), // Symbol
        59 => Some(TagInfo::String { index: 17 }), // TimeInForce
        60 => Some(TagInfo::String { index: 18 }), // TransactTime
        _ => common_tag_info(tag),
    }
}

static NEW_ORDER_SINGLE_MESSAGE: MessageSpec = MessageSpec {
    root: GroupSpec {
        node_size: COMMON_SLOTS + 10,
        first_tag: 0,
        tag_info: new_order_single_tag_info,
        group_info: no_groups,
    },
    msg_type_code: NEW_ORDER_SINGLE,
};

// MarketDataIncrementalRefresh (35=X)

fn md_entry_tag_info(tag: u32) -> Option<TagInfo> {
    match tag {
        279 => Some(TagInfo::String { index: 0 }), // MDUpdateAction
        269 => Some(TagInfo::String { index: 1 }), // MDEntryType
        278 => Some(TagInfo::String { index: 2 }), // MDEntryID
        55 => Some(TagInfo::String { index: 3 }),  // Symbol
        270 => Some(TagInfo::String { index: 4 }), // MDEntryPx
        15 => Some(TagInfo::String { index: 5 }),  // Currency
        271 => Some(TagInfo::String { index: 6 }), // MDEntrySize
        346 => Some(TagInfo::String { index: 7 }), // NumberOfOrders
        _ => None,
    }
}

static MD_ENTRIES_GROUP: GroupSpec = GroupSpec {
    node_size: 8,
    first_tag: 279,
    tag_info: md_entry_tag_info,
    group_info: no_groups,
};

fn market_data_tag_info(tag: u32) -> Option<TagInfo> {
    match tag {
        262 => Some(TagInfo::String { index: 9 }), // MDReqID
        268 => Some(TagInfo::Group { index: 10 }), // NoMDEntries
        _ => common_tag_info(tag),
    }
}

fn market_data_group_info(tag: u32) -> Option<&'static GroupSpec> {
    match tag {
        268 => Some(&MD_ENTRIES_GROUP),
        _ => None,
    }
}

static MARKET_DATA_INCREMENTAL_REFRESH_MESSAGE: MessageSpec = MessageSpec {
    root: GroupSpec {
        node_size: COMMON_SLOTS + 2,
        first_tag: 0,
        tag_info: market_data_tag_info,
        group_info: market_data_group_info,
    },
    msg_type_code: MARKET_DATA_INCREMENTAL_REFRESH,
};

/// The FIX 4.4 dialect table.
pub fn spec_table(msg_type: &[u8]) -> Option<&'static MessageSpec> {
    match msg_type {
        b"0" => Some(&HEARTBEAT_MESSAGE),
        b"D" => Some(&NEW_ORDER_SINGLE_MESSAGE),
        b"X" => Some(&MARKET_DATA_INCREMENTAL_REFRESH_MESSAGE),
        _ => None,
    }
}

/// A parser wired to the FIX 4.4 tables and begin string.
pub fn parser() -> Result<Parser, SetupError> {
    Parser::new(spec_table, b"FIX.4.4")
}
