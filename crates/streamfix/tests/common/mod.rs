//! Shared fixtures: hand-written message tables and wire helpers.
#![allow(dead_code)]

use streamfix::{GroupSpec, MessageSpec, Parser, TagInfo};

/// Message type codes assigned by [`table`].
pub const ORDER: i32 = 0;
pub const MARKET_DATA: i32 = 1;

/// Replaces the readable `|` separator with SOH.
pub fn with_soh(message: &str) -> Vec<u8> {
    message.replace('|', "\x01").into_bytes()
}

/// Wraps a `tag=value<SOH>...` body in a FIX envelope, computing the body
/// length and checksum.
pub fn wire(version: &str, body: &[u8]) -> Vec<u8> {
    let mut msg = format!("8={version}\x019={}\x01", body.len()).into_bytes();
    msg.extend_from_slice(body);
    let sum: u8 = msg.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    msg.extend_from_slice(format!("10={sum:03}\x01").as_bytes());
    msg
}

pub const SIMPLE_MESSAGE: &str = "8=FIX.4.4|9=122|35=D|34=215|49=CLIENT12|\
    52=20100225-19:41:57.316|56=B|1=Marcel|11=13346|21=1|40=2|44=5|54=1|59=0|\
    60=20100225-19:39:52.020|10=072|";

/// Same as [`SIMPLE_MESSAGE`] but with a wrong trailer checksum.
pub const BAD_CHECKSUM_MESSAGE: &str = "8=FIX.4.4|9=122|35=D|34=215|49=CLIENT12|\
    52=20100225-19:41:57.316|56=B|1=Marcel|11=13346|21=1|40=2|44=5|54=1|59=0|\
    60=20100225-19:39:52.020|10=172|";

/// Same as [`SIMPLE_MESSAGE`] but declaring 112 body bytes instead of 122.
pub const BAD_LENGTH_MESSAGE: &str = "8=FIX.4.4|9=112|35=D|34=215|49=CLIENT12|\
    52=20100225-19:41:57.316|56=B|1=Marcel|11=13346|21=1|40=2|44=5|54=1|59=0|\
    60=20100225-19:39:52.020|10=072|";

pub const GROUP_MESSAGE: &str = "8=FIX.4.4|9=196|35=X|49=A|56=B|34=12|\
    52=20100318-03:21:11.364|262=A|268=2|\
    279=0|269=0|278=BID|55=EUR/USD|270=1.37215|15=EUR|271=2500000|346=1|\
    279=0|269=1|278=OFFER|55=EUR/USD|270=1.37224|15=EUR|271=2503200|346=1|10=173|";

/// Same as [`GROUP_MESSAGE`] but the second node opens with `269` instead
/// of the `279` delimiter, which makes `269` a duplicate within node one.
/// The checksum is unchanged because the bytes are merely permuted.
pub const DUPLICATE_TAG_MESSAGE: &str = "8=FIX.4.4|9=196|35=X|49=A|56=B|34=12|\
    52=20100318-03:21:11.364|262=A|268=2|\
    279=0|269=0|278=BID|55=EUR/USD|270=1.37215|15=EUR|271=2500000|346=1|\
    269=1|279=0|278=OFFER|55=EUR/USD|270=1.37224|15=EUR|271=2503200|346=1|10=173|";

// Order message (35=D): a flat tag universe.
fn order_tag_info(tag: u32) -> Option<TagInfo> {
    let index = match tag {
        34 => 0,
        49 => 1,
        52 => 2,
        56 => 3,
        1 => 4,
        11 => 5,
        21 => 6,
        40 => 7,
        44 => 8,
        54 => 9,
        59 => 10,
        60 => 11,
        75 => 12,   // TradeDate
        114 => 13,  // LocateReqd
        1128 => 14, // ApplVerID
        1132 => 15, // TZTransactTime
        _ => return None,
    };
    Some(TagInfo::String { index })
}

fn no_groups(_: u32) -> Option<&'static GroupSpec> {
    None
}

static ORDER_MESSAGE_SPEC: MessageSpec = MessageSpec {
    root: GroupSpec {
        node_size: 16,
        first_tag: 0,
        tag_info: order_tag_info,
        group_info: no_groups,
    },
    msg_type_code: ORDER,
};

// Market data message (35=X) with one repeating group.
fn md_entry_tag_info(tag: u32) -> Option<TagInfo> {
    let index = match tag {
        279 => 0,
        269 => 1,
        278 => 2,
        55 => 3,
        270 => 4,
        15 => 5,
        271 => 6,
        346 => 7,
        _ => return None,
    };
    Some(TagInfo::String { index })
}

static MD_ENTRY_SPEC: GroupSpec = GroupSpec {
    node_size: 8,
    first_tag: 279,
    tag_info: md_entry_tag_info,
    group_info: no_groups,
};

fn market_data_tag_info(tag: u32) -> Option<TagInfo> {
    match tag {
        49 => Some(TagInfo::String { index: 0 }),
        56 => Some(TagInfo::String { index: 1 }),
        34 => Some(TagInfo::String { index: 2 }),
        52 => Some(TagInfo::String { index: 3 }),
        262 => Some(TagInfo::String { index: 4 }),
        268 => Some(TagInfo::Group { index: 5 }),
        _ => None,
    }
}

fn market_data_group_info(tag: u32) -> Option<&'static GroupSpec> {
    match tag {
        268 => Some(&MD_ENTRY_SPEC),
        _ => None,
    }
}

static MARKET_DATA_MESSAGE_SPEC: MessageSpec = MessageSpec {
    root: GroupSpec {
        node_size: 6,
        first_tag: 0,
        tag_info: market_data_tag_info,
        group_info: market_data_group_info,
    },
    msg_type_code: MARKET_DATA,
};

pub fn table(msg_type: &[u8]) -> Option<&'static MessageSpec> {
    match msg_type {
        b"D" => Some(&ORDER_MESSAGE_SPEC),
        b"X" => Some(&MARKET_DATA_MESSAGE_SPEC),
        _ => None,
    }
}

pub fn test_parser() -> Parser {
    let _ = env_logger::builder().is_test(true).try_init();
    Parser::new(table, b"FIX.4.4").expect("valid begin string")
}
