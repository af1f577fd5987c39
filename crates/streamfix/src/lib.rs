//! # `StreamFix` - Streaming FIX Tag-Value Parser
//!
//! This crate decodes FIX (Financial Information eXchange) messages from a
//! continuous, arbitrarily chunked byte stream, the way bytes arrive from a
//! socket or a capture file. It is a pure pull-based decoder: no I/O, no
//! threads, no session layer.
//!
//! Three subsystems cooperate:
//!
//! - **Scanner** — a resumable state machine that reassembles one complete
//!   raw message from chunked input while validating the envelope
//!   (`8=<ver>`, `9=<len>`, `10=<checksum>`) and accumulating the checksum
//!   on the fly.
//! - **Decoder** — interprets the framed body against a caller-supplied
//!   message table, handling length-prefixed binary fields and nested
//!   repeating groups, and fills an indexed group tree.
//! - **Typed accessors** — strict, format-checked conversions from raw field
//!   bytes to integers, floats, booleans, timestamps and protocol-version
//!   codes.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use streamfix::Parser;
//!
//! # fn table(_: &[u8]) -> Option<&'static streamfix::MessageSpec> { None }
//! fn example(bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut parser = Parser::new(table, b"FIX.4.4")?;
//!
//!     let mut message = parser.first_message(bytes);
//!     while let Some(result) = message {
//!         if result.error().is_none() {
//!             let root = result.root();
//!             let symbol = root.get_string(55);
//!             // ...
//!         }
//!         message = parser.next_message();
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Field values and group handles borrow from the returned [`ParseResult`];
//! the borrow checker enforces that they do not outlive the next
//! `next_message` call.

mod decoder;
mod errors;
mod field_types;
mod group;
mod parser;
mod scanner;
mod spec;
mod tagstream;

pub use errors::{ErrorDetails, ErrorKind, SetupError};
pub use field_types::{FixVersion, TzTimestamp, UtcTimestamp};
pub use group::Group;
pub use parser::{ParseResult, Parser};
pub use spec::{GroupSpec, MessageSpec, SpecTable, TagInfo};

/// FIX field separator, byte `0x01`.
pub const SOH: u8 = 0x01;

/// Upper bound on the declared body length of a single message.
pub const MAX_MESSAGE_LENGTH: u32 = 100_000;

/// Upper bound on the declared node count of a repeating group.
pub const MAX_GROUP_SIZE: u32 = 1_000;

// Every message must carry at least MsgType(35), SenderCompID(49),
// TargetCompID(56) and MsgSeqNum(34), e.g. "35=0|49=X|56=Y|34=1|".
pub(crate) const MIN_BODY_LENGTH: u32 = 20;

pub(crate) const INITIAL_BODY_SIZE: usize = 200;
pub(crate) const INITIAL_ROOT_SLOTS: u32 = 20;
