//! The parser: session construction, message iteration and results.

use std::cell::Cell;

use smallvec::SmallVec;

use crate::errors::{EMPTY_SPAN, ErrorDetails, ErrorKind, ErrorState, SetupError, Span};
use crate::group::{EMPTY_ROOT_SPEC, Group, GroupNode};
use crate::scanner::{Scan, Scanner};
use crate::spec::SpecTable;
use crate::{INITIAL_BODY_SIZE, SOH, decoder};

/// The outcome of framing and decoding one message.
///
/// Owns the raw message bytes and the decoded group tree. Field values and
/// group handles obtained from it are borrows; they are invalidated by the
/// next [`Parser::first_message`] / [`Parser::next_message`] call.
#[derive(Debug)]
pub struct ParseResult {
    pub(crate) error: Cell<ErrorState>,
    pub(crate) msg_type_code: i32,
    pub(crate) body: Vec<u8>,
    pub(crate) body_len: usize,
    pub(crate) frame: Span,
    pub(crate) groups: Vec<GroupNode>,
}

impl ParseResult {
    pub(crate) fn new() -> Self {
        Self {
            error: Cell::new(ErrorState::clear()),
            msg_type_code: -1,
            body: Vec::with_capacity(INITIAL_BODY_SIZE),
            body_len: 0,
            frame: EMPTY_SPAN,
            groups: vec![GroupNode::new(&EMPTY_ROOT_SPEC, 1)],
        }
    }

    pub(crate) fn bytes(&self, span: Span) -> &[u8] {
        self.body
            .get(span.0 as usize..span.1 as usize)
            .unwrap_or(&[])
    }

    /// The error recorded for this message, or `None` when it parsed clean.
    pub fn error(&self) -> Option<ErrorDetails<'_>> {
        let e = self.error.get();
        Some(ErrorDetails {
            code: e.code?,
            tag: e.tag,
            context: self.bytes(e.context),
            msg_type: self.bytes(e.msg_type),
        })
    }

    /// The `MsgType (35)` value of this message; empty before one was read.
    pub fn msg_type(&self) -> &[u8] {
        self.bytes(self.error.get().msg_type)
    }

    /// The table-assigned code of the message type, or `-1`.
    pub fn msg_type_code(&self) -> i32 {
        self.msg_type_code
    }

    /// The top-level group of the message.
    pub fn root(&self) -> Group<'_> {
        Group::new(self, 0)
    }

    /// The raw message including the envelope, exactly as it came off the
    /// wire.
    pub fn raw_message(&self) -> &[u8] {
        &self.body[..self.body_len.min(self.body.len())]
    }
}

/// A FIX parsing session over one byte stream.
///
/// Created once with a dialect table and a begin string, then fed input
/// ranges. One parser serves exactly one stream; messages come out in wire
/// order.
#[derive(Debug)]
pub struct Parser {
    table: SpecTable,
    // Precomputed "8=<ver>\x019=" prefix every message must start with.
    header: SmallVec<[u8; 16]>,
    input: Vec<u8>,
    input_pos: usize,
    scanner: Scanner,
    result: ParseResult,
}

impl Parser {
    /// Creates a parser for the given dialect table and begin string
    /// (e.g. `b"FIX.4.4"` or `b"FIXT.1.1"`).
    pub fn new(table: SpecTable, begin_string: &[u8]) -> Result<Self, SetupError> {
        if !(7..=8).contains(&begin_string.len()) {
            return Err(SetupError::BeginStringLength(begin_string.len()));
        }
        if !begin_string.starts_with(b"FIX.") && !begin_string.starts_with(b"FIXT.") {
            return Err(SetupError::BeginStringPrefix);
        }
        let mut header = SmallVec::new();
        header.extend_from_slice(b"8=");
        header.extend_from_slice(begin_string);
        header.push(SOH);
        header.extend_from_slice(b"9=");
        Ok(Self {
            table,
            header,
            input: Vec::new(),
            input_pos: 0,
            scanner: Scanner::new(),
            result: ParseResult::new(),
        })
    }

    fn is_usable(&self) -> bool {
        !self.result.error.get().is_fatal()
    }

    /// Starts parsing a new input range. The previous range must have been
    /// fully consumed, else the parser fails fatally. Returns `None` when
    /// more input is needed for a complete message, or after a fatal error.
    pub fn first_message(&mut self, bytes: &[u8]) -> Option<&ParseResult> {
        if !self.is_usable() {
            return None;
        }
        if self.input_pos < self.input.len() {
            self.set_fatal(ErrorKind::InvalidParserState);
            return None;
        }
        self.input.clear();
        self.input.extend_from_slice(bytes);
        self.input_pos = 0;
        self.run()
    }

    /// Frames and decodes the next message from the residual input.
    /// Returns `None` when the input is exhausted or after a fatal error.
    pub fn next_message(&mut self) -> Option<&ParseResult> {
        if !self.is_usable() {
            return None;
        }
        self.run()
    }

    fn run(&mut self) -> Option<&ParseResult> {
        match self.scanner.extract(
            &self.header,
            &self.input,
            &mut self.input_pos,
            &mut self.result,
        ) {
            Scan::NeedMore => None,
            Scan::Failed => {
                log::debug!("framing failed: {:?}", self.result.error.get().code);
                None
            }
            Scan::Ready => {
                log::trace!("framed a {} byte message", self.result.body_len);
                let envelope = self.result.error.get();
                decoder::decode(self.table, &mut self.result);
                let after = self.result.error.get();
                if after.is_fatal() {
                    return None;
                }
                if envelope.code.is_some() {
                    // The envelope verdict (checksum mismatch) outranks any
                    // field-level finding inside the suspect body.
                    self.result.error.set(ErrorState {
                        msg_type: after.msg_type,
                        ..envelope
                    });
                }
                Some(&self.result)
            }
        }
    }

    fn set_fatal(&mut self, code: ErrorKind) {
        self.result.error.set(ErrorState {
            code: Some(code),
            tag: 0,
            context: EMPTY_SPAN,
            msg_type: EMPTY_SPAN,
        });
    }

    /// The raw bytes of the last framed message, envelope included. Empty
    /// before the first message and after a fatal error.
    pub fn raw_message(&self) -> &[u8] {
        if self.is_usable() {
            self.result.raw_message()
        } else {
            &[]
        }
    }

    /// The current error, shared with the last returned result.
    pub fn error(&self) -> Option<ErrorDetails<'_>> {
        self.result.error()
    }

    /// Resolves a message-type string to its table-assigned code, `-1` when
    /// the table does not know it.
    pub fn msg_type_to_code(&self, msg_type: &[u8]) -> i32 {
        (self.table)(msg_type).map_or(-1, |m| m.msg_type_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_messages(_: &[u8]) -> Option<&'static crate::MessageSpec> {
        None
    }

    #[test]
    fn begin_string_must_be_well_formed() {
        assert!(Parser::new(no_messages, b"FIX.4.4").is_ok());
        assert!(Parser::new(no_messages, b"FIXT.1.1").is_ok());
        assert_eq!(
            Parser::new(no_messages, b"FIX.4").err(),
            Some(SetupError::BeginStringLength(5))
        );
        assert_eq!(
            Parser::new(no_messages, b"FIX.4.4.4").err(),
            Some(SetupError::BeginStringLength(9))
        );
        assert_eq!(
            Parser::new(no_messages, b"GIX.4.4x").err(),
            Some(SetupError::BeginStringPrefix)
        );
    }

    #[test]
    fn unknown_message_type_is_recoverable() {
        let mut parser = Parser::new(no_messages, b"FIX.4.4").expect("valid begin string");
        let body = b"35=q\x0149=X\x0156=Y\x0134=1\x01";
        let mut msg = format!("8=FIX.4.4\x019={}\x01", body.len()).into_bytes();
        msg.extend_from_slice(body);
        let sum: u8 = msg.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        msg.extend_from_slice(format!("10={sum:03}\x01").as_bytes());

        let result = parser.first_message(&msg).expect("recoverable result");
        let error = result.error().expect("error recorded");
        assert_eq!(error.code, ErrorKind::InvalidMessageType);
        assert_eq!(error.tag, 35);
        assert_eq!(error.context, b"q");
        assert_eq!(result.msg_type(), b"q");
        assert_eq!(result.msg_type_code(), -1);
        // The next call resumes at a fresh message boundary.
        assert!(parser.next_message().is_none());
        assert!(parser.first_message(&msg).is_some());
    }
}
