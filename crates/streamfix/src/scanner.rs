//! Frame extraction: reassembles one complete raw FIX message from
//! arbitrarily chunked input.
//!
//! The scanner is a resumable state machine. Whenever the current input
//! window runs dry it parks its state and returns [`Scan::NeedMore`]; the
//! next call picks up exactly where it left off. Every consumed byte is
//! copied into the message buffer, so the raw message survives across
//! chunks, and the trailer checksum is accumulated on the fly during the
//! copy.

use crate::errors::{EMPTY_SPAN, ErrorKind, ErrorState};
use crate::parser::ParseResult;
use crate::{MAX_MESSAGE_LENGTH, MIN_BODY_LENGTH, SOH};

/// Resumption points of the framing state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Waiting for the first byte of a new message.
    Start,
    /// Copying the `8=<ver>\x019=` prefix; `counter` bytes remain.
    Header,
    /// Expecting the first body-length digit (1-9).
    LengthFirst,
    /// Accumulating body-length digits up to the terminating SOH.
    LengthNext,
    /// Copying the message body; `counter` bytes remain.
    Body,
    /// Expecting `'1'` of the `10=` trailer literal.
    TrailerTag1,
    /// Expecting `'0'` of the trailer literal.
    TrailerTag0,
    /// Expecting `'='` of the trailer literal.
    TrailerEq,
    /// Expecting the hundreds checksum digit (0-2).
    ChecksumHundreds,
    /// Expecting the tens checksum digit.
    ChecksumTens,
    /// Expecting the units checksum digit.
    ChecksumUnits,
    /// Expecting the final SOH.
    FinalSoh,
}

/// Outcome of one [`Scanner::extract`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scan {
    /// A complete message is framed in the buffer.
    Ready,
    /// The input window is exhausted mid-message; feed more bytes.
    NeedMore,
    /// The envelope is broken; a fatal error has been recorded.
    Failed,
}

#[derive(Debug)]
pub(crate) struct Scanner {
    state: ScanState,
    counter: u32,
    checksum: u8,
    // Start of the error context for the current state, as an index into
    // the message buffer.
    ctx_begin: u32,
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::Start,
            counter: 0,
            checksum: 0,
            ctx_begin: 0,
        }
    }

    /// Drives the state machine over `input[*pos..]`, writing the raw
    /// message into `out.body`.
    pub fn extract(
        &mut self,
        header: &[u8],
        input: &[u8],
        pos: &mut usize,
        out: &mut ParseResult,
    ) -> Scan {
        loop {
            match self.state {
                ScanState::Start => {
                    if *pos >= input.len() {
                        return Scan::NeedMore;
                    }
                    out.body.clear();
                    out.body_len = 0;
                    out.frame = EMPTY_SPAN;
                    out.msg_type_code = -1;
                    out.error.set(ErrorState::clear());
                    self.checksum = 0;
                    self.counter = header.len() as u32;
                    self.ctx_begin = 0;
                    self.state = ScanState::Header;
                }
                ScanState::Header => {
                    if !self.copy_counted(input, pos, out) {
                        return Scan::NeedMore;
                    }
                    if out.body[..] != *header {
                        return self.fail(out, ErrorKind::InvalidBeginString, 8);
                    }
                    self.ctx_begin = out.body.len() as u32;
                    self.state = ScanState::LengthFirst;
                }
                ScanState::LengthFirst => {
                    let Some(b) = take(input, pos) else {
                        return Scan::NeedMore;
                    };
                    out.body.push(b);
                    self.checksum = self.checksum.wrapping_add(b);
                    match b {
                        b'1'..=b'9' => {
                            self.counter = u32::from(b - b'0');
                            self.state = ScanState::LengthNext;
                        }
                        _ => return self.fail(out, ErrorKind::InvalidMessageLength, 9),
                    }
                }
                ScanState::LengthNext => loop {
                    let Some(b) = take(input, pos) else {
                        return Scan::NeedMore;
                    };
                    out.body.push(b);
                    self.checksum = self.checksum.wrapping_add(b);
                    match b {
                        b'0'..=b'9' => {
                            self.counter = self.counter * 10 + u32::from(b - b'0');
                            if self.counter > MAX_MESSAGE_LENGTH {
                                return self.fail(out, ErrorKind::InvalidMessageLength, 9);
                            }
                        }
                        SOH => {
                            if self.counter < MIN_BODY_LENGTH {
                                return self.fail(out, ErrorKind::InvalidMessageLength, 9);
                            }
                            // Remember the length field for later error
                            // reporting, then make room for body + trailer.
                            let mut e = out.error.get();
                            e.context = (self.ctx_begin, out.body.len() as u32);
                            out.error.set(e);
                            out.body.reserve(self.counter as usize + 7);
                            out.frame.0 = out.body.len() as u32;
                            self.state = ScanState::Body;
                            break;
                        }
                        _ => return self.fail(out, ErrorKind::InvalidMessageLength, 9),
                    }
                },
                ScanState::Body => {
                    if !self.copy_counted(input, pos, out) {
                        return Scan::NeedMore;
                    }
                    if out.body.last() != Some(&SOH) {
                        // Body does not end where the declared length says
                        // it should. The length-field context recorded
                        // above stays in place.
                        out.body_len = out.body.len();
                        let mut e = out.error.get();
                        e.code = Some(ErrorKind::InvalidMessageLength);
                        e.tag = 9;
                        out.error.set(e);
                        return Scan::Failed;
                    }
                    out.frame.1 = out.body.len() as u32;
                    self.ctx_begin = out.body.len() as u32;
                    self.state = ScanState::TrailerTag1;
                }
                ScanState::TrailerTag1 => {
                    let Some(b) = take(input, pos) else {
                        return Scan::NeedMore;
                    };
                    out.body.push(b);
                    if b != b'1' {
                        return self.fail(out, ErrorKind::InvalidTrailer, 10);
                    }
                    self.state = ScanState::TrailerTag0;
                }
                ScanState::TrailerTag0 => {
                    let Some(b) = take(input, pos) else {
                        return Scan::NeedMore;
                    };
                    out.body.push(b);
                    if b != b'0' {
                        return self.fail(out, ErrorKind::InvalidTrailer, 10);
                    }
                    self.state = ScanState::TrailerEq;
                }
                ScanState::TrailerEq => {
                    let Some(b) = take(input, pos) else {
                        return Scan::NeedMore;
                    };
                    out.body.push(b);
                    if b != b'=' {
                        return self.fail(out, ErrorKind::InvalidTrailer, 10);
                    }
                    self.state = ScanState::ChecksumHundreds;
                }
                ScanState::ChecksumHundreds => {
                    let Some(b) = take(input, pos) else {
                        return Scan::NeedMore;
                    };
                    out.body.push(b);
                    match b {
                        b'0'..=b'2' => {
                            self.counter = u32::from(b - b'0') * 100;
                            self.state = ScanState::ChecksumTens;
                        }
                        _ => return self.fail(out, ErrorKind::InvalidTrailer, 10),
                    }
                }
                ScanState::ChecksumTens => {
                    let Some(b) = take(input, pos) else {
                        return Scan::NeedMore;
                    };
                    out.body.push(b);
                    match b {
                        b'0'..=b'9' => {
                            self.counter += u32::from(b - b'0') * 10;
                            self.state = ScanState::ChecksumUnits;
                        }
                        _ => return self.fail(out, ErrorKind::InvalidTrailer, 10),
                    }
                }
                ScanState::ChecksumUnits => {
                    let Some(b) = take(input, pos) else {
                        return Scan::NeedMore;
                    };
                    out.body.push(b);
                    match b {
                        b'0'..=b'9' => {
                            self.counter += u32::from(b - b'0');
                            self.state = ScanState::FinalSoh;
                        }
                        _ => return self.fail(out, ErrorKind::InvalidTrailer, 10),
                    }
                }
                ScanState::FinalSoh => {
                    let Some(b) = take(input, pos) else {
                        return Scan::NeedMore;
                    };
                    out.body.push(b);
                    if b != SOH {
                        return self.fail(out, ErrorKind::InvalidTrailer, 10);
                    }
                    out.body_len = out.body.len();
                    let mut e = out.error.get();
                    if self.counter == u32::from(self.checksum) {
                        e.code = None;
                        e.tag = 0;
                        e.context = EMPTY_SPAN;
                    } else {
                        // Checksum mismatch is recoverable: the message is
                        // framed, only the trailer disagrees with the sum.
                        e.code = Some(ErrorKind::InvalidValue);
                        e.tag = 10;
                        e.context = (self.ctx_begin, out.body.len() as u32 - 1);
                    }
                    out.error.set(e);
                    self.state = ScanState::Start;
                    return Scan::Ready;
                }
            }
        }
    }

    /// Copies `counter` bytes into the buffer, checksumming each. Returns
    /// `false` when the input window ran dry first.
    fn copy_counted(&mut self, input: &[u8], pos: &mut usize, out: &mut ParseResult) -> bool {
        while self.counter > 0 {
            let avail = input.len() - *pos;
            if avail == 0 {
                return false;
            }
            let n = (self.counter as usize).min(avail);
            let chunk = &input[*pos..*pos + n];
            out.body.extend_from_slice(chunk);
            for &b in chunk {
                self.checksum = self.checksum.wrapping_add(b);
            }
            *pos += n;
            self.counter -= n as u32;
        }
        true
    }

    fn fail(&mut self, out: &mut ParseResult, code: ErrorKind, tag: u32) -> Scan {
        out.body_len = out.body.len();
        let mut e = out.error.get();
        e.code = Some(code);
        e.tag = tag;
        e.context = (self.ctx_begin, out.body.len() as u32);
        out.error.set(e);
        Scan::Failed
    }
}

fn take(input: &[u8], pos: &mut usize) -> Option<u8> {
    let b = *input.get(*pos)?;
    *pos += 1;
    Some(b)
}
