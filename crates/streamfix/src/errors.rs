//! Error taxonomy and the shared per-message error slot.

use std::fmt;

use thiserror::Error;

/// The per-message error classification.
///
/// The first block maps one-to-one onto the session-level reject reasons of
/// the FIX Transport 1.1 specification; a message carrying one of these is
/// still returned to the caller and parsing continues with the next message.
/// The variants after [`ErrorKind::Other`] are fatal: the parser is
/// permanently unusable once one of them is recorded.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 0 = Invalid tag number
    #[error("Invalid tag number")]
    InvalidTag,
    /// 1 = Required tag missing
    #[error("Required tag missing")]
    RequiredTagMissing,
    /// 2 = Tag not defined for this message type
    #[error("Tag not defined for this message type")]
    UnexpectedTag,
    /// 3 = Undefined tag
    #[error("Undefined tag")]
    UndefinedTag,
    /// 4 = Tag specified without a value
    #[error("Tag specified without a value")]
    EmptyValue,
    /// 5 = Value is incorrect (out of range) for this tag
    #[error("Value is incorrect (out of range) for this tag")]
    InvalidValue,
    /// 6 = Incorrect data format for value
    #[error("Incorrect data format for value")]
    IncorrectValueFormat,
    /// 7 = Decryption problem
    #[error("Decryption problem")]
    DecryptionProblem,
    /// 8 = Signature problem
    #[error("Signature problem")]
    SignatureProblem,
    /// 9 = CompID problem
    #[error("CompID problem")]
    CompIdProblem,
    /// 10 = SendingTime accuracy problem
    #[error("SendingTime accuracy problem")]
    SendingTimeProblem,
    /// 11 = Invalid MsgType
    #[error("Invalid MsgType")]
    InvalidMessageType,
    /// 12 = XML validation error
    #[error("XML validation error")]
    InvalidXml,
    /// 13 = Tag appears more than once
    #[error("Tag appears more than once")]
    DuplicateTag,
    /// 14 = Tag specified out of required order
    #[error("Tag specified out of required order")]
    InvalidTagOrder,
    /// 15 = Repeating group fields out of order
    #[error("Repeating group fields out of order")]
    InvalidGroupOrder,
    /// 16 = Incorrect NumInGroup count for repeating group
    #[error("Incorrect NumInGroup count for repeating group")]
    InvalidGroupCount,
    /// 17 = Non-data value includes the field delimiter (SOH)
    #[error("Non-data value includes the field delimiter (SOH)")]
    UnexpectedSoh,
    /// 99 = Other
    #[error("Other error")]
    Other,

    /// The envelope did not start with the configured begin string.
    #[error("Invalid begin string")]
    InvalidBeginString,
    /// The `BodyLength (9)` field is malformed or does not match the body.
    #[error("Invalid message length")]
    InvalidMessageLength,
    /// The `CheckSum (10)` trailer is malformed.
    #[error("Invalid message trailer")]
    InvalidTrailer,
    /// The parser was driven while holding unconsumed input, or a message
    /// table returned inconsistent information.
    #[error("Invalid parser state")]
    InvalidParserState,
    /// Allocation failure.
    #[error("Out of memory")]
    OutOfMemory,
}

impl ErrorKind {
    /// Returns `true` when the error leaves the parser unusable.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            Self::InvalidBeginString
                | Self::InvalidMessageLength
                | Self::InvalidTrailer
                | Self::InvalidParserState
                | Self::OutOfMemory
        )
    }

    /// The `SessionRejectReason (373)` code for this error, when one exists.
    pub fn session_reject_code(self) -> Option<u32> {
        let code = match self {
            Self::InvalidTag => 0,
            Self::RequiredTagMissing => 1,
            Self::UnexpectedTag => 2,
            Self::UndefinedTag => 3,
            Self::EmptyValue => 4,
            Self::InvalidValue => 5,
            Self::IncorrectValueFormat => 6,
            Self::DecryptionProblem => 7,
            Self::SignatureProblem => 8,
            Self::CompIdProblem => 9,
            Self::SendingTimeProblem => 10,
            Self::InvalidMessageType => 11,
            Self::InvalidXml => 12,
            Self::DuplicateTag => 13,
            Self::InvalidTagOrder => 14,
            Self::InvalidGroupOrder => 15,
            Self::InvalidGroupCount => 16,
            Self::UnexpectedSoh => 17,
            Self::Other => 99,
            _ => return None,
        };
        Some(code)
    }
}

/// Errors reported by [`Parser::new`](crate::Parser::new).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// The begin string is not between 7 and 8 bytes long.
    #[error("begin string must be 7 or 8 bytes long, got {0}")]
    BeginStringLength(usize),
    /// The begin string does not start with `FIX.` or `FIXT.`.
    #[error("begin string must start with \"FIX.\" or \"FIXT.\"")]
    BeginStringPrefix,
}

/// Byte range into the message buffer. `(0, 0)` means "no bytes".
pub(crate) type Span = (u32, u32);

pub(crate) const EMPTY_SPAN: Span = (0, 0);

/// The shared error slot. One copy lives in every [`ParseResult`]
/// (wrapped in a `Cell`) and every group handle writes through it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ErrorState {
    pub code: Option<ErrorKind>,
    pub tag: u32,
    pub context: Span,
    pub msg_type: Span,
}

impl ErrorState {
    pub fn clear() -> Self {
        Self {
            code: None,
            tag: 0,
            context: EMPTY_SPAN,
            msg_type: EMPTY_SPAN,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.code.is_some_and(ErrorKind::is_fatal)
    }
}

/// A resolved view of the error slot, borrowing context bytes from the
/// message buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorDetails<'a> {
    /// The error classification.
    pub code: ErrorKind,
    /// The offending tag, or the tag the error is attributed to (8, 9 or 10
    /// for envelope errors). Zero when no tag applies.
    pub tag: u32,
    /// The offending bytes inside the raw message, when applicable.
    pub context: &'a [u8],
    /// The `MsgType (35)` value of the message being parsed, when known.
    pub msg_type: &'a [u8],
}

impl fmt::Display for ErrorDetails<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            ErrorKind::InvalidParserState | ErrorKind::OutOfMemory => {
                write!(f, "fatal error: {}", self.code)
            }
            ErrorKind::InvalidBeginString
            | ErrorKind::InvalidMessageLength
            | ErrorKind::InvalidTrailer => write!(
                f,
                "fatal error: {} [tag = {}, context = \"{}\"]",
                self.code,
                self.tag,
                String::from_utf8_lossy(self.context),
            ),
            _ => write!(
                f,
                "error: {} [tag = {}, msg type = \"{}\", context = \"{}\"]",
                self.code,
                self.tag,
                String::from_utf8_lossy(self.msg_type),
                String::from_utf8_lossy(self.context),
            ),
        }
    }
}
