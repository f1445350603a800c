//! Outbound line framing.
//!
//! Every line written to the server passes through [`MessageFramer::frame`]:
//!
//! ```text
//! [UTF-8 text without CR/LF] [\r\n]   total <= byte ceiling
//! ```
//!
//! A CR or LF inside the text would end the line early and let the rest be
//! read as a second protocol command, so such text is refused outright.

use crate::constants::{LINE_TERMINATOR, MESSAGE_BYTE_LIMIT};

/// Errors produced while framing an outbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// Text contains a carriage return or line feed.
    InvalidCharacters,
    /// Encoded frame exceeds the byte ceiling.
    MessageTooLong {
        /// Encoded length including the terminator.
        length: usize,
        /// Byte ceiling in force.
        limit: usize,
    },
}

impl std::fmt::Display for FramingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCharacters => write!(f, "Messages must not contain newline characters"),
            Self::MessageTooLong { length, limit } => write!(
                f,
                "Messages must not exceed {limit} bytes in length, including the appended CRLF (got {length})"
            ),
        }
    }
}

impl std::error::Error for FramingError {}

/// A transport-ready line: UTF-8 text followed by CRLF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFrame {
    bytes: Vec<u8>,
}

impl OutboundFrame {
    /// Encoded bytes, terminator included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The framed text without its terminator.
    pub fn text(&self) -> &str {
        // Built from a &str plus an ASCII terminator.
        let body = &self.bytes[..self.bytes.len() - LINE_TERMINATOR.len()];
        std::str::from_utf8(body).unwrap_or_default()
    }

    /// Consume the frame and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Validates and encodes outbound text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageFramer {
    byte_ceiling: usize,
}

impl Default for MessageFramer {
    fn default() -> Self {
        Self::new(MESSAGE_BYTE_LIMIT)
    }
}

impl MessageFramer {
    /// Framer enforcing `byte_ceiling` bytes per line, CRLF included.
    pub fn new(byte_ceiling: usize) -> Self {
        Self { byte_ceiling }
    }

    /// The byte ceiling in force.
    pub fn byte_ceiling(&self) -> usize {
        self.byte_ceiling
    }

    /// Frame `text` for sending.
    ///
    /// The newline check runs before the length check.
    pub fn frame(&self, text: &str) -> Result<OutboundFrame, FramingError> {
        if text.contains(['\r', '\n']) {
            return Err(FramingError::InvalidCharacters);
        }

        let length = text.len() + LINE_TERMINATOR.len();
        if length > self.byte_ceiling {
            return Err(FramingError::MessageTooLong {
                length,
                limit: self.byte_ceiling,
            });
        }

        let mut bytes = Vec::with_capacity(length);
        bytes.extend_from_slice(text.as_bytes());
        bytes.extend_from_slice(LINE_TERMINATOR.as_bytes());
        Ok(OutboundFrame { bytes })
    }
}
