//! Line framing for stream transports.
//!
//! [`LineBuffer`] accumulates arbitrary byte chunks and hands out complete
//! protocol lines as parsed [`Message`]s.

use bytes::{Buf, BytesMut};

use crate::Message;

/// Longest unterminated line a transport will buffer: the 8191-byte IRCv3
/// tag section plus a 512-byte message.
pub const MAX_LINE_LEN: usize = 8191 + 512;

/// Growing buffer that turns a byte stream into messages.
///
/// Bytes are only consumed once a full line (terminated by `\n`) is present,
/// so partial feeds never lose data. Callers must drain with
/// [`try_read`](Self::try_read) until it returns `None` after every feed, as
/// a single chunk may carry several lines.
///
/// The buffer itself never refuses data. Transports check
/// [`is_overlong`](Self::is_overlong) after a `None` and fail the read.
#[derive(Debug)]
pub struct LineBuffer {
    buffer: BytesMut,
    /// Bytes at the front of `buffer` already known to hold no `\n`.
    scanned: usize,
    max_line_len: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuffer {
    /// Create an empty buffer with the [`MAX_LINE_LEN`] limit.
    pub fn new() -> Self {
        Self::with_max_line_len(MAX_LINE_LEN)
    }

    /// Create an empty buffer with a custom line limit.
    pub fn with_max_line_len(max_line_len: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
            scanned: 0,
            max_line_len,
        }
    }

    /// Append a chunk read from the network.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Take the next complete line, if any, and parse it.
    ///
    /// One trailing `\r` is stripped. Invalid UTF-8 is replaced rather than
    /// rejected.
    pub fn try_read(&mut self) -> Option<Message> {
        let Some(offset) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') else {
            self.scanned = self.buffer.len();
            return None;
        };
        let newline = self.scanned + offset;
        self.scanned = 0;
        let line = self.buffer.split_to(newline + 1);

        let mut end = newline;
        if end > 0 && line[end - 1] == b'\r' {
            end -= 1;
        }
        Some(Message::parse(&String::from_utf8_lossy(&line[..end])))
    }

    /// Returns true once the pending partial line is longer than the limit.
    ///
    /// Only meaningful after [`try_read`](Self::try_read) returned `None`.
    pub fn is_overlong(&self) -> bool {
        self.scanned > self.max_line_len
    }

    /// The line limit checked by [`is_overlong`](Self::is_overlong).
    pub fn max_line_len(&self) -> usize {
        self.max_line_len
    }

    /// Number of buffered bytes not yet returned as a line.
    pub fn len(&self) -> usize {
        self.buffer.remaining()
    }

    /// Returns true if no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
