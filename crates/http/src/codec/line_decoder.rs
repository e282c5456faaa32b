//! CRLF line framing.
//!
//! [`LineDecoder`] is a [`Decoder`] that splits the read buffer on `\r\n`
//! and yields each line without its delimiter. A bare `\n` is part of the
//! line, not a terminator. Lines longer than the configured limit fail with
//! [`ParseError::TooLongLine`] as soon as the limit is crossed, even if the
//! terminator never arrives.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::ParseError;

/// Default maximum size of one line, delimiter excluded.
pub const MAX_LINE_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone)]
pub struct LineDecoder {
    /// Where the next scan for `\n` starts, so partial reads are not rescanned.
    next_index: usize,
    max_length: usize,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_BYTES)
    }

    pub fn with_max_length(max_length: usize) -> Self {
        Self { next_index: 0, max_length }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineDecoder {
    type Item = Bytes;
    type Error = ParseError;

    /// # Returns
    ///
    /// - `Ok(Some(line))`: a complete line, `\r\n` stripped; empty for the blank line
    /// - `Ok(None)`: no complete line buffered yet
    /// - `Err(_)`: the current line outgrew the limit
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                self.next_index = src.len();
                // one byte of slack for a trailing '\r' waiting on its '\n'
                ensure!(src.len() <= self.max_length + 1, ParseError::too_long_line(src.len(), self.max_length));
                return Ok(None);
            };

            let newline = self.next_index + offset;
            if newline > 0 && src[newline - 1] == b'\r' {
                self.next_index = 0;
                let line_length = newline - 1;
                ensure!(line_length <= self.max_length, ParseError::too_long_line(line_length, self.max_length));

                let mut line = src.split_to(newline + 1);
                line.truncate(line_length);
                trace!(line_length, "decoded line");
                return Ok(Some(line.freeze()));
            }

            self.next_index = newline + 1;
        }
    }

    /// End of stream: hand out any complete line still buffered, then stop.
    /// A trailing fragment without `\r\n` is dropped rather than reported.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None => {
                if !src.is_empty() {
                    trace!(dropped = src.len(), "discarding unterminated line at end of stream");
                    src.clear();
                }
                self.next_index = 0;
                Ok(None)
            }
        }
    }
}
