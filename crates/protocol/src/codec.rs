//! Codec for NUL-terminated text messages.
//!
//! Message boundaries are found by scanning for the terminator, so a message
//! split across reads, or several messages in one read, decode correctly.
//! Bytes that are not UTF-8 decode to U+FFFD and are left for the command
//! parser to reject; only an oversized message loses framing.

use std::io;

use bytes::{BufMut, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// Message terminator.
pub const TERMINATOR: u8 = 0;

/// Default maximum message length in bytes (terminator excluded).
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 4096;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("message exceeds {max} bytes")]
    MessageTooLong { max: usize },

    #[error("message contains an embedded terminator")]
    EmbeddedTerminator,

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct MessageCodec {
    max_length: usize,
    next_index: usize,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_MESSAGE_LEN)
    }

    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
        }
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MessageCodec {
    type Item = String;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        let read_to = src.len().min(self.max_length.saturating_add(1));

        let offset = src[self.next_index..read_to]
            .iter()
            .position(|b| *b == TERMINATOR);

        match offset {
            Some(offset) => {
                let end = self.next_index + offset;
                self.next_index = 0;

                let mut message = src.split_to(end + 1);
                message.truncate(end);

                Ok(Some(String::from_utf8_lossy(&message).into_owned()))
            }
            None if src.len() > self.max_length => Err(CodecError::MessageTooLong {
                max: self.max_length,
            }),
            None => {
                self.next_index = read_to;
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        // A trailing unterminated fragment is dropped with the connection.
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None => {
                src.clear();
                self.next_index = 0;
                Ok(None)
            }
        }
    }
}

impl<T: AsRef<str>> Encoder<T> for MessageCodec {
    type Error = CodecError;

    fn encode(&mut self, message: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let message = message.as_ref().as_bytes();
        if message.contains(&TERMINATOR) {
            return Err(CodecError::EmbeddedTerminator);
        }
        dst.reserve(message.len() + 1);
        dst.put_slice(message);
        dst.put_u8(TERMINATOR);
        Ok(())
    }
}
