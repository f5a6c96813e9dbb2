//! Frame writer and reader cursors.
//!
//! All multi-byte fields are big-endian. Strings are a u16 big-endian byte
//! length followed by UTF-8 bytes, matching the client mod's data-stream
//! framing. The writer is append-only; the reader is a bounds-checked cursor
//! that fails with [`CodecError::UnexpectedEof`] rather than reading past the
//! buffer.

use crate::error::CodecError;
use crate::message::MessageType;

/// Append-only frame builder. The message-type header is written on
/// construction; payload fields follow in the fixed order declared for that
/// type.
#[derive(Debug)]
pub struct FrameWriter {
    buf: Vec<u8>,
}

impl FrameWriter {
    /// Starts a frame for the given message type.
    pub fn new(message_type: MessageType) -> Self {
        let mut buf = Vec::with_capacity(32);
        buf.extend_from_slice(&message_type.header().to_be_bytes());
        Self { buf }
    }

    pub fn write_bool(&mut self, v: bool) -> &mut Self {
        self.buf.push(u8::from(v));
        self
    }

    pub fn write_i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn write_i64(&mut self, v: i64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn write_f32(&mut self, v: f32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn write_f64(&mut self, v: f64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Writes a u16-length-prefixed UTF-8 string.
    pub fn write_utf(&mut self, v: &str) -> Result<&mut Self, CodecError> {
        let bytes = v.as_bytes();
        if bytes.len() > u16::MAX as usize {
            return Err(CodecError::StringTooLong {
                len: bytes.len(),
                max: u16::MAX as usize,
            });
        }
        self.buf.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        self.buf.extend_from_slice(bytes);
        Ok(self)
    }

    /// Finishes the frame and returns the raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Bounds-checked read cursor over a received frame.
#[derive(Debug)]
pub struct FrameReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    /// Wraps a raw byte buffer. The header has not been consumed yet; most
    /// callers want [`FrameReader::read_header`] first.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Reads and validates the leading message-type header.
    pub fn read_header(&mut self) -> Result<MessageType, CodecError> {
        MessageType::try_from(self.read_i32()?)
    }

    /// Number of unread bytes remaining.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::UnexpectedEof {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        Ok(self.take(1)?[0] != 0)
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        let bytes = self.take(4)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        let bytes = self.take(8)?;
        Ok(i64::from_be_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    pub fn read_f32(&mut self) -> Result<f32, CodecError> {
        let bytes = self.take(4)?;
        Ok(f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_f64(&mut self) -> Result<f64, CodecError> {
        let bytes = self.take(8)?;
        Ok(f64::from_be_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Reads a u16-length-prefixed UTF-8 string.
    pub fn read_utf(&mut self) -> Result<String, CodecError> {
        let len = u16::from_be_bytes({
            let b = self.take(2)?;
            [b[0], b[1]]
        }) as usize;
        let start = self.pos;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8 { offset: start })
    }
}
