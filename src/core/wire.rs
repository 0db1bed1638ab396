//! Wire codec: byte-stream framing and argument marshalling.
//!
//! A frame is `object_id: u32 | size: u16 | opcode: u16` (all little-endian)
//! followed by `size - 8` payload bytes. File descriptors never appear in the
//! byte stream; they ride out of band on the socket and are claimed by
//! handlers in arrival order.

use std::os::fd::OwnedFd;

use crate::core::errors::CoreError;
use crate::core::objects::ObjectId;

/// Fixed frame header length in bytes.
pub const HEADER_LEN: usize = 8;

/// A decoded incoming request frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub object_id: ObjectId,
    pub opcode: u16,
    pub data: Vec<u8>,
}

/// An event queued for transmission to the client.
#[derive(Debug)]
pub struct OutgoingEvent {
    pub object_id: ObjectId,
    pub opcode: u16,
    pub data: Vec<u8>,
    pub fd: Option<OwnedFd>,
}

impl OutgoingEvent {
    pub fn new(object_id: ObjectId, opcode: u16, data: Vec<u8>) -> Self {
        Self {
            object_id,
            opcode,
            data,
            fd: None,
        }
    }

    pub fn with_fd(object_id: ObjectId, opcode: u16, data: Vec<u8>, fd: OwnedFd) -> Self {
        Self {
            object_id,
            opcode,
            data,
            fd: Some(fd),
        }
    }
}

/// Encode one event into its wire representation.
pub fn encode_event(ev: &OutgoingEvent) -> Vec<u8> {
    let size = HEADER_LEN + ev.data.len();
    let mut buf = Vec::with_capacity(size);
    buf.extend_from_slice(&ev.object_id.raw().to_le_bytes());
    buf.extend_from_slice(&(size as u16).to_le_bytes());
    buf.extend_from_slice(&ev.opcode.to_le_bytes());
    buf.extend_from_slice(&ev.data);
    buf
}

/// Incremental frame decoder. Retains partial input between reads.
#[derive(Debug, Default)]
pub struct MessageDecoder {
    buf: Vec<u8>,
}

impl MessageDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `input` and return every complete frame now available.
    ///
    /// A declared size below the header length is a fatal framing error:
    /// all buffered bytes are discarded and the connection must be torn
    /// down by the caller.
    pub fn consume(&mut self, input: &[u8]) -> Result<Vec<Message>, CoreError> {
        self.buf.extend_from_slice(input);

        let mut out = Vec::new();
        loop {
            if self.buf.len() < HEADER_LEN {
                break;
            }
            let object_id = u32::from_le_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]);
            let size = u16::from_le_bytes([self.buf[4], self.buf[5]]) as usize;
            let opcode = u16::from_le_bytes([self.buf[6], self.buf[7]]);

            if size < HEADER_LEN {
                self.buf.clear();
                return Err(CoreError::framing(format!(
                    "frame size {} below header length",
                    size
                )));
            }
            if self.buf.len() < size {
                break;
            }

            out.push(Message {
                object_id: ObjectId::new(object_id),
                opcode,
                data: self.buf[HEADER_LEN..size].to_vec(),
            });
            self.buf.drain(..size);
        }
        Ok(out)
    }
}

/// Cursor over a request payload using the protocol's argument grammar.
///
/// Malformed payloads read as zero/empty rather than faulting; a client that
/// sends a short payload gets defaulted arguments, which the handlers treat
/// as any other protocol misuse.
pub struct ArgReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ArgReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn u32(&mut self) -> u32 {
        if self.pos + 4 > self.data.len() {
            self.pos = self.data.len();
            return 0;
        }
        let v = u32::from_le_bytes([
            self.data[self.pos],
            self.data[self.pos + 1],
            self.data[self.pos + 2],
            self.data[self.pos + 3],
        ]);
        self.pos += 4;
        v
    }

    pub fn i32(&mut self) -> i32 {
        self.u32() as i32
    }

    /// 24.8 signed fixed-point.
    pub fn fixed(&mut self) -> f64 {
        self.i32() as f64 / 256.0
    }

    pub fn object(&mut self) -> Option<ObjectId> {
        match self.u32() {
            0 => None,
            raw => Some(ObjectId::new(raw)),
        }
    }

    pub fn new_id(&mut self) -> ObjectId {
        ObjectId::new(self.u32())
    }

    /// Length-prefixed, NUL-terminated, 4-byte-padded string.
    pub fn string(&mut self) -> String {
        let len = self.u32() as usize;
        if len == 0 || self.pos + len > self.data.len() {
            self.pos = self.data.len().min(self.pos + pad4(len));
            return String::new();
        }
        let raw = &self.data[self.pos..self.pos + len - 1]; // drop the NUL
        self.pos += pad4(len);
        String::from_utf8_lossy(raw).into_owned()
    }

    /// Length-prefixed, 4-byte-padded byte array.
    pub fn array(&mut self) -> Vec<u8> {
        let len = self.u32() as usize;
        if self.pos + len > self.data.len() {
            self.pos = self.data.len();
            return Vec::new();
        }
        let raw = self.data[self.pos..self.pos + len].to_vec();
        self.pos += pad4(len);
        raw
    }
}

/// Builder for event payloads, inverse of [`ArgReader`].
#[derive(Default)]
pub struct ArgWriter {
    data: Vec<u8>,
}

impl ArgWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.data.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i32(self, v: i32) -> Self {
        self.u32(v as u32)
    }

    pub fn fixed(self, v: f64) -> Self {
        self.i32((v * 256.0) as i32)
    }

    pub fn object(self, id: Option<ObjectId>) -> Self {
        self.u32(id.map(ObjectId::raw).unwrap_or(0))
    }

    pub fn id(self, id: ObjectId) -> Self {
        self.u32(id.raw())
    }

    pub fn string(mut self, s: &str) -> Self {
        let len = s.len() + 1; // including NUL
        self.data.extend_from_slice(&(len as u32).to_le_bytes());
        self.data.extend_from_slice(s.as_bytes());
        self.data.push(0);
        for _ in len..pad4(len) {
            self.data.push(0);
        }
        self
    }

    pub fn array(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        self.data.extend_from_slice(bytes);
        for _ in bytes.len()..pad4(bytes.len()) {
            self.data.push(0);
        }
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

fn pad4(len: usize) -> usize {
    (len + 3) & !3
}
