//! In-memory byte stream.
//!
//! Useful for unit tests and for embedders that receive input in chunks
//! (lines from stdin, packets from a socket) and want to feed them to the
//! interpreter. Received bytes queue in a `VecDeque`; written bytes collect
//! in a separate `Vec`, so one `MemoryStream` can serve as both the input
//! and the output port.

use std::borrow::Cow;
use std::collections::VecDeque;

use crate::ByteStream;

/// A fully in-memory duplex stream.
#[derive(Debug, Default, Clone)]
pub struct MemoryStream {
    /// Bytes waiting to be read.
    rx: VecDeque<u8>,
    /// Bytes written so far.
    tx: Vec<u8>,
}

impl MemoryStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stream with `input` already queued for reading.
    pub fn with_input(input: &[u8]) -> Self {
        let mut stream = Self::new();
        stream.push(input);
        stream
    }

    /// Queue bytes for reading.
    pub fn push(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Queue text for reading.
    pub fn push_str(&mut self, text: &str) {
        self.push(text.as_bytes());
    }

    /// Everything written since the last `take_output`.
    pub fn output(&self) -> &[u8] {
        &self.tx
    }

    /// Written bytes as text (lossy).
    pub fn output_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.tx)
    }

    /// Drain and return the written bytes.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }

    /// Drain the written bytes as text.
    pub fn take_output_string(&mut self) -> String {
        String::from_utf8_lossy(&self.take_output()).into_owned()
    }
}

impl ByteStream for MemoryStream {
    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn peek(&self) -> Option<u8> {
        self.rx.front().copied()
    }

    fn write(&mut self, byte: u8) {
        self.tx.push(byte);
    }

    fn write_all(&mut self, bytes: &[u8]) {
        self.tx.extend_from_slice(bytes);
    }
}
