//! Byte stream abstraction.
//!
//! The interpreter never touches a serial port, socket or file directly. It
//! talks to a [`ByteStream`]: something that can say how many bytes are
//! waiting, hand them out one at a time, and accept bytes for output. Reads
//! never block; an empty source simply returns `None`.

mod memory;
mod writer;

pub use memory::MemoryStream;
pub use writer::WriterStream;

/// A non-blocking source and sink of bytes.
pub trait ByteStream {
    /// Number of bytes that can be read right now.
    fn available(&self) -> usize;

    /// Take the next byte, or `None` if nothing is waiting.
    fn read(&mut self) -> Option<u8>;

    /// Look at the next byte without consuming it.
    fn peek(&self) -> Option<u8>;

    /// Emit one byte.
    fn write(&mut self, byte: u8);

    /// Emit a run of bytes.
    fn write_all(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.write(b);
        }
    }

    /// Emit UTF-8 text.
    fn print(&mut self, text: &str) {
        self.write_all(text.as_bytes());
    }

    /// Emit UTF-8 text followed by a newline.
    fn println(&mut self, text: &str) {
        self.print(text);
        self.write(b'\n');
    }

    /// Push buffered output to the underlying device, if any.
    fn flush(&mut self) {}
}
