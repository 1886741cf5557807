//! Output-only stream over any `std::io::Write`.

use std::io::Write;

use cmdr_types::error::{CmdrError, Result};

use crate::ByteStream;

/// Adapts a writer (stdout, a file, a socket) into an output port.
///
/// It never has anything to read. Write failures are logged and the byte is
/// dropped; the interpreter has no way to act on them mid-line. The first
/// failure is kept and surfaces from [`WriterStream::finish`].
#[derive(Debug)]
pub struct WriterStream<W: Write> {
    inner: W,
    failure: Option<String>,
}

impl<W: Write> WriterStream<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            failure: None,
        }
    }

    /// Borrow the wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Flush and hand back the wrapped writer, or report the first write
    /// that failed while the stream was in use.
    pub fn finish(mut self) -> Result<W> {
        if let Some(failure) = self.failure.take() {
            return Err(CmdrError::Stream(failure));
        }
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn record_failure(&mut self, what: &str, e: &std::io::Error) {
        log::warn!("output {what} failed: {e}");
        if self.failure.is_none() {
            self.failure = Some(format!("{what} failed: {e}"));
        }
    }
}

impl<W: Write> ByteStream for WriterStream<W> {
    fn available(&self) -> usize {
        0
    }

    fn read(&mut self) -> Option<u8> {
        None
    }

    fn peek(&self) -> Option<u8> {
        None
    }

    fn write(&mut self, byte: u8) {
        self.write_all(&[byte]);
    }

    fn write_all(&mut self, bytes: &[u8]) {
        if let Err(e) = self.inner.write_all(bytes) {
            self.record_failure("write", &e);
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.inner.flush() {
            self.record_failure("flush", &e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_readable() {
        let mut s = WriterStream::new(Vec::new());
        assert_eq!(s.available(), 0);
        assert_eq!(s.read(), None);
        assert_eq!(s.peek(), None);
    }

    #[test]
    fn writes_reach_inner() {
        let mut s = WriterStream::new(Vec::new());
        s.println("status ok");
        s.write(b'>');
        assert_eq!(s.get_ref().as_slice(), b"status ok\n>");
        let inner = s.finish().unwrap();
        assert_eq!(inner, b"status ok\n>".to_vec());
    }

    #[derive(Debug)]
    struct Broken;
    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn failed_writes_are_swallowed() {
        let mut s = WriterStream::new(Broken);
        s.print("lost");
        ByteStream::flush(&mut s);
        match s.finish() {
            Err(CmdrError::Stream(msg)) => assert_eq!(msg, "write failed: closed"),
            other => panic!("expected a stream error, got {other:?}"),
        }
    }

    #[test]
    fn clean_stream_finishes_ok() {
        let s = WriterStream::new(Vec::new());
        assert!(s.finish().unwrap().is_empty());
    }
}
