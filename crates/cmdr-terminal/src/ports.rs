//! The streams an interpreter talks to during one poll.
//!
//! The input stream is required. Output defaults to the input stream (a
//! duplex serial port); an auxiliary stream receives echoed bytes and is the
//! far side of the bridge when command parsing is switched off.

use cmdr_stream::ByteStream;

pub struct Ports<'p> {
    input: &'p mut dyn ByteStream,
    output: Option<&'p mut dyn ByteStream>,
    aux: Option<&'p mut dyn ByteStream>,
}

impl<'p> Ports<'p> {
    /// One stream for both input and output.
    pub fn new(stream: &'p mut dyn ByteStream) -> Self {
        Self {
            input: stream,
            output: None,
            aux: None,
        }
    }

    /// Separate input and output streams.
    pub fn split(input: &'p mut dyn ByteStream, output: &'p mut dyn ByteStream) -> Self {
        Self {
            input,
            output: Some(output),
            aux: None,
        }
    }

    /// Attach an auxiliary stream.
    pub fn with_aux(mut self, aux: &'p mut dyn ByteStream) -> Self {
        self.aux = Some(aux);
        self
    }

    pub fn has_aux(&self) -> bool {
        self.aux.is_some()
    }

    pub fn available(&self) -> usize {
        self.input.available()
    }

    pub fn read(&mut self) -> Option<u8> {
        self.input.read()
    }

    pub fn peek(&self) -> Option<u8> {
        self.input.peek()
    }

    /// The stream replies go to.
    pub fn output(&mut self) -> &mut (dyn ByteStream + 'p) {
        match self.output {
            Some(ref mut out) => &mut **out,
            None => &mut *self.input,
        }
    }

    pub fn write(&mut self, byte: u8) {
        self.output().write(byte);
    }

    pub fn print(&mut self, text: &str) {
        self.output().print(text);
    }

    pub fn println(&mut self, text: &str) {
        self.output().println(text);
    }

    /// Mirror a received byte to the output and/or auxiliary stream.
    pub fn echo(&mut self, byte: u8, to_output: bool, to_aux: bool) {
        if to_output {
            self.write(byte);
        }
        if to_aux && let Some(aux) = self.aux.as_deref_mut() {
            aux.write(byte);
        }
    }

    /// Copy everything waiting on the auxiliary stream to the output.
    pub fn drain_aux_to_output(&mut self) {
        let Some(aux) = self.aux.as_deref_mut() else {
            return;
        };
        while let Some(b) = aux.read() {
            match self.output {
                Some(ref mut out) => out.write(b),
                None => self.input.write(b),
            }
        }
    }

    /// Pass bytes both ways between the auxiliary stream and the
    /// input/output pair, without interpretation.
    pub fn bridge(&mut self) {
        self.drain_aux_to_output();
        let Some(aux) = self.aux.as_deref_mut() else {
            return;
        };
        while let Some(b) = self.input.read() {
            aux.write(b);
        }
    }

    pub fn flush(&mut self) {
        self.output().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdr_stream::MemoryStream;

    #[test]
    fn duplex_writes_to_input_stream() {
        let mut serial = MemoryStream::with_input(b"x");
        let mut ports = Ports::new(&mut serial);
        assert_eq!(ports.available(), 1);
        assert_eq!(ports.peek(), Some(b'x'));
        assert_eq!(ports.read(), Some(b'x'));
        ports.println("ok");
        assert!(!ports.has_aux());
        assert_eq!(serial.output(), b"ok\n");
    }

    #[test]
    fn split_writes_to_output() {
        let mut input = MemoryStream::new();
        let mut output = MemoryStream::new();
        let mut ports = Ports::split(&mut input, &mut output);
        ports.print("hi");
        ports.write(b'!');
        assert!(input.output().is_empty());
        assert_eq!(output.output(), b"hi!");
    }

    #[test]
    fn echo_targets() {
        let mut serial = MemoryStream::new();
        let mut aux = MemoryStream::new();
        let mut ports = Ports::new(&mut serial).with_aux(&mut aux);
        ports.echo(b'a', true, false);
        ports.echo(b'b', false, true);
        ports.echo(b'c', true, true);
        ports.echo(b'd', false, false);
        assert_eq!(serial.output(), b"ac");
        assert_eq!(aux.output(), b"bc");
    }

    #[test]
    fn echo_to_missing_aux_is_ignored() {
        let mut serial = MemoryStream::new();
        let mut ports = Ports::new(&mut serial);
        ports.echo(b'z', false, true);
        assert!(serial.output().is_empty());
    }

    #[test]
    fn bridge_moves_both_directions() {
        let mut serial = MemoryStream::with_input(b"to-aux");
        let mut aux = MemoryStream::with_input(b"to-serial");
        let mut ports = Ports::new(&mut serial).with_aux(&mut aux);
        ports.bridge();
        assert_eq!(serial.output(), b"to-serial");
        assert_eq!(serial.available(), 0);
        assert_eq!(aux.output(), b"to-aux");
        assert_eq!(aux.available(), 0);
    }

    #[test]
    fn bridge_without_aux_leaves_input() {
        let mut serial = MemoryStream::with_input(b"keep");
        let mut ports = Ports::new(&mut serial);
        ports.bridge();
        assert_eq!(serial.available(), 4);
    }
}
