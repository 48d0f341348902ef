// File: src/interpreter/io.rs
//
// Boundary between the interpreter and the outside world.
//
// `input` statements pull one line at a time from an InputSource, and
// `print`/`show`/`solve` push one OutputEvent each into an OutputSink. The
// CLI wires these to stdin/stdout; tests use the in-memory impls below.

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead, Write};

/// Which statement produced an output event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Print,
    Show,
    Solve,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEvent {
    pub channel: Channel,
    pub text: String,
}

impl OutputEvent {
    pub fn new(channel: Channel, text: impl Into<String>) -> Self {
        OutputEvent { channel, text: text.into() }
    }
}

impl fmt::Display for OutputEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Supplies raw text for `input` statements, one line per call
pub trait InputSource {
    /// Next line of input, `Ok(None)` once the source is exhausted
    fn next_line(&mut self) -> io::Result<Option<String>>;
}

/// Receives every value the program emits
pub trait OutputSink {
    fn emit(&mut self, event: OutputEvent) -> io::Result<()>;
}

/// Reads input lines from any buffered reader (stdin, a file, a byte slice)
pub struct LineInput<R> {
    reader: R,
}

impl<R: BufRead> LineInput<R> {
    pub fn new(reader: R) -> Self {
        LineInput { reader }
    }
}

impl<R: BufRead> InputSource for LineInput<R> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}

impl InputSource for VecDeque<String> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.pop_front())
    }
}

/// Writes one line per event to any writer
pub struct WriterOutput<W> {
    writer: W,
}

impl<W: Write> WriterOutput<W> {
    pub fn new(writer: W) -> Self {
        WriterOutput { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for WriterOutput<W> {
    fn emit(&mut self, event: OutputEvent) -> io::Result<()> {
        writeln!(self.writer, "{}", event.text)?;
        self.writer.flush()
    }
}

/// Collects events in memory
impl OutputSink for Vec<OutputEvent> {
    fn emit(&mut self, event: OutputEvent) -> io::Result<()> {
        self.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_input_strips_line_endings() {
        let mut input = LineInput::new("4\r\ntrue\n".as_bytes());
        assert_eq!(input.next_line().unwrap().as_deref(), Some("4"));
        assert_eq!(input.next_line().unwrap().as_deref(), Some("true"));
        assert_eq!(input.next_line().unwrap(), None);
    }

    #[test]
    fn test_line_input_reports_read_failures() {
        let mut input = LineInput::new(&[0xff, 0xfe, b'\n'][..]);
        assert_eq!(input.next_line().unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_writer_output_writes_lines() {
        let mut out = WriterOutput::new(Vec::new());
        out.emit(OutputEvent::new(Channel::Print, "7")).unwrap();
        out.emit(OutputEvent::new(Channel::Show, "x = 7")).unwrap();
        assert_eq!(String::from_utf8(out.into_inner()).unwrap(), "7\nx = 7\n");
    }
}
