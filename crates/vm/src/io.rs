//! I/O collaborator used by READ, WRITE, DPRINT and BREAK.
//!
//! The machine never touches process streams directly. [`StdIo`] wires it
//! to stdin/stdout/stderr (or a file for input); [`MemoryIo`] keeps
//! everything in memory for embedding and tests.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use tac_common::operand::parse_int;

/// Input and output streams of a running program.
///
/// Reads never fail: a malformed line or end of input yields `None`,
/// which READ stores as nil. Writes report stream failures.
pub trait Io {
    /// Next input line without its line terminator, or `None` at EOF.
    fn read_line(&mut self) -> Option<String>;

    /// Write already-decoded text to standard output.
    fn write_str(&mut self, s: &str) -> io::Result<()>;

    /// Write raw text to the diagnostic stream.
    fn write_diagnostic(&mut self, s: &str) -> io::Result<()>;

    /// Flush buffered output. Called once when the program stops.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn read_int(&mut self) -> Option<i64> {
        self.read_line().and_then(|line| parse_int(line.trim()))
    }

    /// Only the exact texts `true` and `false` are accepted.
    fn read_bool(&mut self) -> Option<bool> {
        match self.read_line()?.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    fn read_string(&mut self) -> Option<String> {
        self.read_line()
    }

    fn write_int(&mut self, n: i64) -> io::Result<()> {
        self.write_str(&n.to_string())
    }

    fn write_bool(&mut self, b: bool) -> io::Result<()> {
        self.write_str(if b { "true" } else { "false" })
    }

    fn write_string(&mut self, s: &str) -> io::Result<()> {
        self.write_str(s)
    }
}

fn strip_terminator(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

/// Process streams, with input optionally read from a file.
pub struct StdIo {
    input: Box<dyn BufRead>,
    stdout: io::BufWriter<io::Stdout>,
    stderr: io::Stderr,
}

impl StdIo {
    /// Read from stdin.
    pub fn new() -> Self {
        Self::from_reader(Box::new(BufReader::new(io::stdin())))
    }

    /// Read from the file at `path` instead of stdin.
    pub fn with_input(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(Box::new(BufReader::new(file))))
    }

    fn from_reader(input: Box<dyn BufRead>) -> Self {
        Self {
            input,
            stdout: io::BufWriter::new(io::stdout()),
            stderr: io::stderr(),
        }
    }
}

impl Default for StdIo {
    fn default() -> Self {
        Self::new()
    }
}

impl Io for StdIo {
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(strip_terminator(line)),
        }
    }

    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.stdout.write_all(s.as_bytes())
    }

    fn write_diagnostic(&mut self, s: &str) -> io::Result<()> {
        // Keep stdout and stderr ordered when both go to a terminal.
        self.stdout.flush()?;
        self.stderr.write_all(s.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}

/// In-memory streams: queued input lines and captured output.
#[derive(Debug, Clone, Default)]
pub struct MemoryIo {
    input: VecDeque<String>,
    stdout: String,
    stderr: String,
}

impl MemoryIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue input lines, consumed one per READ.
    pub fn with_input<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            input: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Everything written to standard output so far.
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Everything written to the diagnostic stream so far.
    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}

impl Io for MemoryIo {
    fn read_line(&mut self) -> Option<String> {
        self.input.pop_front()
    }

    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.stdout.push_str(s);
        Ok(())
    }

    fn write_diagnostic(&mut self, s: &str) -> io::Result<()> {
        self.stderr.push_str(s);
        Ok(())
    }
}
