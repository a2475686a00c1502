//! Types for managing solver output to various targets.

use std::io::{Error, ErrorKind, Result, Write};

/// Container for managing progress-output targets.
///
/// The solver's iteration log is written through one of these.  The
/// `Buffer` variant lets callers (and the crate's own tests) capture the
/// output, and `Sink` discards it entirely.
pub enum PrintTarget {
    /// write to standard output
    Stdout(std::io::Stdout),
    /// accumulate into an internal buffer
    Buffer(Vec<u8>),
    /// discard all output
    Sink,
}

impl std::fmt::Debug for PrintTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrintTarget::Stdout(_) => write!(f, "PrintTarget::Stdout"),
            PrintTarget::Buffer(_) => write!(f, "PrintTarget::Buffer"),
            PrintTarget::Sink => write!(f, "PrintTarget::Sink"),
        }
    }
}

impl Default for PrintTarget {
    fn default() -> Self {
        PrintTarget::Stdout(std::io::stdout())
    }
}

impl Write for PrintTarget {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        match self {
            PrintTarget::Stdout(stdout) => stdout.write(buf),
            PrintTarget::Buffer(buffer) => {
                buffer.extend_from_slice(buf);
                Ok(buf.len())
            }
            PrintTarget::Sink => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self {
            PrintTarget::Stdout(stdout) => stdout.flush(),
            PrintTarget::Buffer(_) => Ok(()),
            PrintTarget::Sink => Ok(()),
        }
    }
}

/// Trait implemented by solvers that allow configurable print targets
pub trait ConfigurablePrintTarget {
    /// redirect print output to stdout
    fn print_to_stdout(&mut self);
    /// redirect print output to an internal buffer
    fn print_to_buffer(&mut self);
    /// discard print output
    fn print_to_sink(&mut self);
    /// get the contents of the internal print buffer
    fn get_print_buffer(&mut self) -> Result<String>;
}

impl ConfigurablePrintTarget for PrintTarget {
    fn print_to_stdout(&mut self) {
        *self = PrintTarget::Stdout(std::io::stdout());
    }

    fn print_to_buffer(&mut self) {
        *self = PrintTarget::Buffer(Vec::new());
    }

    fn print_to_sink(&mut self) {
        *self = PrintTarget::Sink;
    }

    fn get_print_buffer(&mut self) -> Result<String> {
        match self {
            PrintTarget::Buffer(buffer) => Ok(String::from_utf8_lossy(buffer).to_string()),
            _ => Err(Error::new(
                ErrorKind::Other,
                "Print buffering is not configured.",
            )),
        }
    }
}
