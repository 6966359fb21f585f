//! Output sinks for failure and log lines.
//!
//! Every line a reporter prints goes through an [`OutputSink`]. Tests capture
//! it with [`OutputBuffer`]; everything else goes to stdout through
//! [`ConsoleSink`], the default.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use termcolor::{Color, ColorSpec, StandardStream, WriteColor};

use crate::config::SinkConfig;

/// What a line reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Failure,
    Log,
}

pub trait OutputSink: Send {
    fn emit(&mut self, text: &str, kind: LineKind);
}

/// Discards everything.
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&mut self, _text: &str, _kind: LineKind) {}
}

/// Collects output into a shared string. Clones share the same buffer, so a
/// test keeps one clone and hands the other to the reporter.
#[derive(Clone, Default)]
pub struct OutputBuffer {
    buffer: Arc<Mutex<String>>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.buffer.lock().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.buffer.lock().lines().map(str::to_owned).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

impl OutputSink for OutputBuffer {
    fn emit(&mut self, text: &str, _kind: LineKind) {
        let mut buffer = self.buffer.lock();
        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(text);
    }
}

/// Writes to a colour-capable stream, highlighting failure lines in red.
///
/// [`ConsoleSink::new`] writes to stdout, with colours on when the
/// [`SinkConfig`] asks for them.
pub struct ConsoleSink<W = StandardStream> {
    writer: W,
}

impl ConsoleSink {
    pub fn new(config: SinkConfig) -> Self {
        Self::with_writer(StandardStream::stdout(config.color_choice()))
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new(SinkConfig::default())
    }
}

impl<W: WriteColor + Send> ConsoleSink<W> {
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: WriteColor + Send> OutputSink for ConsoleSink<W> {
    fn emit(&mut self, text: &str, kind: LineKind) {
        // Write errors are dropped: the line is already on the reporter.
        if kind == LineKind::Failure {
            let _ = self
                .writer
                .set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
        }
        let _ = writeln!(self.writer, "{}", text);
        if kind == LineKind::Failure {
            let _ = self.writer.reset();
        }
    }
}

/// Shared, thread-safe handle to a sink.
#[derive(Clone)]
pub struct SharedOutput(Arc<Mutex<dyn OutputSink>>);

impl SharedOutput {
    pub fn new<T: OutputSink + 'static>(sink: T) -> Self {
        SharedOutput(Arc::new(Mutex::new(sink)))
    }

    pub fn emit(&self, text: &str, kind: LineKind) {
        self.0.lock().emit(text, kind);
    }
}

/// A [`ConsoleSink`] on stdout, coloured when stdout is a terminal.
impl Default for SharedOutput {
    fn default() -> Self {
        Self::new(ConsoleSink::default())
    }
}
