//! Configuration for output sinks and test-unit workers.

use termcolor::ColorChoice;

const DEFAULT_THREAD_PREFIX: &str = "vouch:";

/// Colour settings for console output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    pub use_colors: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stdout),
        }
    }
}

impl SinkConfig {
    pub fn plain() -> Self {
        Self { use_colors: false }
    }

    pub fn color_choice(&self) -> ColorChoice {
        if self.use_colors {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        }
    }
}

/// Settings for the worker thread a [`TestUnit`](crate::unit::TestUnit)
/// runs each body on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitConfig {
    /// Prefixed to the unit name to form the worker thread name.
    pub thread_prefix: String,
    /// Worker stack size in bytes; `None` keeps the platform default.
    pub stack_size: Option<usize>,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            thread_prefix: DEFAULT_THREAD_PREFIX.to_string(),
            stack_size: None,
        }
    }
}

impl UnitConfig {
    pub fn with_thread_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_prefix = prefix.into();
        self
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Worker thread name for `unit`. NUL bytes, which thread names cannot
    /// carry, are written as `\0`.
    pub fn thread_name(&self, unit: &str) -> String {
        format!("{}{}", self.thread_prefix, unit).replace('\0', "\\0")
    }
}
