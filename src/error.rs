use miette::Diagnostic;
use thiserror::Error;

/// Errors from driving a test unit.
///
/// Assertion failures are never errors: they are recorded on the reporter.
/// These cover the runner's own fallible edges.
#[derive(Debug, Error, Diagnostic)]
pub enum VouchError {
    #[error("failed to spawn worker for test unit `{name}`")]
    #[diagnostic(
        code(vouch::unit::spawn),
        help("the platform refused to create a thread; check the configured stack size")
    )]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("test unit `{running}` is still running; `{requested}` cannot start on the same handle")]
    #[diagnostic(
        code(vouch::unit::busy),
        help("run units on one handle sequentially, or give each concurrent test its own TestUnit")
    )]
    Busy { running: String, requested: String },
}

pub type Result<T> = std::result::Result<T, VouchError>;
