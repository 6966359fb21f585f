//! Vouch: a minimalist test-assertion helper library.
//!
//! Tests should rarely fail, and when they do the failure should reproduce.
//! So the helpers here fail quickly and quietly with a one-line message
//! instead of building elaborate reports. When a failure does need more
//! context, attach it with [`debug`] or [`debug_log!`]: it costs nothing
//! unless the test fails, and is then replayed most recent first.
//!
//! Every helper takes a [`Reporter`] as its first argument. [`TestUnit`] is
//! the plain reporter: a failure stops the test body. Wrap it with
//! [`relaxed`] to record every failure and keep going.
//!
//! ```
//! use vouch::prelude::*;
//! use vouch::output::OutputBuffer;
//!
//! let buffer = OutputBuffer::new();
//! let unit = TestUnit::with_sink(buffer.clone());
//! let outcome = unit
//!     .run("shows multiple errors", |t| {
//!         let rt = relaxed(t.clone());
//!         equal(&rt, 5, 6);
//!         equal(&rt, 7, 8);
//!     })
//!     .unwrap();
//! assert!(outcome.failed);
//! assert_eq!(buffer.lines(), vec!["want: 5; got: 6", "want: 7; got: 8"]);
//! ```

pub mod assert;
pub mod config;
pub mod debug;
pub mod error;
pub mod output;
pub mod relaxed;
pub mod reporter;
pub mod unit;

pub use crate::assert::{
    all_equal, contains, deep_equal, equal, is_false, is_true, none, not_contains, not_equal,
    not_zero, ok, some, zero, Haystack,
};
pub use crate::config::{SinkConfig, UnitConfig};
pub use crate::debug::{debug, debug_log, pending};
pub use crate::error::{Result, VouchError};
pub use crate::relaxed::{relaxed, Relaxed};
pub use crate::reporter::{Cleanup, Link, Reporter, ReporterId, ReporterLink};
pub use crate::unit::{TestUnit, UnitOutcome};

/// Everything a test module usually needs.
pub mod prelude {
    pub use crate::assert::*;
    pub use crate::debug::{debug, pending};
    pub use crate::debug_log;
    pub use crate::relaxed::{relaxed, Relaxed};
    pub use crate::reporter::{Reporter, ReporterLink};
    pub use crate::unit::{TestUnit, UnitOutcome};
}
