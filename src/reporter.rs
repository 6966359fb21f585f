//! The reporting capability every assertion helper consumes.
//!
//! A [`Reporter`] is the per-test handle: it records failures, aborts the
//! running test body, registers cleanups and emits diagnostic lines. The
//! crate ships one implementation, [`TestUnit`](crate::unit::TestUnit), and one
//! decorator, [`Relaxed`](crate::relaxed::Relaxed); anything else that can
//! honour the contract below may be plugged in.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A deferred callback registered with [`Reporter::on_cleanup`].
pub type Cleanup = Box<dyn FnOnce() + Send + 'static>;

/// A non-owning view of a reporter's unit.
///
/// Callbacks that the unit itself stores (cleanups, debug producers) hold a
/// link instead of a reporter handle, so they never keep the unit alive.
pub trait ReporterLink: Send + Sync {
    fn has_failed(&self) -> bool;

    fn log(&self, message: &str);
}

pub type Link = Arc<dyn ReporterLink>;

/// Identity of an underlying test handle.
///
/// Decorators forward the identity of the reporter they wrap, so state keyed
/// by identity (the debug stack) is shared between a handle and its wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReporterId(u64);

impl ReporterId {
    /// Allocates a process-unique identity.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ReporterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reporter#{}", self.0)
    }
}

/// The test-outcome-recording collaborator.
///
/// # Contract
///
/// - [`fail`](Reporter::fail) records the failure and then, for a plain
///   reporter, does not return: it exits the running test body. Decorators
///   may downgrade this to record-and-return.
/// - [`fail_quiet`](Reporter::fail_quiet) records the failure and always
///   returns.
/// - [`on_cleanup`](Reporter::on_cleanup) callbacks run once when the current
///   test unit ends, pass or fail, most recently registered first.
pub trait Reporter: Send + Sync {
    /// Marks the caller as a helper frame. Pass-through by default.
    fn helper(&self) {}

    /// Records a failure and aborts the current test body.
    fn fail(&self, message: &str);

    /// Records a failure and returns normally.
    fn fail_quiet(&self, message: &str);

    fn has_failed(&self) -> bool;

    /// Registers a callback to run when the current test unit finishes.
    fn on_cleanup(&self, cleanup: Cleanup);

    /// Emits a diagnostic line visible in the test output.
    fn log(&self, message: &str);

    fn id(&self) -> ReporterId;

    /// A view of this reporter's unit that does not own it.
    fn link(&self) -> Link;

    /// Whether `fail` already records without aborting.
    fn is_relaxed(&self) -> bool {
        false
    }
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn helper(&self) {
        (**self).helper()
    }

    fn fail(&self, message: &str) {
        (**self).fail(message)
    }

    fn fail_quiet(&self, message: &str) {
        (**self).fail_quiet(message)
    }

    fn has_failed(&self) -> bool {
        (**self).has_failed()
    }

    fn on_cleanup(&self, cleanup: Cleanup) {
        (**self).on_cleanup(cleanup)
    }

    fn log(&self, message: &str) {
        (**self).log(message)
    }

    fn id(&self) -> ReporterId {
        (**self).id()
    }

    fn link(&self) -> Link {
        (**self).link()
    }

    fn is_relaxed(&self) -> bool {
        (**self).is_relaxed()
    }
}

impl<R: Reporter + ?Sized> Reporter for Arc<R> {
    fn helper(&self) {
        (**self).helper()
    }

    fn fail(&self, message: &str) {
        (**self).fail(message)
    }

    fn fail_quiet(&self, message: &str) {
        (**self).fail_quiet(message)
    }

    fn has_failed(&self) -> bool {
        (**self).has_failed()
    }

    fn on_cleanup(&self, cleanup: Cleanup) {
        (**self).on_cleanup(cleanup)
    }

    fn log(&self, message: &str) {
        (**self).log(message)
    }

    fn id(&self) -> ReporterId {
        (**self).id()
    }

    fn link(&self) -> Link {
        (**self).link()
    }

    fn is_relaxed(&self) -> bool {
        (**self).is_relaxed()
    }
}
