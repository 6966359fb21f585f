//! Record-and-continue failure reporting.

use crate::reporter::{Cleanup, Link, Reporter, ReporterId};

/// Wraps a reporter so that `fail` records the failure and returns instead of
/// aborting the test body. Every other operation is forwarded unchanged.
///
/// Wrapping an already relaxed reporter collapses to single relaxed
/// semantics: each failure is recorded once and nothing aborts.
#[derive(Debug, Clone)]
pub struct Relaxed<R> {
    inner: R,
    // Set when `inner` already records without aborting.
    collapsed: bool,
}

/// Shorthand for [`Relaxed::new`].
pub fn relaxed<R: Reporter>(reporter: R) -> Relaxed<R> {
    Relaxed::new(reporter)
}

impl<R: Reporter> Relaxed<R> {
    pub fn new(inner: R) -> Self {
        let collapsed = inner.is_relaxed();
        tracing::trace!(reporter = %inner.id(), collapsed, "relaxed reporter created");
        Self { inner, collapsed }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Reporter> Reporter for Relaxed<R> {
    fn helper(&self) {
        self.inner.helper()
    }

    fn fail(&self, message: &str) {
        if self.collapsed {
            self.inner.fail(message)
        } else {
            self.inner.fail_quiet(message)
        }
    }

    fn fail_quiet(&self, message: &str) {
        self.inner.fail_quiet(message)
    }

    fn has_failed(&self) -> bool {
        self.inner.has_failed()
    }

    fn on_cleanup(&self, cleanup: Cleanup) {
        self.inner.on_cleanup(cleanup)
    }

    fn log(&self, message: &str) {
        self.inner.log(message)
    }

    fn id(&self) -> ReporterId {
        self.inner.id()
    }

    fn link(&self) -> Link {
        self.inner.link()
    }

    fn is_relaxed(&self) -> bool {
        true
    }
}
