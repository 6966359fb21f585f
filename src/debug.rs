//! Deferred diagnostics, replayed only when a test fails.
//!
//! [`debug`] pushes a producer onto a stack owned by the reporter's test
//! unit. The first push for a reporter registers one cleanup with it; when
//! the unit ends that cleanup removes the stack and, if the reporter has
//! failed, calls every producer most recent first. A passing unit drops its
//! producers without calling any of them.
//!
//! ```text
//! Empty --debug()--> Accumulating --cleanup--> Draining --> Empty
//! ```
//!
//! Stacks are keyed by [`ReporterId`], so a [`Relaxed`](crate::relaxed::Relaxed)
//! wrapper and the handle it wraps share one stack. The drain cleanup holds a
//! [`Link`](crate::reporter::Link) rather than the reporter, so a unit dropped
//! without finishing still drains its stack.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use lazy_static::lazy_static;
use parking_lot::Mutex;

use crate::reporter::{Reporter, ReporterId, ReporterLink};

type Producer = Box<dyn FnOnce() + Send + 'static>;

lazy_static! {
    static ref DEBUG_STACKS: Mutex<HashMap<ReporterId, Vec<Producer>>> =
        Mutex::new(HashMap::new());
}

/// Registers `producer` to run at cleanup if the test has failed by then.
///
/// `producer` must only emit diagnostics; it must not assert or fail the
/// test. Registration happens on the thread running the test body.
///
/// Log from the producer through [`Reporter::link`]. A cloned
/// [`TestUnit`](crate::unit::TestUnit) captured by the producer keeps the
/// unit alive until the stack drains.
pub fn debug<R, F>(reporter: &R, producer: F)
where
    R: Reporter + ?Sized,
    F: FnOnce() + Send + 'static,
{
    reporter.helper();
    let id = reporter.id();
    let first = match DEBUG_STACKS.lock().entry(id) {
        Entry::Occupied(mut stack) => {
            stack.get_mut().push(Box::new(producer));
            false
        }
        Entry::Vacant(slot) => {
            slot.insert(vec![Box::new(producer)]);
            true
        }
    };
    tracing::trace!(reporter = %id, first, "debug producer registered");

    if first {
        let link = reporter.link();
        reporter.on_cleanup(Box::new(move || drain(id, link.as_ref())));
    }
}

/// Registers `message` to be logged through the reporter if the test fails.
///
/// The message is built by the caller, so values are captured as they are
/// now, not as they are at replay. See also [`debug_log!`](crate::debug_log!).
pub fn debug_log<R>(reporter: &R, message: impl Into<String>)
where
    R: Reporter + ?Sized,
{
    let message = message.into();
    let link = reporter.link();
    debug(reporter, move || link.log(&message));
}

/// Formats its arguments now and logs them through the reporter at cleanup,
/// only if the test failed.
///
/// ```
/// use vouch::{debug_log, TestUnit};
///
/// let unit = TestUnit::new();
/// unit.run("example", |t| {
///     let x = 1;
///     debug_log!(t, "x: {}", x);
/// })
/// .unwrap();
/// ```
#[macro_export]
macro_rules! debug_log {
    ($reporter:expr, $($arg:tt)+) => {
        $crate::debug::debug_log($reporter, ::std::format!($($arg)+))
    };
}

/// Number of producers waiting on `reporter`'s stack.
pub fn pending<R: Reporter + ?Sized>(reporter: &R) -> usize {
    DEBUG_STACKS
        .lock()
        .get(&reporter.id())
        .map_or(0, Vec::len)
}

fn drain(id: ReporterId, link: &dyn ReporterLink) {
    // Release the lock before replay so producers never run under it.
    let producers = DEBUG_STACKS.lock().remove(&id).unwrap_or_default();

    if !link.has_failed() {
        tracing::debug!(reporter = %id, discarded = producers.len(), "debug stack discarded");
        return;
    }

    tracing::debug!(reporter = %id, replayed = producers.len(), "replaying debug stack");
    for producer in producers.into_iter().rev() {
        producer();
    }
}
