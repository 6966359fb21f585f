//! A plain reporter that runs each test body on its own worker thread.
//!
//! # Abort model
//!
//! [`TestUnit::fail`] records the failure and then unwinds the calling
//! thread with a private marker payload (without invoking the panic hook).
//! [`TestUnit::run`] executes the body on a scoped worker and joins it, so
//! the unwind tears down only that worker; the caller sees a normal return.
//! Any other panic in the body is recorded as a failure.
//!
//! When the body ends, cleanups run on the caller's thread, most recently
//! registered first.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use parking_lot::{Mutex, RwLock};

use crate::config::UnitConfig;
use crate::error::{Result, VouchError};
use crate::output::{LineKind, OutputSink, SharedOutput};
use crate::reporter::{Cleanup, Link, Reporter, ReporterId, ReporterLink};

/// Unwind payload used by `fail` to leave the test body.
struct Abort;

/// Outcome of one [`TestUnit::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOutcome {
    pub name: String,
    pub failed: bool,
    /// Failure messages in the order they were recorded.
    pub failures: Vec<String>,
    /// Whether the body returned normally instead of being aborted.
    pub completed: bool,
    /// Message of a panic that did not come from `fail`.
    pub panic: Option<String>,
}

impl UnitOutcome {
    pub fn passed(&self) -> bool {
        !self.failed
    }
}

/// Deferred callbacks released in reverse registration order.
///
/// Dropping the stack releases whatever is still pending.
#[derive(Default)]
pub struct CleanupStack {
    callbacks: Vec<Cleanup>,
}

impl CleanupStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cleanup: Cleanup) {
        self.callbacks.push(cleanup);
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Runs every pending callback, last registered first. A callback that
    /// unwinds does not stop the ones after it; messages of panics that were
    /// not aborts are returned.
    pub fn release(&mut self) -> Vec<String> {
        let mut panics = Vec::new();
        while let Some(cleanup) = self.callbacks.pop() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(cleanup)) {
                if !payload.is::<Abort>() {
                    panics.push(panic_message(payload.as_ref()));
                }
            }
        }
        panics
    }
}

impl Drop for CleanupStack {
    fn drop(&mut self) {
        for message in self.release() {
            tracing::warn!(panic = %message, "cleanup panicked");
        }
    }
}

/// Failure record and output of a unit. Links point here, not at
/// [`UnitState`], so callbacks stored in the cleanup stack never form a cycle
/// with the unit that owns them.
struct UnitCore {
    output: SharedOutput,
    failed: RwLock<bool>,
    failures: Mutex<Vec<String>>,
}

impl ReporterLink for UnitCore {
    fn has_failed(&self) -> bool {
        *self.failed.read()
    }

    fn log(&self, message: &str) {
        self.output.emit(message, LineKind::Log);
    }
}

/// Dropping the last handle releases pending cleanups.
struct UnitState {
    id: ReporterId,
    config: UnitConfig,
    core: Arc<UnitCore>,
    running: Mutex<Option<String>>,
    cleanups: Mutex<CleanupStack>,
}

/// The plain reporter: `fail` aborts the running body.
///
/// Cloning yields another handle to the same unit.
#[derive(Clone)]
pub struct TestUnit {
    state: Arc<UnitState>,
}

impl TestUnit {
    /// A unit printing to stdout.
    pub fn new() -> Self {
        Self::with_output(SharedOutput::default())
    }

    pub fn with_output(output: SharedOutput) -> Self {
        Self::with_config(output, UnitConfig::default())
    }

    pub fn with_sink<T: OutputSink + 'static>(sink: T) -> Self {
        Self::with_output(SharedOutput::new(sink))
    }

    pub fn with_config(output: SharedOutput, config: UnitConfig) -> Self {
        Self {
            state: Arc::new(UnitState {
                id: ReporterId::next(),
                config,
                core: Arc::new(UnitCore {
                    output,
                    failed: RwLock::new(false),
                    failures: Mutex::new(Vec::new()),
                }),
                running: Mutex::new(None),
                cleanups: Mutex::new(CleanupStack::new()),
            }),
        }
    }

    /// Failure messages recorded since the last `run` started.
    pub fn failures(&self) -> Vec<String> {
        self.state.core.failures.lock().clone()
    }

    /// Name of the unit currently running, if any.
    pub fn running(&self) -> Option<String> {
        self.state.running.lock().clone()
    }

    /// Runs `body` as one test unit and waits for it.
    ///
    /// Failure state and cleanups are reset first, so a handle can be reused
    /// for any number of sequential units.
    pub fn run<F>(&self, name: &str, body: F) -> Result<UnitOutcome>
    where
        F: FnOnce(&TestUnit) + Send,
    {
        let _running = self.begin(name)?;
        self.reset();
        tracing::debug!(unit = name, reporter = %self.state.id, "test unit started");

        let thread_name = self.state.config.thread_name(name);
        let stack_size = self.state.config.stack_size;
        let joined = thread::scope(|scope| {
            let mut builder = thread::Builder::new().name(thread_name);
            if let Some(bytes) = stack_size {
                builder = builder.stack_size(bytes);
            }
            builder
                .spawn_scoped(scope, || body(self))
                .map(|worker| worker.join())
                .map_err(|source| VouchError::Spawn {
                    name: name.to_string(),
                    source,
                })
        });

        let (completed, panic) = match joined {
            Ok(Ok(())) => (true, None),
            Ok(Err(payload)) if payload.is::<Abort>() => (false, None),
            Ok(Err(payload)) => {
                let message = panic_message(payload.as_ref());
                self.fail_quiet(&format!("panic: {}", message));
                (false, Some(message))
            }
            Err(err) => {
                self.finish();
                return Err(err);
            }
        };

        self.finish();

        let outcome = UnitOutcome {
            name: name.to_string(),
            failed: self.has_failed(),
            failures: self.failures(),
            completed,
            panic,
        };
        tracing::debug!(
            unit = name,
            failed = outcome.failed,
            completed = outcome.completed,
            "test unit finished"
        );
        Ok(outcome)
    }

    /// Releases registered cleanups, LIFO, until none remain.
    ///
    /// `run` calls this when the body ends; call it directly when the handle
    /// is used outside `run`.
    pub fn finish(&self) {
        loop {
            let mut stack = std::mem::take(&mut *self.state.cleanups.lock());
            if stack.is_empty() {
                break;
            }
            for message in stack.release() {
                self.fail_quiet(&format!("panic in cleanup: {}", message));
            }
        }
    }

    fn begin(&self, name: &str) -> Result<RunningGuard<'_>> {
        let mut running = self.state.running.lock();
        if let Some(current) = running.as_ref() {
            return Err(VouchError::Busy {
                running: current.clone(),
                requested: name.to_string(),
            });
        }
        *running = Some(name.to_string());
        Ok(RunningGuard { state: &self.state })
    }

    fn reset(&self) {
        // Cleanups left over from use outside `run` close out that use first.
        self.finish();
        *self.state.core.failed.write() = false;
        self.state.core.failures.lock().clear();
    }
}

impl Default for TestUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TestUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestUnit")
            .field("id", &self.state.id)
            .field("running", &self.running())
            .field("failed", &self.has_failed())
            .finish()
    }
}

impl Reporter for TestUnit {
    fn fail(&self, message: &str) {
        self.fail_quiet(message);
        panic::resume_unwind(Box::new(Abort));
    }

    fn fail_quiet(&self, message: &str) {
        let core = &self.state.core;
        *core.failed.write() = true;
        core.failures.lock().push(message.to_string());
        core.output.emit(message, LineKind::Failure);
        tracing::trace!(reporter = %self.state.id, failure = message, "failure recorded");
    }

    fn has_failed(&self) -> bool {
        *self.state.core.failed.read()
    }

    fn on_cleanup(&self, cleanup: Cleanup) {
        self.state.cleanups.lock().push(cleanup);
    }

    fn log(&self, message: &str) {
        self.state.core.output.emit(message, LineKind::Log);
    }

    fn id(&self) -> ReporterId {
        self.state.id
    }

    fn link(&self) -> Link {
        self.state.core.clone()
    }
}

/// Clears the running marker when `run` returns, whichever way it returns.
struct RunningGuard<'a> {
    state: &'a UnitState,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        *self.state.running.lock() = None;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::output::OutputBuffer;

    fn captured() -> (TestUnit, OutputBuffer) {
        let buffer = OutputBuffer::new();
        (TestUnit::with_sink(buffer.clone()), buffer)
    }

    #[test]
    fn test_fail_aborts_only_the_body() {
        let (unit, buffer) = captured();
        let reached = AtomicBool::new(false);
        let outcome = unit
            .run("aborts", |t| {
                t.fail("first");
                reached.store(true, Ordering::SeqCst);
                t.fail("second");
            })
            .unwrap();
        assert!(!reached.load(Ordering::SeqCst));
        assert!(outcome.failed);
        assert!(!outcome.completed);
        assert_eq!(outcome.failures, vec!["first"]);
        assert_eq!(buffer.contents(), "first");
    }

    #[test]
    fn test_passing_body_completes() {
        let (unit, buffer) = captured();
        let outcome = unit.run("passes", |t| t.log("hello")).unwrap();
        assert!(outcome.passed());
        assert!(outcome.completed);
        assert!(outcome.panic.is_none());
        assert_eq!(buffer.contents(), "hello");
    }

    #[test]
    fn test_foreign_panic_is_recorded() {
        let (unit, _buffer) = captured();
        let outcome = unit.run("panics", |_| panic!("kaboom")).unwrap();
        assert!(outcome.failed);
        assert_eq!(outcome.panic.as_deref(), Some("kaboom"));
        assert_eq!(outcome.failures, vec!["panic: kaboom"]);
    }

    #[test]
    fn test_cleanups_run_lifo_after_body() {
        let (unit, buffer) = captured();
        unit.run("cleanups", |t| {
            let first = t.clone();
            t.on_cleanup(Box::new(move || first.log("registered first")));
            let second = t.clone();
            t.on_cleanup(Box::new(move || second.log("registered second")));
            t.log("body");
        })
        .unwrap();
        assert_eq!(
            buffer.lines(),
            vec!["body", "registered second", "registered first"]
        );
    }

    #[test]
    fn test_cleanups_run_after_abort() {
        let (unit, buffer) = captured();
        unit.run("abort-then-cleanup", |t| {
            let handle = t.clone();
            t.on_cleanup(Box::new(move || handle.log("cleaned")));
            t.fail("boom");
        })
        .unwrap();
        assert_eq!(buffer.lines(), vec!["boom", "cleaned"]);
    }

    #[test]
    fn test_cleanup_registered_during_cleanup_runs() {
        let (unit, buffer) = captured();
        unit.run("nested-cleanup", |t| {
            let outer = t.clone();
            t.on_cleanup(Box::new(move || {
                let inner = outer.clone();
                outer.on_cleanup(Box::new(move || inner.log("late")));
                outer.log("early");
            }));
        })
        .unwrap();
        assert_eq!(buffer.lines(), vec!["early", "late"]);
    }

    #[test]
    fn test_failing_cleanup_does_not_stop_others() {
        let (unit, buffer) = captured();
        let outcome = unit
            .run("cleanup-fails", |t| {
                let logger = t.clone();
                t.on_cleanup(Box::new(move || logger.log("still runs")));
                let failer = t.clone();
                t.on_cleanup(Box::new(move || failer.fail("cleanup failed")));
            })
            .unwrap();
        assert!(outcome.failed);
        assert_eq!(buffer.lines(), vec!["cleanup failed", "still runs"]);
    }

    #[test]
    fn test_state_resets_between_units() {
        let (unit, _buffer) = captured();
        let first = unit.run("first", |t| t.fail_quiet("bad")).unwrap();
        assert!(first.failed);
        let second = unit.run("second", |_| {}).unwrap();
        assert!(second.passed());
        assert!(second.failures.is_empty());
        assert!(unit.running().is_none());
    }

    #[test]
    fn test_nested_run_is_busy() {
        let (unit, _buffer) = captured();
        let nested = Mutex::new(None);
        unit.run("outer", |t| {
            *nested.lock() = Some(t.run("inner", |_| {}));
        })
        .unwrap();
        match nested.into_inner() {
            Some(Err(VouchError::Busy { running, requested })) => {
                assert_eq!(running, "outer");
                assert_eq!(requested, "inner");
            }
            other => panic!("expected busy error, got {:?}", other),
        }
    }

    #[test]
    fn test_worker_thread_is_named() {
        let (unit, _buffer) = captured();
        let seen = Mutex::new(None);
        unit.run("named", |_| {
            *seen.lock() = thread::current().name().map(str::to_owned);
        })
        .unwrap();
        assert_eq!(seen.into_inner().as_deref(), Some("vouch:named"));
    }

    #[test]
    fn test_cleanup_stack_drop_releases() {
        let fired = Arc::new(AtomicBool::new(false));
        {
            let mut stack = CleanupStack::new();
            let flag = fired.clone();
            stack.push(Box::new(move || flag.store(true, Ordering::SeqCst)));
            assert_eq!(stack.len(), 1);
        }
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_nul_in_unit_name_still_runs() {
        let (unit, _buffer) = captured();
        let seen = Mutex::new(None);
        let outcome = unit
            .run("a\0b", |_| {
                *seen.lock() = thread::current().name().map(str::to_owned);
            })
            .unwrap();
        assert!(outcome.passed());
        assert_eq!(outcome.name, "a\0b");
        assert_eq!(seen.into_inner().as_deref(), Some("vouch:a\\0b"));
    }

    #[test]
    fn test_dropping_last_handle_runs_cleanups() {
        let (unit, buffer) = captured();
        let link = unit.link();
        unit.on_cleanup(Box::new(move || link.log("released on drop")));
        unit.fail_quiet("outside run");
        drop(unit);
        assert_eq!(buffer.lines(), vec!["outside run", "released on drop"]);
    }

    /// Collects the field names of every event.
    #[derive(Clone, Default)]
    struct FieldNames(Arc<Mutex<Vec<Vec<String>>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FieldNames {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut names = Vec::new();
            let mut visit = |field: &tracing::field::Field, _value: &dyn fmt::Debug| {
                names.push(field.name().to_string())
            };
            event.record(&mut visit);
            self.0.lock().push(names);
        }
    }

    #[test]
    fn test_events_keep_a_single_message_field() {
        use tracing_subscriber::layer::SubscriberExt;

        let names = FieldNames::default();
        let subscriber = tracing_subscriber::registry().with(names.clone());
        tracing::subscriber::with_default(subscriber, || {
            let (unit, _buffer) = captured();
            unit.fail_quiet("recorded");
            let mut stack = CleanupStack::new();
            stack.push(Box::new(|| panic!("cleanup broke")));
            drop(stack);
        });

        let events = names.0.lock().clone();
        let has = |name: &str| events.iter().any(|fields| fields.iter().any(|f| f == name));
        assert!(has("failure"));
        assert!(has("panic"));
        for fields in &events {
            assert_eq!(fields.iter().filter(|f| *f == "message").count(), 1);
        }
    }
}
