//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use tracing_subscriber::filter::LevelFilter;
use vouch::output::OutputBuffer;
use vouch::TestUnit;

/// A unit whose output lands in the returned buffer.
pub fn captured_unit() -> (TestUnit, OutputBuffer) {
    init_tracing();
    let buffer = OutputBuffer::new();
    (TestUnit::with_sink(buffer.clone()), buffer)
}

/// Routes the crate's internal events to the test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(LevelFilter::TRACE)
        .try_init();
}
