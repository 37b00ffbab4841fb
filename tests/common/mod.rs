// Shared setup for interpose integration tests
#![allow(dead_code)]

use interpose::testkit::fixtures::{sample_runtime, SampleRuntime};
use interpose::testkit::init_test_tracing;
use interpose::{InterposeConfig, Interposer};

/// Fresh sample runtime plus an interposer over it.
pub fn setup() -> (SampleRuntime, Interposer) {
    setup_with(InterposeConfig::default())
}

pub fn setup_with(config: InterposeConfig) -> (SampleRuntime, Interposer) {
    init_test_tracing();
    let sample = sample_runtime();
    let wp = Interposer::with_config(sample.runtime.clone(), config);
    (sample, wp)
}
