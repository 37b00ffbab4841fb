//! Test support for code that uses interpose.
//!
//! - [`fixtures`]: a small ready-made runtime (`os`, `app.TestObject`) used by
//!   the crate's own tests and doc examples.
//! - Assertion macros for `Result` and validation failures, exported at the
//!   crate root.
//! - [`init_test_tracing`]: route `tracing` output through the test harness.
//!
//! ```rust
//! use interpose::testkit::{fixtures::sample_runtime, init_test_tracing};
//! use interpose::{assert_result_ok, Interposer, Target};
//!
//! init_test_tracing();
//! let sample = sample_runtime();
//! let wp = Interposer::new(sample.runtime.clone());
//! let ix = assert_result_ok!(wp.intercept(Target::path("os.cpu_count")));
//! assert_result_ok!(ix.exit());
//! ```

pub mod assertions;
pub mod fixtures;

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static TRACING: OnceCell<()> = OnceCell::new();

/// Install a test-writer subscriber filtered by `RUST_LOG` (default `warn`).
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_tracing() {
    TRACING.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        // Another harness may already own the global subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
