//! The interception record: one substitution, its substitute and its
//! expectation.
//!
//! An [`Interception`] is a scope guard. The substitute is installed when the
//! record is created; dropping it (or calling [`Interception::exit`]) restores
//! the original and validates the recorded calls. Records created while a
//! group is active leave teardown to the group.
//!
//! ```rust
//! use interpose::testkit::fixtures::sample_runtime;
//! use interpose::{call_args, Interposer, Target};
//! use serde_json::json;
//!
//! let sample = sample_runtime();
//! let wp = Interposer::new(sample.runtime.clone());
//!
//! let cpu = wp
//!     .intercept(Target::path("os.cpu_count"))?
//!     .expect_once()
//!     .set_return(12345);
//! assert_eq!(sample.os.call("cpu_count", &call_args!()), Ok(json!(12345)));
//! cpu.exit()?;
//! # Ok::<(), interpose::InterposeError>(())
//! ```

use crate::config::InterposeConfig;
use crate::errors::{Fault, InterposeError, Result};
use crate::expectation::{ExpectCalls, Expectation};
use crate::patch::AttrPatch;
use crate::resolve::{default_substitute, member_of, target_name, Resolved};
use crate::runtime::{Attr, Owner, Runtime};
use crate::substitute::{CallRecorder, RecordedCall, Response, SideEffect};
use crate::value::{ArgMatcher, CallArgs, Value};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

pub(crate) type SharedRecord = Arc<Mutex<Record>>;

/// State behind an [`Interception`], shared with the group it belongs to.
#[derive(Debug)]
pub(crate) struct Record {
    runtime: Runtime,
    config: InterposeConfig,
    owner: Option<Owner>,
    path: Option<String>,
    patch: Option<AttrPatch>,
    substitute: Option<Attr>,
    pending: Option<Response>,
    expectation: Expectation,
    validated: bool,
}

impl Record {
    pub(crate) fn new(
        runtime: Runtime,
        config: InterposeConfig,
        substitute: Option<Attr>,
    ) -> Self {
        Self {
            runtime,
            config,
            owner: None,
            path: None,
            patch: None,
            substitute,
            pending: None,
            expectation: Expectation::default(),
            validated: false,
        }
    }

    pub(crate) fn install(&mut self, resolved: Resolved) -> Result<()> {
        let (path, site, original) = match resolved {
            Resolved::Unpatched { owner } => {
                self.owner = owner;
                return Ok(());
            }
            Resolved::Patch {
                path,
                site,
                original,
            } => (path, site, original),
        };

        let substitute = self
            .substitute
            .clone()
            .unwrap_or_else(|| Attr::from(default_substitute(original.as_ref())));
        let patch = AttrPatch::start(&self.runtime, site, &path, substitute.clone())?;

        if let Some(recorder) = substitute.as_substitute().map(|s| s.recorder()) {
            if self.config.copy_target_names && recorder.name().is_none() {
                recorder.set_name(target_name(original.as_ref(), &path));
            }
            if let Some(response) = self.pending.take() {
                recorder.set_response(response);
            }
        }

        self.path = Some(path);
        self.patch = Some(patch);
        self.substitute = Some(substitute);
        Ok(())
    }

    fn recorder(&self) -> Option<CallRecorder> {
        self.substitute
            .as_ref()
            .and_then(Attr::as_substitute)
            .map(|s| s.recorder().clone())
    }

    fn set_response(&mut self, response: Response) {
        match (&self.substitute, self.recorder()) {
            (_, Some(recorder)) => recorder.set_response(response),
            (None, None) => self.pending = Some(response),
            (Some(other), None) => tracing::warn!(
                path = ?self.path,
                kind = other.kind(),
                "substitute does not record calls; response ignored"
            ),
        }
    }

    pub(crate) fn stop(&mut self) {
        let Some(patch) = self.patch.as_mut().filter(|p| p.is_active()) else {
            return;
        };
        if let Err(err) = patch.stop() {
            tracing::warn!(%err, "ignoring restoration error");
        }
    }

    pub(crate) fn validate(&mut self) -> Result<()> {
        let Some(path) = self.path.clone().filter(|_| self.patch.is_some()) else {
            return Ok(());
        };
        if self.validated || !self.expectation.is_declared() {
            return Ok(());
        }

        let recorder = self.recorder().ok_or_else(|| InterposeError::UnsupportedExpectation {
            path: path.clone(),
            substitute: self
                .substitute
                .as_ref()
                .map_or("nothing", Attr::kind)
                .to_string(),
        })?;

        self.expectation
            .check(&path, &recorder.calls(), self.config.max_reported_calls)?;
        self.validated = true;
        tracing::debug!("{} validated", path);
        Ok(())
    }

    pub(crate) fn stop_and_validate(&mut self) -> Result<()> {
        if self.patch.is_none() {
            return Ok(());
        }
        self.stop();
        self.validate()
    }
}

/// One active substitution.
///
/// Builder methods consume and return the record so they chain off
/// [`Interposer::intercept`](crate::Interposer::intercept).
#[must_use = "dropping an Interception restores the original immediately"]
#[derive(Debug)]
pub struct Interception {
    record: SharedRecord,
    grouped: bool,
    finished: bool,
    strict_drop: bool,
}

impl Interception {
    pub(crate) fn new(record: SharedRecord, grouped: bool, strict_drop: bool) -> Self {
        Self {
            record,
            grouped,
            finished: false,
            strict_drop,
        }
    }

    /// Patch the attribute `name` of a module, class or instance target.
    ///
    /// A record patches one attribute only; naming a second one is an error
    /// and restores the first, validating it and logging any mismatch.
    ///
    /// A property defined on an instance's class is patched on the class,
    /// where attribute reads look for it.
    pub fn member(mut self, name: &str) -> Result<Self> {
        let outcome = {
            let mut record = self.record.lock();
            let patched = record.path.clone().filter(|_| record.patch.is_some());
            match (patched, record.owner.clone()) {
                (Some(path), _) => Err(InterposeError::Repatch { path }),
                (None, Some(owner)) => record.install(member_of(owner, name)),
                (None, None) => Err(InterposeError::unsupported(format!(
                    "target has no attributes; cannot patch '{}'",
                    name
                ))),
            }
        };

        match outcome {
            Ok(()) => Ok(self),
            Err(err) => {
                if matches!(err, InterposeError::Repatch { .. }) && !self.grouped {
                    if let Err(first) = self.record.lock().stop_and_validate() {
                        tracing::error!(%first, "first patch failed validation before repatch");
                    }
                }
                self.finished = true;
                Err(err)
            }
        }
    }

    /// Return `value` from every call.
    pub fn set_return(self, value: impl Into<Value>) -> Self {
        self.record.lock().set_response(Response::Return(value.into()));
        self
    }

    /// Return `values` one per call, then raise [`Fault::Exhausted`].
    pub fn set_return_sequence(self, values: impl IntoIterator<Item = Value>) -> Self {
        self.record.lock().set_response(Response::sequence(values));
        self
    }

    /// Raise `fault` from every call.
    pub fn set_exception(self, fault: Fault) -> Self {
        self.record.lock().set_response(Response::Raise(fault));
        self
    }

    /// Run `f` in place of the original.
    pub fn set_side_effect<F>(self, f: F) -> Self
    where
        F: Fn(&CallArgs) -> std::result::Result<Value, Fault> + Send + Sync + 'static,
    {
        self.record
            .lock()
            .set_response(Response::SideEffect(SideEffect::new(f)));
        self
    }

    /// Declare call bounds; see [`ExpectCalls`].
    pub fn expect(self, bounds: ExpectCalls) -> Self {
        {
            let mut record = self.record.lock();
            record.expectation = bounds.to_expectation();
            if let Some(value) = bounds.return_value {
                record.set_response(Response::Return(value));
            } else if let Some(effect) = bounds.side_effect {
                record.set_response(Response::SideEffect(effect));
            }
        }
        self
    }

    /// Exactly one call, any arguments.
    pub fn expect_once(self) -> Self {
        self.expect(ExpectCalls::times(1))
    }

    /// Exactly one call with exactly `args`.
    pub fn expect_once_with(self, args: CallArgs) -> Self {
        {
            let mut record = self.record.lock();
            record.expectation.matcher = ArgMatcher::Exact(args);
            record.expectation.times = Some(1);
            record.expectation.min = None;
        }
        self
    }

    /// At least one call with exactly `args`.
    pub fn expect_with(self, args: CallArgs) -> Self {
        {
            let mut record = self.record.lock();
            record.expectation.matcher = ArgMatcher::Exact(args);
            record.expectation.min = Some(1);
        }
        self
    }

    /// No calls at all.
    pub fn expect_never(self) -> Self {
        self.expect(ExpectCalls::times(0))
    }

    /// Count only calls made with exactly `args`, keeping the bounds.
    pub fn with_args(self, args: CallArgs) -> Self {
        self.record.lock().expectation.matcher = ArgMatcher::Exact(args);
        self
    }

    /// Count calls with any arguments again, keeping the bounds.
    pub fn with_any_args(self) -> Self {
        self.record.lock().expectation.matcher = ArgMatcher::Any;
        self
    }

    /// Restore the original without validating. Idempotent.
    pub fn stop(&self) {
        self.record.lock().stop();
    }

    /// Check the recorded calls against the expectation. A failure is
    /// reported again on every call; once a check passes, later calls are
    /// no-ops.
    pub fn validate(&self) -> Result<()> {
        self.record.lock().validate()
    }

    /// Restore, then validate.
    pub fn stop_and_validate(&self) -> Result<()> {
        self.record.lock().stop_and_validate()
    }

    /// End the scope explicitly and return the validation outcome instead of
    /// panicking on drop.
    pub fn exit(mut self) -> Result<()> {
        let outcome = self.stop_and_validate();
        self.finished = true;
        outcome
    }

    /// Dotted path of the patched attribute, once one is patched.
    pub fn path(&self) -> Option<String> {
        self.record.lock().path.clone()
    }

    /// Whether the substitute is currently installed.
    pub fn is_patched(&self) -> bool {
        self.record
            .lock()
            .patch
            .as_ref()
            .is_some_and(AttrPatch::is_active)
    }

    /// Whether teardown is left to an active group.
    pub fn is_grouped(&self) -> bool {
        self.grouped
    }

    pub fn substitute(&self) -> Option<Attr> {
        self.record.lock().substitute.clone()
    }

    /// The recorder behind the substitute, when it is one.
    pub fn recorder(&self) -> Option<CallRecorder> {
        self.record.lock().recorder()
    }

    pub fn expectation(&self) -> Expectation {
        self.record.lock().expectation.clone()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.recorder().map(|r| r.calls()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.recorder().map_or(0, |r| r.call_count())
    }
}

impl fmt::Display for Interception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path();
        write!(f, "<Interception('{}')>", path.as_deref().unwrap_or("?"))
    }
}

impl Drop for Interception {
    fn drop(&mut self) {
        if self.finished || self.grouped {
            return;
        }
        if let Err(err) = self.record.lock().stop_and_validate() {
            report_teardown_failure(&err, self.strict_drop);
        }
    }
}

/// Surface a failure found during scope teardown.
///
/// While another panic is unwinding the failure is only logged, so the
/// original panic is the one reported.
pub(crate) fn report_teardown_failure(err: &InterposeError, strict: bool) {
    if std::thread::panicking() {
        tracing::error!(%err, "validation failed while unwinding");
        return;
    }
    if strict {
        panic!("{}", err);
    }
    tracing::error!(%err, "validation failed at scope exit");
}
