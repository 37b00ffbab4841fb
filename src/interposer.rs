//! Entry point: creates interceptions against a runtime and owns the group.

use crate::config::InterposeConfig;
use crate::errors::Result;
use crate::group::{Group, GroupGuard};
use crate::interception::{Interception, Record};
use crate::resolve::{resolve, Target};
use crate::runtime::{Attr, Runtime};
use parking_lot::Mutex;
use std::sync::Arc;

/// Creates [`Interception`]s and coordinates group scopes.
///
/// ```rust
/// use interpose::testkit::fixtures::sample_runtime;
/// use interpose::{call_args, Interposer, Target};
///
/// let sample = sample_runtime();
/// let wp = Interposer::new(sample.runtime.clone());
///
/// wp.run_together(|| {
///     let _cpu = wp.intercept(Target::path("os.cpu_count"))?.expect_once().set_return(1);
///     sample.os.call("cpu_count", &call_args!()).ok();
///     Ok(())
/// })?;
/// # Ok::<(), interpose::InterposeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Interposer {
    runtime: Runtime,
    config: InterposeConfig,
    group: Group,
}

impl Interposer {
    pub fn new(runtime: Runtime) -> Self {
        Self::with_config(runtime, InterposeConfig::default())
    }

    pub fn with_config(runtime: Runtime, config: InterposeConfig) -> Self {
        let group = Group::new(config.collect_group_failures);
        Self {
            runtime,
            config,
            group,
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn config(&self) -> &InterposeConfig {
        &self.config
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    /// Intercept `target` with a default substitute: an accessor recorder
    /// for properties, a call recorder for everything else.
    pub fn intercept(&self, target: impl Into<Target>) -> Result<Interception> {
        self.start(target.into(), None)
    }

    /// Intercept `target` with a caller-supplied replacement.
    ///
    /// Expectations can only be validated when the replacement is a
    /// recorder.
    pub fn intercept_with(
        &self,
        target: impl Into<Target>,
        substitute: impl Into<Attr>,
    ) -> Result<Interception> {
        self.start(target.into(), Some(substitute.into()))
    }

    fn start(&self, target: Target, substitute: Option<Attr>) -> Result<Interception> {
        let mut record = Record::new(self.runtime.clone(), self.config.clone(), substitute);
        record.install(resolve(&self.runtime, target)?)?;

        let record = Arc::new(Mutex::new(record));
        let grouped = self.group.register(&record);
        Ok(Interception::new(record, grouped, self.config.strict_drop))
    }

    /// Open a group scope that lasts until the guard is closed or dropped.
    pub fn together(&self) -> GroupGuard<'_> {
        GroupGuard::new(&self.group, self.config.strict_drop)
    }

    /// Run `f` inside a group scope.
    ///
    /// The group is closed even when `f` fails; an error from `f` takes
    /// precedence over validation failures.
    pub fn run_together<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let guard = self.together();
        let outcome = f();
        let closed = guard.close();
        let value = outcome?;
        closed.map(|()| value)
    }

    /// Wrap `f` so that every call runs inside its own group scope.
    pub fn wrap_together<'a, A, T, F>(&'a self, f: F) -> impl Fn(A) -> Result<T> + 'a
    where
        F: Fn(A) -> Result<T> + 'a,
    {
        move |arg| self.run_together(|| f(arg))
    }

    /// Close the outermost group scope by hand.
    pub fn validate(&self, restore: bool) -> Result<()> {
        self.group.close(restore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_args;
    use crate::errors::{ErrorCode, InterposeError};
    use crate::testkit::fixtures::sample_runtime;
    use serde_json::json;

    #[test]
    fn test_intercept_outside_group_is_not_grouped() {
        let sample = sample_runtime();
        let wp = Interposer::new(sample.runtime.clone());
        let ix = wp.intercept(Target::path("os.cpu_count")).unwrap();
        assert!(!ix.is_grouped());
        assert!(wp.group().is_empty());
        ix.exit().unwrap();
    }

    #[test]
    fn test_failed_resolution_registers_nothing() {
        let sample = sample_runtime();
        let wp = Interposer::new(sample.runtime.clone());
        let guard = wp.together();

        let err = wp.intercept(Target::path("os.missing")).unwrap_err();

        assert_eq!(err.code(), ErrorCode::RESOLUTION_MISSING_ATTRIBUTE);
        assert!(wp.group().is_empty());
        guard.close().unwrap();
    }

    #[test]
    fn test_run_together_prefers_body_error() {
        let sample = sample_runtime();
        let wp = Interposer::new(sample.runtime.clone());

        let err = wp
            .run_together(|| {
                let _ix = wp.intercept(Target::path("os.cpu_count"))?.expect_once();
                Err::<(), _>(InterposeError::config("body failed"))
            })
            .unwrap_err();

        assert!(matches!(err, InterposeError::Config { .. }));
        assert!(!wp.group().is_active());
        assert_eq!(sample.os.call("cpu_count", &call_args!()), Ok(json!(8)));
    }

    #[test]
    fn test_wrap_together_scopes_each_call() {
        let sample = sample_runtime();
        let wp = Interposer::new(sample.runtime.clone());
        let os = sample.os.clone();

        let wrapped = wp.wrap_together(|n: i64| {
            let _ix = wp
                .intercept(Target::path("os.cpu_count"))?
                .expect_once()
                .set_return(n);
            Ok(os.call("cpu_count", &call_args!()).ok())
        });

        assert_eq!(wrapped(3).unwrap(), Some(json!(3)));
        assert_eq!(wrapped(4).unwrap(), Some(json!(4)));
        assert_eq!(sample.os.call("cpu_count", &call_args!()), Ok(json!(8)));
    }

    #[test]
    fn test_manual_validate_closes_group() {
        let sample = sample_runtime();
        let wp = Interposer::new(sample.runtime.clone());
        wp.group().start();
        let _ix = wp.intercept(Target::path("os.cpu_count")).unwrap().expect_never();

        sample.os.call("cpu_count", &call_args!()).unwrap();

        let err = wp.validate(true).unwrap_err();
        assert_eq!(err.code(), ErrorCode::VALIDATION_MISMATCH);
        assert_eq!(sample.os.call("cpu_count", &call_args!()), Ok(json!(8)));
    }
}
