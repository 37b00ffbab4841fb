//! Collective scope for several interceptions.
//!
//! While a group is active, every new interception registers with it and
//! skips its own teardown. Closing the outermost scope restores every member
//! first and validates afterwards, so a failing expectation never leaves
//! another member's substitute installed.
//!
//! Nested scopes only count depth. Validation failures are collected from all
//! members unless `collect_group_failures` is off, in which case the first
//! one wins.

use crate::errors::{InterposeError, Result};
use crate::interception::{report_teardown_failure, SharedRecord};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct GroupState {
    depth: usize,
    members: Vec<SharedRecord>,
}

/// Group coordinator owned by an [`Interposer`](crate::Interposer).
#[derive(Debug, Clone)]
pub struct Group {
    state: Arc<Mutex<GroupState>>,
    collect_failures: bool,
}

impl Group {
    pub fn new(collect_failures: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(GroupState::default())),
            collect_failures,
        }
    }

    /// Enter a (possibly nested) group scope. The outermost start drops any
    /// members left over from a scope closed without restoring.
    pub fn start(&self) {
        let mut state = self.state.lock();
        if state.depth == 0 {
            state.members.clear();
        }
        state.depth += 1;
        tracing::trace!(depth = state.depth, "group scope entered");
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().depth > 0
    }

    pub fn depth(&self) -> usize {
        self.state.lock().depth
    }

    /// Members registered in the current outermost scope.
    pub fn len(&self) -> usize {
        self.state.lock().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register `record` if a scope is active. Returns whether it was taken.
    pub(crate) fn register(&self, record: &SharedRecord) -> bool {
        let mut state = self.state.lock();
        if state.depth == 0 {
            return false;
        }
        state.members.push(Arc::clone(record));
        true
    }

    /// Leave a scope.
    ///
    /// Only the outermost close tears members down: every member is stopped
    /// in registration order, then every member is validated. With `restore`
    /// false the members are validated in place and the scope stays open.
    pub fn close(&self, restore: bool) -> Result<()> {
        if !restore {
            let members = self.state.lock().members.clone();
            return self.validate_members(&members);
        }

        let members = {
            let mut state = self.state.lock();
            if state.depth > 1 {
                state.depth -= 1;
                tracing::trace!(depth = state.depth, "nested group scope left");
                return Ok(());
            }
            state.depth = 0;
            std::mem::take(&mut state.members)
        };

        for member in &members {
            member.lock().stop();
        }
        self.validate_members(&members)
    }

    fn validate_members(&self, members: &[SharedRecord]) -> Result<()> {
        let mut failures = Vec::new();
        for member in members {
            if let Err(err) = member.lock().validate() {
                failures.push(err);
                if !self.collect_failures {
                    break;
                }
            }
        }

        tracing::debug!(
            members = members.len(),
            failures = failures.len(),
            "group validated"
        );
        into_outcome(failures)
    }
}

fn into_outcome(mut failures: Vec<InterposeError>) -> Result<()> {
    match failures.len() {
        0 => Ok(()),
        1 => Err(failures.remove(0)),
        _ => Err(InterposeError::Group(failures)),
    }
}

/// Scope guard returned by [`Interposer::together`](crate::Interposer::together).
///
/// Dropping it closes the scope; a validation failure then panics (or is
/// logged, with `strict_drop` off). Call [`GroupGuard::close`] to get the
/// result instead.
#[must_use = "dropping a GroupGuard closes the group immediately"]
#[derive(Debug)]
pub struct GroupGuard<'a> {
    group: &'a Group,
    strict_drop: bool,
    closed: bool,
}

impl<'a> GroupGuard<'a> {
    pub(crate) fn new(group: &'a Group, strict_drop: bool) -> Self {
        group.start();
        Self {
            group,
            strict_drop,
            closed: false,
        }
    }

    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.group.close(true)
    }
}

impl Drop for GroupGuard<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.group.close(true) {
            report_teardown_failure(&err, self.strict_drop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InterposeConfig;
    use crate::interception::Record;
    use crate::resolve::{resolve, Target};
    use crate::runtime::Runtime;
    use crate::ExpectCalls;
    use crate::Interception;
    use serde_json::json;

    fn record_for(runtime: &Runtime, path: &str, bounds: Option<ExpectCalls>) -> SharedRecord {
        let mut record = Record::new(runtime.clone(), InterposeConfig::default(), None);
        record
            .install(resolve(runtime, Target::path(path)).unwrap())
            .unwrap();
        let shared = Arc::new(Mutex::new(record));
        if let Some(bounds) = bounds {
            // Builders go through the public handle; keep it grouped so its
            // drop leaves teardown to the group.
            let handle = Interception::new(Arc::clone(&shared), true, true);
            drop(handle.expect(bounds));
        }
        shared
    }

    fn runtime() -> Runtime {
        let runtime = Runtime::new();
        let module = runtime.module("svc");
        module.def_function("a", |_| Ok(json!("a")));
        module.def_function("b", |_| Ok(json!("b")));
        runtime
    }

    #[test]
    fn test_register_requires_active_scope() {
        let runtime = runtime();
        let group = Group::new(true);
        let record = record_for(&runtime, "svc.a", None);

        assert!(!group.register(&record));
        group.start();
        assert!(group.register(&record));
        assert_eq!(group.len(), 1);
        group.close(true).unwrap();
        assert!(group.is_empty());
    }

    #[test]
    fn test_nested_close_keeps_members_installed() {
        let runtime = runtime();
        let group = Group::new(true);
        group.start();
        group.start();
        group.register(&record_for(&runtime, "svc.a", None));

        group.close(true).unwrap();
        assert_eq!(group.depth(), 1);
        assert!(runtime.import("svc").unwrap().getattr("a").unwrap().as_substitute().is_some());

        group.close(true).unwrap();
        assert!(!group.is_active());
        assert!(runtime.import("svc").unwrap().getattr("a").unwrap().as_substitute().is_none());
    }

    #[test]
    fn test_all_members_restored_before_failures_reported() {
        let runtime = runtime();
        let group = Group::new(true);
        group.start();
        group.register(&record_for(&runtime, "svc.a", Some(ExpectCalls::times(1))));
        group.register(&record_for(&runtime, "svc.b", Some(ExpectCalls::times(2))));

        let err = group.close(true).unwrap_err();

        assert!(matches!(&err, InterposeError::Group(errors) if errors.len() == 2));
        assert_eq!(err.validation_failures().len(), 2);
        let svc = runtime.import("svc").unwrap();
        assert!(svc.getattr("a").unwrap().as_substitute().is_none());
        assert!(svc.getattr("b").unwrap().as_substitute().is_none());
    }

    #[test]
    fn test_first_failure_only_when_not_collecting() {
        let runtime = runtime();
        let group = Group::new(false);
        group.start();
        group.register(&record_for(&runtime, "svc.a", Some(ExpectCalls::times(1))));
        group.register(&record_for(&runtime, "svc.b", Some(ExpectCalls::times(1))));

        let err = group.close(true).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.validation_failures()[0].path, "svc.a");
    }

    #[test]
    fn test_close_without_restore_validates_in_place() {
        let runtime = runtime();
        let group = Group::new(true);
        group.start();
        group.register(&record_for(&runtime, "svc.a", None));

        group.close(false).unwrap();
        assert!(group.is_active());
        assert_eq!(group.len(), 1);
        assert!(runtime.import("svc").unwrap().getattr("a").unwrap().as_substitute().is_some());

        group.close(true).unwrap();
        assert!(runtime.import("svc").unwrap().getattr("a").unwrap().as_substitute().is_none());
    }

    #[test]
    fn test_outermost_start_clears_stale_members() {
        let runtime = runtime();
        let group = Group::new(true);
        group.start();
        group.register(&record_for(&runtime, "svc.a", None));
        group.close(true).unwrap();

        group.start();
        assert!(group.is_empty());
        group.close(true).unwrap();
    }
}
