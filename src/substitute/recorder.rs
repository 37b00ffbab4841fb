use super::response::Response;
use super::Substitute;
use crate::errors::Fault;
use crate::runtime::{Attr, Namespace};
use crate::value::{CallArgs, Value};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Weak};

/// One invocation seen by a recorder.
///
/// `member` is `None` for a self-call (the recorder itself was called) and
/// the dotted member path for calls made through a child, e.g. `fetch` for
/// `recorder.child("fetch")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedCall {
    pub member: Option<String>,
    pub args: CallArgs,
}

impl RecordedCall {
    pub fn is_self_call(&self) -> bool {
        self.member.is_none()
    }
}

impl fmt::Display for RecordedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            Some(member) => write!(f, "call.{}{}", member, self.args),
            None => write!(f, "call{}", self.args),
        }
    }
}

#[derive(Default)]
struct RecorderState {
    name: Option<String>,
    response: Response,
    calls: Vec<RecordedCall>,
}

struct RecorderInner {
    state: Mutex<RecorderState>,
    children: Namespace,
    parent: Option<Weak<RecorderInner>>,
    member: Option<String>,
}

/// Call-recording substitute for functions and methods.
///
/// Every call is appended to the history before the configured
/// [`Response`] runs. Children created with [`CallRecorder::child`] record
/// their own calls and also report them to every ancestor, tagged with the
/// member path.
#[derive(Clone)]
pub struct CallRecorder(Arc<RecorderInner>);

impl Default for CallRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl CallRecorder {
    pub fn new() -> Self {
        Self(Arc::new(RecorderInner {
            state: Mutex::new(RecorderState::default()),
            children: Namespace::new(),
            parent: None,
            member: None,
        }))
    }

    pub fn named(name: impl Into<String>) -> Self {
        let recorder = Self::new();
        recorder.set_name(name);
        recorder
    }

    pub fn name(&self) -> Option<String> {
        self.0.state.lock().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.0.state.lock().name = Some(name.into());
    }

    /// Name for messages: the explicit name, else `substitute`.
    pub fn display_name(&self) -> String {
        self.name().unwrap_or_else(|| "substitute".to_string())
    }

    /// The recorder this one was created from via [`CallRecorder::child`].
    pub fn parent(&self) -> Option<CallRecorder> {
        self.0
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(CallRecorder)
    }

    /// Name under which this recorder hangs off its parent.
    pub fn member_name(&self) -> Option<&str> {
        self.0.member.as_deref()
    }

    pub fn children(&self) -> &Namespace {
        &self.0.children
    }

    /// Get or create the child recorder `name`.
    ///
    /// An entry under `name` that is not a call recorder is replaced.
    pub fn child(&self, name: &str) -> CallRecorder {
        if let Some(Attr::Substitute(Substitute::Callable(existing))) = self.0.children.get(name) {
            return existing;
        }
        let child = CallRecorder(Arc::new(RecorderInner {
            state: Mutex::new(RecorderState {
                name: Some(name.to_string()),
                ..RecorderState::default()
            }),
            children: Namespace::new(),
            parent: Some(Arc::downgrade(&self.0)),
            member: Some(name.to_string()),
        }));
        self.0.children.set(name, Attr::from(child.clone()));
        child
    }

    /// Current attribute `name`, creating a child recorder when absent.
    pub fn member(&self, name: &str) -> Attr {
        match self.0.children.get(name) {
            Some(attr) => attr,
            None => Attr::from(self.child(name)),
        }
    }

    /// Call the attribute `name` of this recorder.
    pub fn call_member(&self, name: &str, args: &CallArgs) -> Result<Value, Fault> {
        self.member(name).call(args)
    }

    pub fn set_response(&self, response: Response) {
        self.0.state.lock().response = response;
    }

    pub fn response(&self) -> Response {
        self.0.state.lock().response.clone()
    }

    /// Record a self-call and produce the configured response.
    pub fn invoke(&self, args: CallArgs) -> Result<Value, Fault> {
        self.record(&args);
        let (response, name) = {
            let state = self.0.state.lock();
            (state.response.clone(), state.name.clone())
        };
        response.produce(name.as_deref().unwrap_or("substitute"), &args)
    }

    fn push(&self, member: Option<String>, args: &CallArgs) {
        self.0.state.lock().calls.push(RecordedCall {
            member,
            args: args.clone(),
        });
    }

    fn record(&self, args: &CallArgs) {
        self.push(None, args);

        let mut member = self.0.member.clone();
        let mut parent = self.parent();
        loop {
            let (Some(owner), Some(path)) = (parent.take(), member.take()) else {
                break;
            };
            owner.push(Some(path.clone()), args);
            member = owner.0.member.as_ref().map(|m| format!("{}.{}", m, path));
            parent = owner.parent();
        }
    }

    /// Snapshot of the call history, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.0.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.0.state.lock().calls.len()
    }

    pub fn was_called(&self) -> bool {
        self.call_count() > 0
    }

    pub fn reset_calls(&self) {
        self.0.state.lock().calls.clear();
    }

    pub fn ptr_eq(&self, other: &CallRecorder) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for CallRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.state.lock();
        f.debug_struct("CallRecorder")
            .field("name", &state.name)
            .field("calls", &state.calls.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_args;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_invoke_records_before_responding() {
        let recorder = CallRecorder::named("send");
        recorder.set_response(Response::Raise(Fault::raised("IOError", "down")));

        let result = recorder.invoke(call_args!("payload"));

        assert!(result.is_err());
        assert_eq!(
            recorder.calls(),
            vec![RecordedCall {
                member: None,
                args: call_args!("payload"),
            }]
        );
    }

    #[test]
    fn test_child_calls_reach_every_ancestor() {
        let root = CallRecorder::named("client");
        let leaf = root.child("session").child("get");

        leaf.invoke(call_args!("/health")).unwrap();

        assert!(leaf.calls()[0].is_self_call());
        assert_eq!(root.child("session").calls()[0].member.as_deref(), Some("get"));
        let root_calls = root.calls();
        assert_eq!(root_calls.len(), 1);
        assert_eq!(root_calls[0].member.as_deref(), Some("session.get"));
        assert_eq!(root_calls[0].to_string(), r#"call.session.get("/health")"#);
    }

    #[test]
    fn test_child_is_reused() {
        let root = CallRecorder::new();
        let a = root.child("x");
        let b = root.child("x");
        assert!(a.ptr_eq(&b));
        assert!(b.parent().is_some_and(|p| p.ptr_eq(&root)));
        assert_eq!(b.member_name(), Some("x"));
    }

    #[test]
    fn test_call_member_uses_existing_entry() {
        let root = CallRecorder::new();
        root.children().set("limit", Attr::from(json!(5)));
        assert!(root.call_member("limit", &call_args!()).is_err());
        assert!(matches!(root.member("limit"), Attr::Value(v) if v == json!(5)));
    }

    #[test]
    fn test_reset_and_display_name() {
        let recorder = CallRecorder::new();
        assert_eq!(recorder.display_name(), "substitute");
        recorder.invoke(call_args!()).unwrap();
        assert!(recorder.was_called());
        recorder.reset_calls();
        assert_eq!(recorder.call_count(), 0);
    }
}
