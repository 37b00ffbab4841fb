//! Call values: positional/keyword arguments and argument matchers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub use serde_json::Value;

/// Positional and keyword arguments of one call.
///
/// Keyword arguments are kept sorted, so two calls compare equal regardless
/// of the order their keywords were supplied in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallArgs {
    pub args: Vec<Value>,
    pub kwargs: BTreeMap<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a keyword argument.
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    /// Positional argument by index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    pub fn keyword(&self, key: &str) -> Option<&Value> {
        self.kwargs.get(key)
    }
}

impl fmt::Display for CallArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let positional = self.args.iter().map(Value::to_string);
        let keywords = self.kwargs.iter().map(|(k, v)| format!("{}={}", k, v));
        let rendered: Vec<String> = positional.chain(keywords).collect();
        write!(f, "({})", rendered.join(", "))
    }
}

/// Build [`CallArgs`] from positional values and `key = value` keywords.
///
/// ```rust
/// use interpose::call_args;
///
/// let args = call_args!(1, "two"; retries = 3);
/// assert_eq!(args.to_string(), r#"(1, "two", retries=3)"#);
/// assert!(call_args!().is_empty());
/// ```
#[macro_export]
macro_rules! call_args {
    () => {
        $crate::CallArgs::new()
    };
    ($($arg:expr),* $(; $($key:ident = $val:expr),* $(,)?)?) => {
        $crate::CallArgs::new()
            $(.arg($arg))*
            $($(.kwarg(stringify!($key), $val))*)?
    };
}

/// Argument signature an expectation counts calls against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ArgMatcher {
    /// Every recorded call counts, including calls through child members.
    #[default]
    Any,
    /// Only self-calls with exactly these arguments count.
    Exact(CallArgs),
}

impl ArgMatcher {
    pub fn matches(&self, member: Option<&str>, args: &CallArgs) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => member.is_none() && expected == args,
        }
    }
}

impl fmt::Display for ArgMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "ANY"),
            Self::Exact(args) => write!(f, "call{}", args),
        }
    }
}

impl From<CallArgs> for ArgMatcher {
    fn from(args: CallArgs) -> Self {
        Self::Exact(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kwarg_order_does_not_affect_equality() {
        let a = CallArgs::new().kwarg("b", 2).kwarg("a", 1);
        let b = call_args!(; a = 1, b = 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_display_renders_like_a_call() {
        let args = call_args!(json!([1, 2]), true; name = "x");
        assert_eq!(args.to_string(), r#"([1,2], true, name="x")"#);
        assert_eq!(ArgMatcher::Exact(args).to_string(), r#"call([1,2], true, name="x")"#);
        assert_eq!(ArgMatcher::Any.to_string(), "ANY");
    }

    #[test]
    fn test_exact_matcher_ignores_member_calls() {
        let matcher = ArgMatcher::from(call_args!(1));
        assert!(matcher.matches(None, &call_args!(1)));
        assert!(!matcher.matches(Some("child"), &call_args!(1)));
        assert!(!matcher.matches(None, &call_args!(2)));
        assert!(ArgMatcher::Any.matches(Some("child"), &call_args!(2)));
    }

    #[test]
    fn test_accessors() {
        let args = call_args!(10; timeout = 5);
        assert_eq!(args.get(0), Some(&json!(10)));
        assert_eq!(args.keyword("timeout"), Some(&json!(5)));
        assert_eq!(args.get(1), None);
    }
}
