//! Declared call contracts and their validation against recorded history.

use crate::substitute::{RecordedCall, SideEffect};
use crate::value::{ArgMatcher, Value};
use serde::Serialize;
use std::fmt;

/// Count bound that failed, as reported in a [`ValidationFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CountBound {
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
}

impl fmt::Display for CountBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "{}", n),
            Self::AtLeast(n) => write!(f, "at least {}", n),
            Self::AtMost(n) => write!(f, "at the most {}", n),
        }
    }
}

/// A count or argument mismatch found at validation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    /// Dotted path of the intercepted attribute.
    pub path: String,
    /// Rendered argument matcher, `ANY` or `call(...)`.
    pub expected_call: String,
    pub bound: CountBound,
    /// Number of calls that matched the signature.
    pub actual: usize,
    /// Rendered recorded calls, truncated to the configured limit.
    pub recorded: Vec<String>,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expect {} called with {} {} times, actual: {}",
            self.path, self.expected_call, self.bound, self.actual
        )?;
        if !self.recorded.is_empty() {
            write!(f, "\n    recorded: {}", self.recorded.join(", "))?;
        }
        Ok(())
    }
}

/// Count and argument contract attached to an interception.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expectation {
    pub times: Option<usize>,
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub matcher: ArgMatcher,
    /// Count only calls made on the substitute itself.
    pub self_only: bool,
}

impl Expectation {
    /// Whether any count bound has been declared.
    pub fn is_declared(&self) -> bool {
        self.times.is_some() || self.min.is_some() || self.max.is_some()
    }

    /// Recorded calls that count toward the bounds.
    pub fn matching<'a>(&self, calls: &'a [RecordedCall]) -> Vec<&'a RecordedCall> {
        calls
            .iter()
            .filter(|call| self.matcher.matches(call.member.as_deref(), &call.args))
            .filter(|call| !self.self_only || call.is_self_call())
            .collect()
    }

    /// Check `calls` against the bounds; exact count first, then minimum,
    /// then maximum.
    pub fn check(
        &self,
        path: &str,
        calls: &[RecordedCall],
        max_reported: usize,
    ) -> Result<(), ValidationFailure> {
        let actual = self.matching(calls).len();

        let violated = [
            self.times
                .filter(|&n| actual != n)
                .map(CountBound::Exactly),
            self.min.filter(|&n| actual < n).map(CountBound::AtLeast),
            self.max.filter(|&n| actual > n).map(CountBound::AtMost),
        ]
        .into_iter()
        .flatten()
        .next();

        match violated {
            None => Ok(()),
            Some(bound) => Err(ValidationFailure {
                path: path.to_string(),
                expected_call: self.matcher.to_string(),
                bound,
                actual,
                recorded: calls
                    .iter()
                    .take(max_reported)
                    .map(ToString::to_string)
                    .collect(),
            }),
        }
    }
}

/// Arguments of [`Interception::expect`](crate::Interception::expect).
///
/// The default asks for at least one call with any arguments. Setting an
/// exact count drops the minimum.
///
/// ```rust
/// use interpose::ExpectCalls;
///
/// let bounds = ExpectCalls::times(2).at_most(5);
/// assert_eq!(bounds.min, None);
/// assert_eq!(ExpectCalls::default().min, Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct ExpectCalls {
    pub times: Option<usize>,
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub return_value: Option<Value>,
    pub side_effect: Option<SideEffect>,
    pub self_only: bool,
}

impl Default for ExpectCalls {
    fn default() -> Self {
        Self {
            times: None,
            min: Some(1),
            max: None,
            return_value: None,
            side_effect: None,
            self_only: false,
        }
    }
}

impl ExpectCalls {
    /// Exactly `n` calls.
    pub fn times(n: usize) -> Self {
        Self {
            times: Some(n),
            ..Self::default()
        }
    }

    pub fn at_least(mut self, n: usize) -> Self {
        self.min = Some(n);
        self
    }

    pub fn at_most(mut self, n: usize) -> Self {
        self.max = Some(n);
        self
    }

    /// No lower bound.
    pub fn any_number(mut self) -> Self {
        self.min = None;
        self
    }

    pub fn returning(mut self, value: impl Into<Value>) -> Self {
        self.return_value = Some(value.into());
        self
    }

    pub fn side_effect(mut self, effect: SideEffect) -> Self {
        self.side_effect = Some(effect);
        self
    }

    pub fn self_only(mut self) -> Self {
        self.self_only = true;
        self
    }

    /// The count/matcher part, with the exact count overriding the minimum.
    pub(crate) fn to_expectation(&self) -> Expectation {
        Expectation {
            times: self.times,
            min: if self.times.is_some() { None } else { self.min },
            max: self.max,
            matcher: ArgMatcher::Any,
            self_only: self.self_only,
        }
    }
}
