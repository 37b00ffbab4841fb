use crate::errors::Fault;
use crate::value::{CallArgs, Value};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

type SideEffectFn = dyn Fn(&CallArgs) -> Result<Value, Fault> + Send + Sync;

/// A function run in place of the original on every call.
#[derive(Clone)]
pub struct SideEffect(Arc<SideEffectFn>);

impl SideEffect {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&CallArgs) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, args: &CallArgs) -> Result<Value, Fault> {
        (self.0)(args)
    }
}

impl fmt::Debug for SideEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SideEffect(..)")
    }
}

/// What a substitute produces when invoked.
#[derive(Debug, Clone, Default)]
pub enum Response {
    /// Nothing configured: `Value::Null`.
    #[default]
    Default,
    Return(Value),
    Raise(Fault),
    SideEffect(SideEffect),
    /// Successive values, one per call; raises once drained.
    Sequence(Arc<Mutex<VecDeque<Value>>>),
}

impl Response {
    pub fn sequence(values: impl IntoIterator<Item = Value>) -> Self {
        Self::Sequence(Arc::new(Mutex::new(values.into_iter().collect())))
    }

    pub(crate) fn produce(&self, name: &str, args: &CallArgs) -> Result<Value, Fault> {
        match self {
            Self::Default => Ok(Value::Null),
            Self::Return(value) => Ok(value.clone()),
            Self::Raise(fault) => Err(fault.clone()),
            Self::SideEffect(effect) => effect.call(args),
            Self::Sequence(values) => values
                .lock()
                .pop_front()
                .ok_or_else(|| Fault::Exhausted(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_args;
    use serde_json::json;

    #[test]
    fn test_sequence_drains_then_raises() {
        let response = Response::sequence([json!(1), json!(2)]);
        let args = call_args!();
        assert_eq!(response.produce("next", &args), Ok(json!(1)));
        assert_eq!(response.produce("next", &args), Ok(json!(2)));
        assert_eq!(
            response.produce("next", &args),
            Err(Fault::Exhausted("next".into()))
        );
    }

    #[test]
    fn test_side_effect_sees_arguments() {
        let response = Response::SideEffect(SideEffect::new(|args| {
            Ok(json!(args.args.len()))
        }));
        assert_eq!(response.produce("f", &call_args!(1, 2, 3)), Ok(json!(3)));
    }

    #[test]
    fn test_default_and_raise() {
        let args = call_args!();
        assert_eq!(Response::Default.produce("f", &args), Ok(Value::Null));
        let fault = Fault::raised("IOError", "boom");
        assert_eq!(Response::Raise(fault.clone()).produce("f", &args), Err(fault));
    }
}
