//! Callables of the attribute runtime: functions, properties, bound methods.

use super::object::Object;
use crate::errors::Fault;
use crate::value::{CallArgs, Value};
use std::fmt;
use std::sync::Arc;

/// Arguments handed to a function body.
///
/// `receiver` is the instance for calls made through a bound method or a
/// property accessor, `None` for plain calls.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub receiver: Option<&'a Object>,
    pub args: &'a CallArgs,
}

pub type FunctionBody = dyn Fn(&Invocation<'_>) -> Result<Value, Fault> + Send + Sync;

struct FunctionDef {
    module: String,
    qualname: String,
    builtin: bool,
    body: Box<FunctionBody>,
}

/// A named function defined in a module, possibly inside a class scope.
///
/// The qualified name mirrors where the function lives: `cpu_count` for a
/// module-level function, `TestObject.name` for a method.
#[derive(Clone)]
pub struct Function(Arc<FunctionDef>);

impl Function {
    pub fn new<F>(module: impl Into<String>, qualname: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        Self(Arc::new(FunctionDef {
            module: module.into(),
            qualname: qualname.into(),
            builtin: false,
            body: Box::new(body),
        }))
    }

    /// Same as [`Function::new`], flagged as a builtin.
    pub fn builtin<F>(module: impl Into<String>, qualname: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        Self(Arc::new(FunctionDef {
            module: module.into(),
            qualname: qualname.into(),
            builtin: true,
            body: Box::new(body),
        }))
    }

    /// Last segment of the qualified name.
    pub fn name(&self) -> &str {
        self.0
            .qualname
            .rsplit('.')
            .next()
            .unwrap_or(&self.0.qualname)
    }

    pub fn qualname(&self) -> &str {
        &self.0.qualname
    }

    /// Name of the defining module.
    pub fn module(&self) -> &str {
        &self.0.module
    }

    pub fn is_builtin(&self) -> bool {
        self.0.builtin
    }

    pub fn call(&self, receiver: Option<&Object>, args: &CallArgs) -> Result<Value, Fault> {
        (self.0.body)(&Invocation { receiver, args })
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("module", &self.0.module)
            .field("qualname", &self.0.qualname)
            .field("builtin", &self.0.builtin)
            .finish()
    }
}

#[derive(Debug)]
struct PropertyDef {
    getter: Function,
    setter: Option<Function>,
}

/// A getter/setter pair living on a class.
#[derive(Debug, Clone)]
pub struct Property(Arc<PropertyDef>);

impl Property {
    pub fn new(getter: Function) -> Self {
        Self(Arc::new(PropertyDef {
            getter,
            setter: None,
        }))
    }

    pub fn with_setter(getter: Function, setter: Function) -> Self {
        Self(Arc::new(PropertyDef {
            getter,
            setter: Some(setter),
        }))
    }

    pub fn getter(&self) -> &Function {
        &self.0.getter
    }

    pub fn setter(&self) -> Option<&Function> {
        self.0.setter.as_ref()
    }

    pub fn name(&self) -> &str {
        self.0.getter.name()
    }

    pub fn ptr_eq(&self, other: &Property) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A class function paired with the instance it was looked up on.
#[derive(Debug, Clone)]
pub struct BoundMethod {
    receiver: Object,
    function: Function,
}

impl BoundMethod {
    pub fn new(receiver: Object, function: Function) -> Self {
        Self { receiver, function }
    }

    pub fn receiver(&self) -> &Object {
        &self.receiver
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn name(&self) -> &str {
        self.function.name()
    }

    pub fn call(&self, args: &CallArgs) -> Result<Value, Fault> {
        self.function.call(Some(&self.receiver), args)
    }

    pub fn ptr_eq(&self, other: &BoundMethod) -> bool {
        self.receiver.ptr_eq(&other.receiver) && self.function.ptr_eq(&other.function)
    }
}
