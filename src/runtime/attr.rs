use super::function::{BoundMethod, Function, Property};
use super::object::{Class, Module, Object};
use crate::errors::Fault;
use crate::substitute::{AccessorRecorder, CallRecorder, Substitute};
use crate::value::{CallArgs, Value};

/// Anything that can sit in an attribute table.
#[derive(Debug, Clone)]
pub enum Attr {
    Value(Value),
    Function(Function),
    Method(BoundMethod),
    Property(Property),
    Module(Module),
    Class(Class),
    Object(Object),
    Substitute(Substitute),
}

impl Attr {
    /// Short kind label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::Function(_) => "function",
            Self::Method(_) => "method",
            Self::Property(_) => "property",
            Self::Module(_) => "module",
            Self::Class(_) => "class",
            Self::Object(_) => "object",
            Self::Substitute(s) => s.kind_name(),
        }
    }

    /// The name this attribute exposes about itself, if any.
    pub fn name(&self) -> Option<String> {
        match self {
            Self::Function(f) => Some(f.name().to_string()),
            Self::Method(m) => Some(m.name().to_string()),
            Self::Property(p) => Some(p.name().to_string()),
            Self::Module(m) => Some(m.name().to_string()),
            Self::Class(c) => Some(c.name().to_string()),
            Self::Substitute(s) => s.recorder().name(),
            Self::Value(_) | Self::Object(_) => None,
        }
    }

    /// Identity comparison: handles by pointer, plain values by equality.
    pub fn is_same(&self, other: &Attr) -> bool {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a.ptr_eq(b),
            (Self::Method(a), Self::Method(b)) => a.ptr_eq(b),
            (Self::Property(a), Self::Property(b)) => a.ptr_eq(b),
            (Self::Module(a), Self::Module(b)) => a.ptr_eq(b),
            (Self::Class(a), Self::Class(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Substitute(a), Self::Substitute(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn is_property(&self) -> bool {
        matches!(self, Self::Property(_))
    }

    pub fn as_substitute(&self) -> Option<&Substitute> {
        match self {
            Self::Substitute(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Call the attribute.
    ///
    /// Functions run without a receiver, bound methods with theirs.
    /// Substitutes record the call exactly as made.
    pub fn call(&self, args: &CallArgs) -> Result<Value, Fault> {
        match self {
            Self::Function(f) => f.call(None, args),
            Self::Method(m) => m.call(args),
            Self::Substitute(s) => s.recorder().invoke(args.clone()),
            other => Err(Fault::NotCallable(other.kind().to_string())),
        }
    }
}

impl From<Value> for Attr {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Function> for Attr {
    fn from(f: Function) -> Self {
        Self::Function(f)
    }
}

impl From<BoundMethod> for Attr {
    fn from(m: BoundMethod) -> Self {
        Self::Method(m)
    }
}

impl From<Property> for Attr {
    fn from(p: Property) -> Self {
        Self::Property(p)
    }
}

impl From<Module> for Attr {
    fn from(m: Module) -> Self {
        Self::Module(m)
    }
}

impl From<Class> for Attr {
    fn from(c: Class) -> Self {
        Self::Class(c)
    }
}

impl From<Object> for Attr {
    fn from(o: Object) -> Self {
        Self::Object(o)
    }
}

impl From<Substitute> for Attr {
    fn from(s: Substitute) -> Self {
        Self::Substitute(s)
    }
}

impl From<CallRecorder> for Attr {
    fn from(r: CallRecorder) -> Self {
        Self::Substitute(Substitute::Callable(r))
    }
}

impl From<AccessorRecorder> for Attr {
    fn from(r: AccessorRecorder) -> Self {
        Self::Substitute(Substitute::Accessor(r))
    }
}
