//! Modules, classes and instances.
//!
//! Attribute lookup follows the usual descriptor rules:
//!
//! - reading an instance attribute consults class-level data descriptors
//!   (properties and accessor substitutes) first, then the instance table,
//!   then the class table;
//! - functions found on the class are bound to the instance;
//! - substitutes are never bound, so they see exactly the arguments the
//!   caller passed.

use super::attr::Attr;
use super::function::{BoundMethod, Function, Invocation, Property};
use super::namespace::Namespace;
use crate::errors::Fault;
use crate::substitute::Substitute;
use crate::value::{CallArgs, Value};
use std::fmt;
use std::sync::Arc;

struct ModuleDef {
    name: String,
    attrs: Namespace,
}

/// A named module holding functions, classes and values.
#[derive(Clone)]
pub struct Module(Arc<ModuleDef>);

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Arc::new(ModuleDef {
            name: name.into(),
            attrs: Namespace::new(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn namespace(&self) -> &Namespace {
        &self.0.attrs
    }

    pub fn define(&self, name: impl Into<String>, attr: impl Into<Attr>) -> &Self {
        self.0.attrs.set(name, attr.into());
        self
    }

    /// Define a module-level function and return it.
    pub fn def_function<F>(&self, name: &str, body: F) -> Function
    where
        F: Fn(&Invocation<'_>) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        let function = Function::new(self.name(), name, body);
        self.define(name, function.clone());
        function
    }

    /// Define a class in this module and return it.
    pub fn def_class(&self, name: &str) -> Class {
        let class = Class::new(self.name(), name);
        self.define(name, class.clone());
        class
    }

    pub fn getattr(&self, name: &str) -> Result<Attr, Fault> {
        self.0
            .attrs
            .get(name)
            .ok_or_else(|| Fault::missing_attribute(format!("module {}", self.name()), name))
    }

    /// Read a plain value attribute.
    pub fn get(&self, name: &str) -> Result<Value, Fault> {
        expect_value(name, self.getattr(name)?)
    }

    /// Call `module.name(args)`.
    pub fn call(&self, name: &str, args: &CallArgs) -> Result<Value, Fault> {
        self.getattr(name)?.call(args)
    }

    pub fn ptr_eq(&self, other: &Module) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<module '{}'>", self.name())
    }
}

struct ClassDef {
    name: String,
    module: String,
    attrs: Namespace,
}

/// A class: a named attribute table shared by its instances.
#[derive(Clone)]
pub struct Class(Arc<ClassDef>);

impl Class {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self(Arc::new(ClassDef {
            name: name.into(),
            module: module.into(),
            attrs: Namespace::new(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Name of the defining module.
    pub fn module(&self) -> &str {
        &self.0.module
    }

    pub fn namespace(&self) -> &Namespace {
        &self.0.attrs
    }

    pub fn define(&self, name: impl Into<String>, attr: impl Into<Attr>) -> &Self {
        self.0.attrs.set(name, attr.into());
        self
    }

    fn qualify(&self, name: &str) -> String {
        format!("{}.{}", self.name(), name)
    }

    /// Define a method; its qualified name is `Class.name`.
    pub fn def_method<F>(&self, name: &str, body: F) -> Function
    where
        F: Fn(&Invocation<'_>) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        let function = Function::new(self.module(), self.qualify(name), body);
        self.define(name, function.clone());
        function
    }

    /// Define a read-only property.
    pub fn def_property<F>(&self, name: &str, getter: F) -> Property
    where
        F: Fn(&Invocation<'_>) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        let property = Property::new(Function::new(self.module(), self.qualify(name), getter));
        self.define(name, property.clone());
        property
    }

    /// Define a property with a setter. The setter receives the new value as
    /// its single positional argument.
    pub fn def_property_with_setter<G, S>(&self, name: &str, getter: G, setter: S) -> Property
    where
        G: Fn(&Invocation<'_>) -> Result<Value, Fault> + Send + Sync + 'static,
        S: Fn(&Invocation<'_>) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        let property = Property::with_setter(
            Function::new(self.module(), self.qualify(name), getter),
            Function::new(self.module(), self.qualify(name), setter),
        );
        self.define(name, property.clone());
        property
    }

    /// Raw class attribute: methods come back unbound, properties as
    /// property objects.
    pub fn getattr(&self, name: &str) -> Result<Attr, Fault> {
        self.0
            .attrs
            .get(name)
            .ok_or_else(|| Fault::missing_attribute(self.name(), name))
    }

    /// Call a class attribute directly, without a receiver.
    pub fn call(&self, name: &str, args: &CallArgs) -> Result<Value, Fault> {
        self.getattr(name)?.call(args)
    }

    pub fn instantiate(&self) -> Object {
        Object(Arc::new(ObjectDef {
            class: self.clone(),
            attrs: Namespace::new(),
        }))
    }

    pub fn ptr_eq(&self, other: &Class) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class '{}.{}'>", self.module(), self.name())
    }
}

struct ObjectDef {
    class: Class,
    attrs: Namespace,
}

/// An instance of a [`Class`] with its own attribute table.
#[derive(Clone)]
pub struct Object(Arc<ObjectDef>);

impl Object {
    pub fn class(&self) -> &Class {
        &self.0.class
    }

    /// The instance's own table (not including class attributes).
    pub fn namespace(&self) -> &Namespace {
        &self.0.attrs
    }

    pub fn define(&self, name: impl Into<String>, attr: impl Into<Attr>) -> &Self {
        self.0.attrs.set(name, attr.into());
        self
    }

    /// Raw lookup: instance table, then class table, with no binding.
    pub fn lookup(&self, name: &str) -> Option<Attr> {
        self.0
            .attrs
            .get(name)
            .or_else(|| self.class().namespace().get(name))
    }

    /// Attribute access as `instance.name` would see it.
    pub fn getattr(&self, name: &str) -> Result<Attr, Fault> {
        let class_attr = self.class().namespace().get(name);

        match &class_attr {
            Some(Attr::Property(property)) => {
                return property
                    .getter()
                    .call(Some(self), &CallArgs::new())
                    .map(Attr::Value);
            }
            Some(Attr::Substitute(Substitute::Accessor(accessor))) => {
                return accessor.read().map(Attr::Value);
            }
            _ => {}
        }

        if let Some(attr) = self.0.attrs.get(name) {
            return Ok(attr);
        }

        match class_attr {
            Some(Attr::Function(function)) => {
                Ok(Attr::Method(BoundMethod::new(self.clone(), function)))
            }
            Some(attr) => Ok(attr),
            None => Err(Fault::missing_attribute(self.class().name(), name)),
        }
    }

    /// Read a value attribute or property.
    pub fn get(&self, name: &str) -> Result<Value, Fault> {
        expect_value(name, self.getattr(name)?)
    }

    /// Assign `instance.name = value`.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), Fault> {
        let value = value.into();
        match self.class().namespace().get(name) {
            Some(Attr::Property(property)) => match property.setter() {
                Some(setter) => setter
                    .call(Some(self), &CallArgs::new().arg(value))
                    .map(|_| ()),
                None => Err(Fault::ReadOnly(name.to_string())),
            },
            Some(Attr::Substitute(Substitute::Accessor(accessor))) => accessor.write(value),
            _ => {
                self.0.attrs.set(name, Attr::Value(value));
                Ok(())
            }
        }
    }

    /// Call `instance.name(args)`.
    pub fn call_method(&self, name: &str, args: &CallArgs) -> Result<Value, Fault> {
        self.getattr(name)?.call(args)
    }

    /// Look up a class function bound to this instance.
    pub fn method(&self, name: &str) -> Result<BoundMethod, Fault> {
        match self.class().namespace().get(name) {
            Some(Attr::Function(function)) => Ok(BoundMethod::new(self.clone(), function)),
            Some(other) => Err(Fault::raised(
                "TypeError",
                format!("'{}' is a {}, not a method", name, other.kind()),
            )),
            None => Err(Fault::missing_attribute(self.class().name(), name)),
        }
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} object>", self.class().name())
    }
}

fn expect_value(name: &str, attr: Attr) -> Result<Value, Fault> {
    match attr {
        Attr::Value(value) => Ok(value),
        other => Err(Fault::raised(
            "TypeError",
            format!("'{}' is a {}, not a value", name, other.kind()),
        )),
    }
}
