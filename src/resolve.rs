//! Target resolution: from a reference to the attribute that gets replaced.
//!
//! Resolution rules, in priority order:
//!
//! 1. A property resolves through its getter's qualified name, so reads and
//!    writes share the class-level patch point.
//! 2. A bound method patches the instance's own table, which makes the
//!    override per-instance.
//! 3. A function resolves through its qualified name: `Class.method` finds
//!    the class in the defining module, a bare name patches the module.
//! 4. A substitute resolves through the parent/member it was created from.
//! 5. A string is a fully-qualified dotted path, resolved when the patch
//!    starts.
//! 6. Modules, classes, instances and plain values are not patched; a
//!    member is named later with
//!    [`Interception::member`](crate::Interception::member).

use crate::errors::{InterposeError, Result};
use crate::patch::PatchSite;
use crate::runtime::{Attr, BoundMethod, Class, Function, Module, Object, Owner, Property, Runtime};
use crate::substitute::{AccessorRecorder, CallRecorder, Substitute};
use crate::value::Value;

/// A reference to something that can be intercepted.
#[derive(Debug, Clone)]
pub enum Target {
    Method(BoundMethod),
    Function(Function),
    Property(Property),
    Substitute(Substitute),
    Path(String),
    Module(Module),
    Class(Class),
    Object(Object),
    Value(Value),
}

impl Target {
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }
}

/// Outcome of resolving a [`Target`].
#[derive(Debug)]
pub(crate) enum Resolved {
    Patch {
        path: String,
        site: PatchSite,
        original: Option<Attr>,
    },
    Unpatched {
        owner: Option<Owner>,
    },
}

pub(crate) fn resolve(runtime: &Runtime, target: Target) -> Result<Resolved> {
    match target {
        Target::Property(property) => resolve_function(runtime, property.getter()),
        Target::Method(method) => Ok(member_of(
            Owner::Object(method.receiver().clone()),
            method.name(),
        )),
        Target::Function(function) => resolve_function(runtime, &function),
        Target::Substitute(substitute) => resolve_substitute(&substitute),
        Target::Path(path) => Ok(Resolved::Patch {
            site: PatchSite::Path(path.clone()),
            path,
            original: None,
        }),
        Target::Module(module) => Ok(Resolved::Unpatched {
            owner: Some(Owner::Module(module)),
        }),
        Target::Class(class) => Ok(Resolved::Unpatched {
            owner: Some(Owner::Class(class)),
        }),
        Target::Object(object) => Ok(Resolved::Unpatched {
            owner: Some(Owner::Object(object)),
        }),
        Target::Value(_) => Ok(Resolved::Unpatched { owner: None }),
    }
}

/// Resolve `name` on a known owner.
///
/// Instance reads consult class-level properties (and accessor substitutes)
/// before the instance table, so those are patched on the class.
pub(crate) fn member_of(owner: Owner, name: &str) -> Resolved {
    let owner = match owner {
        Owner::Object(object) if is_class_accessor(&object, name) => {
            Owner::Class(object.class().clone())
        }
        other => other,
    };
    let original = owner.lookup(name);
    Resolved::Patch {
        path: format!("{}.{}", owner.label(), name),
        site: PatchSite::Member {
            owner,
            name: name.to_string(),
        },
        original,
    }
}

fn is_class_accessor(object: &Object, name: &str) -> bool {
    matches!(
        object.class().namespace().get(name),
        Some(Attr::Property(_)) | Some(Attr::Substitute(Substitute::Accessor(_)))
    )
}

fn resolve_function(runtime: &Runtime, function: &Function) -> Result<Resolved> {
    let module = runtime.import(function.module())?;
    match function.qualname().rsplit_once('.') {
        Some((scope, name)) => {
            let owner = scope
                .split('.')
                .try_fold(Owner::Module(module), |owner, segment| owner.descend(segment))?;
            Ok(member_of(owner, name))
        }
        None => Ok(member_of(Owner::Module(module), function.qualname())),
    }
}

fn resolve_substitute(substitute: &Substitute) -> Result<Resolved> {
    let recorder = substitute.recorder();
    match (recorder.parent(), recorder.member_name()) {
        (Some(parent), Some(name)) => Ok(member_of(Owner::Substitute(parent), name)),
        _ => Err(InterposeError::unsupported(format!(
            "substitute '{}' has no parent to patch",
            recorder.display_name()
        ))),
    }
}

/// Recorder kind for an original: accessor for properties, call recorder
/// for everything else.
pub(crate) fn default_substitute(original: Option<&Attr>) -> Substitute {
    match original {
        Some(attr) if attr.is_property() => Substitute::accessor(),
        _ => Substitute::callable(),
    }
}

/// Name the substitute would carry: the original's own name, else the last
/// path segment.
pub(crate) fn target_name(original: Option<&Attr>, path: &str) -> String {
    original
        .and_then(Attr::name)
        .unwrap_or_else(|| path.rsplit('.').next().unwrap_or(path).to_string())
}

impl From<BoundMethod> for Target {
    fn from(method: BoundMethod) -> Self {
        Self::Method(method)
    }
}

impl From<Function> for Target {
    fn from(function: Function) -> Self {
        Self::Function(function)
    }
}

impl From<Property> for Target {
    fn from(property: Property) -> Self {
        Self::Property(property)
    }
}

impl From<Substitute> for Target {
    fn from(substitute: Substitute) -> Self {
        Self::Substitute(substitute)
    }
}

impl From<CallRecorder> for Target {
    fn from(recorder: CallRecorder) -> Self {
        Self::Substitute(Substitute::Callable(recorder))
    }
}

impl From<AccessorRecorder> for Target {
    fn from(accessor: AccessorRecorder) -> Self {
        Self::Substitute(Substitute::Accessor(accessor))
    }
}

impl From<Module> for Target {
    fn from(module: Module) -> Self {
        Self::Module(module)
    }
}

impl From<Class> for Target {
    fn from(class: Class) -> Self {
        Self::Class(class)
    }
}

impl From<Object> for Target {
    fn from(object: Object) -> Self {
        Self::Object(object)
    }
}

impl From<&str> for Target {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for Target {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<Attr> for Target {
    fn from(attr: Attr) -> Self {
        match attr {
            Attr::Value(v) => Self::Value(v),
            Attr::Function(f) => Self::Function(f),
            Attr::Method(m) => Self::Method(m),
            Attr::Property(p) => Self::Property(p),
            Attr::Module(m) => Self::Module(m),
            Attr::Class(c) => Self::Class(c),
            Attr::Object(o) => Self::Object(o),
            Attr::Substitute(s) => Self::Substitute(s),
        }
    }
}
