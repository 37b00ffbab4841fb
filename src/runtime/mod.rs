//! The attribute runtime that interceptions operate on.
//!
//! Code under test reaches its collaborators through [`Module`]s, [`Class`]es
//! and [`Object`]s registered with a [`Runtime`]. Every lookup goes through an
//! attribute table, so swapping a table entry is enough to intercept a
//! function, a method or a property for every caller at once.
//!
//! ```rust
//! use interpose::runtime::Runtime;
//! use interpose::call_args;
//! use serde_json::json;
//!
//! let runtime = Runtime::new();
//! let os = runtime.module("os");
//! os.def_function("cpu_count", |_| Ok(json!(8)));
//!
//! assert_eq!(os.call("cpu_count", &call_args!()), Ok(json!(8)));
//! assert!(runtime.import("os").is_ok());
//! ```

pub mod attr;
pub mod function;
pub mod namespace;
pub mod object;

pub use attr::Attr;
pub use function::{BoundMethod, Function, FunctionBody, Invocation, Property};
pub use namespace::Namespace;
pub use object::{Class, Module, Object};

use crate::errors::{InterposeError, Result};
use crate::substitute::{CallRecorder, Substitute};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Registry of modules by dotted name.
#[derive(Clone, Default)]
pub struct Runtime {
    modules: Arc<RwLock<HashMap<String, Module>>>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module, replacing any module of the same name.
    pub fn register(&self, module: Module) -> Module {
        self.modules
            .write()
            .insert(module.name().to_string(), module.clone());
        module
    }

    /// Get a registered module, creating and registering it if needed.
    pub fn module(&self, name: &str) -> Module {
        if let Some(module) = self.modules.read().get(name) {
            return module.clone();
        }
        self.modules
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Module::new(name))
            .clone()
    }

    pub fn import(&self, name: &str) -> Result<Module> {
        self.modules
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| InterposeError::unknown_module(name))
    }

    /// Split `a.b.Owner.attr` into the owner it names and the final segment.
    ///
    /// The longest registered module prefix wins; remaining segments are
    /// walked through attribute tables.
    pub fn resolve_path(&self, path: &str) -> Result<(Owner, String)> {
        let (owner_path, name) = path.rsplit_once('.').ok_or_else(|| {
            InterposeError::unsupported(format!("'{}' is not a dotted attribute path", path))
        })?;
        Ok((self.resolve_owner(owner_path)?, name.to_string()))
    }

    /// Resolve a dotted path that names a module, class, instance or
    /// substitute.
    pub fn resolve_owner(&self, path: &str) -> Result<Owner> {
        let segments: Vec<&str> = path.split('.').collect();
        for cut in (1..=segments.len()).rev() {
            let module_name = segments[..cut].join(".");
            let Some(module) = self.modules.read().get(&module_name).cloned() else {
                continue;
            };
            return segments[cut..]
                .iter()
                .try_fold(Owner::Module(module), |owner, segment| owner.descend(segment));
        }
        Err(InterposeError::unknown_module(segments[0]))
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.modules.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("Runtime").field("modules", &names).finish()
    }
}

/// Something whose attribute table can be patched.
#[derive(Debug, Clone)]
pub enum Owner {
    Module(Module),
    Class(Class),
    Object(Object),
    Substitute(CallRecorder),
}

impl Owner {
    /// Name used when building a dotted path for diagnostics.
    pub fn label(&self) -> String {
        match self {
            Self::Module(m) => m.name().to_string(),
            Self::Class(c) => c.name().to_string(),
            Self::Object(o) => format!("{:?}", o),
            Self::Substitute(r) => r.display_name(),
        }
    }

    /// The table a patch writes into.
    pub fn namespace(&self) -> Namespace {
        match self {
            Self::Module(m) => m.namespace().clone(),
            Self::Class(c) => c.namespace().clone(),
            Self::Object(o) => o.namespace().clone(),
            Self::Substitute(r) => r.children().clone(),
        }
    }

    /// Current value of `name` as seen through this owner, without binding.
    ///
    /// Substitutes grow a child on first access, like attribute access on a
    /// recorder does.
    pub fn lookup(&self, name: &str) -> Option<Attr> {
        match self {
            Self::Module(m) => m.namespace().get(name),
            Self::Class(c) => c.namespace().get(name),
            Self::Object(o) => o.lookup(name),
            Self::Substitute(r) => Some(r.member(name)),
        }
    }

    pub(crate) fn descend(self, segment: &str) -> Result<Owner> {
        match self.lookup(segment) {
            Some(attr) => Owner::try_from(attr).map_err(|attr| {
                InterposeError::unsupported(format!(
                    "'{}.{}' is a {} and has no attributes to patch",
                    self.label(),
                    segment,
                    attr.kind()
                ))
            }),
            None => Err(InterposeError::missing_attribute(self.label(), segment)),
        }
    }
}

impl TryFrom<Attr> for Owner {
    type Error = Attr;

    fn try_from(attr: Attr) -> std::result::Result<Self, Attr> {
        match attr {
            Attr::Module(m) => Ok(Self::Module(m)),
            Attr::Class(c) => Ok(Self::Class(c)),
            Attr::Object(o) => Ok(Self::Object(o)),
            Attr::Substitute(Substitute::Callable(r)) => Ok(Self::Substitute(r)),
            other => Err(other),
        }
    }
}
