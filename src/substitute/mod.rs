//! Substitutes: the recording stand-ins installed in place of originals.
//!
//! - [`CallRecorder`] replaces functions and methods.
//! - [`AccessorRecorder`] replaces properties; reads are recorded as calls
//!   without arguments, writes as calls with the assigned value.
//!
//! Both keep their history after the interception that installed them is
//! stopped, which is what lets validation run after restoration.

pub mod recorder;
pub mod response;

pub use recorder::{CallRecorder, RecordedCall};
pub use response::{Response, SideEffect};

use crate::errors::Fault;
use crate::value::{CallArgs, Value};
use std::fmt;

/// Property substitute. Shares its history and response with the wrapped
/// [`CallRecorder`].
#[derive(Clone, Default)]
pub struct AccessorRecorder(CallRecorder);

impl AccessorRecorder {
    pub fn new() -> Self {
        Self(CallRecorder::new())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self(CallRecorder::named(name))
    }

    pub fn recorder(&self) -> &CallRecorder {
        &self.0
    }

    /// A property read.
    pub fn read(&self) -> Result<Value, Fault> {
        self.0.invoke(CallArgs::new())
    }

    /// A property assignment. The response still runs, so a configured
    /// exception is raised on write too.
    pub fn write(&self, value: Value) -> Result<(), Fault> {
        self.0.invoke(CallArgs::new().arg(value)).map(|_| ())
    }
}

impl fmt::Debug for AccessorRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessorRecorder").field(&self.0).finish()
    }
}

/// The two recorder variants.
#[derive(Debug, Clone)]
pub enum Substitute {
    Callable(CallRecorder),
    Accessor(AccessorRecorder),
}

impl Substitute {
    pub fn callable() -> Self {
        Self::Callable(CallRecorder::new())
    }

    pub fn accessor() -> Self {
        Self::Accessor(AccessorRecorder::new())
    }

    /// The underlying call history and response.
    pub fn recorder(&self) -> &CallRecorder {
        match self {
            Self::Callable(r) => r,
            Self::Accessor(a) => a.recorder(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Callable(_) => "CallRecorder",
            Self::Accessor(_) => "AccessorRecorder",
        }
    }

    pub fn ptr_eq(&self, other: &Substitute) -> bool {
        match (self, other) {
            (Self::Callable(a), Self::Callable(b)) => a.ptr_eq(b),
            (Self::Accessor(a), Self::Accessor(b)) => a.recorder().ptr_eq(b.recorder()),
            _ => false,
        }
    }
}

impl From<CallRecorder> for Substitute {
    fn from(r: CallRecorder) -> Self {
        Self::Callable(r)
    }
}

impl From<AccessorRecorder> for Substitute {
    fn from(a: AccessorRecorder) -> Self {
        Self::Accessor(a)
    }
}
