//! Scoped interception of functions, methods and properties for tests.
//!
//! Code under test reaches its collaborators through a [`Runtime`]: modules,
//! classes and instances whose attributes live in swappable tables. An
//! [`Interposer`] replaces one attribute with a recording substitute,
//! configures what the substitute returns, declares how often it must be
//! called, and puts the original back when the [`Interception`] ends.
//!
//! ```rust
//! use interpose::testkit::fixtures::sample_runtime;
//! use interpose::{call_args, Interposer};
//! use serde_json::json;
//!
//! let sample = sample_runtime();
//! let wp = Interposer::new(sample.runtime.clone());
//! let obj = sample.test_object.instantiate();
//!
//! let name = wp
//!     .intercept(obj.method("name")?)?
//!     .expect_once()
//!     .set_return(0);
//! assert_eq!(obj.call_method("name", &call_args!())?, json!(0));
//! name.exit()?;
//!
//! assert_eq!(obj.call_method("name", &call_args!())?, json!("TestObject"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod errors;
pub mod expectation;
pub mod group;
pub mod interception;
pub mod interposer;
pub mod patch;
pub mod resolve;
pub mod runtime;
pub mod substitute;
pub mod testkit;
pub mod value;

pub use crate::config::InterposeConfig;
pub use crate::errors::{ErrorCode, Fault, InterposeError, Result};
pub use crate::expectation::{CountBound, ExpectCalls, Expectation, ValidationFailure};
pub use crate::group::{Group, GroupGuard};
pub use crate::interception::Interception;
pub use crate::interposer::Interposer;
pub use crate::resolve::Target;
pub use crate::runtime::{
    Attr, BoundMethod, Class, Function, Invocation, Module, Namespace, Object, Owner, Property,
    Runtime,
};
pub use crate::substitute::{
    AccessorRecorder, CallRecorder, RecordedCall, Response, SideEffect, Substitute,
};
pub use crate::value::{ArgMatcher, CallArgs, Value};
