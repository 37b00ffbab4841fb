//! Sample runtime shared by tests and examples.

use crate::runtime::{Class, Module, Runtime};
use serde_json::json;

/// Handles into the runtime built by [`sample_runtime`].
#[derive(Debug, Clone)]
pub struct SampleRuntime {
    pub runtime: Runtime,
    /// `os` with `cpu_count() -> 8` and `getpid() -> 4242`.
    pub os: Module,
    /// `app` with the `TestObject` class and a `VERSION` value.
    pub app: Module,
    /// `app.TestObject`: method `name() -> "TestObject"`, property `age -> 1`,
    /// method `greet(who) -> "hello, <who>"`.
    pub test_object: Class,
}

pub fn sample_runtime() -> SampleRuntime {
    let runtime = Runtime::new();

    let os = runtime.module("os");
    os.def_function("cpu_count", |_| Ok(json!(8)));
    os.def_function("getpid", |_| Ok(json!(4242)));

    let app = runtime.module("app");
    app.define("VERSION", json!("1.0"));
    let test_object = app.def_class("TestObject");
    test_object.def_method("name", |_| Ok(json!("TestObject")));
    test_object.def_property("age", |_| Ok(json!(1)));
    test_object.def_method("greet", |call| {
        let who = call.args.get(0).and_then(|v| v.as_str()).unwrap_or("world");
        Ok(json!(format!("hello, {}", who)))
    });

    SampleRuntime {
        runtime,
        os,
        app,
        test_object,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_args;

    #[test]
    fn test_sample_runtime_behaves_unpatched() {
        let sample = sample_runtime();
        let obj = sample.test_object.instantiate();

        assert_eq!(sample.os.call("cpu_count", &call_args!()), Ok(json!(8)));
        assert_eq!(obj.call_method("name", &call_args!()), Ok(json!("TestObject")));
        assert_eq!(obj.get("age"), Ok(json!(1)));
        assert_eq!(
            obj.call_method("greet", &call_args!("bob")),
            Ok(json!("hello, bob"))
        );
        assert_eq!(sample.app.get("VERSION"), Ok(json!("1.0")));
    }
}
