//! Install/restore primitive for a single attribute.
//!
//! A started [`AttrPatch`] remembers the owner's own entry for the attribute
//! (not an inherited one) and puts exactly that back on stop. When the owner
//! had no entry of its own, stop removes the substitute so lookups fall back
//! to the class again.

use crate::errors::{InterposeError, Result};
use crate::runtime::{Attr, Owner, Runtime};

/// Where a patch goes.
#[derive(Debug, Clone)]
pub enum PatchSite {
    /// A named attribute of a known owner.
    Member { owner: Owner, name: String },
    /// A dotted path, resolved against the runtime when the patch starts.
    Path(String),
}

/// One installed substitution.
#[derive(Debug)]
pub struct AttrPatch {
    owner: Owner,
    name: String,
    path: String,
    saved: Option<Attr>,
    active: bool,
}

impl AttrPatch {
    /// Resolve the site and install `substitute` immediately.
    pub fn start(runtime: &Runtime, site: PatchSite, path: &str, substitute: Attr) -> Result<Self> {
        let (owner, name) = match site {
            PatchSite::Member { owner, name } => (owner, name),
            PatchSite::Path(dotted) => runtime.resolve_path(&dotted)?,
        };

        if owner.lookup(&name).is_none() {
            return Err(InterposeError::missing_attribute(owner.label(), &name));
        }

        let namespace = owner.namespace();
        let saved = namespace.get(&name);
        namespace.set(name.clone(), substitute);
        tracing::debug!(path, replaced = ?saved.as_ref().map(Attr::kind), "installed substitute");

        Ok(Self {
            owner,
            name,
            path: path.to_string(),
            saved,
            active: true,
        })
    }

    /// Put the saved entry back. Stopping an inactive patch is an error the
    /// caller may ignore.
    pub fn stop(&mut self) -> Result<()> {
        if !self.active {
            return Err(InterposeError::Restoration {
                path: self.path.clone(),
            });
        }

        let namespace = self.owner.namespace();
        match self.saved.take() {
            Some(original) => {
                namespace.set(self.name.clone(), original);
            }
            None => {
                namespace.remove(&self.name);
            }
        }
        self.active = false;
        tracing::debug!(path = %self.path, "restored original");
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_args;
    use crate::errors::ErrorCode;
    use crate::substitute::CallRecorder;
    use serde_json::json;

    #[test]
    fn test_start_and_stop_module_function() {
        let runtime = Runtime::new();
        let os = runtime.module("os");
        let original = os.def_function("cpu_count", |_| Ok(json!(4)));
        let recorder = CallRecorder::new();

        let mut patch = AttrPatch::start(
            &runtime,
            PatchSite::Path("os.cpu_count".into()),
            "os.cpu_count",
            Attr::from(recorder.clone()),
        )
        .unwrap();

        os.call("cpu_count", &call_args!()).unwrap();
        assert_eq!(recorder.call_count(), 1);

        patch.stop().unwrap();
        assert!(!patch.is_active());
        assert!(os
            .getattr("cpu_count")
            .unwrap()
            .is_same(&Attr::Function(original)));
    }

    #[test]
    fn test_instance_patch_is_removed_on_stop() {
        let runtime = Runtime::new();
        let class = runtime.module("app").def_class("Thing");
        class.def_method("name", |_| Ok(json!("Thing")));
        let obj = class.instantiate();

        let mut patch = AttrPatch::start(
            &runtime,
            PatchSite::Member {
                owner: Owner::Object(obj.clone()),
                name: "name".into(),
            },
            "<Thing object>.name",
            Attr::from(json!("patched")),
        )
        .unwrap();
        assert!(obj.namespace().contains("name"));

        patch.stop().unwrap();
        assert!(!obj.namespace().contains("name"));
        assert_eq!(obj.call_method("name", &call_args!()), Ok(json!("Thing")));
    }

    #[test]
    fn test_second_stop_is_restoration_error() {
        let runtime = Runtime::new();
        runtime.module("m").define("x", json!(1));
        let mut patch = AttrPatch::start(
            &runtime,
            PatchSite::Path("m.x".into()),
            "m.x",
            Attr::from(json!(2)),
        )
        .unwrap();

        patch.stop().unwrap();
        let err = patch.stop().unwrap_err();
        assert_eq!(err.code(), ErrorCode::RESTORATION_INACTIVE);
    }

    #[test]
    fn test_missing_attribute_is_not_created() {
        let runtime = Runtime::new();
        let module = runtime.module("m");
        let err = AttrPatch::start(
            &runtime,
            PatchSite::Path("m.absent".into()),
            "m.absent",
            Attr::from(json!(0)),
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RESOLUTION_MISSING_ATTRIBUTE);
        assert!(!module.namespace().contains("absent"));
    }
}
