// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Embedded host code carried by `Action` and `HostExpr` nodes.

use std::fmt;
use std::sync::Arc;

use crate::Value;

/// Read-only view of the names visible to host code.
pub trait Bindings {
    fn lookup(&self, name: &str) -> Option<Value>;
}

type NativeFn = dyn Fn(&dyn Bindings) -> Result<Value, String> + Send + Sync;

/// An opaque callback supplied by the embedding application.
#[derive(Clone)]
pub struct NativeHost {
    label: String,
    func: Arc<NativeFn>,
}

impl NativeHost {
    pub fn new<F>(label: impl Into<String>, func: F) -> Self
    where
        F: Fn(&dyn Bindings) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            func: Arc::new(func),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn call(&self, bindings: &dyn Bindings) -> Result<Value, String> {
        (self.func)(bindings)
    }
}

impl fmt::Debug for NativeHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeHost({})", self.label)
    }
}

/// Host code: source text for the action evaluator, or a native callback.
#[derive(Debug, Clone)]
pub enum HostCode {
    Source(String),
    Native(NativeHost),
}

impl HostCode {
    /// Text shown in listings and error messages.
    pub fn describe(&self) -> &str {
        match self {
            HostCode::Source(text) => text,
            HostCode::Native(native) => native.label(),
        }
    }
}

impl From<&str> for HostCode {
    fn from(text: &str) -> Self {
        HostCode::Source(text.to_string())
    }
}

impl From<String> for HostCode {
    fn from(text: String) -> Self {
        HostCode::Source(text)
    }
}

impl From<NativeHost> for HostCode {
    fn from(native: NativeHost) -> Self {
        HostCode::Native(native)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for HostCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStructVariant;
        match self {
            HostCode::Source(text) => serializer.serialize_newtype_variant("HostCode", 0, "Source", text),
            HostCode::Native(native) => {
                let mut s = serializer.serialize_struct_variant("HostCode", 1, "Native", 1)?;
                s.serialize_field("label", native.label())?;
                s.end()
            }
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for HostCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        enum Repr {
            Source(String),
        }
        let Repr::Source(text) = Repr::deserialize(deserializer)?;
        Ok(HostCode::Source(text))
    }
}
