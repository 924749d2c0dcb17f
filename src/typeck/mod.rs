//! Scope-local typing: name environments, the Java type model, and the
//! expression inferencer used by the closure builder.

pub mod env;
pub mod infer;
pub mod types;

pub use env::{BindingOrigin, SYNTHETIC_MODULE, TypeEnv};
pub use infer::Scope;
pub use types::{BUILTIN_CLASSES, JType};
