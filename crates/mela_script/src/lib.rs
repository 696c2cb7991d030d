//! Runtime reflection over native Rust values.
//!
//! A [`TypeSystem`] maps native types to descriptors listing attributes,
//! methods, constructors, converters and iteration. A [`DynObject`] pairs a
//! value with its descriptor and exposes all of that by name.

mod builder;
mod callable;
mod descriptor;
pub mod errors;
mod holder;
mod object;
mod provider;
mod registry;

pub use builder::TypeBuilder;
pub use callable::{MutMethod, RefMethod, StaticMethod};
pub use descriptor::{Overload, TypeDesc, TypeTag};
pub use errors::{ScriptError, ScriptResult};
pub use holder::{Policy, Storage};
pub use object::DynObject;
pub use provider::{StdTypeProvider, TypeProvider};
pub use registry::{RegistryId, TypeSystem};
