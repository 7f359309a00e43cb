//! Schema metadata, the type registry, and schema assembly.

pub mod meta;
pub mod model;
pub mod registry;
pub mod translate;

pub use self::{
    model::{BindingSummary, SchemaDocument, assemble},
    registry::{RegistrySnapshot, TypeRegistry},
};
