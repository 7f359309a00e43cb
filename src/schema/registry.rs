//! The type registry: an arena of type metadata keyed by name.
//!
//! Types may reference each other cyclically (`Author` ↔ `Post`), so
//! references are stored by name and only chased when the registry is
//! finalized. Registration order is irrelevant for correctness but is
//! preserved for the exported schema document.

use arcstr::ArcStr;
use fnv::FnvHashMap;

use crate::{
    SchemaError,
    schema::meta::{TypeKind, TypeMeta},
    value::ScalarKind,
};

/// A mutable registry of type metadata, populated during the collection
/// phase.
///
/// The five built-in scalars are pre-registered. `finalize` consumes the
/// registry and produces an immutable [`RegistrySnapshot`] after checking
/// that every reference resolves.
pub struct TypeRegistry {
    types: FnvHashMap<ArcStr, TypeMeta>,
    order: Vec<ArcStr>,
}

impl TypeRegistry {
    /// Constructs a registry holding only the built-in scalars.
    pub fn new() -> Self {
        let mut registry = Self {
            types: FnvHashMap::default(),
            order: Vec::new(),
        };
        for kind in ScalarKind::ALL {
            let meta = TypeMeta::new(kind.name(), TypeKind::Scalar);
            registry.order.push(meta.name.clone());
            registry.types.insert(meta.name.clone(), meta);
        }
        registry
    }

    /// Registers a type, failing if the name is already taken.
    pub fn register(&mut self, meta: TypeMeta) -> Result<(), SchemaError> {
        if self.types.contains_key(&meta.name) {
            return Err(SchemaError::DuplicateType {
                name: meta.name.clone(),
            });
        }
        self.order.push(meta.name.clone());
        self.types.insert(meta.name.clone(), meta);
        Ok(())
    }

    /// Resolves a type reference by name.
    pub fn resolve_reference(&self, name: &str) -> Result<&TypeMeta, SchemaError> {
        self.types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType { name: name.into() })
    }

    /// Checks every stored reference and freezes the registry.
    pub fn finalize(self) -> Result<RegistrySnapshot, SchemaError> {
        for name in &self.order {
            let meta = &self.types[name];
            for field in &meta.fields {
                let dangling = |reference: &ArcStr| SchemaError::DanglingReference {
                    type_name: meta.name.clone(),
                    field_name: field.name.clone(),
                    reference: reference.clone(),
                };
                if !self.types.contains_key(&field.field_type.name) {
                    return Err(dangling(&field.field_type.name));
                }
                for arg in &field.arguments {
                    if !self.types.contains_key(&arg.arg_type.name) {
                        return Err(dangling(&arg.arg_type.name));
                    }
                }
                if let Some(bundle) = &field.args_bundle {
                    match self.types.get(bundle) {
                        Some(b) if b.kind == TypeKind::Args => {}
                        _ => return Err(dangling(bundle)),
                    }
                }
            }
        }
        log::debug!("type registry finalized with {} types", self.order.len());
        Ok(RegistrySnapshot {
            types: self.types,
            order: self.order,
        })
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// An immutable snapshot of the finalized registry.
///
/// Safe for unsynchronized concurrent reads; nothing mutates it after
/// [`TypeRegistry::finalize`] returns.
#[derive(Clone, Debug)]
pub struct RegistrySnapshot {
    types: FnvHashMap<ArcStr, TypeMeta>,
    order: Vec<ArcStr>,
}

impl RegistrySnapshot {
    /// Looks a type up by name.
    pub fn type_by_name(&self, name: &str) -> Option<&TypeMeta> {
        self.types.get(name)
    }

    /// Iterates all types in registration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeMeta> {
        self.order.iter().map(|name| &self.types[name])
    }

    /// Number of registered types, built-ins included.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the snapshot holds no types. Never true in practice, since
    /// built-ins are always present.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
