//! Schema assembly.
//!
//! `assemble` is a pure combination of a finalized registry snapshot and
//! finalized resolver bindings. It never fails on its own; every failure
//! mode belongs to the upstream finalization steps.

use arcstr::ArcStr;
use serde::Serialize;

use crate::{
    resolve::{Binding, MUTATION_TYPE, QUERY_TYPE, ResolverBindings},
    schema::{meta::TypeMeta, registry::RegistrySnapshot},
};

/// One resolver binding, reduced to its serializable identity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BindingSummary {
    /// Owning type name.
    pub type_name: ArcStr,
    /// Field name.
    pub field_name: ArcStr,
    /// Service class the handler is dispatched through, if any.
    pub service: Option<ArcStr>,
}

/// The assembled, immutable description of all types and fields.
///
/// Types appear in registration order and fields in declaration order, so
/// serialization and schema-language export are deterministic.
#[derive(Clone, Debug, Serialize)]
pub struct SchemaDocument {
    types: Vec<TypeMeta>,
    query_type: Option<ArcStr>,
    mutation_type: Option<ArcStr>,
    resolvers: Vec<BindingSummary>,
}

impl SchemaDocument {
    /// All types in registration order, built-ins included.
    pub fn types(&self) -> &[TypeMeta] {
        &self.types
    }

    /// Looks a type up by name.
    pub fn type_by_name(&self, name: &str) -> Option<&TypeMeta> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Name of the root query type, if one was declared.
    pub fn query_type(&self) -> Option<&str> {
        self.query_type.as_deref()
    }

    /// Name of the root mutation type, if one was declared.
    pub fn mutation_type(&self) -> Option<&str> {
        self.mutation_type.as_deref()
    }

    /// All resolver bindings, ordered by type registration then field
    /// declaration.
    pub fn resolvers(&self) -> &[BindingSummary] {
        &self.resolvers
    }

    /// Whether the given field resolves through an explicit resolver
    /// rather than default property access.
    pub fn has_resolver(&self, type_name: &str, field_name: &str) -> bool {
        self.resolvers
            .iter()
            .any(|r| r.type_name == type_name && r.field_name == field_name)
    }

    /// Renders the schema-definition-language form of this document.
    pub fn to_sdl(&self) -> String {
        super::translate::to_sdl(self)
    }
}

/// Combines a registry snapshot and resolver bindings into one document.
///
/// Deterministic and side-effect-free: the same inputs always produce the
/// same document.
pub fn assemble(snapshot: &RegistrySnapshot, bindings: &ResolverBindings) -> SchemaDocument {
    let types: Vec<TypeMeta> = snapshot.types().cloned().collect();
    let mut resolvers = Vec::new();
    for meta in &types {
        for field in &meta.fields {
            if let Binding::Resolver(bound) = bindings.bind(&meta.name, &field.name) {
                resolvers.push(BindingSummary {
                    type_name: meta.name.clone(),
                    field_name: field.name.clone(),
                    service: bound.resolver().service.clone(),
                });
            }
        }
    }
    SchemaDocument {
        query_type: types
            .iter()
            .any(|t| t.name == QUERY_TYPE)
            .then(|| QUERY_TYPE.into()),
        mutation_type: types
            .iter()
            .any(|t| t.name == MUTATION_TYPE)
            .then(|| MUTATION_TYPE.into()),
        types,
        resolvers,
    }
}
