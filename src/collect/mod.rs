//! Declaration collection.
//!
//! Declarations for types and fields arrive in arbitrary order from two
//! producers: the structural-annotation builders in [`annotate`] and the
//! schema-document parser in [`document`]. Both emit the same normalized
//! record shapes defined here; nothing downstream of the collector can tell
//! the two modes apart.

pub mod annotate;
pub mod document;

use arcstr::ArcStr;
use indexmap::IndexMap;

use crate::{
    SchemaError,
    ast::Nullability,
    schema::meta::{Argument, DeprecationStatus, Field, TypeKind, TypeMeta},
    types::name::Name,
    value::Value,
};

pub use annotate::{ArgAnnotation, FieldAnnotation, ObjectAnnotation, ScanOptions, StructuralHint};
pub use document::declare_document;

/// Marker type name emitted by a numeric structural hint that carries no
/// integer/float discriminator. Always rejected at submission.
pub(crate) const AMBIGUOUS_NUMBER: &str = "__AmbiguousNumber";

/// Where a declaration came from, for error reporting.
///
/// A site is an opaque human-readable label, typically `file:line` for
/// annotations or `document:line:column` for parsed schema text.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DeclarationSite(ArcStr);

impl DeclarationSite {
    /// Creates a site from its label.
    pub fn new(label: impl Into<ArcStr>) -> Self {
        Self(label.into())
    }

    /// The site label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeclarationSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for DeclarationSite {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

/// Nullability shorthand, as producers declare it.
///
/// The unspecified default is non-nullable on every axis.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NullableSpec {
    /// Non-nullable value; for lists, non-nullable items too.
    #[default]
    NonNull,
    /// The value itself may be null.
    Outer,
    /// Innermost list items may be null; the list itself may not.
    Items,
    /// Both the list and its innermost items may be null.
    ItemsAndList,
}

/// A normalized type declaration record.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDeclaration {
    /// Declared type name.
    pub name: ArcStr,
    /// Declared kind.
    pub kind: TypeKind,
    /// Optional description.
    pub description: Option<ArcStr>,
    /// Deprecation marker.
    pub deprecation: DeprecationStatus,
    /// Declaration site.
    pub site: DeclarationSite,
}

/// A normalized argument declaration, owned by a field declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct ArgumentDeclaration {
    /// Argument name.
    pub name: ArcStr,
    /// Referenced type name.
    pub type_name: ArcStr,
    /// List depth of the reference.
    pub list_depth: usize,
    /// Nullability shorthand.
    pub nullable: NullableSpec,
    /// Explicit items-nullability override, if any.
    pub items_non_null: Option<bool>,
    /// Declared default.
    pub default_value: Option<Value>,
    /// Optional description.
    pub description: Option<ArcStr>,
    /// Opaque validation-constraint tags.
    pub constraints: Vec<ArcStr>,
}

/// A normalized field declaration record.
///
/// This is the exact shape both producers emit: owner type, field name, a
/// type reference given as name + list depth + nullability, and optional
/// default/description/deprecation metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDeclaration {
    /// Name of the owning type.
    pub owner_type: ArcStr,
    /// Field name, unique within the owning type.
    pub field_name: ArcStr,
    /// Referenced type name.
    pub type_name: ArcStr,
    /// List depth of the reference.
    pub list_depth: usize,
    /// Nullability shorthand.
    pub nullable: NullableSpec,
    /// Explicit items-nullability override, if any. `Some(true)` together
    /// with an items-nullable shorthand is a contradiction and rejected.
    pub items_non_null: Option<bool>,
    /// Declared default.
    pub default_value: Option<Value>,
    /// Optional description.
    pub description: Option<ArcStr>,
    /// Deprecation marker.
    pub deprecation: DeprecationStatus,
    /// Individually declared arguments.
    pub arguments: Vec<ArgumentDeclaration>,
    /// Name of an `Args`-kind type acting as this field's argument bundle.
    pub args_bundle: Option<ArcStr>,
    /// Opaque validation-constraint tags.
    pub constraints: Vec<ArcStr>,
    /// Declaration site.
    pub site: DeclarationSite,
}

/// A declaration record submitted to the collector.
#[derive(Clone, Debug, PartialEq)]
pub enum Declaration {
    /// Declares a named type.
    Type(TypeDeclaration),
    /// Declares a field of a named type.
    Field(FieldDeclaration),
}

struct PendingField {
    field: Field,
    site: DeclarationSite,
}

struct PendingType {
    kind: Option<(TypeKind, DeclarationSite)>,
    description: Option<ArcStr>,
    deprecation: DeprecationStatus,
    fields: IndexMap<ArcStr, Vec<PendingField>>,
}

impl PendingType {
    fn stub() -> Self {
        Self {
            kind: None,
            description: None,
            deprecation: DeprecationStatus::Current,
            fields: IndexMap::new(),
        }
    }
}

/// Gathers declaration records and assembles them into type metadata.
///
/// `submit` performs per-record checks that can fail fast (invalid names,
/// contradictory nullability, undiscriminated numerics); cross-record checks
/// (conflicting re-declarations) are deferred to `finalize` so that
/// submission order never matters.
#[derive(Default)]
pub struct DeclarationCollector {
    types: IndexMap<ArcStr, PendingType>,
    submitted: usize,
}

impl DeclarationCollector {
    /// Constructs an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts one declaration record.
    pub fn submit(&mut self, declaration: Declaration) -> Result<(), SchemaError> {
        self.submitted += 1;
        match declaration {
            Declaration::Type(decl) => self.submit_type(decl),
            Declaration::Field(decl) => self.submit_field(decl),
        }
    }

    fn submit_type(&mut self, decl: TypeDeclaration) -> Result<(), SchemaError> {
        check_name(&decl.name, &decl.site)?;
        let pending = self
            .types
            .entry(decl.name.clone())
            .or_insert_with(PendingType::stub);
        match &pending.kind {
            None => pending.kind = Some((decl.kind, decl.site.clone())),
            Some((kind, _)) if *kind == decl.kind => {}
            Some((_, first_site)) => {
                return Err(SchemaError::ConflictingDeclaration {
                    subject: arcstr::format!("type {}", decl.name),
                    first_site: first_site.0.clone(),
                    second_site: decl.site.0,
                });
            }
        }
        if pending.description.is_none() {
            pending.description = decl.description;
        }
        if decl.deprecation.is_deprecated() {
            pending.deprecation = decl.deprecation;
        }
        Ok(())
    }

    fn submit_field(&mut self, decl: FieldDeclaration) -> Result<(), SchemaError> {
        check_name(&decl.owner_type, &decl.site)?;
        check_name(&decl.field_name, &decl.site)?;
        if decl.type_name == AMBIGUOUS_NUMBER {
            return Err(SchemaError::AmbiguousNumericType {
                type_name: decl.owner_type,
                field_name: decl.field_name,
                site: decl.site.0,
            });
        }
        check_name(&decl.type_name, &decl.site)?;

        let nullable = normalize_nullability(
            decl.nullable,
            decl.items_non_null,
            decl.list_depth,
        )
        .ok_or_else(|| SchemaError::ContradictoryNullability {
            type_name: decl.owner_type.clone(),
            field_name: decl.field_name.clone(),
            site: decl.site.0.clone(),
        })?;

        let mut field = Field::new(
            decl.field_name.clone(),
            crate::ast::TypeRef {
                name: decl.type_name,
                list_depth: decl.list_depth,
                nullable,
            },
        );
        field.description = decl.description;
        field.default_value = decl.default_value;
        field.deprecation_status = decl.deprecation;
        field.args_bundle = decl.args_bundle;
        field.constraints = decl.constraints;
        for arg in decl.arguments {
            field = field.argument(self.build_argument(&decl.owner_type, &decl.field_name, arg, &decl.site)?);
        }

        let pending = self
            .types
            .entry(decl.owner_type)
            .or_insert_with(PendingType::stub);
        pending
            .fields
            .entry(field.name.clone())
            .or_default()
            .push(PendingField {
                field,
                site: decl.site,
            });
        Ok(())
    }

    fn build_argument(
        &self,
        owner: &ArcStr,
        field: &ArcStr,
        decl: ArgumentDeclaration,
        site: &DeclarationSite,
    ) -> Result<Argument, SchemaError> {
        check_name(&decl.name, site)?;
        if decl.type_name == AMBIGUOUS_NUMBER {
            return Err(SchemaError::AmbiguousNumericType {
                type_name: owner.clone(),
                field_name: arcstr::format!("{field}({})", decl.name),
                site: site.0.clone(),
            });
        }
        check_name(&decl.type_name, site)?;
        let nullable = normalize_nullability(decl.nullable, decl.items_non_null, decl.list_depth)
            .ok_or_else(|| SchemaError::ContradictoryNullability {
                type_name: owner.clone(),
                field_name: arcstr::format!("{field}({})", decl.name),
                site: site.0.clone(),
            })?;
        let mut arg = Argument::new(
            decl.name,
            crate::ast::TypeRef {
                name: decl.type_name,
                list_depth: decl.list_depth,
                nullable,
            },
        );
        arg.description = decl.description;
        arg.default_value = decl.default_value;
        arg.constraints = decl.constraints;
        Ok(arg)
    }

    /// Assembles all submitted declarations into type metadata.
    ///
    /// Conflicting re-declarations of the same `(type, field)` with
    /// different type references fail here, with both sites identified.
    pub fn finalize(self) -> Result<Vec<TypeMeta>, SchemaError> {
        let mut metas = Vec::with_capacity(self.types.len());
        for (name, pending) in self.types {
            let Some((kind, _)) = pending.kind else {
                return Err(SchemaError::UnknownType { name });
            };
            let mut meta = TypeMeta::new(name.clone(), kind);
            meta.description = pending.description;
            meta.deprecation_status = pending.deprecation;
            for (field_name, candidates) in pending.fields {
                let mut iter = candidates.into_iter();
                let first = match iter.next() {
                    Some(first) => first,
                    None => continue,
                };
                let first_site = first.site;
                let mut merged = first.field;
                for other in iter {
                    if other.field.field_type != merged.field_type {
                        return Err(SchemaError::ConflictingDeclaration {
                            subject: arcstr::format!("{name}.{field_name}"),
                            first_site: first_site.0.clone(),
                            second_site: other.site.0,
                        });
                    }
                    // Compatible re-declaration: first description wins.
                    if merged.description.is_none() {
                        merged.description = other.field.description;
                    }
                }
                meta = meta.field(merged);
            }
            metas.push(meta);
        }
        log::debug!(
            "collected {} declarations into {} types",
            self.submitted,
            metas.len()
        );
        Ok(metas)
    }
}

fn check_name(name: &ArcStr, site: &DeclarationSite) -> Result<(), SchemaError> {
    if Name::is_valid(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidName {
            name: name.clone(),
            site: site.0.clone(),
        })
    }
}

fn normalize_nullability(
    spec: NullableSpec,
    items_non_null: Option<bool>,
    list_depth: usize,
) -> Option<Nullability> {
    let mut nullable = match spec {
        NullableSpec::NonNull => Nullability::NON_NULL,
        NullableSpec::Outer => Nullability {
            outer: true,
            items: false,
        },
        NullableSpec::Items => Nullability {
            outer: false,
            items: true,
        },
        NullableSpec::ItemsAndList => Nullability::FULL,
    };
    if list_depth == 0 {
        if nullable.items || items_non_null.is_some() {
            // Item nullability on a non-list is meaningless.
            return None;
        }
        return Some(nullable);
    }
    match items_non_null {
        Some(true) if nullable.items => return None,
        Some(true) => nullable.items = false,
        Some(false) => nullable.items = true,
        None => {}
    }
    Some(nullable)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        SchemaError,
        schema::meta::{DeprecationStatus, TypeKind},
    };

    use super::{
        Declaration, DeclarationCollector, FieldDeclaration, NullableSpec, TypeDeclaration,
    };

    fn type_decl(name: &str, kind: TypeKind, site: &str) -> Declaration {
        Declaration::Type(TypeDeclaration {
            name: name.into(),
            kind,
            description: None,
            deprecation: DeprecationStatus::Current,
            site: site.into(),
        })
    }

    fn field_decl(owner: &str, field: &str, ty: &str, site: &str) -> FieldDeclaration {
        FieldDeclaration {
            owner_type: owner.into(),
            field_name: field.into(),
            type_name: ty.into(),
            list_depth: 0,
            nullable: NullableSpec::NonNull,
            items_non_null: None,
            default_value: None,
            description: None,
            deprecation: DeprecationStatus::Current,
            arguments: vec![],
            args_bundle: None,
            constraints: vec![],
            site: site.into(),
        }
    }

    #[test]
    fn fields_may_arrive_before_their_type() {
        let mut collector = DeclarationCollector::new();
        collector
            .submit(Declaration::Field(field_decl(
                "Author",
                "id",
                "Int",
                "a.rs:1",
            )))
            .unwrap();
        collector
            .submit(type_decl("Author", TypeKind::Object, "a.rs:1"))
            .unwrap();
        let metas = collector.finalize().unwrap();
        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].fields.len(), 1);
    }

    #[test]
    fn conflicting_type_references_name_both_sites() {
        let mut collector = DeclarationCollector::new();
        collector
            .submit(type_decl("Author", TypeKind::Object, "a.rs:1"))
            .unwrap();
        collector
            .submit(Declaration::Field(field_decl(
                "Author",
                "id",
                "Int",
                "a.rs:2",
            )))
            .unwrap();
        collector
            .submit(Declaration::Field(field_decl(
                "Author",
                "id",
                "String",
                "schema.graphql:4:3",
            )))
            .unwrap();
        let err = collector.finalize().unwrap_err();
        assert_eq!(
            err,
            SchemaError::ConflictingDeclaration {
                subject: "Author.id".into(),
                first_site: "a.rs:2".into(),
                second_site: "schema.graphql:4:3".into(),
            }
        );
    }

    #[test]
    fn identical_redeclaration_is_idempotent() {
        let mut collector = DeclarationCollector::new();
        collector
            .submit(type_decl("Author", TypeKind::Object, "a.rs:1"))
            .unwrap();
        collector
            .submit(Declaration::Field(field_decl(
                "Author",
                "id",
                "Int",
                "a.rs:2",
            )))
            .unwrap();
        collector
            .submit(Declaration::Field(field_decl(
                "Author",
                "id",
                "Int",
                "schema.graphql:2:3",
            )))
            .unwrap();
        let metas = collector.finalize().unwrap();
        assert_eq!(metas[0].fields.len(), 1);
    }

    #[test]
    fn kind_conflict_is_rejected() {
        let mut collector = DeclarationCollector::new();
        collector
            .submit(type_decl("Author", TypeKind::Object, "a.rs:1"))
            .unwrap();
        let err = collector
            .submit(type_decl("Author", TypeKind::Input, "b.rs:9"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::ConflictingDeclaration { .. }));
    }

    #[test]
    fn contradictory_nullability_fails_at_submission() {
        let mut collector = DeclarationCollector::new();
        let mut decl = field_decl("Author", "posts", "Post", "a.rs:3");
        decl.list_depth = 1;
        decl.nullable = NullableSpec::ItemsAndList;
        decl.items_non_null = Some(true);
        let err = collector.submit(Declaration::Field(decl)).unwrap_err();
        assert_eq!(
            err,
            SchemaError::ContradictoryNullability {
                type_name: "Author".into(),
                field_name: "posts".into(),
                site: "a.rs:3".into(),
            }
        );
    }

    #[test]
    fn item_nullability_on_non_list_is_contradictory() {
        let mut collector = DeclarationCollector::new();
        let mut decl = field_decl("Author", "name", "String", "a.rs:4");
        decl.nullable = NullableSpec::Items;
        assert!(matches!(
            collector.submit(Declaration::Field(decl)),
            Err(SchemaError::ContradictoryNullability { .. })
        ));
    }

    #[test]
    fn undeclared_owner_type_fails_finalize() {
        let mut collector = DeclarationCollector::new();
        collector
            .submit(Declaration::Field(field_decl(
                "Ghost", "id", "Int", "g.rs:1",
            )))
            .unwrap();
        assert_eq!(
            collector.finalize().unwrap_err(),
            SchemaError::UnknownType {
                name: "Ghost".into()
            }
        );
    }

    #[test]
    fn invalid_names_fail_at_submission() {
        let mut collector = DeclarationCollector::new();
        let err = collector
            .submit(type_decl("4ever", TypeKind::Object, "x.rs:1"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidName { .. }));
    }
}
