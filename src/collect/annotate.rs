//! The code-first declaration producer.
//!
//! Structural annotations describe class-like definitions: a field name, its
//! optionality, and either an inferred scalar shape or an explicit type
//! override. The builders here turn those hints into the same normalized
//! declaration records the schema-document parser emits.

use arcstr::ArcStr;
use serde::Deserialize;

use crate::{
    SchemaError,
    schema::meta::{DeprecationStatus, TypeKind},
    value::Value,
};

use super::{
    AMBIGUOUS_NUMBER, ArgumentDeclaration, Declaration, DeclarationCollector, DeclarationSite,
    FieldDeclaration, NullableSpec, TypeDeclaration,
};

/// A structural type hint on an annotated field.
///
/// `Number` is a numeric hint with no integer/float discriminator; the
/// collector rejects it, since there is no reliable default. Use `Int` or
/// `Float` (or an explicit override) instead.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StructuralHint {
    /// A string-shaped field.
    String,
    /// A boolean-shaped field.
    Boolean,
    /// A numeric field without an integer/float discriminator. Rejected.
    Number,
    /// Explicitly an integer.
    Int,
    /// Explicitly a float.
    Float,
    /// An identifier.
    Id,
    /// An explicit override naming any registered type.
    Named(ArcStr),
}

impl StructuralHint {
    /// An explicit override naming a registered type.
    pub fn named(name: impl Into<ArcStr>) -> Self {
        Self::Named(name.into())
    }

    fn type_name(&self) -> ArcStr {
        match self {
            Self::String => arcstr::literal!("String"),
            Self::Boolean => arcstr::literal!("Boolean"),
            Self::Number => AMBIGUOUS_NUMBER.into(),
            Self::Int => arcstr::literal!("Int"),
            Self::Float => arcstr::literal!("Float"),
            Self::Id => arcstr::literal!("ID"),
            Self::Named(name) => name.clone(),
        }
    }
}

/// Annotation for one argument of an annotated field.
#[derive(Clone, Debug)]
pub struct ArgAnnotation {
    name: ArcStr,
    hint: StructuralHint,
    list_depth: usize,
    nullable: NullableSpec,
    items_non_null: Option<bool>,
    default_value: Option<Value>,
    description: Option<ArcStr>,
    constraints: Vec<ArcStr>,
}

impl ArgAnnotation {
    /// Creates an argument annotation with the given name and hint.
    pub fn new(name: impl Into<ArcStr>, hint: StructuralHint) -> Self {
        Self {
            name: name.into(),
            hint,
            list_depth: 0,
            nullable: NullableSpec::NonNull,
            items_non_null: None,
            default_value: None,
            description: None,
            constraints: vec![],
        }
    }

    /// Wraps the argument type in one more level of list.
    #[must_use]
    pub fn list(mut self) -> Self {
        self.list_depth += 1;
        self
    }

    /// Marks the argument value as optional.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = NullableSpec::Outer;
        self
    }

    /// Sets the full nullability shorthand.
    #[must_use]
    pub fn nullable_spec(mut self, spec: NullableSpec) -> Self {
        self.nullable = spec;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, val: Value) -> Self {
        self.default_value = Some(val);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a validation-constraint tag.
    #[must_use]
    pub fn constraint(mut self, tag: impl Into<ArcStr>) -> Self {
        self.constraints.push(tag.into());
        self
    }

    fn into_declaration(self) -> ArgumentDeclaration {
        ArgumentDeclaration {
            name: self.name,
            type_name: self.hint.type_name(),
            list_depth: self.list_depth,
            nullable: self.nullable,
            items_non_null: self.items_non_null,
            default_value: self.default_value,
            description: self.description,
            constraints: self.constraints,
        }
    }
}

/// Annotation for one field of an annotated type.
#[derive(Clone, Debug)]
pub struct FieldAnnotation {
    name: ArcStr,
    hint: StructuralHint,
    list_depth: usize,
    nullable: NullableSpec,
    items_non_null: Option<bool>,
    default_value: Option<Value>,
    description: Option<ArcStr>,
    deprecation: DeprecationStatus,
    arguments: Vec<ArgAnnotation>,
    args_bundle: Option<ArcStr>,
    constraints: Vec<ArcStr>,
    site: Option<DeclarationSite>,
}

impl FieldAnnotation {
    /// Creates a field annotation with the given name and hint.
    pub fn new(name: impl Into<ArcStr>, hint: StructuralHint) -> Self {
        Self {
            name: name.into(),
            hint,
            list_depth: 0,
            nullable: NullableSpec::NonNull,
            items_non_null: None,
            default_value: None,
            description: None,
            deprecation: DeprecationStatus::Current,
            arguments: vec![],
            args_bundle: None,
            constraints: vec![],
            site: None,
        }
    }

    /// Wraps the field type in one more level of list.
    #[must_use]
    pub fn list(mut self) -> Self {
        self.list_depth += 1;
        self
    }

    /// Marks the field value as optional.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = NullableSpec::Outer;
        self
    }

    /// Marks the innermost list items as optional.
    #[must_use]
    pub fn items_nullable(mut self) -> Self {
        self.nullable = NullableSpec::Items;
        self
    }

    /// Marks both the list and its items as optional.
    #[must_use]
    pub fn items_and_list_nullable(mut self) -> Self {
        self.nullable = NullableSpec::ItemsAndList;
        self
    }

    /// Explicitly forces list items to be non-nullable.
    ///
    /// Combined with an items-nullable shorthand this is a contradiction,
    /// which the collector rejects at submission.
    #[must_use]
    pub fn non_null_items(mut self) -> Self {
        self.items_non_null = Some(true);
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, val: Value) -> Self {
        self.default_value = Some(val);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the field as deprecated.
    #[must_use]
    pub fn deprecated(mut self, reason: Option<&str>) -> Self {
        self.deprecation = DeprecationStatus::Deprecated(reason.map(Into::into));
        self
    }

    /// Adds an argument annotation.
    #[must_use]
    pub fn arg(mut self, arg: ArgAnnotation) -> Self {
        self.arguments.push(arg);
        self
    }

    /// References an `Args`-kind type as the argument bundle.
    #[must_use]
    pub fn bundle(mut self, name: impl Into<ArcStr>) -> Self {
        self.args_bundle = Some(name.into());
        self
    }

    /// Appends a validation-constraint tag.
    #[must_use]
    pub fn constraint(mut self, tag: impl Into<ArcStr>) -> Self {
        self.constraints.push(tag.into());
        self
    }

    /// Overrides the declaration site recorded for this field.
    #[must_use]
    pub fn at(mut self, site: impl Into<DeclarationSite>) -> Self {
        self.site = Some(site.into());
        self
    }
}

/// Annotation for a class-like type definition.
#[derive(Clone, Debug)]
pub struct ObjectAnnotation {
    name: ArcStr,
    kind: TypeKind,
    description: Option<ArcStr>,
    deprecation: DeprecationStatus,
    site: DeclarationSite,
    fields: Vec<FieldAnnotation>,
}

impl ObjectAnnotation {
    fn new(name: impl Into<ArcStr>, kind: TypeKind, site: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            deprecation: DeprecationStatus::Current,
            site: DeclarationSite::new(site),
            fields: vec![],
        }
    }

    /// Annotates an object type.
    pub fn object(name: impl Into<ArcStr>, site: impl Into<ArcStr>) -> Self {
        Self::new(name, TypeKind::Object, site)
    }

    /// Annotates an input type.
    pub fn input(name: impl Into<ArcStr>, site: impl Into<ArcStr>) -> Self {
        Self::new(name, TypeKind::Input, site)
    }

    /// Annotates an argument-bundle type.
    pub fn args(name: impl Into<ArcStr>, site: impl Into<ArcStr>) -> Self {
        Self::new(name, TypeKind::Args, site)
    }

    /// Annotates a custom scalar type.
    pub fn scalar(name: impl Into<ArcStr>, site: impl Into<ArcStr>) -> Self {
        Self::new(name, TypeKind::Scalar, site)
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the type as deprecated.
    #[must_use]
    pub fn deprecated(mut self, reason: Option<&str>) -> Self {
        self.deprecation = DeprecationStatus::Deprecated(reason.map(Into::into));
        self
    }

    /// Adds a field annotation.
    #[must_use]
    pub fn field(mut self, field: FieldAnnotation) -> Self {
        self.fields.push(field);
        self
    }

    /// Emits this annotation's declaration records into the collector.
    pub fn declare(self, collector: &mut DeclarationCollector) -> Result<(), SchemaError> {
        let owner = self.name.clone();
        collector.submit(Declaration::Type(TypeDeclaration {
            name: self.name,
            kind: self.kind,
            description: self.description,
            deprecation: self.deprecation,
            site: self.site.clone(),
        }))?;
        for field in self.fields {
            let site = field.site.clone().unwrap_or_else(|| self.site.clone());
            collector.submit(Declaration::Field(FieldDeclaration {
                owner_type: owner.clone(),
                field_name: field.name,
                type_name: field.hint.type_name(),
                list_depth: field.list_depth,
                nullable: field.nullable,
                items_non_null: field.items_non_null,
                default_value: field.default_value,
                description: field.description,
                deprecation: field.deprecation,
                arguments: field
                    .arguments
                    .into_iter()
                    .map(ArgAnnotation::into_declaration)
                    .collect(),
                args_bundle: field.args_bundle,
                constraints: field.constraints,
                site,
            }))?;
        }
        Ok(())
    }
}

/// Which source files the structural scanner considers.
///
/// The scanner only inspects files whose name ends in one of the listed
/// suffix patterns. The default matches the conventional model/input/args
/// file naming; override the list to widen or narrow the scan.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanOptions {
    /// File-suffix allowlist.
    pub type_file_suffixes: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            type_file_suffixes: vec![
                ".model.rs".into(),
                ".input.rs".into(),
                ".args.rs".into(),
            ],
        }
    }
}

impl ScanOptions {
    /// Whether a file path passes the suffix allowlist.
    pub fn considers(&self, path: &str) -> bool {
        self.type_file_suffixes
            .iter()
            .any(|suffix| path.ends_with(suffix))
    }
}
