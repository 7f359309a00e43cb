#![doc = include_str!("../README.md")]

use arcstr::ArcStr;
use derive_more::{Display, Error};

pub mod ast;
pub mod coerce;
pub mod collect;
pub mod resolve;
pub mod schema;
pub mod types;
pub mod value;

pub use crate::{
    ast::{Nullability, TypeRef},
    coerce::{
        AcceptAll, Arguments, ConstraintValidator, Violation, coerce, coerce_field_arguments,
        effective_arguments,
    },
    collect::{
        ArgAnnotation, ArgumentDeclaration, Declaration, DeclarationCollector, DeclarationSite,
        FieldAnnotation, FieldDeclaration, NullableSpec, ObjectAnnotation, ScanOptions,
        StructuralHint, TypeDeclaration, declare_document,
    },
    resolve::{
        Binding, BoundResolver, ExecutionError, FieldError, FieldResult, MUTATION_TYPE,
        NullFactory, ParamSource, ParamSpec, QUERY_TYPE, ResolveInfo, ResolvedParam, Resolver,
        ResolverBinder, ResolverBindings, ResolverValue, ServiceError, ServiceFactory, Shared,
        dispatch_field, is_root_type,
    },
    schema::{
        BindingSummary, RegistrySnapshot, SchemaDocument, TypeRegistry, assemble,
        meta::{Argument, DeprecationStatus, Field, TypeKind, TypeMeta},
    },
    types::name::{Name, NameParseError},
    value::{ScalarKind, Value},
};

/// An error that prevented schema assembly.
///
/// Every variant is fatal to startup: no partial or best-effort schema is
/// ever assembled. Failures scoped to a single request are carried by
/// [`FieldError`] instead.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum SchemaError {
    /// A type name was registered twice.
    #[display("duplicate type `{name}`")]
    DuplicateType {
        /// The offending type name.
        name: ArcStr,
    },

    /// A reference named a type nobody registered.
    #[display("unknown type `{name}`")]
    UnknownType {
        /// The missing type name.
        name: ArcStr,
    },

    /// A field's type reference cannot be resolved.
    #[display("`{type_name}.{field_name}` references unknown type `{reference}`")]
    DanglingReference {
        /// Type owning the field.
        type_name: ArcStr,
        /// Field carrying the reference.
        field_name: ArcStr,
        /// The unresolvable reference.
        reference: ArcStr,
    },

    /// A top-level operation has no explicit resolver.
    #[display("no resolver registered for `{type_name}.{field_name}`")]
    UnresolvedField {
        /// The root type.
        type_name: ArcStr,
        /// The unresolved operation field.
        field_name: ArcStr,
    },

    /// A resolver's declared parent type is not the type it is bound to.
    #[display(
        "resolver for `{type_name}.{field_name}` declares parent type `{declared}`"
    )]
    ParentTypeMismatch {
        /// Type the resolver is bound to.
        type_name: ArcStr,
        /// Field the resolver is bound to.
        field_name: ArcStr,
        /// The mismatching declared parent.
        declared: ArcStr,
    },

    /// Two declarations disagree about the same subject.
    #[display(
        "conflicting declarations for `{subject}` (first at {first_site}, conflicting at {second_site})"
    )]
    ConflictingDeclaration {
        /// What was declared twice, e.g. `Author.posts`.
        subject: ArcStr,
        /// Site of the declaration seen first.
        first_site: ArcStr,
        /// Site of the conflicting declaration.
        second_site: ArcStr,
    },

    /// A numeric declaration carries no integer/float discriminator.
    #[display(
        "numeric type of `{type_name}.{field_name}` is ambiguous, declare Int or Float explicitly ({site})"
    )]
    AmbiguousNumericType {
        /// Type owning the declaration.
        type_name: ArcStr,
        /// The ambiguous field or argument.
        field_name: ArcStr,
        /// Declaration site.
        site: ArcStr,
    },

    /// A declaration combines contradictory nullability flags.
    #[display("contradictory nullability on `{type_name}.{field_name}` ({site})")]
    ContradictoryNullability {
        /// Type owning the declaration.
        type_name: ArcStr,
        /// The contradictory field or argument.
        field_name: ArcStr,
        /// Declaration site.
        site: ArcStr,
    },

    /// A declared name is not a valid schema name.
    #[display("invalid name `{name}` ({site})")]
    InvalidName {
        /// The offending name.
        name: ArcStr,
        /// Declaration site.
        site: ArcStr,
    },

    /// A schema document could not be parsed or used.
    #[display("failed to read `{source_name}`: {message}")]
    DocumentParse {
        /// The document's source label.
        source_name: ArcStr,
        /// What went wrong.
        message: String,
    },

    /// A second resolver was registered for the same `(type, field)` key.
    #[display("resolver already registered for `{type_name}.{field_name}`")]
    DuplicateResolver {
        /// Owning type name.
        type_name: ArcStr,
        /// Field name.
        field_name: ArcStr,
    },

    /// The injected service factory failed to produce an instance.
    #[display("service `{service}` could not be instantiated: {reason}")]
    ServiceInstantiation {
        /// The requested service class.
        service: ArcStr,
        /// The factory's reason.
        reason: String,
    },
}
