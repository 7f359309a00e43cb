//! Types used to describe the assembled schema.

use arcstr::ArcStr;
use serde::Serialize;

use crate::{ast::TypeRef, value::Value};

/// Whether an item is deprecated, with context.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum DeprecationStatus {
    /// The item is not deprecated.
    Current,
    /// The item is deprecated, with an optional reason.
    Deprecated(Option<ArcStr>),
}

impl DeprecationStatus {
    /// If this deprecation status indicates the item is deprecated.
    pub fn is_deprecated(&self) -> bool {
        matches!(self, DeprecationStatus::Deprecated(_))
    }

    /// An optional reason for the deprecation, or none if `Current`.
    pub fn reason(&self) -> Option<&str> {
        match self {
            DeprecationStatus::Current => None,
            DeprecationStatus::Deprecated(rsn) => rsn.as_deref(),
        }
    }
}

/// The kind of a named type.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum TypeKind {
    /// Composite output type with resolvable fields.
    Object,
    /// Composite input type, coerced field-by-field.
    Input,
    /// Argument bundle; its fields flatten into a field's argument list.
    Args,
    /// Atomic leaf type.
    Scalar,
}

/// Metadata for an argument to a field.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Argument {
    /// Public argument name.
    pub name: ArcStr,
    /// Optional description.
    pub description: Option<ArcStr>,
    /// Declared value type.
    pub arg_type: TypeRef,
    /// Declared default, substituted when the argument is absent.
    pub default_value: Option<Value>,
    /// Opaque validation-constraint tags, checked by an injected validator.
    pub constraints: Vec<ArcStr>,
}

impl Argument {
    /// Builds a new [`Argument`] of the given type with the given name.
    pub fn new(name: impl Into<ArcStr>, arg_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            arg_type,
            default_value: None,
            constraints: vec![],
        }
    }

    /// Sets the description of this argument.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the default value of this argument.
    #[must_use]
    pub fn default_value(mut self, val: Value) -> Self {
        self.default_value = Some(val);
        self
    }

    /// Appends a validation-constraint tag.
    #[must_use]
    pub fn constraint(mut self, tag: impl Into<ArcStr>) -> Self {
        self.constraints.push(tag.into());
        self
    }

    /// Whether a request must supply this argument.
    ///
    /// Derived, never stored: required iff the declared type is not
    /// outer-nullable and no default value exists.
    pub fn is_required(&self) -> bool {
        !self.arg_type.nullable.outer && self.default_value.is_none()
    }
}

/// Metadata for a field.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Field {
    /// Public field name, unique within the owning type.
    pub name: ArcStr,
    /// Optional description.
    pub description: Option<ArcStr>,
    /// Declared value type.
    pub field_type: TypeRef,
    /// Individually declared arguments, in declaration order.
    pub arguments: Vec<Argument>,
    /// Name of an `Args`-kind type whose fields flatten into the
    /// argument list instead of (or in addition to) `arguments`.
    pub args_bundle: Option<ArcStr>,
    /// Declared default, substituted when the field is coerced as input.
    pub default_value: Option<Value>,
    /// Opaque validation-constraint tags carried when this field acts as an
    /// argument of a bundle.
    pub constraints: Vec<ArcStr>,
    /// Whether the field is deprecated, with an optional reason.
    pub deprecation_status: DeprecationStatus,
}

impl Field {
    /// Builds a new [`Field`] of the given type with the given name.
    pub fn new(name: impl Into<ArcStr>, field_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            field_type,
            arguments: vec![],
            args_bundle: None,
            default_value: None,
            constraints: vec![],
            deprecation_status: DeprecationStatus::Current,
        }
    }

    /// Sets the description of this field.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an argument to this field.
    #[must_use]
    pub fn argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// References an `Args`-kind type as this field's argument bundle.
    #[must_use]
    pub fn args_bundle(mut self, bundle: impl Into<ArcStr>) -> Self {
        self.args_bundle = Some(bundle.into());
        self
    }

    /// Sets the default value of this field.
    #[must_use]
    pub fn default_value(mut self, val: Value) -> Self {
        self.default_value = Some(val);
        self
    }

    /// Appends a validation-constraint tag.
    #[must_use]
    pub fn constraint(mut self, tag: impl Into<ArcStr>) -> Self {
        self.constraints.push(tag.into());
        self
    }

    /// Marks this field as deprecated with an optional reason.
    #[must_use]
    pub fn deprecated(mut self, reason: Option<ArcStr>) -> Self {
        self.deprecation_status = DeprecationStatus::Deprecated(reason);
        self
    }

    /// Reinterprets this field as an argument declaration.
    ///
    /// Fields of `Args`-kind types are argument declarations in disguise;
    /// flattening a bundle turns each of them into a real [`Argument`].
    pub fn to_argument(&self) -> Argument {
        Argument {
            name: self.name.clone(),
            description: self.description.clone(),
            arg_type: self.field_type.clone(),
            default_value: self.default_value.clone(),
            constraints: self.constraints.clone(),
        }
    }
}

/// Metadata for a named type.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TypeMeta {
    /// Globally unique type name.
    pub name: ArcStr,
    /// What kind of type this is.
    pub kind: TypeKind,
    /// Optional description.
    pub description: Option<ArcStr>,
    /// Fields in declaration order. Always empty for scalars.
    pub fields: Vec<Field>,
    /// Whether the type is deprecated, with an optional reason.
    pub deprecation_status: DeprecationStatus,
}

impl TypeMeta {
    /// Builds a new [`TypeMeta`] of the given kind with the given name.
    pub fn new(name: impl Into<ArcStr>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            fields: vec![],
            deprecation_status: DeprecationStatus::Current,
        }
    }

    /// Sets the description of this type.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a field to this type.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Marks this type as deprecated with an optional reason.
    #[must_use]
    pub fn deprecated(mut self, reason: Option<ArcStr>) -> Self {
        self.deprecation_status = DeprecationStatus::Deprecated(reason);
        self
    }

    /// Accesses a field's metadata given its name.
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns true if the type is built into the library.
    ///
    /// Covers the five pre-registered scalars; built-in types are filtered
    /// out of the exported schema text.
    pub fn is_builtin(&self) -> bool {
        matches!(
            &*self.name,
            "Int" | "Float" | "String" | "Boolean" | "ID"
        ) && self.kind == TypeKind::Scalar
    }
}
