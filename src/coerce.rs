//! Request-time argument coercion.
//!
//! Raw argument values arrive as an untyped [`Value`] object. Coercion walks
//! the declared arguments in declaration order, validates supplied values
//! against the declared type reference (scalar kind, list depth, and
//! nullability, recursively), substitutes defaults, and hands constraint
//! tags to an injected validator. All failures are field-scoped
//! [`FieldError`]s; nothing here ever aborts the process.

use arcstr::ArcStr;
use indexmap::IndexMap;

use crate::{
    ast::TypeRef,
    resolve::{FieldError, FieldResult},
    schema::{
        meta::{Argument, Field, TypeKind, TypeMeta},
        registry::RegistrySnapshot,
    },
    value::{ScalarKind, Value},
};

/// Coerced argument values, keyed by argument name in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    values: IndexMap<ArcStr, Value>,
}

impl Arguments {
    /// Looks a coerced argument up by name.
    ///
    /// Absent-but-nullable arguments are present as [`Value::Null`].
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Iterates arguments in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&ArcStr, &Value)> {
        self.values.iter()
    }

    /// Number of coerced arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no arguments were declared.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Converts the coerced arguments into an object value.
    pub fn into_value(self) -> Value {
        Value::Object(
            self.values
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}

/// A single failed validation constraint.
#[derive(Clone, Debug, PartialEq)]
pub struct Violation {
    /// The constraint tag that failed.
    pub constraint: ArcStr,
    /// Human-readable explanation.
    pub message: String,
}

/// Injected constraint-checking collaborator.
///
/// The engine never interprets constraint tags itself; it forwards the
/// coerced value together with the declared tags and turns any violations
/// into a field error.
pub trait ConstraintValidator: Send + Sync {
    /// Checks `value` against the declared constraint tags.
    fn validate(&self, value: &Value, constraints: &[ArcStr]) -> Result<(), Vec<Violation>>;
}

/// The do-nothing validator: every value passes.
pub struct AcceptAll;

impl ConstraintValidator for AcceptAll {
    fn validate(&self, _: &Value, _: &[ArcStr]) -> Result<(), Vec<Violation>> {
        Ok(())
    }
}

/// Coerces raw arguments for a field, flattening its argument bundle first.
pub fn coerce_field_arguments(
    field: &Field,
    raw: &Value,
    snapshot: &RegistrySnapshot,
    validator: &dyn ConstraintValidator,
) -> FieldResult<Arguments> {
    let arguments = effective_arguments(field, snapshot)?;
    coerce(&arguments, raw, snapshot, validator)
}

/// The full argument list of a field: individually declared arguments
/// followed by the flattened fields of its `Args`-kind bundle, if any.
pub fn effective_arguments(
    field: &Field,
    snapshot: &RegistrySnapshot,
) -> FieldResult<Vec<Argument>> {
    let mut arguments = field.arguments.clone();
    if let Some(bundle) = &field.args_bundle {
        let meta = snapshot.type_by_name(bundle).ok_or_else(|| {
            FieldError::from(format!("argument bundle `{bundle}` is not registered"))
        })?;
        if meta.kind != TypeKind::Args {
            return Err(FieldError::from(format!(
                "argument bundle `{bundle}` is not an arguments type"
            )));
        }
        arguments.extend(meta.fields.iter().map(Field::to_argument));
    }
    Ok(arguments)
}

/// Coerces raw arguments against a declared argument list.
///
/// `raw` must be an object value or null (no arguments supplied).
pub fn coerce(
    arguments: &[Argument],
    raw: &Value,
    snapshot: &RegistrySnapshot,
    validator: &dyn ConstraintValidator,
) -> FieldResult<Arguments> {
    let empty = IndexMap::new();
    let supplied = match raw {
        Value::Null => &empty,
        Value::Object(entries) => entries,
        other => {
            return Err(type_mismatch(format!(
                "arguments must be supplied as an object, got {}",
                other.shape()
            )));
        }
    };

    for key in supplied.keys() {
        if !arguments.iter().any(|a| a.name == key.as_str()) {
            return Err(type_mismatch(format!("unknown argument `{key}`")));
        }
    }

    let mut coerced = Arguments::default();
    for argument in arguments {
        let value = match supplied.get(argument.name.as_str()) {
            Some(value) => {
                let value = coerce_value(
                    &argument.arg_type,
                    argument.arg_type.list_depth,
                    value,
                    snapshot,
                    validator,
                )
                .map_err(|e| e.prefixed(&format!("argument `{}`", argument.name)))?;
                check_constraints(&value, &argument.constraints, validator)
                    .map_err(|e| e.prefixed(&format!("argument `{}`", argument.name)))?;
                value
            }
            None => match &argument.default_value {
                Some(default) => {
                    check_constraints(default, &argument.constraints, validator)
                        .map_err(|e| e.prefixed(&format!("argument `{}`", argument.name)))?;
                    default.clone()
                }
                None if argument.is_required() => {
                    return Err(FieldError::new(
                        format!(
                            "missing required argument `{}` of type `{}`",
                            argument.name, argument.arg_type
                        ),
                        Value::object([
                            ("kind", Value::from("MissingRequiredArgument")),
                            ("argument", Value::from(argument.name.as_str())),
                        ]),
                    ));
                }
                None => Value::Null,
            },
        };
        coerced.values.insert(argument.name.clone(), value);
    }
    Ok(coerced)
}

fn coerce_value(
    ty: &TypeRef,
    remaining_depth: usize,
    value: &Value,
    snapshot: &RegistrySnapshot,
    validator: &dyn ConstraintValidator,
) -> FieldResult<Value> {
    if value.is_null() {
        let nullable = if remaining_depth == ty.list_depth {
            ty.nullable.outer
        } else if remaining_depth == 0 {
            ty.nullable.items
        } else {
            false
        };
        return if nullable {
            Ok(Value::Null)
        } else {
            Err(type_mismatch(format!(
                "null is not allowed for non-nullable `{ty}`"
            )))
        };
    }

    if remaining_depth > 0 {
        let items = value.as_list_value().ok_or_else(|| {
            type_mismatch(format!("expected a list for `{ty}`, got {}", value.shape()))
        })?;
        let coerced = items
            .iter()
            .map(|item| coerce_value(ty, remaining_depth - 1, item, snapshot, validator))
            .collect::<FieldResult<Vec<_>>>()?;
        return Ok(Value::List(coerced));
    }

    if let Some(kind) = ScalarKind::by_name(&ty.name) {
        return coerce_scalar(kind, value);
    }
    let meta = snapshot
        .type_by_name(&ty.name)
        .ok_or_else(|| type_mismatch(format!("type `{}` is not registered", ty.name)))?;
    match meta.kind {
        // Custom scalars are opaque to the engine.
        TypeKind::Scalar => Ok(value.clone()),
        TypeKind::Input => coerce_input_object(meta, value, snapshot, validator),
        TypeKind::Object | TypeKind::Args => Err(type_mismatch(format!(
            "type `{}` cannot be used in input position",
            meta.name
        ))),
    }
}

fn coerce_scalar(kind: ScalarKind, value: &Value) -> FieldResult<Value> {
    let mismatch = || {
        type_mismatch(format!(
            "expected `{}`, got {}",
            kind.name(),
            value.shape()
        ))
    };
    match (kind, value) {
        (ScalarKind::Int, Value::Int(_))
        | (ScalarKind::Float, Value::Float(_))
        | (ScalarKind::String, Value::String(_))
        | (ScalarKind::Boolean, Value::Boolean(_))
        | (ScalarKind::Id, Value::String(_)) => Ok(value.clone()),
        // Integer literals widen to floats, and serialize into identifiers.
        (ScalarKind::Float, Value::Int(i)) => Ok(Value::Float(f64::from(*i))),
        (ScalarKind::Id, Value::Int(i)) => Ok(Value::String(i.to_string())),
        _ => Err(mismatch()),
    }
}

fn coerce_input_object(
    meta: &TypeMeta,
    value: &Value,
    snapshot: &RegistrySnapshot,
    validator: &dyn ConstraintValidator,
) -> FieldResult<Value> {
    let entries = value.as_object_value().ok_or_else(|| {
        type_mismatch(format!(
            "expected input object `{}`, got {}",
            meta.name,
            value.shape()
        ))
    })?;
    for key in entries.keys() {
        if meta.field_by_name(key).is_none() {
            return Err(type_mismatch(format!(
                "unknown field `{key}` on input `{}`",
                meta.name
            )));
        }
    }
    let mut coerced = IndexMap::new();
    for field in &meta.fields {
        let value = match entries.get(field.name.as_str()) {
            Some(value) => {
                let value = coerce_value(
                    &field.field_type,
                    field.field_type.list_depth,
                    value,
                    snapshot,
                    validator,
                )
                .map_err(|e| e.prefixed(&format!("input field `{}.{}`", meta.name, field.name)))?;
                check_constraints(&value, &field.constraints, validator)?;
                value
            }
            None => match &field.default_value {
                Some(default) => default.clone(),
                None if !field.field_type.nullable.outer => {
                    return Err(FieldError::new(
                        format!(
                            "missing required input field `{}.{}` of type `{}`",
                            meta.name, field.name, field.field_type
                        ),
                        Value::object([
                            ("kind", Value::from("MissingRequiredArgument")),
                            ("field", Value::from(field.name.as_str())),
                        ]),
                    ));
                }
                None => Value::Null,
            },
        };
        coerced.insert(field.name.to_string(), value);
    }
    Ok(Value::Object(coerced))
}

fn check_constraints(
    value: &Value,
    constraints: &[ArcStr],
    validator: &dyn ConstraintValidator,
) -> FieldResult<()> {
    if constraints.is_empty() {
        return Ok(());
    }
    validator.validate(value, constraints).map_err(|violations| {
        let messages = violations
            .iter()
            .map(|v| Value::from(v.message.as_str()))
            .collect::<Vec<_>>();
        FieldError::new(
            format!(
                "constraint violation: {}",
                violations
                    .iter()
                    .map(|v| v.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            ),
            Value::object([
                ("kind", Value::from("ConstraintViolation")),
                ("violations", Value::List(messages)),
            ]),
        )
    })
}

fn type_mismatch(message: String) -> FieldError {
    FieldError::new(
        message,
        Value::object([("kind", Value::from("CoercionTypeMismatch"))]),
    )
}
