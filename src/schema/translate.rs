//! Schema-language export.
//!
//! Renders an assembled [`SchemaDocument`] to schema-definition-language
//! text. Types appear in registration order and fields in declaration
//! order; the nullability and list-depth encoding is reproduced exactly.
//! Built-in scalars and argument-bundle types are omitted: the former are
//! implied, the latter appear flattened into field argument lists.

use std::fmt::Write;

use itertools::Itertools as _;

use crate::schema::{
    meta::{Argument, DeprecationStatus, Field, TypeKind, TypeMeta},
    model::SchemaDocument,
};

/// Renders the whole document.
pub fn to_sdl(document: &SchemaDocument) -> String {
    let blocks = document
        .types()
        .iter()
        .filter(|meta| !meta.is_builtin() && meta.kind != TypeKind::Args)
        .map(|meta| type_definition(meta, document))
        .collect::<Vec<_>>();
    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

fn type_definition(meta: &TypeMeta, document: &SchemaDocument) -> String {
    let mut out = String::new();
    if let Some(description) = &meta.description {
        let _ = writeln!(out, "\"\"\"{description}\"\"\"");
    }
    match meta.kind {
        TypeKind::Scalar => {
            let _ = write!(out, "scalar {}", meta.name);
            out
        }
        TypeKind::Object | TypeKind::Input | TypeKind::Args => {
            let keyword = match meta.kind {
                TypeKind::Input => "input",
                _ => "type",
            };
            let _ = writeln!(out, "{keyword} {} {{", meta.name);
            for field in &meta.fields {
                render_field(&mut out, field, document);
            }
            let _ = write!(out, "}}");
            out
        }
    }
}

fn render_field(out: &mut String, field: &Field, document: &SchemaDocument) {
    if let Some(description) = &field.description {
        let _ = writeln!(out, "  \"\"\"{description}\"\"\"");
    }
    let _ = write!(out, "  {}", field.name);

    let mut arguments = field.arguments.clone();
    if let Some(bundle) = &field.args_bundle {
        if let Some(meta) = document.type_by_name(bundle) {
            arguments.extend(meta.fields.iter().map(Field::to_argument));
        }
    }
    if !arguments.is_empty() {
        let rendered = arguments.iter().map(render_argument).join(", ");
        let _ = write!(out, "({rendered})");
    }

    let _ = write!(out, ": {}", field.field_type);
    if let Some(default) = &field.default_value {
        let _ = write!(out, " = {default}");
    }
    render_deprecation(out, &field.deprecation_status);
    let _ = writeln!(out);
}

fn render_argument(argument: &Argument) -> String {
    let mut out = format!("{}: {}", argument.name, argument.arg_type);
    if let Some(default) = &argument.default_value {
        let _ = write!(out, " = {default}");
    }
    out
}

fn render_deprecation(out: &mut String, status: &DeprecationStatus) {
    match status {
        DeprecationStatus::Current => {}
        DeprecationStatus::Deprecated(None) => {
            let _ = write!(out, " @deprecated");
        }
        DeprecationStatus::Deprecated(Some(reason)) => {
            let _ = write!(
                out,
                " @deprecated(reason: \"{}\")",
                reason.replace('"', "\\\"")
            );
        }
    }
}
