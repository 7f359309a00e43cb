//! The schema-first declaration producer.
//!
//! Parses a standalone schema document and emits the same normalized
//! declaration records as the structural-annotation producer. Only the
//! subset of the schema language this engine models is accepted: object
//! types, input types, and scalar declarations.

use arcstr::ArcStr;
use graphql_parser::{
    Pos,
    schema::{
        Definition, Directive, Field as SdlField, InputValue as SdlInputValue, Type as SdlType,
        TypeDefinition, Value as SdlValue,
    },
};
use indexmap::IndexMap;

use crate::{
    SchemaError,
    schema::meta::{DeprecationStatus, TypeKind},
    value::{ScalarKind, Value},
};

use super::{
    ArgumentDeclaration, Declaration, DeclarationCollector, DeclarationSite, FieldDeclaration,
    NullableSpec, TypeDeclaration,
};

/// Parses `sdl` and submits every declaration it contains.
///
/// `source_name` labels the document in declaration sites and error
/// messages. Re-declaring a built-in scalar is ignored; enums, interfaces,
/// unions, and type extensions are outside the engine's data model and fail
/// fast.
pub fn declare_document(
    collector: &mut DeclarationCollector,
    source_name: &str,
    sdl: &str,
) -> Result<(), SchemaError> {
    let document = graphql_parser::parse_schema::<String>(sdl).map_err(|e| {
        SchemaError::DocumentParse {
            source_name: source_name.into(),
            message: e.to_string(),
        }
    })?;

    for definition in &document.definitions {
        match definition {
            Definition::TypeDefinition(TypeDefinition::Object(object)) => {
                submit_composite(
                    collector,
                    source_name,
                    &object.name,
                    TypeKind::Object,
                    object.description.as_deref(),
                    object.position,
                    &object.fields,
                )?;
            }
            Definition::TypeDefinition(TypeDefinition::InputObject(input)) => {
                collector.submit(Declaration::Type(TypeDeclaration {
                    name: input.name.as_str().into(),
                    kind: TypeKind::Input,
                    description: input.description.as_deref().map(Into::into),
                    deprecation: DeprecationStatus::Current,
                    site: site(source_name, input.position),
                }))?;
                for field in &input.fields {
                    let (type_name, list_depth, nullable) = type_shape(&field.value_type);
                    collector.submit(Declaration::Field(FieldDeclaration {
                        owner_type: input.name.as_str().into(),
                        field_name: field.name.as_str().into(),
                        type_name,
                        list_depth,
                        nullable,
                        items_non_null: None,
                        default_value: convert_default(
                            source_name,
                            field.default_value.as_ref(),
                        )?,
                        description: field.description.as_deref().map(Into::into),
                        deprecation: DeprecationStatus::Current,
                        arguments: vec![],
                        args_bundle: None,
                        constraints: vec![],
                        site: site(source_name, field.position),
                    }))?;
                }
            }
            Definition::TypeDefinition(TypeDefinition::Scalar(scalar)) => {
                if ScalarKind::by_name(&scalar.name).is_some() {
                    continue;
                }
                collector.submit(Declaration::Type(TypeDeclaration {
                    name: scalar.name.as_str().into(),
                    kind: TypeKind::Scalar,
                    description: scalar.description.as_deref().map(Into::into),
                    deprecation: DeprecationStatus::Current,
                    site: site(source_name, scalar.position),
                }))?;
            }
            Definition::TypeDefinition(other) => {
                let kind = match other {
                    TypeDefinition::Enum(_) => "enum",
                    TypeDefinition::Interface(_) => "interface",
                    TypeDefinition::Union(_) => "union",
                    _ => "type",
                };
                return Err(SchemaError::DocumentParse {
                    source_name: source_name.into(),
                    message: format!("{kind} definitions are not supported"),
                });
            }
            Definition::SchemaDefinition(_) => {
                // Root operation types are fixed to `Query`/`Mutation`.
            }
            Definition::TypeExtension(_) => {
                return Err(SchemaError::DocumentParse {
                    source_name: source_name.into(),
                    message: "type extensions are not supported".into(),
                });
            }
            Definition::DirectiveDefinition(_) => {
                return Err(SchemaError::DocumentParse {
                    source_name: source_name.into(),
                    message: "directive definitions are not supported".into(),
                });
            }
        }
    }
    Ok(())
}

fn submit_composite(
    collector: &mut DeclarationCollector,
    source_name: &str,
    name: &str,
    kind: TypeKind,
    description: Option<&str>,
    position: Pos,
    fields: &[SdlField<'_, String>],
) -> Result<(), SchemaError> {
    collector.submit(Declaration::Type(TypeDeclaration {
        name: name.into(),
        kind,
        description: description.map(Into::into),
        deprecation: DeprecationStatus::Current,
        site: site(source_name, position),
    }))?;
    for field in fields {
        let (type_name, list_depth, nullable) = type_shape(&field.field_type);
        let arguments = field
            .arguments
            .iter()
            .map(|arg| convert_argument(source_name, arg))
            .collect::<Result<Vec<_>, _>>()?;
        collector.submit(Declaration::Field(FieldDeclaration {
            owner_type: name.into(),
            field_name: field.name.as_str().into(),
            type_name,
            list_depth,
            nullable,
            items_non_null: None,
            default_value: None,
            description: field.description.as_deref().map(Into::into),
            deprecation: deprecation(&field.directives),
            arguments,
            args_bundle: None,
            constraints: vec![],
            site: site(source_name, field.position),
        }))?;
    }
    Ok(())
}

fn convert_argument(
    source_name: &str,
    arg: &SdlInputValue<'_, String>,
) -> Result<ArgumentDeclaration, SchemaError> {
    let (type_name, list_depth, nullable) = type_shape(&arg.value_type);
    Ok(ArgumentDeclaration {
        name: arg.name.as_str().into(),
        type_name,
        list_depth,
        nullable,
        items_non_null: None,
        default_value: convert_default(source_name, arg.default_value.as_ref())?,
        description: arg.description.as_deref().map(Into::into),
        constraints: vec![],
    })
}

/// Flattens a schema-language type literal into the normalized
/// name + list-depth + nullability encoding.
fn type_shape(ty: &SdlType<'_, String>) -> (ArcStr, usize, NullableSpec) {
    let mut node = ty;
    let mut outer_nullable = true;
    if let SdlType::NonNullType(inner) = node {
        outer_nullable = false;
        node = inner.as_ref();
    }
    let mut list_depth = 0;
    let mut items_nullable = false;
    loop {
        match node {
            SdlType::ListType(inner) => {
                list_depth += 1;
                let mut element = inner.as_ref();
                items_nullable = true;
                if let SdlType::NonNullType(wrapped) = element {
                    items_nullable = false;
                    element = wrapped.as_ref();
                }
                node = element;
            }
            SdlType::NamedType(name) => {
                let nullable = match (outer_nullable, list_depth > 0 && items_nullable) {
                    (false, false) => NullableSpec::NonNull,
                    (true, false) => NullableSpec::Outer,
                    (false, true) => NullableSpec::Items,
                    (true, true) => NullableSpec::ItemsAndList,
                };
                return (name.as_str().into(), list_depth, nullable);
            }
            SdlType::NonNullType(inner) => {
                // Non-null markers between list levels add nothing: wrapper
                // levels are non-nullable already.
                node = inner.as_ref();
            }
        }
    }
}

fn convert_default(
    source_name: &str,
    value: Option<&SdlValue<'_, String>>,
) -> Result<Option<Value>, SchemaError> {
    value
        .map(|v| convert_value(source_name, v))
        .transpose()
}

fn convert_value(source_name: &str, value: &SdlValue<'_, String>) -> Result<Value, SchemaError> {
    let unsupported = |what: &str| SchemaError::DocumentParse {
        source_name: source_name.into(),
        message: format!("{what} are not allowed in schema defaults"),
    };
    Ok(match value {
        SdlValue::Null => Value::Null,
        SdlValue::Int(n) => {
            let n = n.as_i64().and_then(|n| i32::try_from(n).ok()).ok_or_else(
                || SchemaError::DocumentParse {
                    source_name: source_name.into(),
                    message: "integer default out of 32-bit range".into(),
                },
            )?;
            Value::Int(n)
        }
        SdlValue::Float(x) => Value::Float(*x),
        SdlValue::String(s) => Value::String(s.clone()),
        SdlValue::Boolean(b) => Value::Boolean(*b),
        SdlValue::List(items) => Value::List(
            items
                .iter()
                .map(|item| convert_value(source_name, item))
                .collect::<Result<_, _>>()?,
        ),
        SdlValue::Object(entries) => {
            let mut object = IndexMap::new();
            for (key, entry) in entries {
                object.insert(key.clone(), convert_value(source_name, entry)?);
            }
            Value::Object(object)
        }
        SdlValue::Variable(_) => return Err(unsupported("variables")),
        SdlValue::Enum(_) => return Err(unsupported("enum literals")),
    })
}

fn deprecation(directives: &[Directive<'_, String>]) -> DeprecationStatus {
    for directive in directives {
        if directive.name == "deprecated" {
            let reason = directive.arguments.iter().find_map(|(name, value)| {
                if name != "reason" {
                    return None;
                }
                match value {
                    SdlValue::String(s) => Some(ArcStr::from(s.as_str())),
                    _ => None,
                }
            });
            return DeprecationStatus::Deprecated(reason);
        }
    }
    DeprecationStatus::Current
}

fn site(source_name: &str, position: Pos) -> DeclarationSite {
    DeclarationSite::new(arcstr::format!(
        "{source_name}:{}:{}",
        position.line,
        position.column
    ))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        SchemaError,
        ast::TypeRef,
        collect::DeclarationCollector,
        schema::meta::{DeprecationStatus, TypeKind},
        value::Value,
    };

    use super::declare_document;

    #[test]
    fn parses_object_and_input_types() {
        let mut collector = DeclarationCollector::new();
        declare_document(
            &mut collector,
            "schema.graphql",
            r#"
            "A blog post."
            type Post {
              id: Int!
              title: String!
              votes: Int @deprecated(reason: "use score")
            }

            input NewPost {
              title: String!
              votes: Int = 0
            }
            "#,
        )
        .unwrap();

        let metas = collector.finalize().unwrap();
        assert_eq!(metas.len(), 2);

        let post = &metas[0];
        assert_eq!(post.kind, TypeKind::Object);
        assert_eq!(post.description.as_deref(), Some("A blog post."));
        assert_eq!(
            post.field_by_name("id").unwrap().field_type,
            TypeRef::named("Int"),
        );
        assert_eq!(
            post.field_by_name("votes").unwrap().field_type,
            TypeRef::named("Int").nullable(),
        );
        assert_eq!(
            post.field_by_name("votes").unwrap().deprecation_status,
            DeprecationStatus::Deprecated(Some("use score".into())),
        );

        let new_post = &metas[1];
        assert_eq!(new_post.kind, TypeKind::Input);
        assert_eq!(
            new_post.field_by_name("votes").unwrap().default_value,
            Some(Value::Int(0)),
        );
    }

    #[test]
    fn parses_field_arguments_with_defaults() {
        let mut collector = DeclarationCollector::new();
        declare_document(
            &mut collector,
            "schema.graphql",
            r#"
            type Query {
              author(id: Int!, role: String = "writer"): Author
            }
            type Author { id: Int! }
            "#,
        )
        .unwrap();
        let metas = collector.finalize().unwrap();
        let author_field = metas[0].field_by_name("author").unwrap();
        assert_eq!(author_field.arguments.len(), 2);
        assert!(author_field.arguments[0].is_required());
        assert_eq!(
            author_field.arguments[1].default_value,
            Some("writer".into()),
        );
    }

    #[test]
    fn list_nullability_maps_onto_both_axes() {
        let mut collector = DeclarationCollector::new();
        declare_document(
            &mut collector,
            "schema.graphql",
            r#"
            type Author {
              posts: [Post]
              topPosts: [Post!]!
              drafts: [Post]!
            }
            type Post { id: Int! }
            "#,
        )
        .unwrap();
        let metas = collector.finalize().unwrap();
        let author = &metas[0];
        assert_eq!(
            author.field_by_name("posts").unwrap().field_type,
            TypeRef::named("Post").list().nullable().items_nullable(),
        );
        assert_eq!(
            author.field_by_name("topPosts").unwrap().field_type,
            TypeRef::named("Post").list(),
        );
        assert_eq!(
            author.field_by_name("drafts").unwrap().field_type,
            TypeRef::named("Post").list().items_nullable(),
        );
    }

    #[test]
    fn rejects_definitions_outside_the_data_model() {
        let mut collector = DeclarationCollector::new();
        let err = declare_document(
            &mut collector,
            "schema.graphql",
            "enum Episode { NEWHOPE EMPIRE }",
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DocumentParse { .. }));
        assert!(err.to_string().contains("enum"));
    }

    #[test]
    fn reports_parse_failures_with_the_source_name() {
        let mut collector = DeclarationCollector::new();
        let err = declare_document(&mut collector, "broken.graphql", "type {").unwrap_err();
        match err {
            SchemaError::DocumentParse { source_name, .. } => {
                assert_eq!(source_name, "broken.graphql");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn builtin_scalar_redeclarations_are_ignored() {
        let mut collector = DeclarationCollector::new();
        declare_document(
            &mut collector,
            "schema.graphql",
            "scalar ID\nscalar DateTime",
        )
        .unwrap();
        let metas = collector.finalize().unwrap();
        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].name, "DateTime");
        assert_eq!(metas[0].kind, TypeKind::Scalar);
    }
}
