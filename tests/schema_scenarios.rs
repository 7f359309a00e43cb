//! End-to-end scenarios: declarations from both producers, binding,
//! assembly, schema export, and request-time dispatch.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use larch::{
    AcceptAll, DeclarationCollector, FieldAnnotation, NullFactory, ObjectAnnotation, ParamSource,
    Resolver, ResolverBinder, ResolverValue, SchemaError, ServiceError, ServiceFactory, Shared,
    StructuralHint, TypeRegistry, Value, assemble, declare_document, dispatch_field,
};

/// The user-supplied posts service, as the DI container would produce it.
struct PostsService {
    posts: Vec<(i32, Value)>,
}

impl PostsService {
    fn find_all(&self, author_id: i32) -> Value {
        Value::list(
            self.posts
                .iter()
                .filter(|(owner, _)| *owner == author_id)
                .map(|(_, post)| post.clone()),
        )
    }
}

struct Factory;

impl ServiceFactory for Factory {
    fn instantiate(&self, service: &str) -> Result<Shared, ServiceError> {
        match service {
            "PostsService" => Ok(Arc::new(PostsService {
                posts: vec![
                    (
                        1,
                        Value::object([
                            ("id", Value::from(10)),
                            ("title", Value::from("Introduction to Larch")),
                            ("votes", Value::from(3)),
                        ]),
                    ),
                    (
                        2,
                        Value::object([
                            ("id", Value::from(11)),
                            ("title", Value::from("Advanced Larch")),
                            ("votes", Value::Null),
                        ]),
                    ),
                ],
            })),
            other => Err(ServiceError::new(format!("unknown service `{other}`"))),
        }
    }
}

fn declare_schema(collector: &mut DeclarationCollector) {
    // Code-first half: Author and the root query type.
    ObjectAnnotation::object("Author", "src/author.model.rs")
        .field(FieldAnnotation::new("id", StructuralHint::Int))
        .field(FieldAnnotation::new("firstName", StructuralHint::String).nullable())
        .field(FieldAnnotation::new("lastName", StructuralHint::String).nullable())
        .field(
            FieldAnnotation::new("posts", StructuralHint::named("Post"))
                .list()
                .items_and_list_nullable(),
        )
        .declare(collector)
        .unwrap();
    ObjectAnnotation::object("Query", "src/author.resolver.rs")
        .field(
            FieldAnnotation::new("author", StructuralHint::named("Author"))
                .nullable()
                .arg(larch::ArgAnnotation::new("id", StructuralHint::Int)),
        )
        .declare(collector)
        .unwrap();

    // Schema-first half: Post comes from a standalone document.
    declare_document(
        collector,
        "post.graphql",
        r#"
        type Post {
          id: Int!
          title: String!
          votes: Int
        }
        "#,
    )
    .unwrap();
}

fn build_registry(collector: DeclarationCollector) -> larch::RegistrySnapshot {
    let mut registry = TypeRegistry::new();
    for meta in collector.finalize().unwrap() {
        registry.register(meta).unwrap();
    }
    registry.finalize().unwrap()
}

fn author_posts_resolver() -> Resolver {
    Resolver::field("Author", "posts", |service, params| {
        let Some(service) = service else {
            return ResolverValue::err("PostsService was not instantiated".into());
        };
        let Some(posts) = service.downcast_ref::<PostsService>().map(|s| {
            let author_id = match params.first() {
                Some(larch::ResolvedParam::Root(parent)) => parent
                    .as_object_value()
                    .and_then(|o| o.get("id"))
                    .and_then(Value::as_int_value)
                    .unwrap_or(0),
                _ => 0,
            };
            s.find_all(author_id)
        }) else {
            return ResolverValue::err("PostsService has the wrong type".into());
        };
        ResolverValue::ok(posts)
    })
    .parent("Author")
    .service("PostsService")
    .param(ParamSource::Root, None)
}

fn query_author_resolver() -> Resolver {
    Resolver::query("author", |_, params| {
        let id = match params.first() {
            Some(larch::ResolvedParam::RawArg(value)) => value.as_int_value().unwrap_or(0),
            _ => 0,
        };
        // Suspends on purpose: the caller must await before child fields.
        ResolverValue::Deferred(Box::pin(async move {
            Ok(Value::object([
                ("id", Value::from(id)),
                ("firstName", Value::from("Ada")),
                ("lastName", Value::from("Lovelace")),
            ]))
        }))
    })
    .param(ParamSource::RawArg, Some("id"))
}

#[test]
fn author_post_schema_renders_expected_definition() {
    let mut collector = DeclarationCollector::new();
    declare_schema(&mut collector);
    let snapshot = build_registry(collector);

    let mut binder = ResolverBinder::new();
    binder.register(query_author_resolver()).unwrap();
    binder.register(author_posts_resolver()).unwrap();
    let bindings = binder.finalize(&snapshot, &Factory).unwrap();

    let document = assemble(&snapshot, &bindings);
    let sdl = document.to_sdl();

    assert!(sdl.contains(
        "type Author {\n  id: Int!\n  firstName: String\n  lastName: String\n  posts: [Post]\n}"
    ));
    assert!(sdl.contains("type Post {\n  id: Int!\n  title: String!\n  votes: Int\n}"));
    assert!(sdl.contains("author(id: Int!): Author"));

    // The explicit resolver wins over property fallback.
    assert!(document.has_resolver("Author", "posts"));
    assert!(!document.has_resolver("Author", "firstName"));
    assert_eq!(
        document.resolvers()[0].service.as_deref(),
        Some("PostsService")
    );
}

#[tokio::test]
async fn author_post_dispatch_flows_parent_to_children() {
    let mut collector = DeclarationCollector::new();
    declare_schema(&mut collector);
    let snapshot = build_registry(collector);

    let mut binder = ResolverBinder::new();
    binder.register(query_author_resolver()).unwrap();
    binder.register(author_posts_resolver()).unwrap();
    let bindings = binder.finalize(&snapshot, &Factory).unwrap();

    let context: Shared = Arc::new(());

    // Top-level operation: deferred, awaited before children resolve.
    let author = dispatch_field(
        &snapshot,
        &bindings,
        "Query",
        "author",
        &Value::Null,
        &Value::object([("id", Value::from(1))]),
        &context,
        &AcceptAll,
    )
    .wait()
    .await
    .unwrap();

    // Child field through the explicit resolver.
    let posts = dispatch_field(
        &snapshot,
        &bindings,
        "Author",
        "posts",
        &author,
        &Value::Null,
        &context,
        &AcceptAll,
    )
    .wait()
    .await
    .unwrap();
    let posts = posts.as_list_value().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(
        posts[0].as_object_value().unwrap()["title"],
        Value::from("Introduction to Larch")
    );

    // Sibling field through property fallback, unaffected by the resolver.
    let first_name = dispatch_field(
        &snapshot,
        &bindings,
        "Author",
        "firstName",
        &author,
        &Value::Null,
        &context,
        &AcceptAll,
    )
    .wait()
    .await
    .unwrap();
    assert_eq!(first_name, Value::from("Ada"));

    // A failing field is scoped to itself; siblings already resolved fine.
    let err = dispatch_field(
        &snapshot,
        &bindings,
        "Query",
        "author",
        &Value::Null,
        &Value::object([("id", Value::from("not-an-int"))]),
        &context,
        &AcceptAll,
    )
    .wait()
    .await
    .unwrap_err();
    assert!(err.message().contains("expected `Int`"));
}

#[test]
fn top_level_operation_without_resolver_fails_finalize() {
    let mut collector = DeclarationCollector::new();
    declare_schema(&mut collector);
    let snapshot = build_registry(collector);

    let mut binder = ResolverBinder::new();
    binder.register(author_posts_resolver()).unwrap();
    let err = binder.finalize(&snapshot, &Factory).unwrap_err();
    assert_eq!(
        err,
        SchemaError::UnresolvedField {
            type_name: "Query".into(),
            field_name: "author".into(),
        }
    );
}

#[test]
fn both_authoring_modes_converge_on_one_model() {
    // The same Author type declared twice, once per mode.
    let mut collector = DeclarationCollector::new();
    ObjectAnnotation::object("Author", "src/author.model.rs")
        .field(FieldAnnotation::new("id", StructuralHint::Int))
        .field(FieldAnnotation::new("firstName", StructuralHint::String).nullable())
        .declare(&mut collector)
        .unwrap();
    declare_document(
        &mut collector,
        "author.graphql",
        "type Author {\n  id: Int!\n  firstName: String\n}",
    )
    .unwrap();

    let metas = collector.finalize().unwrap();
    assert_eq!(metas.len(), 1);
    assert_eq!(metas[0].fields.len(), 2);
}

#[test]
fn modes_conflicting_on_a_type_reference_are_fatal() {
    let mut collector = DeclarationCollector::new();
    ObjectAnnotation::object("Author", "src/author.model.rs")
        .field(FieldAnnotation::new("id", StructuralHint::Int))
        .declare(&mut collector)
        .unwrap();
    declare_document(
        &mut collector,
        "author.graphql",
        "type Author {\n  id: String!\n}",
    )
    .unwrap();

    let err = collector.finalize().unwrap_err();
    match err {
        SchemaError::ConflictingDeclaration {
            subject,
            first_site,
            second_site,
        } => {
            assert_eq!(subject, "Author.id");
            assert_eq!(first_site, "src/author.model.rs");
            assert!(second_site.starts_with("author.graphql:"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn argument_bundles_dispatch_like_inline_arguments() {
    let mut collector = DeclarationCollector::new();
    ObjectAnnotation::args("GetAuthor", "src/get_author.args.rs")
        .field(FieldAnnotation::new("firstName", StructuralHint::String).nullable())
        .field(
            FieldAnnotation::new("lastName", StructuralHint::String)
                .default_value("".into()),
        )
        .declare(&mut collector)
        .unwrap();
    ObjectAnnotation::object("Query", "src/author.resolver.rs")
        .field(
            FieldAnnotation::new("author", StructuralHint::named("Author"))
                .nullable()
                .bundle("GetAuthor"),
        )
        .declare(&mut collector)
        .unwrap();
    ObjectAnnotation::object("Author", "src/author.model.rs")
        .field(FieldAnnotation::new("id", StructuralHint::Int))
        .declare(&mut collector)
        .unwrap();
    let snapshot = build_registry(collector);

    let mut binder = ResolverBinder::new();
    binder
        .register(
            Resolver::query("author", |_, params| {
                let args = match params.first() {
                    Some(larch::ResolvedParam::Args(args)) => args.clone(),
                    _ => return ResolverValue::err("expected coerced arguments".into()),
                };
                ResolverValue::ok(args.into_value())
            })
            .param(ParamSource::Args, None),
        )
        .unwrap();
    let bindings = binder.finalize(&snapshot, &NullFactory).unwrap();

    let context: Shared = Arc::new(());
    let coerced = dispatch_field(
        &snapshot,
        &bindings,
        "Query",
        "author",
        &Value::Null,
        &Value::object(Vec::<(&str, Value)>::new()),
        &context,
        &AcceptAll,
    )
    .wait()
    .await
    .unwrap();

    assert_eq!(
        coerced,
        Value::object([("firstName", Value::Null), ("lastName", Value::from(""))])
    );
}

#[test]
fn schema_document_serializes_for_machine_consumers() {
    let mut collector = DeclarationCollector::new();
    declare_schema(&mut collector);
    let snapshot = build_registry(collector);

    let mut binder = ResolverBinder::new();
    binder.register(query_author_resolver()).unwrap();
    binder.register(author_posts_resolver()).unwrap();
    let bindings = binder.finalize(&snapshot, &Factory).unwrap();
    let document = assemble(&snapshot, &bindings);

    let json: serde_json::Value = serde_json::to_value(&document).unwrap();
    let types = json["types"].as_array().unwrap();
    assert!(types.iter().any(|t| t["name"] == "Author"));
    assert_eq!(json["query_type"], "Query");
    assert_eq!(json["resolvers"][0]["service"], "PostsService");
}
