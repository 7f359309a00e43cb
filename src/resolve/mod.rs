//! Resolver binding and request-time dispatch.
//!
//! During startup every `(type, field)` pair is routed to at most one
//! registered [`Resolver`]; fields without one fall back to reading the
//! same-named property off the parent value. Fields of the reserved root
//! types get no such fallback: a top-level operation without an explicit
//! resolver fails binder finalization.
//!
//! At request time [`dispatch_field`] joins argument coercion with the
//! bound handler. Handlers return a value or a future of a value; the
//! caller awaits deferred results before resolving child fields.

use std::{any::Any, fmt, sync::Arc};

use arcstr::ArcStr;
use derive_more::{Display, Error};
use fnv::FnvHashMap;
use futures::future::BoxFuture;

use crate::{
    SchemaError,
    ast::TypeRef,
    coerce::{Arguments, ConstraintValidator, coerce_field_arguments},
    schema::{
        meta::{Field, TypeKind},
        registry::RegistrySnapshot,
    },
    value::Value,
};

/// Name of the reserved root query type.
pub const QUERY_TYPE: &str = "Query";

/// Name of the reserved root mutation type.
pub const MUTATION_TYPE: &str = "Mutation";

/// Whether `name` is one of the reserved root operation types.
pub fn is_root_type(name: &str) -> bool {
    name == QUERY_TYPE || name == MUTATION_TYPE
}

/// Error type for errors that occur during field resolution.
///
/// Field errors carry a human-readable message and an optional structured
/// `data` value. They can be converted from anything implementing
/// [`fmt::Display`], which makes error chaining with the `?` operator a
/// breeze.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldError {
    message: String,
    data: Value,
}

impl<T: fmt::Display> From<T> for FieldError {
    fn from(e: T) -> Self {
        Self {
            message: e.to_string(),
            data: Value::Null,
        }
    }
}

impl FieldError {
    /// Constructs a new error with additional structured data.
    pub fn new<T: fmt::Display>(message: T, data: Value) -> Self {
        Self {
            message: message.to_string(),
            data,
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The structured error data, or [`Value::Null`] if none was attached.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Returns the same error with its message prefixed by `context`.
    #[must_use]
    pub fn prefixed(self, context: &str) -> Self {
        Self {
            message: format!("{context}: {}", self.message),
            data: self.data,
        }
    }
}

/// The result of resolving a field of some type.
pub type FieldResult<T> = Result<T, FieldError>;

/// A field error attached to its location in the response.
///
/// The external executor accumulates these; one failing field never aborts
/// its siblings.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionError {
    path: Vec<String>,
    error: FieldError,
}

impl ExecutionError {
    /// Creates an execution error at the given response path.
    pub fn new(path: &[&str], error: FieldError) -> Self {
        Self {
            path: path.iter().map(|s| (*s).into()).collect(),
            error,
        }
    }

    /// The path of fields leading to the failed field.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The underlying field error.
    pub fn error(&self) -> &FieldError {
        &self.error
    }
}

/// Where one handler parameter is extracted from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParamSource {
    /// The parent value of the enclosing selection.
    Root,
    /// The request context object.
    Context,
    /// Static information about the resolved field.
    Info,
    /// All coerced arguments at once.
    Args,
    /// One coerced argument, selected by key.
    RawArg,
}

/// One entry of a resolver's parameter-extraction plan.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParamSpec {
    /// Extraction source.
    pub source: ParamSource,
    /// Argument key, only meaningful for [`ParamSource::RawArg`].
    pub key: Option<ArcStr>,
}

/// Static information about the field being resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolveInfo {
    /// Name of the type owning the field.
    pub parent_type: ArcStr,
    /// Name of the field.
    pub field_name: ArcStr,
    /// Declared type of the field.
    pub field_type: TypeRef,
}

/// A shared, type-erased service or context object.
pub type Shared = Arc<dyn Any + Send + Sync>;

/// One extracted handler parameter.
#[derive(Clone)]
pub enum ResolvedParam {
    /// The parent value.
    Root(Value),
    /// The request context.
    Context(Shared),
    /// Field information.
    Info(ResolveInfo),
    /// All coerced arguments.
    Args(Arguments),
    /// A single coerced argument value.
    RawArg(Value),
}

/// A handler's result: either an immediate value or a future of one.
///
/// The caller must await [`ResolverValue::Deferred`] before resolving child
/// fields; field resolution never proceeds on a still-pending parent value.
pub enum ResolverValue {
    /// The handler produced a value synchronously.
    Ready(FieldResult<Value>),
    /// The handler suspended; the value arrives later.
    Deferred(BoxFuture<'static, FieldResult<Value>>),
}

impl ResolverValue {
    /// Shorthand for an immediate successful value.
    pub fn ok(value: Value) -> Self {
        Self::Ready(Ok(value))
    }

    /// Shorthand for an immediate error.
    pub fn err(error: FieldError) -> Self {
        Self::Ready(Err(error))
    }

    /// Awaits the value, whether it was ready or deferred.
    pub async fn wait(self) -> FieldResult<Value> {
        match self {
            Self::Ready(result) => result,
            Self::Deferred(future) => future.await,
        }
    }
}

type ResolverFn = Arc<dyn Fn(Option<Shared>, Vec<ResolvedParam>) -> ResolverValue + Send + Sync>;

/// Binds a `(type, field)` pair to a handler function.
///
/// The key is the explicit public name, never derived from the handler, so
/// renaming a handler never changes the wire contract. Top-level operations
/// are fields of the reserved root types.
#[derive(Clone)]
pub struct Resolver {
    /// Owning type name.
    pub type_name: ArcStr,
    /// Field name within the owning type.
    pub field_name: ArcStr,
    /// Declared parent-type requirement, checked against the owning type.
    pub parent_type: Option<ArcStr>,
    /// Name of the service class instantiated through the injected factory.
    pub service: Option<ArcStr>,
    /// Parameter-extraction plan, applied in order.
    pub params: Vec<ParamSpec>,
    handler: ResolverFn,
}

impl Resolver {
    /// Creates a field resolver for `type_name.field_name`.
    pub fn field<F>(
        type_name: impl Into<ArcStr>,
        field_name: impl Into<ArcStr>,
        handler: F,
    ) -> Self
    where
        F: Fn(Option<Shared>, Vec<ResolvedParam>) -> ResolverValue + Send + Sync + 'static,
    {
        Self {
            type_name: type_name.into(),
            field_name: field_name.into(),
            parent_type: None,
            service: None,
            params: vec![],
            handler: Arc::new(handler),
        }
    }

    /// Creates a top-level query resolver.
    pub fn query<F>(field_name: impl Into<ArcStr>, handler: F) -> Self
    where
        F: Fn(Option<Shared>, Vec<ResolvedParam>) -> ResolverValue + Send + Sync + 'static,
    {
        Self::field(QUERY_TYPE, field_name, handler)
    }

    /// Creates a top-level mutation resolver.
    pub fn mutation<F>(field_name: impl Into<ArcStr>, handler: F) -> Self
    where
        F: Fn(Option<Shared>, Vec<ResolvedParam>) -> ResolverValue + Send + Sync + 'static,
    {
        Self::field(MUTATION_TYPE, field_name, handler)
    }

    /// Declares the parent type this resolver expects.
    #[must_use]
    pub fn parent(mut self, type_name: impl Into<ArcStr>) -> Self {
        self.parent_type = Some(type_name.into());
        self
    }

    /// Names the service class to instantiate for this resolver.
    #[must_use]
    pub fn service(mut self, service: impl Into<ArcStr>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Appends one entry to the parameter-extraction plan.
    #[must_use]
    pub fn param(mut self, source: ParamSource, key: Option<&str>) -> Self {
        self.params.push(ParamSpec {
            source,
            key: key.map(Into::into),
        });
        self
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("type_name", &self.type_name)
            .field("field_name", &self.field_name)
            .field("parent_type", &self.parent_type)
            .field("service", &self.service)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Error returned by a [`ServiceFactory`].
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
#[display("{reason}")]
pub struct ServiceError {
    /// Why instantiation failed.
    #[error(not(source))]
    pub reason: String,
}

impl ServiceError {
    /// Creates a factory error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Injected dependency-injection capability.
///
/// The binder asks the factory once per distinct service name; the core
/// never constructs resolver-holding instances itself.
pub trait ServiceFactory: Send + Sync {
    /// Produces the shared instance for a service class name.
    fn instantiate(&self, service: &str) -> Result<Shared, ServiceError>;
}

/// A factory for schemas whose resolvers declare no services.
pub struct NullFactory;

impl ServiceFactory for NullFactory {
    fn instantiate(&self, service: &str) -> Result<Shared, ServiceError> {
        Err(ServiceError::new(format!(
            "no service factory configured, cannot instantiate `{service}`"
        )))
    }
}

/// A resolver together with its instantiated service, ready to invoke.
pub struct BoundResolver {
    resolver: Resolver,
    service: Option<Shared>,
}

impl BoundResolver {
    /// The underlying resolver descriptor.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Invokes the handler with already-extracted parameters.
    pub fn invoke(&self, params: Vec<ResolvedParam>) -> ResolverValue {
        (self.resolver.handler)(self.service.clone(), params)
    }
}

/// The outcome of binding a `(type, field)` pair.
pub enum Binding<'a> {
    /// An explicit resolver is registered for the field.
    Resolver(&'a BoundResolver),
    /// No resolver; the field reads the same-named property off the parent.
    Property,
}

/// Collects resolver registrations and validates them against a registry
/// snapshot.
#[derive(Default)]
pub struct ResolverBinder {
    resolvers: Vec<Resolver>,
}

impl ResolverBinder {
    /// Constructs an empty binder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resolver; a second registration for the same
    /// `(type, field)` key is a conflict.
    pub fn register(&mut self, resolver: Resolver) -> Result<(), SchemaError> {
        if self
            .resolvers
            .iter()
            .any(|r| r.type_name == resolver.type_name && r.field_name == resolver.field_name)
        {
            return Err(SchemaError::DuplicateResolver {
                type_name: resolver.type_name.clone(),
                field_name: resolver.field_name.clone(),
            });
        }
        self.resolvers.push(resolver);
        Ok(())
    }

    /// Validates all registrations and produces the immutable bindings.
    ///
    /// Checks, in order: every resolver targets an existing object-type
    /// field; declared parent types match the owning type; every service
    /// instantiates; every root-type field has an explicit resolver.
    pub fn finalize(
        self,
        snapshot: &RegistrySnapshot,
        factory: &dyn ServiceFactory,
    ) -> Result<ResolverBindings, SchemaError> {
        let mut bindings: FnvHashMap<ArcStr, FnvHashMap<ArcStr, BoundResolver>> =
            FnvHashMap::default();
        let mut services: FnvHashMap<ArcStr, Shared> = FnvHashMap::default();
        let resolver_count = self.resolvers.len();

        for resolver in self.resolvers {
            let meta = snapshot
                .type_by_name(&resolver.type_name)
                .filter(|m| m.kind == TypeKind::Object)
                .ok_or_else(|| SchemaError::UnknownType {
                    name: resolver.type_name.clone(),
                })?;
            if meta.field_by_name(&resolver.field_name).is_none() {
                return Err(SchemaError::DanglingReference {
                    type_name: resolver.type_name.clone(),
                    field_name: resolver.field_name.clone(),
                    reference: resolver.field_name.clone(),
                });
            }
            if let Some(parent) = &resolver.parent_type {
                if parent != &resolver.type_name {
                    return Err(SchemaError::ParentTypeMismatch {
                        type_name: resolver.type_name.clone(),
                        field_name: resolver.field_name.clone(),
                        declared: parent.clone(),
                    });
                }
            }
            let service = match &resolver.service {
                Some(name) => Some(match services.get(name) {
                    Some(instance) => instance.clone(),
                    None => {
                        let instance = factory.instantiate(name).map_err(|e| {
                            SchemaError::ServiceInstantiation {
                                service: name.clone(),
                                reason: e.reason,
                            }
                        })?;
                        services.insert(name.clone(), instance.clone());
                        instance
                    }
                }),
                None => None,
            };
            bindings
                .entry(resolver.type_name.clone())
                .or_default()
                .insert(
                    resolver.field_name.clone(),
                    BoundResolver { resolver, service },
                );
        }

        // Top-level operations never fall back to property access.
        for root in [QUERY_TYPE, MUTATION_TYPE] {
            let Some(meta) = snapshot.type_by_name(root) else {
                continue;
            };
            for field in &meta.fields {
                let bound = bindings
                    .get(root)
                    .is_some_and(|fields| fields.contains_key(&field.name));
                if !bound {
                    return Err(SchemaError::UnresolvedField {
                        type_name: root.into(),
                        field_name: field.name.clone(),
                    });
                }
            }
        }

        log::debug!("resolver binder finalized with {resolver_count} resolvers");
        Ok(ResolverBindings { bindings })
    }
}

/// Immutable resolver bindings, produced by [`ResolverBinder::finalize`].
///
/// Safe for unsynchronized concurrent reads from any number of
/// request-handling tasks.
pub struct ResolverBindings {
    bindings: FnvHashMap<ArcStr, FnvHashMap<ArcStr, BoundResolver>>,
}

impl fmt::Debug for ResolverBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverBindings")
            .field("types", &self.bindings.len())
            .finish_non_exhaustive()
    }
}

impl ResolverBindings {
    /// Binds a `(type, field)` pair. Idempotent: the same key always yields
    /// the same binding.
    pub fn bind(&self, type_name: &str, field_name: &str) -> Binding<'_> {
        match self
            .bindings
            .get(type_name)
            .and_then(|fields| fields.get(field_name))
        {
            Some(bound) => Binding::Resolver(bound),
            None => Binding::Property,
        }
    }

    /// Iterates all bound resolvers in no particular order.
    pub fn resolvers(&self) -> impl Iterator<Item = &BoundResolver> {
        self.bindings.values().flat_map(|fields| fields.values())
    }
}

/// Resolves one field selection: coerces the raw arguments, binds the
/// field, and either invokes the handler or falls back to property access.
///
/// Every failure is returned as a field-scoped error; sibling fields of the
/// same query are unaffected.
pub fn dispatch_field(
    snapshot: &RegistrySnapshot,
    bindings: &ResolverBindings,
    type_name: &str,
    field_name: &str,
    parent: &Value,
    raw_args: &Value,
    context: &Shared,
    validator: &dyn ConstraintValidator,
) -> ResolverValue {
    let Some(field) = snapshot
        .type_by_name(type_name)
        .and_then(|meta| meta.field_by_name(field_name))
    else {
        return ResolverValue::err(FieldError::from(format!(
            "field `{type_name}.{field_name}` does not exist in the schema"
        )));
    };

    let args = match coerce_field_arguments(field, raw_args, snapshot, validator) {
        Ok(args) => args,
        Err(e) => return ResolverValue::err(e),
    };

    match bindings.bind(type_name, field_name) {
        Binding::Resolver(bound) => {
            let params = extract_params(
                &bound.resolver().params,
                type_name,
                field,
                parent,
                context,
                &args,
            );
            bound.invoke(params)
        }
        Binding::Property => ResolverValue::Ready(read_property(field, parent)),
    }
}

fn extract_params(
    plan: &[ParamSpec],
    type_name: &str,
    field: &Field,
    parent: &Value,
    context: &Shared,
    args: &Arguments,
) -> Vec<ResolvedParam> {
    plan.iter()
        .map(|spec| match spec.source {
            ParamSource::Root => ResolvedParam::Root(parent.clone()),
            ParamSource::Context => ResolvedParam::Context(context.clone()),
            ParamSource::Info => ResolvedParam::Info(ResolveInfo {
                parent_type: type_name.into(),
                field_name: field.name.clone(),
                field_type: field.field_type.clone(),
            }),
            ParamSource::Args => ResolvedParam::Args(args.clone()),
            ParamSource::RawArg => {
                let value = spec
                    .key
                    .as_deref()
                    .and_then(|key| args.get(key))
                    .cloned()
                    .unwrap_or(Value::Null);
                ResolvedParam::RawArg(value)
            }
        })
        .collect()
}

fn read_property(field: &Field, parent: &Value) -> FieldResult<Value> {
    let value = parent
        .as_object_value()
        .and_then(|entries| entries.get(field.name.as_str()))
        .cloned()
        .unwrap_or(Value::Null);
    if value.is_null() && !field.field_type.nullable.outer {
        return Err(FieldError::from(format!(
            "non-nullable field `{}` has no value on the parent",
            field.name
        )));
    }
    Ok(value)
}
