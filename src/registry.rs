//! Model registry: type resolution and the set of defined models.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ResolveError;
use crate::introspect::{Introspector, TypeModel};
use crate::schema::SchemaDescriptor;
use crate::synth::build_model;
use crate::types::{is_not_blank, ResolveOptions, TypeDescriptor, TypeNaming};
use crate::views::decorate_model_name;

/// Resolves types to schemas and owns the models defined along the way.
pub trait ModelRegistry {
    /// Schema for a type: inline for primitives and containers, a `$ref` for
    /// models. `None` when the type is ignored.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError` when the type is unknown or a model fails to build.
    fn resolve(&mut self, ty: &TypeDescriptor) -> Result<Option<SchemaDescriptor>, ResolveError>;

    /// Name of the model a type resolves to, `None` for unnamed schemas.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`ModelRegistry::resolve`].
    fn resolve_name(&mut self, ty: &TypeDescriptor) -> Result<Option<String>, ResolveError> {
        Ok(self.resolve(ty)?.and_then(|schema| schema.name))
    }

    fn defined_models(&self) -> &BTreeMap<String, SchemaDescriptor>;

    fn defined_models_mut(&mut self) -> &mut BTreeMap<String, SchemaDescriptor>;
}

/// Registry backed by an [`Introspector`], synthesizing models on demand.
///
/// Each model is built once. A type that is already being built resolves to
/// a `$ref`, so cyclic type graphs terminate.
pub struct ModelContext<'a> {
    introspector: &'a dyn Introspector,
    options: &'a ResolveOptions,
    models: BTreeMap<String, SchemaDescriptor>,
    in_progress: BTreeSet<String>,
}

impl<'a> ModelContext<'a> {
    pub fn new(introspector: &'a dyn Introspector, options: &'a ResolveOptions) -> Self {
        Self {
            introspector,
            options,
            models: BTreeMap::new(),
            in_progress: BTreeSet::new(),
        }
    }

    pub fn introspector(&self) -> &'a dyn Introspector {
        self.introspector
    }

    pub fn options(&self) -> &'a ResolveOptions {
        self.options
    }

    /// Model name for a type under the current options.
    pub fn model_name(&self, model: &TypeModel, ty: &TypeDescriptor) -> String {
        model_name(model, ty, self.options)
    }

    /// Register a built model under its name.
    pub fn define_model(&mut self, name: String, schema: SchemaDescriptor) {
        tracing::debug!(model = %name, properties = schema.properties.len(), "defined model");
        self.models.insert(name, schema);
    }

    pub fn into_models(self) -> BTreeMap<String, SchemaDescriptor> {
        self.models
    }

    fn resolve_container(
        &mut self,
        ty: &TypeDescriptor,
    ) -> Result<Option<Option<SchemaDescriptor>>, ResolveError> {
        let schema = match ty.name.as_str() {
            "list" | "array" | "set" => {
                let items = match ty.generics.first() {
                    Some(item) => match self.resolve(item)? {
                        Some(items) => items,
                        None => return Ok(Some(None)),
                    },
                    None => SchemaDescriptor::default(),
                };
                let mut schema = SchemaDescriptor::array_of(items);
                if ty.name == "set" {
                    schema.array_mut().unique_items = Some(true);
                }
                schema
            }
            "map" => {
                let mut schema = SchemaDescriptor::object();
                if let Some(value) = ty.generics.get(1) {
                    match self.resolve(value)? {
                        Some(values) => schema.additional_properties = Some(Box::new(values)),
                        None => return Ok(Some(None)),
                    }
                }
                schema
            }
            _ => return Ok(None),
        };
        Ok(Some(Some(schema)))
    }
}

impl ModelRegistry for ModelContext<'_> {
    fn resolve(&mut self, ty: &TypeDescriptor) -> Result<Option<SchemaDescriptor>, ResolveError> {
        if self.options.is_ignored(ty) {
            tracing::trace!(ty = %ty, "skipping ignored type");
            return Ok(None);
        }
        if let Some(schema) = primitive(&ty.name) {
            return Ok(Some(schema));
        }
        if let Some(container) = self.resolve_container(ty)? {
            return Ok(container);
        }

        let introspector = self.introspector;
        let model = introspector
            .type_model(ty)
            .ok_or_else(|| ResolveError::UnknownType {
                name: ty.to_string(),
            })?;
        let name = self.model_name(model, ty);
        if self.models.contains_key(&name) || self.in_progress.contains(&name) {
            return Ok(Some(SchemaDescriptor::reference(&name)));
        }

        self.in_progress.insert(name.clone());
        let built = build_model(self, model, ty, &name);
        self.in_progress.remove(&name);
        self.define_model(name.clone(), built?);
        Ok(Some(SchemaDescriptor::reference(&name)))
    }

    fn defined_models(&self) -> &BTreeMap<String, SchemaDescriptor> {
        &self.models
    }

    fn defined_models_mut(&mut self) -> &mut BTreeMap<String, SchemaDescriptor> {
        &mut self.models
    }
}

/// Inline schema of a built-in scalar type.
pub fn primitive(name: &str) -> Option<SchemaDescriptor> {
    let schema = match name {
        "string" | "java.lang.String" => SchemaDescriptor::string(),
        "boolean" | "java.lang.Boolean" => SchemaDescriptor::of_type("boolean"),
        "integer" | "int" | "int32" | "java.lang.Integer" => {
            SchemaDescriptor::of_type("integer").with_format("int32")
        }
        "long" | "int64" | "java.lang.Long" => {
            SchemaDescriptor::of_type("integer").with_format("int64")
        }
        "number" | "decimal" | "java.math.BigDecimal" => SchemaDescriptor::of_type("number"),
        "float" => SchemaDescriptor::of_type("number").with_format("float"),
        "double" => SchemaDescriptor::of_type("number").with_format("double"),
        "date" => SchemaDescriptor::string().with_format("date"),
        "date-time" => SchemaDescriptor::string().with_format("date-time"),
        "uuid" => SchemaDescriptor::string().with_format("uuid"),
        "byte" => SchemaDescriptor::string().with_format("byte"),
        "binary" => SchemaDescriptor::string().with_format("binary"),
        "object" | "java.lang.Object" => SchemaDescriptor::object(),
        _ => return None,
    };
    Some(schema)
}

/// Name under which a type's model is defined.
///
/// A non-blank class-level schema name wins over the type name. `$` becomes
/// `_`, every bound generic argument appends `_<argument>`, and the result is
/// qualified with the requested views.
pub fn model_name(model: &TypeModel, ty: &TypeDescriptor, options: &ResolveOptions) -> String {
    let base = model
        .annotations
        .schema()
        .and_then(|s| s.name.as_deref())
        .map(str::trim)
        .filter(|n| is_not_blank(n))
        .map(str::to_string)
        .unwrap_or_else(|| type_name(ty, options.naming).replace('$', "_"));

    let mut name = base;
    for argument in &ty.generics {
        name.push('_');
        name.push_str(&generic_token(argument, options.naming));
    }
    decorate_model_name(&name, &options.views)
}

fn type_name(ty: &TypeDescriptor, naming: TypeNaming) -> String {
    match naming {
        TypeNaming::Simple => ty.simple_name().to_string(),
        TypeNaming::Qualified if ty.name.starts_with("java.") => ty.simple_name().to_string(),
        TypeNaming::Qualified => ty.name.clone(),
    }
}

fn generic_token(ty: &TypeDescriptor, naming: TypeNaming) -> String {
    let mut token = type_name(ty, naming).replace(['.', '$'], "_");
    for argument in &ty.generics {
        token.push('_');
        token.push_str(&generic_token(argument, naming));
    }
    token
}
