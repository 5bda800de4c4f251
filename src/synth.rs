//! Model synthesis: builds object schemas for introspected types.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::access::{apply_access_mode, resolve_access_mode};
use crate::array::resolve_array_schema;
use crate::discriminator::{resolve_discriminator, retrofit_discriminator_property};
use crate::error::ResolveError;
use crate::facets::FacetSource;
use crate::introspect::{AnnotatedType, Introspector, PropertyDescriptor, TypeModel};
use crate::metadata::{merge_schema_metadata, MergedMeta};
use crate::registry::{ModelContext, ModelRegistry};
use crate::resolver::{resolve_annotated_type, resolve_schema_members};
use crate::schema::SchemaDescriptor;
use crate::types::{is_not_blank, ResolveOptions, SynthesisStrategy, TypeDescriptor};
use crate::views::hidden_by_views;
use crate::xml::resolve_xml;

/// Result of resolving a type: its schema plus every model it defined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedDocument {
    #[serde(rename = "schema")]
    pub root: SchemaDescriptor,
    #[serde(rename = "components", serialize_with = "serialize_components")]
    pub models: BTreeMap<String, SchemaDescriptor>,
}

fn serialize_components<S: Serializer>(
    models: &BTreeMap<String, SchemaDescriptor>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Components<'a> {
        schemas: &'a BTreeMap<String, SchemaDescriptor>,
    }
    Components { schemas: models }.serialize(serializer)
}

/// Resolve a type and every model reachable from it.
///
/// # Example
///
/// ```
/// use annotated_schema::{resolve_type, PropertyDescriptor, ResolveOptions, TypeCatalog, TypeModel};
///
/// let mut pet = TypeModel::new("com.acme.Pet".parse().unwrap());
/// pet.properties.push(PropertyDescriptor::new("name", "string".parse().unwrap()));
/// let catalog = TypeCatalog::new(vec![pet]);
///
/// let doc = resolve_type(&catalog, &"com.acme.Pet".parse().unwrap(), &ResolveOptions::new()).unwrap();
/// assert_eq!(doc.root.ref_target(), Some("com.acme.Pet"));
/// assert!(doc.models["com.acme.Pet"].properties.contains("name"));
/// ```
///
/// # Errors
///
/// Returns `ResolveError` if a type is unknown, the root type is ignored, or a
/// discriminator mapping cannot be resolved.
pub fn resolve_type(
    introspector: &dyn Introspector,
    ty: &TypeDescriptor,
    options: &ResolveOptions,
) -> Result<ResolvedDocument, ResolveError> {
    let mut ctx = ModelContext::new(introspector, options);
    let mut root = ctx.resolve(ty)?.ok_or_else(|| ResolveError::IgnoredType {
        name: ty.to_string(),
    })?;
    if let Some(model) = introspector.type_model(ty) {
        retrofit_discriminator_property(model, &mut root, &mut ctx);
    }
    Ok(ResolvedDocument {
        root,
        models: ctx.into_models(),
    })
}

/// Build the object schema of a model.
///
/// Properties are resolved in declaration order. Ignored, view-hidden and
/// `hidden` properties are skipped, as are properties of ignored types.
///
/// # Errors
///
/// Returns `ResolveError` if a property type or discriminator mapping cannot
/// be resolved.
pub fn build_model(
    ctx: &mut ModelContext<'_>,
    model: &TypeModel,
    ty: &TypeDescriptor,
    name: &str,
) -> Result<SchemaDescriptor, ResolveError> {
    let introspector = ctx.introspector();
    let options = ctx.options();
    let ignored = introspector.ignored_properties(model);

    let mut schema = SchemaDescriptor::object().named(name);
    for property in &model.properties {
        if ignored.iter().any(|n| *n == property.name) {
            tracing::trace!(model = name, property = %property.name, "skipping ignored property");
            continue;
        }
        if hidden_by_views(&property.annotations, &options.views, introspector) {
            tracing::trace!(model = name, property = %property.name, "skipping property outside requested views");
            continue;
        }
        if let Some((property_name, property_schema, required)) =
            build_property(ctx, model, ty, property)?
        {
            if required {
                schema.add_required(&property_name);
            }
            schema.properties.insert(property_name, property_schema);
        }
    }

    resolve_annotated_type(&mut schema, &AnnotatedType::new(ty.clone()), introspector);
    schema.xml = resolve_xml(Some(&model.annotations), None);
    schema.discriminator = resolve_discriminator(model, ctx)?;
    retrofit_discriminator_property(model, &mut schema, ctx);
    Ok(schema)
}

/// Schema of one property, with its output name and whether it is required.
fn build_property(
    ctx: &mut ModelContext<'_>,
    model: &TypeModel,
    ty: &TypeDescriptor,
    property: &PropertyDescriptor,
) -> Result<Option<(String, SchemaDescriptor, bool)>, ResolveError> {
    let merged = merge_schema_metadata(Some(&property.annotations), None);
    let meta = merged.as_ref().map(MergedMeta::schema);
    if meta.map_or(false, |m| m.hidden) {
        tracing::trace!(property = %property.name, "skipping hidden property");
        return Ok(None);
    }

    let property_type = property
        .property_type
        .substitute(&model.type_parameters, &ty.generics);
    let Some(resolved) = ctx.resolve(&property_type)? else {
        tracing::trace!(property = %property.name, ty = %property_type, "skipping property of ignored type");
        return Ok(None);
    };
    let mut schema = apply_strategy(ctx, resolved);

    let source = FacetSource::new(Some(&property.annotations), Some(&property.annotations), meta);
    resolve_schema_members(&mut schema, &source);
    if let Some(array) = merged.as_ref().and_then(MergedMeta::array) {
        if schema.is_array() {
            resolve_array_schema(schema.array_mut(), Some(array));
        }
    }
    apply_access_mode(&mut schema, resolve_access_mode(Some(property), Some(model), meta));

    let name = meta
        .and_then(|m| m.name.as_deref())
        .filter(|n| is_not_blank(n))
        .unwrap_or(&property.name)
        .to_string();
    let required = property.is_required() || meta.map_or(false, |m| m.required);
    Ok(Some((name, schema, required)))
}

/// Embed a model reference according to the configured strategy.
fn apply_strategy(ctx: &ModelContext<'_>, schema: SchemaDescriptor) -> SchemaDescriptor {
    let Some(target) = schema.ref_target() else {
        return schema;
    };
    match ctx.options().strategy {
        SynthesisStrategy::Ref => schema,
        SynthesisStrategy::Inline => match ctx.defined_models().get(target) {
            Some(defined) => SchemaDescriptor {
                name: None,
                ..defined.clone()
            },
            // still being built: a cycle, keep the reference
            None => schema,
        },
        SynthesisStrategy::AllOf => SchemaDescriptor {
            all_of: vec![schema],
            ..SchemaDescriptor::default()
        },
    }
}
