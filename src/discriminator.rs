//! Polymorphic discriminator resolution and the discriminator-property retrofit.

use crate::error::ResolveError;
use crate::introspect::TypeModel;
use crate::registry::ModelRegistry;
use crate::schema::{construct_ref, Discriminator, SchemaDescriptor};
use crate::types::is_not_blank;

/// Name of the discriminating property declared by a type, if any.
///
/// Explicit schema metadata wins over the polymorphism marker.
pub fn discriminator_property(model: &TypeModel) -> Option<&str> {
    model
        .annotations
        .schema()
        .and_then(|s| s.discriminator_property.as_deref())
        .filter(|p| !p.is_empty())
        .or_else(|| type_info_property(model))
}

fn type_info_property(model: &TypeModel) -> Option<&str> {
    model
        .annotations
        .type_info()
        .and_then(|t| t.property.as_deref())
        .filter(|p| is_not_blank(p))
}

/// Resolve the discriminator of a type.
///
/// Mapping entries with an empty tag or no target are skipped; every other
/// target is resolved through the registry and recorded as a local reference.
///
/// # Errors
///
/// Returns `ResolveError::UnresolvedMapping` when a mapping target does not
/// resolve to a named model, or any error raised while resolving it.
pub fn resolve_discriminator<R>(
    model: &TypeModel,
    registry: &mut R,
) -> Result<Option<Discriminator>, ResolveError>
where
    R: ModelRegistry + ?Sized,
{
    let Some(property) = discriminator_property(model) else {
        return Ok(None);
    };
    let mut discriminator = Discriminator::new(property);

    let mappings = model
        .annotations
        .schema()
        .map(|s| s.discriminator_mapping.as_slice())
        .unwrap_or_default();
    for mapping in mappings {
        let Some(target) = mapping.schema.as_ref().filter(|_| !mapping.value.is_empty()) else {
            continue;
        };
        let name = registry
            .resolve_name(target)?
            .ok_or_else(|| ResolveError::UnresolvedMapping {
                tag: mapping.value.clone(),
                target: target.to_string(),
            })?;
        discriminator
            .mapping
            .insert(mapping.value.clone(), construct_ref(&name));
    }

    Ok(Some(discriminator))
}

/// Ensure the property named by the type's polymorphism marker exists.
///
/// The property is added as a required string. When `schema` is a local
/// reference, the referenced model in the registry is updated instead.
/// Returns whether anything changed; calling it again is a no-op.
pub fn retrofit_discriminator_property<R>(
    model: &TypeModel,
    schema: &mut SchemaDescriptor,
    registry: &mut R,
) -> bool
where
    R: ModelRegistry + ?Sized,
{
    let Some(property) = type_info_property(model) else {
        return false;
    };

    let reference = schema.ref_target().map(str::to_string);
    let target = match reference {
        Some(name) => match registry.defined_models_mut().get_mut(&name) {
            Some(defined) => defined,
            None => {
                tracing::warn!(
                    model = %name,
                    property,
                    "cannot retrofit discriminator property, referenced model is not defined"
                );
                return false;
            }
        },
        None => schema,
    };

    if target.properties.contains(property) {
        return false;
    }
    target
        .properties
        .insert(property, SchemaDescriptor::string());
    target.add_required(property);
    tracing::debug!(
        model = %model.descriptor,
        property,
        "retrofitted discriminator property"
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::{PropertyDescriptor, TypeCatalog};
    use crate::metadata::{
        Annotation, Annotations, DiscriminatorMappingMeta, SchemaMeta, TypeInfoMeta,
    };
    use crate::registry::ModelContext;
    use crate::types::{ResolveOptions, TypeDescriptor};

    fn model(annotations: Vec<Annotation>) -> TypeModel {
        TypeModel {
            annotations: Annotations::new(annotations),
            ..TypeModel::new(TypeDescriptor::new("com.acme.Pet"))
        }
    }

    fn type_info(property: &str) -> Annotation {
        Annotation::TypeInfo(TypeInfoMeta {
            property: Some(property.into()),
        })
    }

    fn explicit(property: &str, mapping: Vec<DiscriminatorMappingMeta>) -> Annotation {
        Annotation::Schema(SchemaMeta {
            discriminator_property: Some(property.into()),
            discriminator_mapping: mapping,
            ..SchemaMeta::default()
        })
    }

    fn mapping(tag: &str, target: &str) -> DiscriminatorMappingMeta {
        DiscriminatorMappingMeta {
            value: tag.into(),
            schema: Some(TypeDescriptor::new(target)),
        }
    }

    fn subtype(name: &str) -> TypeModel {
        TypeModel {
            properties: vec![PropertyDescriptor::new("name", TypeDescriptor::new("string"))],
            ..TypeModel::new(TypeDescriptor::new(name))
        }
    }

    // === Resolution ===

    #[test]
    fn explicit_property_without_mapping() {
        let catalog = TypeCatalog::default();
        let options = ResolveOptions::new();
        let mut ctx = ModelContext::new(&catalog, &options);

        let discriminator = resolve_discriminator(&model(vec![explicit("kind", vec![])]), &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(discriminator.property_name, "kind");
        assert!(discriminator.mapping.is_empty());
    }

    #[test]
    fn marker_only_supplies_name() {
        let catalog = TypeCatalog::default();
        let options = ResolveOptions::new();
        let mut ctx = ModelContext::new(&catalog, &options);

        let discriminator = resolve_discriminator(&model(vec![type_info("@type")]), &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(discriminator.property_name, "@type");
    }

    #[test]
    fn explicit_property_beats_marker() {
        let catalog = TypeCatalog::default();
        let options = ResolveOptions::new();
        let mut ctx = ModelContext::new(&catalog, &options);

        let m = model(vec![type_info("@type"), explicit("kind", vec![])]);
        let discriminator = resolve_discriminator(&m, &mut ctx).unwrap().unwrap();
        assert_eq!(discriminator.property_name, "kind");
    }

    #[test]
    fn neither_yields_none() {
        let catalog = TypeCatalog::default();
        let options = ResolveOptions::new();
        let mut ctx = ModelContext::new(&catalog, &options);

        assert!(resolve_discriminator(&model(vec![]), &mut ctx)
            .unwrap()
            .is_none());
        assert!(resolve_discriminator(&model(vec![explicit("", vec![])]), &mut ctx)
            .unwrap()
            .is_none());
    }

    #[test]
    fn mapping_targets_become_references() {
        let catalog = TypeCatalog::new(vec![subtype("com.acme.Dog"), subtype("com.acme.Cat")]);
        let options = ResolveOptions::new();
        let mut ctx = ModelContext::new(&catalog, &options);

        let m = model(vec![explicit(
            "kind",
            vec![
                mapping("dog", "com.acme.Dog"),
                mapping("cat", "com.acme.Cat"),
                mapping("", "com.acme.Cat"),
                DiscriminatorMappingMeta {
                    value: "none".into(),
                    schema: None,
                },
            ],
        )]);
        let discriminator = resolve_discriminator(&m, &mut ctx).unwrap().unwrap();
        assert_eq!(discriminator.mapping.len(), 2);
        assert_eq!(discriminator.mapping["dog"], "#/components/schemas/com.acme.Dog");
        assert_eq!(discriminator.mapping["cat"], "#/components/schemas/com.acme.Cat");
        assert!(ctx.defined_models().contains_key("com.acme.Dog"));
    }

    #[test]
    fn unresolvable_mapping_target_fails() {
        let catalog = TypeCatalog::default();
        let options = ResolveOptions::new();
        let mut ctx = ModelContext::new(&catalog, &options);

        // a primitive resolves, but not to a named model
        let m = model(vec![explicit("kind", vec![mapping("text", "string")])]);
        let err = resolve_discriminator(&m, &mut ctx).unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvedMapping { ref tag, .. } if tag == "text"));

        let m = model(vec![explicit("kind", vec![mapping("x", "com.acme.Missing")])]);
        let err = resolve_discriminator(&m, &mut ctx).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownType { .. }));
    }

    // === Retrofit ===

    #[test]
    fn retrofit_inline_schema_is_idempotent() {
        let catalog = TypeCatalog::default();
        let options = ResolveOptions::new();
        let mut ctx = ModelContext::new(&catalog, &options);
        let m = model(vec![type_info("kind")]);

        let mut schema = SchemaDescriptor::object();
        assert!(retrofit_discriminator_property(&m, &mut schema, &mut ctx));
        assert!(!retrofit_discriminator_property(&m, &mut schema, &mut ctx));

        assert_eq!(schema.properties.len(), 1);
        assert_eq!(
            schema.properties.get("kind").unwrap().schema_type.as_deref(),
            Some("string")
        );
        assert_eq!(schema.required, vec!["kind"]);
    }

    #[test]
    fn retrofit_follows_reference_into_registry() {
        let catalog = TypeCatalog::default();
        let options = ResolveOptions::new();
        let mut ctx = ModelContext::new(&catalog, &options);
        ctx.define_model("com.acme.Pet".into(), SchemaDescriptor::object());
        let m = model(vec![type_info("kind")]);

        let mut reference = SchemaDescriptor::reference("com.acme.Pet");
        assert!(retrofit_discriminator_property(&m, &mut reference, &mut ctx));
        assert!(!retrofit_discriminator_property(&m, &mut reference, &mut ctx));

        assert!(reference.properties.is_empty());
        let defined = &ctx.defined_models()["com.acme.Pet"];
        assert!(defined.properties.contains("kind"));
        assert_eq!(defined.required, vec!["kind"]);
    }

    #[test]
    fn retrofit_keeps_existing_property() {
        let catalog = TypeCatalog::default();
        let options = ResolveOptions::new();
        let mut ctx = ModelContext::new(&catalog, &options);
        let m = model(vec![type_info("kind")]);

        let mut schema = SchemaDescriptor::object();
        schema
            .properties
            .insert("kind", SchemaDescriptor::of_type("integer"));
        assert!(!retrofit_discriminator_property(&m, &mut schema, &mut ctx));
        assert!(schema.required.is_empty());
    }

    #[test]
    fn retrofit_without_marker_or_target_does_nothing() {
        let catalog = TypeCatalog::default();
        let options = ResolveOptions::new();
        let mut ctx = ModelContext::new(&catalog, &options);

        let mut schema = SchemaDescriptor::object();
        let explicit_only = model(vec![explicit("kind", vec![])]);
        assert!(!retrofit_discriminator_property(&explicit_only, &mut schema, &mut ctx));

        let mut dangling = SchemaDescriptor::reference("com.acme.Gone");
        let m = model(vec![type_info("kind")]);
        assert!(!retrofit_discriminator_property(&m, &mut dangling, &mut ctx));
    }
}
