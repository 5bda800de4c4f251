//! Array facet resolution.

use crate::facets::FacetSource;
use crate::metadata::{extension_map, ArraySchemaMeta};
use crate::resolver::resolve_schema_members;
use crate::schema::{ArraySchemaDescriptor, SchemaDescriptor};
use crate::types::UNBOUNDED;

/// Apply array metadata to the array facets of a schema.
///
/// The element schema embedded in the metadata, when it sets anything, is
/// resolved into `items` with the plain facet pass (no access-mode or
/// discriminator handling).
pub fn resolve_array_schema(array: &mut ArraySchemaDescriptor, meta: Option<&ArraySchemaMeta>) {
    let Some(meta) = meta else {
        return;
    };

    if let Some(min_items) = meta
        .min_items
        .filter(|v| *v < UNBOUNDED)
        .and_then(|v| u32::try_from(v).ok())
    {
        array.min_items = Some(min_items);
    }
    if let Some(max_items) = meta
        .max_items
        .filter(|v| *v > 0)
        .and_then(|v| u32::try_from(v).ok())
    {
        array.max_items = Some(max_items);
    }
    if meta.unique_items {
        array.unique_items = Some(true);
    }
    if !meta.extensions.is_empty() {
        array.extensions.extend(extension_map(&meta.extensions));
    }

    if meta.schema.has_metadata() {
        let items = array
            .items
            .get_or_insert_with(|| Box::new(SchemaDescriptor::default()));
        resolve_schema_members(items, &FacetSource::explicit(&meta.schema));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Extension, ExtensionProperty, SchemaMeta};
    use serde_json::json;

    #[test]
    fn bounds_and_uniqueness() {
        let mut array = ArraySchemaDescriptor::default();
        resolve_array_schema(
            &mut array,
            Some(&ArraySchemaMeta {
                min_items: Some(0),
                max_items: Some(10),
                unique_items: true,
                ..ArraySchemaMeta::default()
            }),
        );
        assert_eq!(array.min_items, Some(0));
        assert_eq!(array.max_items, Some(10));
        assert_eq!(array.unique_items, Some(true));
        assert!(array.items.is_none());
    }

    #[test]
    fn sentinels_are_ignored() {
        let mut array = ArraySchemaDescriptor::default();
        resolve_array_schema(
            &mut array,
            Some(&ArraySchemaMeta {
                min_items: Some(UNBOUNDED),
                max_items: Some(0),
                ..ArraySchemaMeta::default()
            }),
        );
        assert_eq!(array, ArraySchemaDescriptor::default());

        resolve_array_schema(&mut array, None);
        assert_eq!(array, ArraySchemaDescriptor::default());
    }

    #[test]
    fn element_schema_is_resolved_into_items() {
        let mut array = ArraySchemaDescriptor {
            items: Some(Box::new(SchemaDescriptor::string())),
            ..ArraySchemaDescriptor::default()
        };
        resolve_array_schema(
            &mut array,
            Some(&ArraySchemaMeta {
                extensions: vec![Extension {
                    name: "list".into(),
                    properties: vec![ExtensionProperty {
                        name: "sorted".into(),
                        value: "true".into(),
                        parse_value: true,
                    }],
                }],
                schema: SchemaMeta {
                    max_length: Some(16),
                    pattern: Some("^[a-z]+$".into()),
                    ..SchemaMeta::default()
                },
                ..ArraySchemaMeta::default()
            }),
        );

        let items = array.items.as_deref().unwrap();
        assert_eq!(items.schema_type.as_deref(), Some("string"));
        assert_eq!(items.max_length, Some(16));
        assert_eq!(items.pattern.as_deref(), Some("^[a-z]+$"));
        assert_eq!(array.extensions.get("x-list"), Some(&json!({ "sorted": true })));
    }
}
