//! Schema resolution - applies facet resolvers to a schema descriptor.
//!
//! [`resolve_schema_members`] is the single pass that turns explicit metadata
//! into schema facets. It never creates or registers descriptors; callers own
//! both.

use serde_json::Value;

use crate::facets::FacetSource;
use crate::introspect::{AnnotatedType, Introspector};
use crate::metadata::{merge_schema_metadata, MergedMeta};
use crate::schema::SchemaDescriptor;
use crate::types::is_not_blank;

/// Apply every facet resolver to `schema`, in a fixed order.
///
/// Resolved facets overwrite what is already there, except `format`, which
/// only fills an unset value (a primitive's intrinsic format wins). Required
/// names are added idempotently; unresolved facets leave the schema alone.
pub fn resolve_schema_members(schema: &mut SchemaDescriptor, source: &FacetSource<'_>) {
    if let Some(description) = source.description() {
        schema.description = Some(description);
    }
    if let Some(title) = source.title() {
        schema.title = Some(title);
    }
    if schema.format.is_none() {
        schema.format = source.format();
    }
    if let Some(default) = source.default_value().filter(|d| is_not_blank(d)) {
        schema.default = Some(typed_literal(schema, &default));
    }
    if let Some(example) = source.example() {
        schema.example = Some(example);
    }
    if source.read_only() == Some(true) {
        schema.mark_read_only();
    }
    if let Some(nullable) = source.nullable() {
        schema.nullable = Some(nullable);
    }
    if let Some(multiple_of) = source.multiple_of() {
        schema.multiple_of = Some(multiple_of);
    }
    if let Some(max_length) = source.max_length() {
        schema.max_length = Some(max_length);
    }
    if let Some(min_length) = source.min_length() {
        schema.min_length = Some(min_length);
    }
    if let Some(minimum) = source.minimum() {
        schema.minimum = Some(minimum);
    }
    if let Some(maximum) = source.maximum() {
        schema.maximum = Some(maximum);
    }
    if let Some(exclusive) = source.exclusive_minimum() {
        schema.exclusive_minimum = Some(exclusive);
    }
    if let Some(exclusive) = source.exclusive_maximum() {
        schema.exclusive_maximum = Some(exclusive);
    }
    if let Some(pattern) = source.pattern() {
        schema.pattern = Some(pattern);
    }
    if let Some(min_properties) = source.min_properties() {
        schema.min_properties = Some(min_properties);
    }
    if let Some(max_properties) = source.max_properties() {
        schema.max_properties = Some(max_properties);
    }
    if let Some(required) = source.required_properties() {
        for name in &required {
            schema.add_required(name);
        }
    }
    if source.write_only() == Some(true) {
        schema.mark_write_only();
    }
    if let Some(docs) = source.external_docs() {
        schema.external_docs = Some(docs);
    }
    if let Some(deprecated) = source.deprecated() {
        schema.deprecated = Some(deprecated);
    }
    if let Some(values) = source.allowable_values() {
        schema.enum_values = values.iter().map(|v| typed_literal(schema, v)).collect();
    }
    if let Some(extensions) = source.extensions() {
        schema.extensions.extend(extensions);
    }
}

/// Resolve the facets of a type under the metadata of its usage site.
///
/// The contextual set is merged over the type's own metadata, and array
/// metadata is unwrapped to its element schema before the facet pass.
pub fn resolve_annotated_type(
    schema: &mut SchemaDescriptor,
    annotated: &AnnotatedType,
    introspector: &dyn Introspector,
) {
    let type_level = introspector
        .type_model(&annotated.ty)
        .map(|model| &model.annotations);
    let merged = merge_schema_metadata(Some(&annotated.context), type_level);
    let source = FacetSource::new(
        type_level,
        Some(&annotated.context),
        merged.as_ref().map(MergedMeta::schema),
    );
    resolve_schema_members(schema, &source);
}

/// Interpret a metadata literal according to the schema's type.
///
/// Literals for non-string types are read as JSON; anything that does not
/// parse stays a string.
fn typed_literal(schema: &SchemaDescriptor, literal: &str) -> Value {
    match schema.schema_type.as_deref() {
        Some("integer" | "number" | "boolean" | "object" | "array") => {
            serde_json::from_str(literal).unwrap_or_else(|_| Value::String(literal.to_string()))
        }
        _ => Value::String(literal.to_string()),
    }
}
