//! Payload validation against resolved schemas.

use serde_json::{Map, Value};

use crate::error::{ResolveError, SchemaError, ValidateError};
use crate::introspect::Introspector;
use crate::schema::ref_target;
use crate::synth::{resolve_type, ResolvedDocument};
use crate::types::{ResolveOptions, TypeDescriptor};

const JSON_SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Validate a payload against the schema of a type.
///
/// Resolves the type, converts the document to JSON Schema, then validates
/// the payload against it.
///
/// # Errors
///
/// Returns `ValidateError::Resolve` if schema resolution fails, or
/// `ValidateError::Invalid` if the payload doesn't match the schema.
pub fn validate(
    introspector: &dyn Introspector,
    ty: &TypeDescriptor,
    payload: &Value,
    options: &ResolveOptions,
) -> Result<(), ValidateError> {
    let document = resolve_type(introspector, ty, options)?;
    let schema = to_json_schema(&document)?;
    validate_against_schema(&schema, payload)
}

/// Validate a payload against an already-converted JSON Schema.
///
/// Use this when you've already resolved the schema and want to validate
/// multiple payloads against it.
pub fn validate_against_schema(schema: &Value, payload: &Value) -> Result<(), ValidateError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| {
        ValidateError::Resolve(ResolveError::InvalidSchema {
            message: e.to_string(),
        })
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(payload)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}

/// Convert a resolved document into a self-contained JSON Schema.
///
/// Models move to `$defs` (references are rewritten to match), `nullable`
/// becomes a `null` type alternative, and boolean exclusive bounds become
/// numeric ones.
///
/// # Errors
///
/// Returns `ResolveError::InvalidSchema` if the document does not serialize.
pub fn to_json_schema(document: &ResolvedDocument) -> Result<Value, ResolveError> {
    let to_value = |schema| {
        serde_json::to_value(schema).map_err(|e| ResolveError::InvalidSchema {
            message: e.to_string(),
        })
    };

    let mut defs = Map::new();
    for (name, model) in &document.models {
        let mut value = to_value(model)?;
        convert(&mut value);
        defs.insert(name.clone(), value);
    }

    let mut root = to_value(&document.root)?;
    convert(&mut root);
    if let Value::Object(map) = &mut root {
        map.insert("$schema".to_string(), Value::String(JSON_SCHEMA_DIALECT.to_string()));
        if !defs.is_empty() {
            map.insert("$defs".to_string(), Value::Object(defs));
        }
    }
    Ok(root)
}

/// Rewrite one schema object (and its subschemas) in place.
fn convert(value: &mut Value) {
    let Value::Object(map) = value else {
        return;
    };

    if let Some(Value::String(reference)) = map.get_mut("$ref") {
        if let Some(name) = ref_target(reference) {
            *reference = format!("#/$defs/{}", name.replace('~', "~0").replace('/', "~1"));
        }
    }

    if map.remove("nullable") == Some(Value::Bool(true)) {
        if let Some(Value::String(ty)) = map.get("type") {
            let union = Value::Array(vec![Value::String(ty.clone()), Value::String("null".into())]);
            map.insert("type".to_string(), union);
        }
    }

    for (flag, bound) in [("exclusiveMinimum", "minimum"), ("exclusiveMaximum", "maximum")] {
        if map.remove(flag) == Some(Value::Bool(true)) {
            if let Some(limit) = map.remove(bound) {
                map.insert(flag.to_string(), limit);
            }
        }
    }

    for (key, child) in map.iter_mut() {
        match key.as_str() {
            "properties" => {
                if let Value::Object(props) = child {
                    for prop in props.values_mut() {
                        convert(prop);
                    }
                }
            }
            "items" | "additionalProperties" => convert(child),
            "allOf" | "anyOf" | "oneOf" => {
                if let Value::Array(branches) = child {
                    for branch in branches {
                        convert(branch);
                    }
                }
            }
            _ => {}
        }
    }
}
