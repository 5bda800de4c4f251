//! Schema descriptors produced by resolution.
//!
//! Descriptors serialize to OpenAPI 3.0 schema objects. Unset facets are
//! omitted from the output.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::types::{is_not_blank, COMPONENTS_REF_PREFIX};

/// Accumulated schema for one type or property.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDescriptor {
    /// Model or property name; not part of the serialized schema.
    #[serde(skip)]
    pub name: Option<String>,
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<SchemaDescriptor>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaDescriptor>,
    #[serde(flatten)]
    pub array: Option<ArraySchemaDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xml: Option<XmlWrapper>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl SchemaDescriptor {
    /// Schema of the given JSON type.
    pub fn of_type(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Self::default()
        }
    }

    pub fn object() -> Self {
        Self::of_type("object")
    }

    pub fn string() -> Self {
        Self::of_type("string")
    }

    /// Array schema with the given item schema.
    pub fn array_of(items: SchemaDescriptor) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            array: Some(ArraySchemaDescriptor {
                items: Some(Box::new(items)),
                ..ArraySchemaDescriptor::default()
            }),
            ..Self::default()
        }
    }

    /// Local reference to a named model.
    pub fn reference(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            reference: Some(construct_ref(name)),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Model name targeted by a local `$ref`, if this schema is one.
    pub fn ref_target(&self) -> Option<&str> {
        self.reference.as_deref().and_then(ref_target)
    }

    /// Add a name to `required` unless blank or already present.
    pub fn add_required(&mut self, name: &str) {
        if !is_not_blank(name) || self.required.iter().any(|r| r == name) {
            return;
        }
        self.required.push(name.to_string());
    }

    /// Mark read-only; clears write-only.
    pub fn mark_read_only(&mut self) {
        self.read_only = Some(true);
        self.write_only = None;
    }

    /// Mark write-only; clears read-only.
    pub fn mark_write_only(&mut self) {
        self.write_only = Some(true);
        self.read_only = None;
    }

    /// Array facets, created on first use.
    pub fn array_mut(&mut self) -> &mut ArraySchemaDescriptor {
        self.array.get_or_insert_with(ArraySchemaDescriptor::default)
    }

    pub fn is_array(&self) -> bool {
        self.schema_type.as_deref() == Some("array")
    }
}

/// Properties of an object schema, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, SchemaDescriptor)>);

impl Properties {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&SchemaDescriptor> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SchemaDescriptor> {
        self.0.iter_mut().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Insert or replace, keeping the original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, schema: SchemaDescriptor) {
        let name = name.into();
        match self.get_mut(&name) {
            Some(existing) => *existing = schema,
            None => self.0.push((name, schema)),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaDescriptor)> {
        self.0.iter().map(|(n, s)| (n.as_str(), s))
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, schema) in &self.0 {
            map.serialize_entry(name, schema)?;
        }
        map.end()
    }
}

/// Array facets of a schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArraySchemaDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// Polymorphic discriminator of a type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    pub property_name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub mapping: BTreeMap<String, String>,
}

impl Discriminator {
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            mapping: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct XmlWrapper {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExternalDocs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Local reference string for a model name.
pub fn construct_ref(name: &str) -> String {
    format!("{}{}", COMPONENTS_REF_PREFIX, name)
}

/// Model name of a local reference, `None` for anything else.
pub fn ref_target(reference: &str) -> Option<&str> {
    reference.strip_prefix(COMPONENTS_REF_PREFIX)
}
