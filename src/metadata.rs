//! Declarative metadata records attached to types and properties.
//!
//! Each kind of metadata is a structured record with optional fields. A
//! property or type carries an ordered [`Annotations`] set of them; when the
//! same kind appears more than once in one set, the first one wins.
//!
//! Catalog JSON spells each record as an object tagged with `kind`:
//!
//! ```json
//! { "kind": "schema", "description": "Pet name", "maxLength": 64 }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{is_not_blank, AccessMode, TypeDescriptor};

/// One piece of declarative metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Annotation {
    Schema(SchemaMeta),
    ArraySchema(ArraySchemaMeta),
    /// Per-property descriptive marker; normalized into schema metadata.
    Parameter(ParameterMeta),
    ExternalDocs(ExternalDocsMeta),
    XmlElement(XmlElementMeta),
    XmlRoot(XmlRootMeta),
    /// Polymorphism marker naming the type-discriminating property.
    TypeInfo(TypeInfoMeta),
    /// View scoping.
    View(ViewMeta),
    IgnoreProperties(IgnorePropertiesMeta),
}

/// Explicit schema metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchemaMeta {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub schema_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub format: Option<String>,
    pub pattern: Option<String>,
    pub default_value: Option<String>,
    pub example: Option<String>,
    /// Zero means unset.
    pub multiple_of: f64,
    pub minimum: Option<String>,
    pub maximum: Option<String>,
    pub exclusive_minimum: bool,
    pub exclusive_maximum: bool,
    pub min_length: Option<i32>,
    /// [`UNBOUNDED`](crate::types::UNBOUNDED) means unset.
    pub max_length: Option<i32>,
    pub min_properties: Option<i32>,
    pub max_properties: Option<i32>,
    pub required_properties: Vec<String>,
    pub required: bool,
    pub nullable: bool,
    pub read_only: bool,
    pub write_only: bool,
    pub access_mode: AccessMode,
    pub deprecated: bool,
    pub hidden: bool,
    pub allowable_values: Vec<String>,
    pub extensions: Vec<Extension>,
    pub external_docs: Option<ExternalDocsMeta>,
    pub discriminator_property: Option<String>,
    pub discriminator_mapping: Vec<DiscriminatorMappingMeta>,
}

impl SchemaMeta {
    /// True when any field differs from its default.
    pub fn has_metadata(&self) -> bool {
        *self != SchemaMeta::default()
    }

    /// Field-wise merge: values set on `self` win, `base` fills the gaps.
    pub fn merged_over(&self, base: &SchemaMeta) -> SchemaMeta {
        fn pick<T: Clone>(a: &Option<T>, b: &Option<T>) -> Option<T> {
            a.clone().or_else(|| b.clone())
        }
        fn pick_vec<T: Clone>(a: &[T], b: &[T]) -> Vec<T> {
            if a.is_empty() {
                b.to_vec()
            } else {
                a.to_vec()
            }
        }

        SchemaMeta {
            name: pick(&self.name, &base.name),
            schema_type: pick(&self.schema_type, &base.schema_type),
            title: pick(&self.title, &base.title),
            description: pick(&self.description, &base.description),
            format: pick(&self.format, &base.format),
            pattern: pick(&self.pattern, &base.pattern),
            default_value: pick(&self.default_value, &base.default_value),
            example: pick(&self.example, &base.example),
            multiple_of: if self.multiple_of != 0.0 {
                self.multiple_of
            } else {
                base.multiple_of
            },
            minimum: pick(&self.minimum, &base.minimum),
            maximum: pick(&self.maximum, &base.maximum),
            exclusive_minimum: self.exclusive_minimum || base.exclusive_minimum,
            exclusive_maximum: self.exclusive_maximum || base.exclusive_maximum,
            min_length: pick(&self.min_length, &base.min_length),
            max_length: pick(&self.max_length, &base.max_length),
            min_properties: pick(&self.min_properties, &base.min_properties),
            max_properties: pick(&self.max_properties, &base.max_properties),
            required_properties: pick_vec(&self.required_properties, &base.required_properties),
            required: self.required || base.required,
            nullable: self.nullable || base.nullable,
            read_only: self.read_only || base.read_only,
            write_only: self.write_only || base.write_only,
            access_mode: if self.access_mode != AccessMode::Auto {
                self.access_mode
            } else {
                base.access_mode
            },
            deprecated: self.deprecated || base.deprecated,
            hidden: self.hidden || base.hidden,
            allowable_values: pick_vec(&self.allowable_values, &base.allowable_values),
            extensions: pick_vec(&self.extensions, &base.extensions),
            external_docs: pick(&self.external_docs, &base.external_docs),
            discriminator_property: pick(
                &self.discriminator_property,
                &base.discriminator_property,
            ),
            discriminator_mapping: pick_vec(
                &self.discriminator_mapping,
                &base.discriminator_mapping,
            ),
        }
    }
}

/// Array-level metadata; `schema` describes the elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArraySchemaMeta {
    /// [`UNBOUNDED`](crate::types::UNBOUNDED) means unset.
    pub min_items: Option<i32>,
    pub max_items: Option<i32>,
    pub unique_items: bool,
    pub extensions: Vec<Extension>,
    pub schema: SchemaMeta,
}

impl ArraySchemaMeta {
    pub fn has_metadata(&self) -> bool {
        *self != ArraySchemaMeta::default()
    }
}

/// Descriptive marker placed on a property (or a constructor parameter).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub deprecated: bool,
    pub hidden: bool,
    pub example: Option<String>,
    pub extensions: Vec<Extension>,
    pub schema: Option<SchemaMeta>,
    pub array: Option<ArraySchemaMeta>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExternalDocsMeta {
    pub description: Option<String>,
    pub url: Option<String>,
}

/// Element-level XML marker; only its default value is consulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct XmlElementMeta {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct XmlRootMeta {
    pub name: Option<String>,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TypeInfoMeta {
    pub property: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewMeta {
    pub views: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IgnorePropertiesMeta {
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiscriminatorMappingMeta {
    pub value: String,
    /// Target subtype; absent means "no type".
    pub schema: Option<TypeDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Extension {
    pub name: String,
    pub properties: Vec<ExtensionProperty>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtensionProperty {
    pub name: String,
    pub value: String,
    /// Parse `value` as JSON (raw string on failure).
    pub parse_value: bool,
}

/// Convert extension records into an `x-` keyed map.
///
/// A named extension becomes one `x-<name>` object holding its properties;
/// properties of an unnamed extension become top-level `x-<property>` keys.
/// Properties with a blank name or value are skipped.
pub fn extension_map(extensions: &[Extension]) -> Map<String, Value> {
    let mut map = Map::new();
    for extension in extensions {
        let key = if extension.name.is_empty() {
            String::new()
        } else {
            with_x_prefix(&extension.name)
        };
        for property in &extension.properties {
            if !is_not_blank(&property.name) || !is_not_blank(&property.value) {
                continue;
            }
            let value = if property.parse_value {
                serde_json::from_str(&property.value)
                    .unwrap_or_else(|_| Value::String(property.value.clone()))
            } else {
                Value::String(property.value.clone())
            };
            if key.is_empty() {
                map.insert(with_x_prefix(&property.name), value);
            } else {
                let entry = map
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !entry.is_object() {
                    *entry = Value::Object(Map::new());
                }
                if let Value::Object(inner) = entry {
                    inner.insert(property.name.clone(), value);
                }
            }
        }
    }
    map
}

fn with_x_prefix(name: &str) -> String {
    if name.starts_with("x-") {
        name.to_string()
    } else {
        format!("x-{}", name)
    }
}

/// Ordered set of metadata from one attachment point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotations(pub Vec<Annotation>);

impl Annotations {
    pub fn new(annotations: Vec<Annotation>) -> Self {
        Self(annotations)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.0.iter()
    }

    pub fn schema(&self) -> Option<&SchemaMeta> {
        self.iter().find_map(|a| match a {
            Annotation::Schema(m) => Some(m),
            _ => None,
        })
    }

    pub fn array_schema(&self) -> Option<&ArraySchemaMeta> {
        self.iter().find_map(|a| match a {
            Annotation::ArraySchema(m) => Some(m),
            _ => None,
        })
    }

    pub fn external_docs(&self) -> Option<&ExternalDocsMeta> {
        self.iter().find_map(|a| match a {
            Annotation::ExternalDocs(m) => Some(m),
            _ => None,
        })
    }

    pub fn xml_element(&self) -> Option<&XmlElementMeta> {
        self.iter().find_map(|a| match a {
            Annotation::XmlElement(m) => Some(m),
            _ => None,
        })
    }

    pub fn xml_root(&self) -> Option<&XmlRootMeta> {
        self.iter().find_map(|a| match a {
            Annotation::XmlRoot(m) => Some(m),
            _ => None,
        })
    }

    pub fn type_info(&self) -> Option<&TypeInfoMeta> {
        self.iter().find_map(|a| match a {
            Annotation::TypeInfo(m) => Some(m),
            _ => None,
        })
    }

    /// Every view-scoping record (a property may carry several).
    pub fn views(&self) -> impl Iterator<Item = &ViewMeta> {
        self.iter().filter_map(|a| match a {
            Annotation::View(m) => Some(m),
            _ => None,
        })
    }

    pub fn ignored_properties(&self) -> Vec<String> {
        self.iter()
            .filter_map(|a| match a {
                Annotation::IgnoreProperties(m) => Some(m.names.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Replace parameter markers with the schema metadata they imply.
    pub fn normalized(&self) -> Annotations {
        Annotations(
            self.iter()
                .map(|a| match a {
                    Annotation::Parameter(p) => schema_from_parameter(p),
                    other => other.clone(),
                })
                .collect(),
        )
    }
}

impl FromIterator<Annotation> for Annotations {
    fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
        Annotations(iter.into_iter().collect())
    }
}

/// Schema metadata chosen for a resolution pass.
#[derive(Debug, Clone, PartialEq)]
pub enum MergedMeta {
    Schema(SchemaMeta),
    Array(ArraySchemaMeta),
}

impl MergedMeta {
    /// The explicit schema metadata, unwrapping array metadata to its elements.
    pub fn schema(&self) -> &SchemaMeta {
        match self {
            MergedMeta::Schema(s) => s,
            MergedMeta::Array(a) => &a.schema,
        }
    }

    pub fn array(&self) -> Option<&ArraySchemaMeta> {
        match self {
            MergedMeta::Array(a) => Some(a),
            MergedMeta::Schema(_) => None,
        }
    }
}

/// Pick the schema metadata for a pass from contextual and type-level sets.
///
/// Precedence: contextual array metadata; contextual schema metadata merged
/// over the type-level schema metadata; type-level array metadata; type-level
/// schema metadata. Records holding only defaults count as absent.
pub fn merge_schema_metadata(
    context: Option<&Annotations>,
    type_level: Option<&Annotations>,
) -> Option<MergedMeta> {
    fn schema_of(set: Option<&Annotations>) -> Option<SchemaMeta> {
        set.and_then(Annotations::schema)
            .filter(|m| m.has_metadata())
            .cloned()
    }
    fn array_of(set: Option<&Annotations>) -> Option<ArraySchemaMeta> {
        set.and_then(Annotations::array_schema)
            .filter(|m| m.has_metadata())
            .cloned()
    }

    let normalized = context.map(Annotations::normalized);
    let ctx_schema = schema_of(normalized.as_ref());
    let ctx_array = array_of(normalized.as_ref());
    let type_schema = schema_of(type_level);
    let type_array = array_of(type_level);

    if let Some(array) = ctx_array {
        return Some(MergedMeta::Array(array));
    }
    match (ctx_schema, type_schema) {
        (Some(ctx), Some(base)) => Some(MergedMeta::Schema(ctx.merged_over(&base))),
        (Some(ctx), None) => Some(MergedMeta::Schema(ctx)),
        (None, type_schema) => type_array
            .map(MergedMeta::Array)
            .or(type_schema.map(MergedMeta::Schema)),
    }
}

/// Convert a descriptive parameter marker into schema (or array) metadata.
///
/// The marker's own fields win over its embedded schema record; an embedded
/// array record wraps the result as its element schema.
pub fn schema_from_parameter(parameter: &ParameterMeta) -> Annotation {
    let derived = SchemaMeta {
        name: parameter.name.clone(),
        description: parameter.description.clone(),
        required: parameter.required,
        deprecated: parameter.deprecated,
        hidden: parameter.hidden,
        example: parameter.example.clone(),
        extensions: parameter.extensions.clone(),
        ..SchemaMeta::default()
    };
    let schema = match parameter.schema.as_ref().filter(|s| s.has_metadata()) {
        Some(embedded) => derived.merged_over(embedded),
        None => derived,
    };
    match parameter.array.as_ref().filter(|a| a.has_metadata()) {
        Some(array) => Annotation::ArraySchema(ArraySchemaMeta {
            schema: schema.merged_over(&array.schema),
            ..array.clone()
        }),
        None => Annotation::Schema(schema),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(description: &str) -> Annotation {
        Annotation::Schema(SchemaMeta {
            description: Some(description.into()),
            ..SchemaMeta::default()
        })
    }

    #[test]
    fn annotation_json_is_kind_tagged() {
        let set: Annotations = serde_json::from_value(json!([
            { "kind": "schema", "description": "the name", "maxLength": 10 },
            { "kind": "xmlRoot", "name": "pet" },
            { "kind": "view", "views": ["Public"] }
        ]))
        .unwrap();

        assert_eq!(set.schema().unwrap().max_length, Some(10));
        assert_eq!(set.xml_root().unwrap().name.as_deref(), Some("pet"));
        assert_eq!(set.views().count(), 1);
    }

    #[test]
    fn first_record_of_a_kind_wins() {
        let set = Annotations::new(vec![schema("first"), schema("second")]);
        assert_eq!(set.schema().unwrap().description.as_deref(), Some("first"));
    }

    #[test]
    fn default_record_has_no_metadata() {
        assert!(!SchemaMeta::default().has_metadata());
        assert!(SchemaMeta {
            deprecated: true,
            ..SchemaMeta::default()
        }
        .has_metadata());
        assert!(!ArraySchemaMeta::default().has_metadata());
    }

    #[test]
    fn merged_over_prefers_self() {
        let ctx = SchemaMeta {
            description: Some("ctx".into()),
            ..SchemaMeta::default()
        };
        let base = SchemaMeta {
            description: Some("type".into()),
            title: Some("Title".into()),
            access_mode: AccessMode::ReadOnly,
            ..SchemaMeta::default()
        };
        let merged = ctx.merged_over(&base);
        assert_eq!(merged.description.as_deref(), Some("ctx"));
        assert_eq!(merged.title.as_deref(), Some("Title"));
        assert_eq!(merged.access_mode, AccessMode::ReadOnly);
    }

    #[test]
    fn merge_prefers_context_array_metadata() {
        let ctx = Annotations::new(vec![
            schema("ctx"),
            Annotation::ArraySchema(ArraySchemaMeta {
                max_items: Some(3),
                ..ArraySchemaMeta::default()
            }),
        ]);
        let merged = merge_schema_metadata(Some(&ctx), None).unwrap();
        assert_eq!(merged.array().unwrap().max_items, Some(3));
    }

    #[test]
    fn merge_falls_back_to_type_level() {
        let type_level = Annotations::new(vec![schema("type")]);
        let merged = merge_schema_metadata(None, Some(&type_level)).unwrap();
        assert_eq!(merged.schema().description.as_deref(), Some("type"));

        let empty_ctx = Annotations::new(vec![Annotation::Schema(SchemaMeta::default())]);
        let merged = merge_schema_metadata(Some(&empty_ctx), Some(&type_level)).unwrap();
        assert_eq!(merged.schema().description.as_deref(), Some("type"));

        assert!(merge_schema_metadata(None, None).is_none());
    }

    #[test]
    fn parameter_marker_becomes_schema_metadata() {
        let ctx = Annotations::new(vec![Annotation::Parameter(ParameterMeta {
            description: Some("The owner".into()),
            schema: Some(SchemaMeta {
                description: Some("ignored".into()),
                format: Some("email".into()),
                ..SchemaMeta::default()
            }),
            ..ParameterMeta::default()
        })]);

        let merged = merge_schema_metadata(Some(&ctx), None).unwrap();
        let meta = merged.schema();
        assert_eq!(meta.description.as_deref(), Some("The owner"));
        assert_eq!(meta.format.as_deref(), Some("email"));
        assert!(!meta.required);
    }

    #[test]
    fn parameter_with_array_record_wraps_element_schema() {
        let annotation = schema_from_parameter(&ParameterMeta {
            description: Some("tags".into()),
            array: Some(ArraySchemaMeta {
                unique_items: true,
                ..ArraySchemaMeta::default()
            }),
            ..ParameterMeta::default()
        });
        match annotation {
            Annotation::ArraySchema(array) => {
                assert!(array.unique_items);
                assert_eq!(array.schema.description.as_deref(), Some("tags"));
            }
            other => panic!("expected array metadata, got {:?}", other),
        }
    }

    #[test]
    fn extension_map_named_and_unnamed() {
        let map = extension_map(&[
            Extension {
                name: "".into(),
                properties: vec![ExtensionProperty {
                    name: "internal".into(),
                    value: "true".into(),
                    parse_value: true,
                }],
            },
            Extension {
                name: "x-vendor".into(),
                properties: vec![
                    ExtensionProperty {
                        name: "team".into(),
                        value: "payments".into(),
                        parse_value: false,
                    },
                    ExtensionProperty {
                        name: "blank".into(),
                        value: " ".into(),
                        parse_value: false,
                    },
                ],
            },
        ]);

        assert_eq!(map.get("x-internal"), Some(&json!(true)));
        assert_eq!(map.get("x-vendor"), Some(&json!({ "team": "payments" })));
    }

    #[test]
    fn extension_parse_failure_keeps_raw_string() {
        let map = extension_map(&[Extension {
            name: "meta".into(),
            properties: vec![ExtensionProperty {
                name: "raw".into(),
                value: "{not json".into(),
                parse_value: true,
            }],
        }]);
        assert_eq!(map.get("x-meta"), Some(&json!({ "raw": "{not json" })));
    }

    #[test]
    fn ignored_properties_collects_all_records() {
        let set = Annotations::new(vec![
            Annotation::IgnoreProperties(IgnorePropertiesMeta {
                names: vec!["a".into()],
            }),
            Annotation::IgnoreProperties(IgnorePropertiesMeta {
                names: vec!["b".into()],
            }),
        ]);
        assert_eq!(set.ignored_properties(), vec!["a", "b"]);
    }
}
