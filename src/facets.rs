//! Facet resolvers.
//!
//! Each resolver derives one schema attribute from the explicit schema
//! metadata, falling back to other metadata on the introspection handle or in
//! the contextual set where a fallback exists. Every resolver is total: empty,
//! blank, sentinel or malformed input resolves to `None`.

use serde_json::{Map, Number, Value};

use crate::metadata::{extension_map, Annotations, ExternalDocsMeta, SchemaMeta};
use crate::schema::ExternalDocs;
use crate::types::{is_not_blank, AccessMode, UNBOUNDED, XML_UNSET_DEFAULT};

/// Inputs of one facet resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacetSource<'a> {
    /// Metadata on the introspection handle (the type or property itself).
    pub annotated: Option<&'a Annotations>,
    /// Contextual metadata (e.g. from the declaring property).
    pub context: Option<&'a Annotations>,
    /// Explicit schema metadata.
    pub schema: Option<&'a SchemaMeta>,
}

impl<'a> FacetSource<'a> {
    pub fn new(
        annotated: Option<&'a Annotations>,
        context: Option<&'a Annotations>,
        schema: Option<&'a SchemaMeta>,
    ) -> Self {
        Self {
            annotated,
            context,
            schema,
        }
    }

    /// Source with only explicit schema metadata.
    pub fn explicit(schema: &'a SchemaMeta) -> Self {
        Self {
            schema: Some(schema),
            ..Self::default()
        }
    }

    fn non_blank(&self, pick: impl Fn(&SchemaMeta) -> &Option<String>) -> Option<String> {
        self.schema
            .and_then(|s| pick(s).as_deref())
            .filter(|v| is_not_blank(v))
            .map(str::to_string)
    }

    fn flag(&self, pick: impl Fn(&SchemaMeta) -> bool) -> Option<bool> {
        self.schema.filter(|s| pick(s)).map(|_| true)
    }

    fn positive(&self, pick: impl Fn(&SchemaMeta) -> Option<i32>) -> Option<u32> {
        self.schema
            .and_then(pick)
            .filter(|v| *v > 0)
            .and_then(|v| u32::try_from(v).ok())
    }

    pub fn description(&self) -> Option<String> {
        self.non_blank(|s| &s.description)
    }

    pub fn title(&self) -> Option<String> {
        self.non_blank(|s| &s.title)
    }

    pub fn format(&self) -> Option<String> {
        self.non_blank(|s| &s.format)
    }

    pub fn pattern(&self) -> Option<String> {
        self.non_blank(|s| &s.pattern)
    }

    /// Explicit default, else a non-sentinel XML element default.
    pub fn default_value(&self) -> Option<String> {
        if let Some(value) = self
            .schema
            .and_then(|s| s.default_value.as_deref())
            .filter(|v| !v.is_empty())
        {
            return Some(value.to_string());
        }
        let annotated = self.annotated?;
        let element = annotated
            .xml_element()
            .or_else(|| self.context.and_then(Annotations::xml_element))?;
        element
            .default_value
            .as_deref()
            .filter(|v| !v.is_empty() && *v != XML_UNSET_DEFAULT)
            .map(str::to_string)
    }

    /// Explicit example, parsed as JSON when possible.
    pub fn example(&self) -> Option<Value> {
        let raw = self
            .schema
            .and_then(|s| s.example.as_deref())
            .filter(|v| !v.is_empty())?;
        Some(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
    }

    pub fn multiple_of(&self) -> Option<Number> {
        self.schema
            .map(|s| s.multiple_of)
            .filter(|v| *v != 0.0)
            .and_then(Number::from_f64)
    }

    pub fn minimum(&self) -> Option<Number> {
        self.schema
            .and_then(|s| s.minimum.as_deref())
            .and_then(parse_number)
    }

    pub fn maximum(&self) -> Option<Number> {
        self.schema
            .and_then(|s| s.maximum.as_deref())
            .and_then(parse_number)
    }

    pub fn exclusive_minimum(&self) -> Option<bool> {
        self.flag(|s| s.exclusive_minimum)
    }

    pub fn exclusive_maximum(&self) -> Option<bool> {
        self.flag(|s| s.exclusive_maximum)
    }

    pub fn max_length(&self) -> Option<u32> {
        self.positive(|s| s.max_length.filter(|v| *v != UNBOUNDED))
    }

    pub fn min_length(&self) -> Option<u32> {
        self.positive(|s| s.min_length)
    }

    pub fn min_properties(&self) -> Option<u32> {
        self.positive(|s| s.min_properties)
    }

    pub fn max_properties(&self) -> Option<u32> {
        self.positive(|s| s.max_properties)
    }

    pub fn nullable(&self) -> Option<bool> {
        self.flag(|s| s.nullable)
    }

    pub fn deprecated(&self) -> Option<bool> {
        self.flag(|s| s.deprecated)
    }

    /// Read-only facet as implied by explicit metadata alone.
    ///
    /// An explicit access mode decides; otherwise the read-only flag.
    pub fn read_only(&self) -> Option<bool> {
        let schema = self.schema?;
        match schema.access_mode {
            AccessMode::ReadOnly => Some(true),
            AccessMode::WriteOnly | AccessMode::ReadWrite => None,
            AccessMode::Auto => schema.read_only.then_some(true),
        }
    }

    /// Write-only facet as implied by explicit metadata alone.
    ///
    /// A read-only flag outranks the write-only flag.
    pub fn write_only(&self) -> Option<bool> {
        let schema = self.schema?;
        match schema.access_mode {
            AccessMode::WriteOnly => Some(true),
            AccessMode::ReadOnly | AccessMode::ReadWrite => None,
            AccessMode::Auto => (schema.write_only && !schema.read_only).then_some(true),
        }
    }

    /// Required property names; ignored when the first entry is blank.
    pub fn required_properties(&self) -> Option<Vec<String>> {
        self.schema
            .map(|s| &s.required_properties)
            .filter(|names| names.first().map_or(false, |n| is_not_blank(n)))
            .cloned()
    }

    pub fn allowable_values(&self) -> Option<Vec<String>> {
        self.schema
            .map(|s| &s.allowable_values)
            .filter(|values| !values.is_empty())
            .cloned()
    }

    pub fn extensions(&self) -> Option<Map<String, Value>> {
        self.schema
            .filter(|s| !s.extensions.is_empty())
            .map(|s| extension_map(&s.extensions))
    }

    /// Direct external-docs metadata on the handle, else the embedded record.
    pub fn external_docs(&self) -> Option<ExternalDocs> {
        self.annotated
            .and_then(Annotations::external_docs)
            .and_then(external_docs)
            .or_else(|| {
                self.schema
                    .and_then(|s| s.external_docs.as_ref())
                    .and_then(external_docs)
            })
    }
}

/// Convert an external-docs record; all-blank records resolve to `None`.
pub fn external_docs(meta: &ExternalDocsMeta) -> Option<ExternalDocs> {
    let keep = |v: &Option<String>| v.as_deref().filter(|s| is_not_blank(s)).map(str::to_string);
    let docs = ExternalDocs {
        description: keep(&meta.description),
        url: keep(&meta.url),
    };
    if docs.description.is_none() && docs.url.is_none() {
        None
    } else {
        Some(docs)
    }
}

/// Parse a numeric literal, ignoring `,` thousands separators.
///
/// Integers stay integers; anything that is not a finite number is `None`.
pub fn parse_number(literal: &str) -> Option<Number> {
    let cleaned: String = literal.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(Value::Number(n)) = serde_json::from_str::<Value>(cleaned) {
        return Some(n);
    }
    match cleaned.parse::<f64>() {
        Ok(v) => Number::from_f64(v),
        Err(_) => {
            tracing::debug!(literal, "ignoring non-numeric bound");
            None
        }
    }
}
