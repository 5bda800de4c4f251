//! Type introspection: explicit capability descriptors for types and properties.
//!
//! The engine never inspects a runtime type itself. An [`Introspector`]
//! supplies one [`TypeModel`] per type, populated once, describing each
//! property's accessors and attached metadata. [`TypeCatalog`] is the
//! serde-loadable implementation used by the loader and the CLI.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::metadata::Annotations;
use crate::types::{AccessMode, TypeDescriptor};

/// One property of a type, with its structural capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    /// External (serialized) name.
    pub name: String,
    /// Name of the backing member; defaults to `name`.
    #[serde(default)]
    pub internal_name: Option<String>,
    #[serde(rename = "type")]
    pub property_type: TypeDescriptor,
    #[serde(default)]
    pub has_getter: bool,
    #[serde(default)]
    pub has_setter: bool,
    #[serde(default)]
    pub has_field: bool,
    #[serde(default)]
    pub has_constructor_parameter: bool,
    /// Explicit access override from the serialization layer.
    #[serde(default)]
    pub access: Option<AccessMode>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub annotations: Annotations,
}

impl PropertyDescriptor {
    /// A property with a getter and a field (plain read/write data member).
    pub fn new(name: impl Into<String>, property_type: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            internal_name: None,
            property_type,
            has_getter: true,
            has_setter: false,
            has_field: true,
            has_constructor_parameter: false,
            access: None,
            required: None,
            annotations: Annotations::default(),
        }
    }

    pub fn internal_name(&self) -> &str {
        self.internal_name.as_deref().unwrap_or(&self.name)
    }

    /// Whether the serialization layer marks the property required.
    pub fn is_required(&self) -> bool {
        self.required == Some(true)
    }
}

/// Introspection result for one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeModel {
    #[serde(rename = "type")]
    pub descriptor: TypeDescriptor,
    /// Names of the type's generic parameters, in declaration order.
    #[serde(default)]
    pub type_parameters: Vec<String>,
    /// Class-level metadata.
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
}

impl TypeModel {
    pub fn new(descriptor: TypeDescriptor) -> Self {
        Self {
            descriptor,
            type_parameters: Vec::new(),
            annotations: Annotations::default(),
            properties: Vec::new(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A type together with the contextual metadata it is resolved under.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedType {
    pub ty: TypeDescriptor,
    pub context: Annotations,
}

impl AnnotatedType {
    pub fn new(ty: TypeDescriptor) -> Self {
        Self {
            ty,
            context: Annotations::default(),
        }
    }

    pub fn with_context(mut self, context: Annotations) -> Self {
        self.context = context;
        self
    }
}

/// Source of type models and view relationships.
pub trait Introspector {
    /// Model of a type, looked up by its raw name.
    fn type_model(&self, ty: &TypeDescriptor) -> Option<&TypeModel>;

    /// Property names excluded from resolution.
    fn ignored_properties(&self, model: &TypeModel) -> Vec<String> {
        model.annotations.ignored_properties()
    }

    /// Whether `view` is `ancestor` or (transitively) extends it.
    fn is_subview(&self, view: &str, ancestor: &str) -> bool {
        view == ancestor
    }
}

/// In-memory set of type models plus a view hierarchy.
///
/// Models are only reachable through methods, so the name index always
/// matches them; deserializing builds the index as well.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "CatalogData")]
pub struct TypeCatalog {
    types: Vec<TypeModel>,
    /// View name → names of the views it extends.
    pub views: BTreeMap<String, Vec<String>>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// Wire shape of a catalog, before indexing.
#[derive(Default, Deserialize)]
#[serde(default)]
struct CatalogData {
    types: Vec<TypeModel>,
    views: BTreeMap<String, Vec<String>>,
}

impl From<CatalogData> for TypeCatalog {
    fn from(data: CatalogData) -> Self {
        let mut catalog = Self::new(data.types);
        catalog.views = data.views;
        catalog
    }
}

impl TypeCatalog {
    pub fn new(types: Vec<TypeModel>) -> Self {
        let mut catalog = Self {
            types: Vec::with_capacity(types.len()),
            ..Self::default()
        };
        for model in types {
            catalog.insert(model);
        }
        catalog
    }

    /// Declare that `view` extends `parent`.
    pub fn with_view(mut self, view: impl Into<String>, parent: impl Into<String>) -> Self {
        self.views.entry(view.into()).or_default().push(parent.into());
        self
    }

    /// Add a model, replacing any model with the same name in place.
    pub fn insert(&mut self, model: TypeModel) {
        match self.index.get(&model.descriptor.name) {
            Some(&i) => self.types[i] = model,
            None => {
                self.index
                    .insert(model.descriptor.name.clone(), self.types.len());
                self.types.push(model);
            }
        }
    }

    /// Remove the model named `name`, returning it.
    pub fn remove(&mut self, name: &str) -> Option<TypeModel> {
        let i = self.index.remove(name)?;
        let model = self.types.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(model)
    }

    /// Models in catalog order.
    pub fn types(&self) -> &[TypeModel] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}

impl Introspector for TypeCatalog {
    fn type_model(&self, ty: &TypeDescriptor) -> Option<&TypeModel> {
        self.index.get(&ty.name).and_then(|&i| self.types.get(i))
    }

    fn is_subview(&self, view: &str, ancestor: &str) -> bool {
        let mut pending = vec![view];
        let mut seen = Vec::new();
        while let Some(current) = pending.pop() {
            if current == ancestor {
                return true;
            }
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            if let Some(parents) = self.views.get(current) {
                pending.extend(parents.iter().map(String::as_str));
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_from_json_is_indexed() {
        let catalog: TypeCatalog = serde_json::from_value(json!({
            "types": [{
                "type": "com.acme.Pet",
                "properties": [
                    { "name": "name", "type": "string", "hasGetter": true, "hasField": true },
                    { "name": "secret", "type": "string", "hasSetter": true, "access": "WRITE_ONLY" }
                ]
            }],
            "views": { "Internal": ["Public"] }
        }))
        .unwrap();

        let model = catalog
            .type_model(&TypeDescriptor::new("com.acme.Pet"))
            .unwrap();
        assert_eq!(model.properties.len(), 2);
        let secret = model.property("secret").unwrap();
        assert_eq!(secret.access, Some(AccessMode::WriteOnly));
        assert!(!secret.has_getter);
        assert_eq!(secret.internal_name(), "secret");
        assert!(catalog.is_subview("Internal", "Public"));
    }

    #[test]
    fn empty_json_catalog_is_empty() {
        let catalog: TypeCatalog = serde_json::from_str("{}").unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.views.is_empty());
    }

    #[test]
    fn remove_keeps_lookups_consistent() {
        let mut catalog = TypeCatalog::new(vec![
            TypeModel::new(TypeDescriptor::new("A")),
            TypeModel::new(TypeDescriptor::new("B")),
            TypeModel::new(TypeDescriptor::new("C")),
        ]);
        let removed = catalog.remove("A").unwrap();
        assert_eq!(removed.descriptor.name, "A");
        assert_eq!(catalog.len(), 2);
        assert!(catalog.type_model(&TypeDescriptor::new("A")).is_none());
        assert_eq!(
            catalog
                .type_model(&TypeDescriptor::new("C"))
                .map(|m| m.descriptor.name.as_str()),
            Some("C")
        );
        assert!(catalog.remove("A").is_none());
        catalog.remove("C");
        assert!(catalog.type_model(&TypeDescriptor::new("C")).is_none());
        assert!(catalog.type_model(&TypeDescriptor::new("B")).is_some());
    }

    #[test]
    fn duplicate_names_keep_the_last_model() {
        let mut last = TypeModel::new(TypeDescriptor::new("A"));
        last.properties
            .push(PropertyDescriptor::new("x", TypeDescriptor::new("string")));
        let catalog = TypeCatalog::new(vec![TypeModel::new(TypeDescriptor::new("A")), last]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.types()[0].properties.len(), 1);
    }

    #[test]
    fn lookup_ignores_generic_arguments() {
        let catalog = TypeCatalog::new(vec![TypeModel::new(TypeDescriptor::new("Page"))]);
        let bound: TypeDescriptor = "Page<com.acme.Pet>".parse().unwrap();
        assert!(catalog.type_model(&bound).is_some());
        assert!(catalog
            .type_model(&TypeDescriptor::new("Missing"))
            .is_none());
    }

    #[test]
    fn insert_replaces_existing_model() {
        let mut catalog = TypeCatalog::default();
        catalog.insert(TypeModel::new(TypeDescriptor::new("A")));
        let mut replacement = TypeModel::new(TypeDescriptor::new("A"));
        replacement
            .properties
            .push(PropertyDescriptor::new("x", TypeDescriptor::new("string")));
        catalog.insert(replacement);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("A"));
        assert_eq!(catalog.types()[0].properties.len(), 1);
    }

    #[test]
    fn view_hierarchy_is_transitive() {
        let catalog = TypeCatalog::default()
            .with_view("Admin", "Internal")
            .with_view("Internal", "Public");
        assert!(catalog.is_subview("Admin", "Public"));
        assert!(catalog.is_subview("Public", "Public"));
        assert!(!catalog.is_subview("Public", "Admin"));
    }

    #[test]
    fn view_cycles_terminate() {
        let catalog = TypeCatalog::default()
            .with_view("A", "B")
            .with_view("B", "A");
        assert!(!catalog.is_subview("A", "C"));
    }

    #[test]
    fn ignored_properties_come_from_class_metadata() {
        let model: TypeModel = serde_json::from_value(json!({
            "type": "com.acme.Pet",
            "annotations": [{ "kind": "ignoreProperties", "names": ["internalId"] }]
        }))
        .unwrap();
        let catalog = TypeCatalog::new(vec![model.clone()]);
        assert_eq!(catalog.ignored_properties(&model), vec!["internalId"]);
    }
}
