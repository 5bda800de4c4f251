//! Annotated Schema Resolver
//!
//! Resolution of declarative property metadata into OpenAPI schema descriptors.
//!
//! Types are described by an [`Introspector`] (usually a [`TypeCatalog`] loaded
//! from JSON): each type lists its properties, their declared types and
//! accessor shape, and the metadata records attached to them. Resolution turns
//! a root type into a schema plus every named model reachable from it.
//!
//! # Example
//!
//! ```
//! use annotated_schema::{load_catalog_str, resolve_type, ResolveOptions};
//!
//! let catalog = load_catalog_str(r#"{
//!     "types": [{
//!         "type": "com.acme.Pet",
//!         "properties": [
//!             { "name": "id", "type": "long",
//!               "annotations": [{ "kind": "schema", "accessMode": "READ_ONLY" }] },
//!             { "name": "name", "type": "string",
//!               "annotations": [{ "kind": "schema", "description": "Pet name", "required": true }] }
//!         ]
//!     }]
//! }"#).unwrap();
//!
//! let doc = resolve_type(&catalog, &"com.acme.Pet".parse().unwrap(), &ResolveOptions::new()).unwrap();
//! let pet = &doc.models["com.acme.Pet"];
//!
//! assert_eq!(pet.properties.get("id").unwrap().read_only, Some(true));
//! assert_eq!(pet.properties.get("name").unwrap().description.as_deref(), Some("Pet name"));
//! assert_eq!(pet.required, vec!["name"]);
//! ```
//!
//! # Resolution order
//!
//! | Stage | Source |
//! |-------|--------|
//! | Property facets | Property metadata merged over the type-level metadata |
//! | Array facets | `arraySchema` records on array-typed properties |
//! | Access mode | Explicit mode, read/write flags, then accessor shape |
//! | Type facets | Class-level metadata of the model |
//! | XML / discriminator | `xmlRoot`, `schema.discriminator*` and `typeInfo` records |
//!
//! # Metadata format
//!
//! Annotations are tagged records:
//! ```json
//! { "kind": "schema", "description": "Pet name", "maxLength": 32 }
//! ```

mod access;
mod array;
mod discriminator;
mod error;
mod facets;
mod introspect;
mod linter;
mod loader;
mod metadata;
mod registry;
mod resolver;
mod schema;
mod synth;
mod types;
mod validator;
mod views;
mod xml;

pub use access::{apply_access_mode, resolve_access_mode};
pub use array::resolve_array_schema;
pub use discriminator::{
    discriminator_property, resolve_discriminator, retrofit_discriminator_property,
};
pub use error::{ResolveError, SchemaError, TypeNameError, ValidateError};
pub use facets::{external_docs, parse_number, FacetSource};
pub use introspect::{AnnotatedType, Introspector, PropertyDescriptor, TypeCatalog, TypeModel};
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{
    is_url, load_catalog, load_catalog_auto, load_catalog_str, load_json, load_json_auto,
    load_options,
};
pub use metadata::{
    extension_map, merge_schema_metadata, schema_from_parameter, Annotation, Annotations,
    ArraySchemaMeta, DiscriminatorMappingMeta, Extension, ExtensionProperty, ExternalDocsMeta,
    IgnorePropertiesMeta, MergedMeta, ParameterMeta, SchemaMeta, TypeInfoMeta, ViewMeta,
    XmlElementMeta, XmlRootMeta,
};
pub use registry::{model_name, primitive, ModelContext, ModelRegistry};
pub use resolver::{resolve_annotated_type, resolve_schema_members};
pub use schema::{
    construct_ref, ref_target, ArraySchemaDescriptor, Discriminator, ExternalDocs, Properties,
    SchemaDescriptor, XmlWrapper,
};
pub use synth::{build_model, resolve_type, ResolvedDocument};
pub use types::{
    AccessMode, ResolveOptions, SynthesisStrategy, TypeDescriptor, TypeNaming,
    COMPONENTS_REF_PREFIX, DEFAULT_IGNORED_TYPES, UNBOUNDED, VIEW_JOINER, XML_DEFAULT,
    XML_UNSET_DEFAULT,
};
pub use validator::{to_json_schema, validate, validate_against_schema};
pub use views::{decorate_model_name, hidden_by_views};
pub use xml::resolve_xml;

#[cfg(feature = "remote")]
pub use loader::{load_catalog_url, load_json_url};
