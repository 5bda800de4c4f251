//! Access-mode resolution for properties.

use crate::introspect::{PropertyDescriptor, TypeModel};
use crate::metadata::SchemaMeta;
use crate::schema::SchemaDescriptor;
use crate::types::{is_not_blank, AccessMode};

#[derive(Debug, Clone, Copy, Default)]
struct Capabilities {
    getter: bool,
    setter: bool,
    field: bool,
    constructor_parameter: bool,
}

impl Capabilities {
    fn of(property: &PropertyDescriptor) -> Self {
        Self {
            getter: property.has_getter,
            setter: property.has_setter,
            field: property.has_field,
            constructor_parameter: property.has_constructor_parameter,
        }
    }

    fn union(self, other: Self) -> Self {
        Self {
            getter: self.getter || other.getter,
            setter: self.setter || other.setter,
            field: self.field || other.field,
            constructor_parameter: self.constructor_parameter || other.constructor_parameter,
        }
    }

    fn write_only(&self) -> bool {
        !self.getter && !self.field && (self.setter || self.constructor_parameter)
    }
}

/// Resolve the access mode of a property.
///
/// Explicit metadata wins in this order: an access mode other than `Auto`,
/// the read-only flag, the write-only flag. Without any, the mode is inferred
/// from the property's structure: an access override on the descriptor (or on
/// another property of the type sharing its internal name) is returned as-is;
/// a property that can be set but not read is `WriteOnly`; anything else is
/// unspecified.
pub fn resolve_access_mode(
    property: Option<&PropertyDescriptor>,
    model: Option<&TypeModel>,
    schema: Option<&SchemaMeta>,
) -> Option<AccessMode> {
    if let Some(schema) = schema {
        if schema.access_mode != AccessMode::Auto {
            return Some(schema.access_mode);
        }
        if schema.read_only {
            return Some(AccessMode::ReadOnly);
        }
        if schema.write_only {
            return Some(AccessMode::WriteOnly);
        }
    }

    let property = property?;
    let mut capabilities = Capabilities::of(property);
    let mut access = property.access;

    if access.is_none() {
        let internal = property.internal_name();
        if let Some(same) = model
            .filter(|_| is_not_blank(internal))
            .and_then(|m| m.properties.iter().find(|p| p.internal_name() == internal))
        {
            capabilities = capabilities.union(Capabilities::of(same));
            access = same.access;
        }
    }

    match access {
        Some(mode) => Some(mode),
        None if capabilities.write_only() => Some(AccessMode::WriteOnly),
        None => None,
    }
}

/// Apply a resolved access mode to the read-only/write-only facets.
///
/// `ReadWrite`, `Auto` and unspecified leave the facets untouched.
pub fn apply_access_mode(schema: &mut SchemaDescriptor, mode: Option<AccessMode>) {
    match mode {
        Some(AccessMode::ReadOnly) => schema.mark_read_only(),
        Some(AccessMode::WriteOnly) => schema.mark_write_only(),
        Some(AccessMode::ReadWrite) | Some(AccessMode::Auto) | None => {}
    }
}
