//! XML wrapper resolution from root-element metadata.

use crate::metadata::Annotations;
use crate::schema::XmlWrapper;
use crate::types::XML_DEFAULT;

fn declared(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.is_empty() && *v != XML_DEFAULT)
        .map(str::to_string)
}

/// Build the XML wrapper from an `xmlRoot` record on the handle, else in the
/// contextual list. Returns `None` unless the record declares a name.
pub fn resolve_xml(
    annotated: Option<&Annotations>,
    context: Option<&Annotations>,
) -> Option<XmlWrapper> {
    let root = annotated
        .and_then(Annotations::xml_root)
        .or_else(|| context.and_then(Annotations::xml_root))?;
    let name = declared(root.name.as_deref())?;
    Some(XmlWrapper {
        name,
        namespace: declared(root.namespace.as_deref()),
    })
}
