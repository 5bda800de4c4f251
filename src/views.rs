//! View-qualified model names and view-based property filtering.

use crate::introspect::Introspector;
use crate::metadata::Annotations;
use crate::types::{is_not_blank, VIEW_JOINER};

/// Display name of a view: the simple name of its (possibly qualified) type.
fn display_name(view: &str) -> &str {
    view.rsplit(|c: char| c == '.' || c == '$')
        .next()
        .unwrap_or(view)
}

/// Qualify a model name with the views it is resolved under.
///
/// `Pet` under `[Public, Internal]` becomes `Pet_Public-or-Internal`.
pub fn decorate_model_name(name: &str, views: &[String]) -> String {
    if views.is_empty() || !is_not_blank(name) {
        return name.to_string();
    }
    let joined = views
        .iter()
        .map(|v| display_name(v))
        .collect::<Vec<_>>()
        .join(VIEW_JOINER);
    format!("{}_{}", name, joined)
}

/// Whether metadata scoped to views hides a property under `requested`.
///
/// A property with no view metadata is always visible, as is everything when
/// no view is requested. Otherwise one declared view must equal, or be an
/// ancestor of, some requested view; a view record listing no views hides
/// the property.
pub fn hidden_by_views(
    annotations: &Annotations,
    requested: &[String],
    introspector: &dyn Introspector,
) -> bool {
    if requested.is_empty() {
        return false;
    }
    if annotations.views().next().is_none() {
        return false;
    }
    !annotations
        .views()
        .flat_map(|v| v.views.iter())
        .any(|view| requested.iter().any(|r| introspector.is_subview(r, view)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::TypeCatalog;
    use crate::metadata::{Annotation, ViewMeta};

    fn scoped(views: &[&str]) -> Annotations {
        Annotations::new(vec![Annotation::View(ViewMeta {
            views: views.iter().map(|v| v.to_string()).collect(),
        })])
    }

    fn requested(views: &[&str]) -> Vec<String> {
        views.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn decorate_joins_views_in_order() {
        assert_eq!(
            decorate_model_name("Pet", &requested(&["Public", "Internal"])),
            "Pet_Public-or-Internal"
        );
        assert_eq!(
            decorate_model_name("Pet", &requested(&["com.acme.Views$Public"])),
            "Pet_Public"
        );
    }

    #[test]
    fn decorate_without_views_is_identity() {
        assert_eq!(decorate_model_name("Pet", &[]), "Pet");
        assert_eq!(decorate_model_name("", &requested(&["Public"])), "");
    }

    #[test]
    fn unscoped_property_is_never_hidden() {
        let catalog = TypeCatalog::default();
        assert!(!hidden_by_views(
            &Annotations::default(),
            &requested(&["Public"]),
            &catalog
        ));
    }

    #[test]
    fn no_requested_view_shows_everything() {
        let catalog = TypeCatalog::default();
        assert!(!hidden_by_views(&scoped(&["Internal"]), &[], &catalog));
    }

    #[test]
    fn declared_view_must_match_requested() {
        let catalog = TypeCatalog::default();
        assert!(hidden_by_views(
            &scoped(&["Internal"]),
            &requested(&["Public"]),
            &catalog
        ));
        assert!(!hidden_by_views(
            &scoped(&["Internal", "Public"]),
            &requested(&["Public"]),
            &catalog
        ));
    }

    #[test]
    fn empty_view_record_hides_under_any_view() {
        let catalog = TypeCatalog::default();
        assert!(hidden_by_views(&scoped(&[]), &requested(&["Public"]), &catalog));
        assert!(!hidden_by_views(&scoped(&[]), &[], &catalog));
    }

    #[test]
    fn ancestor_view_matches_requested_subview() {
        let catalog = TypeCatalog::default().with_view("Internal", "Public");
        // a Public property is visible in the Internal view
        assert!(!hidden_by_views(
            &scoped(&["Public"]),
            &requested(&["Internal"]),
            &catalog
        ));
        // but not the other way around
        assert!(hidden_by_views(
            &scoped(&["Internal"]),
            &requested(&["Public"]),
            &catalog
        ));
    }
}
