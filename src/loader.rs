//! Catalog and payload loading from various sources.
//!
//! Handles loading JSON from files, strings, and HTTP URLs, and decoding it
//! into type catalogs and resolution options.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ResolveError;
use crate::introspect::TypeCatalog;
use crate::types::ResolveOptions;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `ResolveError::FileNotFound` if the file doesn't exist,
/// or `ResolveError::InvalidJson` if the file isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, ResolveError> {
    if !path.exists() {
        return Err(ResolveError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ResolveError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ResolveError::InvalidJson { source })
}

/// Load a JSON document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `ResolveError::NetworkError` if the request fails or the
/// response isn't valid JSON.
#[cfg(feature = "remote")]
pub fn load_json_url(url: &str) -> Result<Value, ResolveError> {
    let network = |source| ResolveError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network)?;

    // Check for HTTP errors before parsing
    client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(network)?
        .json()
        .map_err(network)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a JSON document from a file path or URL.
///
/// URL loading requires the `remote` feature.
///
/// # Errors
///
/// Returns appropriate errors based on the source type.
pub fn load_json_auto(source: &str) -> Result<Value, ResolveError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_json_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(ResolveError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_json(Path::new(source))
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ResolveError> {
    serde_json::from_value(value).map_err(|source| ResolveError::InvalidJson { source })
}

fn into_catalog(value: Value) -> Result<TypeCatalog, ResolveError> {
    let catalog: TypeCatalog = decode(value)?;
    tracing::debug!(
        types = catalog.len(),
        views = catalog.views.len(),
        "loaded type catalog"
    );
    Ok(catalog)
}

/// Load a type catalog from a file path.
///
/// # Errors
///
/// Returns `ResolveError::FileNotFound` if the file doesn't exist, or
/// `ResolveError::InvalidJson` if it isn't a valid catalog.
pub fn load_catalog(path: &Path) -> Result<TypeCatalog, ResolveError> {
    into_catalog(load_json(path)?)
}

/// Load a type catalog from a JSON string.
///
/// # Errors
///
/// Returns `ResolveError::InvalidJson` if the string isn't a valid catalog.
pub fn load_catalog_str(content: &str) -> Result<TypeCatalog, ResolveError> {
    let value = serde_json::from_str(content).map_err(|source| ResolveError::InvalidJson { source })?;
    into_catalog(value)
}

/// Load a type catalog from an HTTP/HTTPS URL.
///
/// # Errors
///
/// Returns `ResolveError::NetworkError` if the request fails, or
/// `ResolveError::InvalidJson` if the body isn't a valid catalog.
#[cfg(feature = "remote")]
pub fn load_catalog_url(url: &str) -> Result<TypeCatalog, ResolveError> {
    into_catalog(load_json_url(url)?)
}

/// Load a type catalog from a file path or URL.
///
/// # Errors
///
/// Returns appropriate errors based on the source type.
pub fn load_catalog_auto(source: &str) -> Result<TypeCatalog, ResolveError> {
    into_catalog(load_json_auto(source)?)
}

/// Load resolution options from a JSON file. Missing fields keep their defaults.
///
/// # Errors
///
/// Returns `ResolveError::FileNotFound` if the file doesn't exist, or
/// `ResolveError::InvalidJson` if it isn't a valid options object.
pub fn load_options(path: &Path) -> Result<ResolveOptions, ResolveError> {
    decode(load_json(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::Introspector;
    use crate::types::{SynthesisStrategy, TypeDescriptor};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CATALOG: &str = r#"{
        "types": [
            { "type": "com.acme.Pet", "properties": [{ "name": "name", "type": "string" }] }
        ],
        "views": { "Internal": ["Public"] }
    }"#;

    #[test]
    fn load_json_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"name": "Rex"}}"#).unwrap();

        let value = load_json(file.path()).unwrap();
        assert_eq!(value["name"], "Rex");
    }

    #[test]
    fn load_json_file_not_found() {
        let result = load_json(Path::new("/nonexistent/path.json"));
        assert!(matches!(result, Err(ResolveError::FileNotFound { .. })));
    }

    #[test]
    fn load_json_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let result = load_json(file.path());
        assert!(matches!(result, Err(ResolveError::InvalidJson { .. })));
    }

    #[test]
    fn load_catalog_str_is_indexed() {
        let catalog = load_catalog_str(CATALOG).unwrap();
        assert!(catalog
            .type_model(&TypeDescriptor::new("com.acme.Pet"))
            .is_some());
        assert!(catalog.is_subview("Internal", "Public"));
    }

    #[test]
    fn load_catalog_rejects_bad_type_names() {
        let result = load_catalog_str(
            r#"{"types": [{ "type": "com.acme.Pet", "properties": [{ "name": "x", "type": "list<" }] }]}"#,
        );
        assert!(matches!(result, Err(ResolveError::InvalidJson { .. })));
    }

    #[test]
    fn load_catalog_str_invalid() {
        let result = load_catalog_str("not json");
        assert!(matches!(result, Err(ResolveError::InvalidJson { .. })));
    }

    #[test]
    fn load_catalog_auto_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", CATALOG).unwrap();

        let catalog = load_catalog_auto(file.path().to_str().unwrap()).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn load_options_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"strategy": "inline", "views": ["Public"]}}"#).unwrap();

        let options = load_options(file.path()).unwrap();
        assert_eq!(options.strategy, SynthesisStrategy::Inline);
        assert_eq!(options.views, vec!["Public"]);
        assert!(options.is_ignored(&TypeDescriptor::new("java.lang.Class")));
    }

    #[test]
    fn is_url_https() {
        assert!(is_url("https://example.com/catalog.json"));
        assert!(is_url("http://example.com/catalog.json"));
    }

    #[test]
    fn is_url_file_path() {
        assert!(!is_url("/path/to/catalog.json"));
        assert!(!is_url("./catalog.json"));
        assert!(!is_url("catalog.json"));
    }

    #[cfg(feature = "remote")]
    mod remote {
        use super::*;

        #[test]
        fn load_catalog_url_valid() {
            let mut server = mockito::Server::new();
            let mock = server
                .mock("GET", "/catalog.json")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(CATALOG)
                .create();

            let catalog = load_catalog_url(&format!("{}/catalog.json", server.url())).unwrap();
            assert_eq!(catalog.len(), 1);
            mock.assert();
        }

        #[test]
        fn load_json_url_404() {
            let mut server = mockito::Server::new();
            server.mock("GET", "/missing.json").with_status(404).create();

            let result = load_json_url(&format!("{}/missing.json", server.url()));
            assert!(matches!(result, Err(ResolveError::NetworkError { .. })));
        }

        #[test]
        fn load_json_url_invalid_host() {
            let result = load_json_url("https://this-domain-does-not-exist-12345.invalid/catalog.json");
            assert!(matches!(result, Err(ResolveError::NetworkError { .. })));
        }

        #[test]
        fn load_catalog_auto_url() {
            let mut server = mockito::Server::new();
            server
                .mock("GET", "/catalog.json")
                .with_status(200)
                .with_body(CATALOG)
                .create();

            let result = load_catalog_auto(&format!("{}/catalog.json", server.url()));
            assert!(result.is_ok());
        }
    }
}
