//! Catalog linting - static analysis of type catalog files.
//!
//! Validates catalog files for:
//! - JSON syntax and catalog shape errors
//! - Unknown property types and discriminator mapping targets
//! - Metadata that resolution would silently ignore or reconcile

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::facets::parse_number;
use crate::introspect::{TypeCatalog, TypeModel};
use crate::loader::load_json;
use crate::metadata::{Annotation, Annotations, SchemaMeta};
use crate::registry::primitive;
use crate::types::{is_not_blank, json_type_name, TypeDescriptor, UNBOUNDED};

/// Type names understood without a catalog entry besides primitives.
const CONTAINER_TYPES: &[&str] = &["list", "array", "set", "map"];

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/types/0/properties/1/type")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings are treated as errors.
/// Returns aggregated results for all files.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_catalog_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        total_warnings += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Lint a single catalog file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let mut checker = Checker {
        file,
        diagnostics: Vec::new(),
    };

    match load_json(file) {
        Ok(value) if !value.is_object() => checker.error(
            "E001",
            "/".to_string(),
            format!("catalog must be an object, got {}", json_type_name(&value)),
        ),
        Ok(value) => match serde_json::from_value::<TypeCatalog>(value) {
            Ok(catalog) => checker.check_catalog(&catalog),
            Err(e) => checker.error("E001", "/".to_string(), format!("invalid catalog: {}", e)),
        },
        Err(e) => checker.error("E001", "/".to_string(), format!("syntax error: {}", e)),
    }

    let diagnostics = checker.diagnostics;
    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: file.strip_prefix(base_path).unwrap_or(file).to_path_buf(),
        status,
        diagnostics,
    }
}

struct Checker<'a> {
    file: &'a Path,
    diagnostics: Vec<Diagnostic>,
}

impl Checker<'_> {
    fn push(&mut self, severity: Severity, code: &str, path: String, message: String) {
        self.diagnostics.push(Diagnostic {
            severity,
            code: code.to_string(),
            file: self.file.to_path_buf(),
            path,
            message,
        });
    }

    fn error(&mut self, code: &str, path: String, message: String) {
        self.push(Severity::Error, code, path, message);
    }

    fn warning(&mut self, code: &str, path: String, message: String) {
        self.push(Severity::Warning, code, path, message);
    }

    fn check_catalog(&mut self, catalog: &TypeCatalog) {
        for (i, model) in catalog.types().iter().enumerate() {
            let model_path = format!("/types/{}", i);
            self.check_annotations(catalog, &model.annotations, &format!("{}/annotations", model_path));
            self.check_discriminator_names(model, &model_path);

            for (j, property) in model.properties.iter().enumerate() {
                let property_path = format!("{}/properties/{}", model_path, j);
                if let Some(unknown) = unknown_type(catalog, model, &property.property_type) {
                    self.error(
                        "E003",
                        format!("{}/type", property_path),
                        format!(
                            "property \"{}\" has unknown type {}",
                            property.name, unknown
                        ),
                    );
                }
                self.check_annotations(
                    catalog,
                    &property.annotations,
                    &format!("{}/annotations", property_path),
                );
            }
        }
    }

    fn check_annotations(
        &mut self,
        catalog: &TypeCatalog,
        annotations: &Annotations,
        path: &str,
    ) {
        for (k, annotation) in annotations.iter().enumerate() {
            let path = format!("{}/{}", path, k);
            match annotation {
                Annotation::Schema(meta) => self.check_schema_meta(catalog, meta, &path),
                Annotation::ArraySchema(array) => {
                    self.check_schema_meta(catalog, &array.schema, &format!("{}/schema", path))
                }
                Annotation::Parameter(parameter) => {
                    if let Some(meta) = &parameter.schema {
                        self.check_schema_meta(catalog, meta, &format!("{}/schema", path));
                    }
                    if let Some(array) = &parameter.array {
                        self.check_schema_meta(
                            catalog,
                            &array.schema,
                            &format!("{}/array/schema", path),
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn check_schema_meta(&mut self, catalog: &TypeCatalog, meta: &SchemaMeta, path: &str) {
        for (key, literal) in [("minimum", &meta.minimum), ("maximum", &meta.maximum)] {
            if let Some(literal) = literal
                .as_deref()
                .filter(|l| is_not_blank(l) && parse_number(l).is_none())
            {
                self.warning(
                    "W001",
                    format!("{}/{}", path, key),
                    format!("{} \"{}\" is not a number and will be ignored", key, literal),
                );
            }
        }

        if let Some(example) = meta.example.as_deref() {
            let structured = example.trim_start().starts_with(['{', '[']);
            if structured && serde_json::from_str::<Value>(example).is_err() {
                self.warning(
                    "W002",
                    format!("{}/example", path),
                    "example looks like JSON but does not parse; it will be kept as a string"
                        .to_string(),
                );
            }
        }

        if meta
            .required_properties
            .first()
            .map_or(false, |first| !is_not_blank(first))
        {
            self.warning(
                "W003",
                format!("{}/requiredProperties", path),
                "first required property is blank; the list will be ignored".to_string(),
            );
        }

        if meta.read_only && meta.write_only {
            self.warning(
                "W004",
                path.to_string(),
                "readOnly and writeOnly are both set; readOnly wins".to_string(),
            );
        }

        if let (Some(min), Some(max)) = (meta.min_length, meta.max_length) {
            if max != UNBOUNDED && max > 0 && min > max {
                self.warning(
                    "W005",
                    path.to_string(),
                    format!("minLength {} exceeds maxLength {}", min, max),
                );
            }
        }

        for (m, mapping) in meta.discriminator_mapping.iter().enumerate() {
            let Some(target) = &mapping.schema else {
                continue;
            };
            if !catalog.contains(&target.name) {
                self.error(
                    "E002",
                    format!("{}/discriminatorMapping/{}", path, m),
                    format!(
                        "discriminator mapping \"{}\" targets unknown type {}",
                        mapping.value, target
                    ),
                );
            }
        }
    }

    fn check_discriminator_names(&mut self, model: &TypeModel, model_path: &str) {
        let explicit = model
            .annotations
            .schema()
            .and_then(|s| s.discriminator_property.as_deref())
            .filter(|p| !p.is_empty());
        let marker = model
            .annotations
            .type_info()
            .and_then(|t| t.property.as_deref())
            .filter(|p| is_not_blank(p));
        if let (Some(explicit), Some(marker)) = (explicit, marker) {
            if explicit != marker {
                self.warning(
                    "W006",
                    format!("{}/annotations", model_path),
                    format!(
                        "discriminator property \"{}\" differs from type info property \"{}\"",
                        explicit, marker
                    ),
                );
            }
        }
    }
}

/// First type name in `ty` that neither the catalog nor the built-ins know.
fn unknown_type(catalog: &TypeCatalog, model: &TypeModel, ty: &TypeDescriptor) -> Option<String> {
    let known: BTreeSet<&str> = model.type_parameters.iter().map(String::as_str).collect();
    let mut pending = vec![ty];
    while let Some(current) = pending.pop() {
        let name = current.name.as_str();
        if !(known.contains(name)
            || catalog.contains(name)
            || CONTAINER_TYPES.contains(&name)
            || primitive(name).is_some())
        {
            return Some(name.to_string());
        }
        pending.extend(current.generics.iter());
    }
    None
}

/// Collect all .json files in a path (file or directory).
fn collect_catalog_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}
