//! Core types for metadata-driven schema resolution.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeNameError;

/// Sentinel meaning "no upper bound" for length and item-count metadata.
pub const UNBOUNDED: i32 = i32::MAX;

/// Sentinel used by XML metadata for "derive the name from the type".
pub const XML_DEFAULT: &str = "##default";

/// Sentinel default value of an XML element marker meaning "no default".
pub const XML_UNSET_DEFAULT: &str = "\u{0}";

/// Prefix of local model references.
pub const COMPONENTS_REF_PREFIX: &str = "#/components/schemas/";

/// Joiner between view names in a view-qualified model name.
pub const VIEW_JOINER: &str = "-or-";

/// Non-data carrier types that are never introspected.
pub const DEFAULT_IGNORED_TYPES: &[&str] = &["javax.ws.rs.core.Response", "java.lang.Class"];

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Returns true when `s` has at least one non-whitespace character.
pub(crate) fn is_not_blank(s: &str) -> bool {
    !s.trim().is_empty()
}

/// A type being introspected: raw qualified name plus bound generic arguments.
///
/// Textual form is `name<arg, arg>`, e.g. `map<string, com.acme.Pet>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeDescriptor {
    pub name: String,
    pub generics: Vec<TypeDescriptor>,
}

impl TypeDescriptor {
    /// A non-generic type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generics: Vec::new(),
        }
    }

    /// A type with bound generic arguments.
    pub fn generic(name: impl Into<String>, generics: Vec<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            generics,
        }
    }

    /// Last segment of the qualified name (`com.acme.Outer$Inner` → `Inner`).
    pub fn simple_name(&self) -> &str {
        self.name
            .rsplit(|c: char| c == '.' || c == '$')
            .next()
            .unwrap_or(&self.name)
    }

    /// Replace type parameters (by name) with the bound arguments.
    ///
    /// Parameters without a corresponding argument are left as-is.
    pub fn substitute(&self, params: &[String], args: &[TypeDescriptor]) -> TypeDescriptor {
        if self.generics.is_empty() {
            if let Some(bound) = params
                .iter()
                .position(|p| *p == self.name)
                .and_then(|i| args.get(i))
            {
                return bound.clone();
            }
        }
        TypeDescriptor {
            name: self.name.clone(),
            generics: self
                .generics
                .iter()
                .map(|g| g.substitute(params, args))
                .collect(),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.generics.is_empty() {
            f.write_str("<")?;
            for (i, g) in self.generics.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", g)?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl FromStr for TypeDescriptor {
    type Err = TypeNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeParser { input: s, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(ty)
    }
}

impl TryFrom<String> for TypeDescriptor {
    type Error = TypeNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeDescriptor> for String {
    fn from(value: TypeDescriptor) -> Self {
        value.to_string()
    }
}

struct TypeParser<'a> {
    input: &'a str,
    pos: usize,
}

impl TypeParser<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn error(&self, message: &str) -> TypeNameError {
        TypeNameError {
            input: self.input.to_string(),
            message: message.to_string(),
        }
    }

    fn parse_type(&mut self) -> Result<TypeDescriptor, TypeNameError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '<' | '>' | ',') || c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
        let name = &self.input[start..self.pos];
        if name.is_empty() {
            return Err(match self.peek() {
                None => self.error("unexpected end of input"),
                Some(_) => self.error("expected type name"),
            });
        }

        self.skip_ws();
        let mut generics = Vec::new();
        if self.peek() == Some('<') {
            self.pos += 1;
            loop {
                generics.push(self.parse_type()?);
                self.skip_ws();
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some('>') => {
                        self.pos += 1;
                        break;
                    }
                    Some(_) => return Err(self.error("expected ',' or '>'")),
                    None => return Err(self.error("unexpected end of input")),
                }
            }
        }

        Ok(TypeDescriptor::generic(name, generics))
    }
}

/// Read/write visibility of a property in the generated schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessMode {
    /// Derive from structure.
    #[default]
    Auto,
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// How a property whose type is a registered model is embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SynthesisStrategy {
    /// Plain `$ref` to the model.
    #[default]
    Ref,
    /// Copy of the model body in place of the reference.
    Inline,
    /// `allOf: [$ref]`, so that property facets can sit beside the reference.
    AllOf,
}

impl SynthesisStrategy {
    /// Parse a strategy from its CLI spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ref" => Some(SynthesisStrategy::Ref),
            "inline" => Some(SynthesisStrategy::Inline),
            "allOf" | "all-of" => Some(SynthesisStrategy::AllOf),
            _ => None,
        }
    }
}

/// How model names are derived from type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeNaming {
    /// Keep the package-qualified name (`com.acme.Pet`).
    #[default]
    Qualified,
    /// Use the simple name (`Pet`).
    Simple,
}

/// Options for schema resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolveOptions {
    /// Requested views. Empty means every property is visible.
    pub views: Vec<String>,
    pub strategy: SynthesisStrategy,
    pub naming: TypeNaming,
    /// Qualified type names that are never introspected.
    pub ignored_types: BTreeSet<String>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            views: Vec::new(),
            strategy: SynthesisStrategy::default(),
            naming: TypeNaming::default(),
            ignored_types: DEFAULT_IGNORED_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ResolveOptions {
    /// Options with no requested views, `$ref` strategy and qualified names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a requested view.
    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.views.push(view.into());
        self
    }

    pub fn strategy(mut self, strategy: SynthesisStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn naming(mut self, naming: TypeNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Add a qualified type name to the ignore set.
    pub fn ignore_type(mut self, name: impl Into<String>) -> Self {
        self.ignored_types.insert(name.into());
        self
    }

    /// Whether a type is on the ignore list (exact raw-name match).
    pub fn is_ignored(&self, ty: &TypeDescriptor) -> bool {
        self.ignored_types.contains(&ty.name)
    }
}
