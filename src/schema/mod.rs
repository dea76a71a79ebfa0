//! Setting schema metadata.
//!
//! Settings are described by JSON schema documents contributed by the host
//! and its plugins. This module models the finite shapes those documents
//! use (it is deliberately not a general JSON-Schema validator), resolves
//! `$ref` composition, and aggregates the contributions into the flat entry
//! list the editing menus work from.

pub mod reference;
pub mod source;

pub use reference::{SchemaCache, DEFAULT_SETTINGS_URI};
pub use source::{FileSchemaSource, SchemaSource};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One JSON-schema-like primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Null,
    Boolean,
    String,
    Integer,
    Number,
    Array,
    Object,
}

impl PrimitiveType {
    /// Runtime type of a JSON value.
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl std::fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A declared type: either a single primitive or a set of allowed ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    One(PrimitiveType),
    Many(Vec<PrimitiveType>),
}

impl TypeSet {
    pub fn types(&self) -> &[PrimitiveType] {
        match self {
            Self::One(t) => std::slice::from_ref(t),
            Self::Many(ts) => ts,
        }
    }

    pub fn first(&self) -> Option<PrimitiveType> {
        self.types().first().copied()
    }

    pub fn contains(&self, t: PrimitiveType) -> bool {
        self.types().contains(&t)
    }
}

/// Scope classification of a setting: where it may be configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettingScope {
    /// Configurable only in local user settings.
    Application,
    /// Configurable only in local and remote user settings.
    Machine,
    /// Configurable in user or workspace settings.
    Window,
    /// Configurable in user, workspace or folder settings.
    Resource,
    /// Resource setting that may also be configured per language.
    LanguageOverridable,
    /// Machine setting that may also be configured in workspace or folder
    /// settings.
    MachineOverridable,
}

/// Schema metadata for one setting or one nested property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertySchema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_set: Option<TypeSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<SettingScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overridable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_descriptions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_enum_descriptions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, PropertySchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<PropertySchema>>,
}

impl PropertySchema {
    /// Whether the schema admits `wanted`, looking through the declared type
    /// set, `allOf` branches, and finally the runtime type of the default.
    pub fn has_type(&self, wanted: PrimitiveType) -> bool {
        if let Some(types) = &self.type_set {
            if types.contains(wanted) {
                return true;
            }
        }
        if let Some(all_of) = &self.all_of {
            if all_of.iter().any(|branch| branch.has_type(wanted)) {
                return true;
            }
        }
        matches!(&self.default, Some(value) if PrimitiveType::of_value(value) == wanted)
    }

    /// Nested object properties merged across `allOf` branches.
    pub fn merged_properties(&self) -> BTreeMap<String, PropertySchema> {
        let mut merged = self.properties.clone().unwrap_or_default();
        if let Some(all_of) = &self.all_of {
            for branch in all_of {
                if let Some(props) = &branch.properties {
                    for (key, schema) in props {
                        merged.insert(key.clone(), schema.clone());
                    }
                }
            }
        }
        merged
    }

    /// Plain description, preferring `description` over the markdown form.
    pub fn plain_description(&self) -> Option<String> {
        self.description
            .clone()
            .or_else(|| markdown_to_plaintext(self.markdown_description.as_deref()))
    }

    /// Per-choice descriptions for enum settings, markdown cleaned up.
    pub fn choice_descriptions(&self) -> Option<Vec<String>> {
        self.enum_descriptions.clone().or_else(|| {
            self.markdown_enum_descriptions.as_ref().map(|all| {
                all.iter()
                    .map(|text| markdown_to_plaintext(Some(text)).unwrap_or_default())
                    .collect()
            })
        })
    }

    /// Description of the enum choice at `index`, if declared.
    pub fn choice_description(&self, index: usize) -> Option<String> {
        self.choice_descriptions()
            .and_then(|all| all.get(index).cloned())
    }
}

/// A setting's schema metadata paired with its stable dotted id.
///
/// Built fresh from the aggregated schema each time the settings list opens;
/// immutable once built; never persisted.
#[derive(Debug, Clone)]
pub struct SettingsEntry {
    pub id: String,
    pub property: PropertySchema,
}

impl SettingsEntry {
    pub fn new(id: impl Into<String>, property: PropertySchema) -> Self {
        Self {
            id: id.into(),
            property,
        }
    }

    /// Schema-declared default, falling back to the type-driven zero value:
    /// boolean→false, string→"", integer/number→0, array→[], object→{},
    /// anything else→null.
    pub fn default_value(&self) -> Value {
        if let Some(default) = &self.property.default {
            return default.clone();
        }
        match self.property.type_set.as_ref().and_then(TypeSet::first) {
            Some(PrimitiveType::Boolean) => Value::Bool(false),
            Some(PrimitiveType::String) => Value::String(String::new()),
            Some(PrimitiveType::Integer) | Some(PrimitiveType::Number) => {
                Value::Number(0.into())
            }
            Some(PrimitiveType::Array) => Value::Array(Vec::new()),
            Some(PrimitiveType::Object) => Value::Object(Default::default()),
            _ => Value::Null,
        }
    }

    /// Display name for the setting's type; a string with enum choices
    /// renders as `enum`.
    pub fn display_type(&self) -> String {
        let rendered = match &self.property.type_set {
            Some(TypeSet::One(t)) => t.to_string(),
            Some(TypeSet::Many(ts)) => serde_json::to_string(ts).unwrap_or_default(),
            None => "unknown".to_string(),
        };
        if rendered == "string" && self.property.enum_values.is_some() {
            "enum".to_string()
        } else {
            rendered
        }
    }

    /// Description plus, for enum settings, one `choice: description` line
    /// per declared choice.
    pub fn full_description(&self) -> String {
        let mut description = self
            .property
            .plain_description()
            .unwrap_or_else(|| "(This setting item has no description)".to_string());
        if let (Some(choices), Some(choice_descriptions)) = (
            &self.property.enum_values,
            self.property.choice_descriptions(),
        ) {
            if !choices.is_empty() && !choice_descriptions.is_empty() {
                let mut lines = vec![description, String::new()];
                for (index, choice) in choices.iter().enumerate() {
                    lines.push(format!(
                        "{}: {}",
                        render_value(choice),
                        choice_descriptions.get(index).cloned().unwrap_or_default()
                    ));
                }
                description = lines.join("\n");
            }
        }
        description
    }
}

/// A parsed settings schema document: `{ properties: { id: schema } }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsDocument {
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
}

/// Strip the host's `` `#setting.id#` `` markdown cross-references down to
/// plain inline code.
pub fn markdown_to_plaintext(markdown: Option<&str>) -> Option<String> {
    let markdown = markdown?;
    let re = regex::Regex::new(r"`#([a-zA-Z_0-9\-\.]+)#`").expect("static pattern");
    Some(re.replace_all(markdown, "`$1`").into_owned())
}

/// Compact rendering of a value for display, with strings left unquoted.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
