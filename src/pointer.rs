//! Pointers to concrete editable setting locations.
//!
//! A [`SettingsPointer`] names *which* setting, *which* nested detail path
//! inside it, *which* configuration target, and whether the edit applies to
//! a language override. Pointer equality deliberately ignores the resolved
//! scope token: two pointers are the same edit location iff id, detail path,
//! target and override flag all match, and that equality class is both the
//! write-queue coalescing key and the recency lookup key.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Where a configuration write lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigurationTarget {
    /// User-global settings.
    Global,
    /// The workspace definition.
    Workspace,
    /// A single workspace folder.
    WorkspaceFolder,
}

impl ConfigurationTarget {
    /// Parse a target from a CLI-style string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "global" | "user" => Some(Self::Global),
            "workspace" => Some(Self::Workspace),
            "folder" | "workspace-folder" => Some(Self::WorkspaceFolder),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "Global",
            Self::Workspace => "Workspace",
            Self::WorkspaceFolder => "WorkspaceFolder",
        }
    }
}

impl std::fmt::Display for ConfigurationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The concrete addressable location the external configuration store
/// understands: a location URI, optionally paired with a language id.
///
/// A pointer with no scope token at all addresses user-global settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeToken {
    /// Location URI of the settings document, `None` for user-global.
    pub location: Option<String>,
    /// Language id when the edit targets a language override section.
    pub language_id: Option<String>,
}

/// A concrete editable setting location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsPointer {
    /// Dotted setting id, e.g. `editor.tabSize`.
    pub id: String,
    /// Nested property/array-index keys drilling into the value; empty
    /// addresses the whole setting.
    pub detail_id: Vec<String>,
    pub target: ConfigurationTarget,
    pub override_in_language: bool,
    /// Resolved scope, excluded from equality.
    pub scope: Option<ScopeToken>,
}

impl PartialEq for SettingsPointer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.detail_id == other.detail_id
            && self.target == other.target
            && self.override_in_language == other.override_in_language
    }
}

impl Eq for SettingsPointer {}

impl Hash for SettingsPointer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.detail_id.hash(state);
        self.target.hash(state);
        self.override_in_language.hash(state);
    }
}

impl SettingsPointer {
    /// Derive a pointer one detail level deeper.
    pub fn detail(&self, segment: impl Into<String>) -> Self {
        let mut detail_id = self.detail_id.clone();
        detail_id.push(segment.into());
        Self {
            id: self.id.clone(),
            detail_id,
            target: self.target,
            override_in_language: self.override_in_language,
            scope: self.scope.clone(),
        }
    }

    /// Stable storage key for the recency stores: JSON of `[id, ...detail_id]`.
    ///
    /// Different nested paths within the same setting track recency
    /// independently.
    pub fn storage_key(&self) -> String {
        let mut parts = vec![self.id.clone()];
        parts.extend(self.detail_id.iter().cloned());
        serde_json::to_string(&parts).unwrap_or_else(|_| self.id.clone())
    }

    /// Language id of the resolved scope, if any.
    pub fn language_id(&self) -> Option<&str> {
        self.scope
            .as_ref()
            .and_then(|s| s.language_id.as_deref())
    }
}

/// Everything before the last dot of a setting id; an id without a dot is
/// its own section.
pub fn configuration_section(id: &str) -> &str {
    id.rsplit_once('.').map(|(section, _)| section).unwrap_or(id)
}

/// The final segment of a setting id; an id without a dot is its own key.
pub fn configuration_key(id: &str) -> &str {
    id.rsplit_once('.').map(|(_, key)| key).unwrap_or(id)
}

/// Recombine a section/key pair into the full setting id.
pub fn configuration_id(section: &str, key: &str) -> String {
    if section == key || section.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", section, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pointer(id: &str, detail: &[&str], target: ConfigurationTarget, lang: bool) -> SettingsPointer {
        SettingsPointer {
            id: id.to_string(),
            detail_id: detail.iter().map(|s| s.to_string()).collect(),
            target,
            override_in_language: lang,
            scope: None,
        }
    }

    #[test]
    fn test_section_key_split() {
        assert_eq!(configuration_section("editor.tabSize"), "editor");
        assert_eq!(configuration_key("editor.tabSize"), "tabSize");
        assert_eq!(configuration_section("a.b.c"), "a.b");
        assert_eq!(configuration_key("a.b.c"), "c");
        // An id without a dot maps to itself on both sides.
        assert_eq!(configuration_section("telemetry"), "telemetry");
        assert_eq!(configuration_key("telemetry"), "telemetry");
        assert_eq!(configuration_id("telemetry", "telemetry"), "telemetry");
        assert_eq!(configuration_id("editor", "tabSize"), "editor.tabSize");
    }

    #[test]
    fn test_pointer_equality_ignores_scope() {
        let mut a = pointer("editor.tabSize", &[], ConfigurationTarget::Global, false);
        let b = pointer("editor.tabSize", &[], ConfigurationTarget::Global, false);
        a.scope = Some(ScopeToken {
            location: Some("file:///ws".into()),
            language_id: None,
        });
        assert_eq!(a, b);
    }

    #[test]
    fn test_pointer_equality_distinguishes_axes() {
        let base = pointer("editor.tabSize", &[], ConfigurationTarget::Global, false);
        assert_ne!(
            base,
            pointer("editor.fontSize", &[], ConfigurationTarget::Global, false)
        );
        assert_ne!(
            base,
            pointer("editor.tabSize", &["x"], ConfigurationTarget::Global, false)
        );
        assert_ne!(
            base,
            pointer("editor.tabSize", &[], ConfigurationTarget::Workspace, false)
        );
        assert_ne!(
            base,
            pointer("editor.tabSize", &[], ConfigurationTarget::Global, true)
        );
    }

    #[test]
    fn test_storage_key_includes_detail_path() {
        let whole = pointer("foo.obj", &[], ConfigurationTarget::Global, false);
        let nested = pointer("foo.obj", &["x", "y"], ConfigurationTarget::Global, false);
        assert_eq!(whole.storage_key(), r#"["foo.obj"]"#);
        assert_eq!(nested.storage_key(), r#"["foo.obj","x","y"]"#);
    }
}
