//! Scope resolution: mapping an edit intent onto a concrete location.
//!
//! Resolution is pure given the [`Environment`] snapshot at call time. It is
//! never cached across calls because the active document (and therefore the
//! folder and language a pointer resolves to) can change between menu opens.

use std::path::{Path, PathBuf};

use crate::pointer::{ConfigurationTarget, ScopeToken, SettingsPointer};
use crate::schema::SettingsEntry;

/// The document currently focused in the host.
#[derive(Debug, Clone)]
pub struct ActiveDocument {
    /// Location of the document, used to pick the containing folder.
    pub uri: String,
    /// Language id used for language-override scopes.
    pub language_id: String,
}

/// Snapshot of the host environment relevant to scope resolution.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub active_document: Option<ActiveDocument>,
    /// Location of the workspace definition file, when one exists.
    pub workspace_file: Option<String>,
    /// Open workspace folder locations, in declaration order.
    pub workspace_folders: Vec<String>,
}

impl Environment {
    /// Build a snapshot rooted at a workspace directory, applying optional
    /// active-document and extra-folder overrides from the CLI.
    pub fn detect(
        root: &Path,
        doc: Option<&str>,
        language: Option<&str>,
        extra_folders: &[String],
    ) -> Self {
        let mut workspace_folders = vec![root.to_string_lossy().to_string()];
        workspace_folders.extend(extra_folders.iter().cloned());
        let active_document = match (doc, language) {
            (Some(uri), Some(language_id)) => Some(ActiveDocument {
                uri: uri.to_string(),
                language_id: language_id.to_string(),
            }),
            (Some(uri), None) => Some(ActiveDocument {
                uri: uri.to_string(),
                language_id: language_from_path(uri),
            }),
            (None, Some(language_id)) => Some(ActiveDocument {
                uri: root.to_string_lossy().to_string(),
                language_id: language_id.to_string(),
            }),
            (None, None) => None,
        };
        Self {
            active_document,
            workspace_file: None,
            workspace_folders,
        }
    }

    /// Language id of the active document, if any.
    pub fn language_id(&self) -> Option<&str> {
        self.active_document.as_ref().map(|d| d.language_id.as_str())
    }

    /// The location a target resolves to, or `None` for user-global.
    pub fn scope_location(&self, target: ConfigurationTarget) -> Option<String> {
        match target {
            ConfigurationTarget::Global => None,
            ConfigurationTarget::Workspace => self
                .workspace_file
                .clone()
                .or_else(|| self.workspace_folders.first().cloned()),
            ConfigurationTarget::WorkspaceFolder => self
                .folder_of_active_document()
                .or_else(|| self.workspace_folders.first().cloned()),
        }
    }

    /// The workspace folder containing the active document, by longest
    /// prefix match.
    fn folder_of_active_document(&self) -> Option<String> {
        let doc = self.active_document.as_ref()?;
        self.workspace_folders
            .iter()
            .filter(|folder| doc.uri.starts_with(folder.as_str()))
            .max_by_key(|folder| folder.len())
            .cloned()
    }

    /// Resolve the scope token for an edit intent.
    ///
    /// A language override always wins when a language id is available,
    /// regardless of target; otherwise the token carries the target's
    /// location alone, and a global non-override intent has no token.
    pub fn resolve_scope(
        &self,
        target: ConfigurationTarget,
        override_in_language: bool,
    ) -> Option<ScopeToken> {
        let location = self.scope_location(target);
        if override_in_language {
            if let Some(language_id) = self.language_id() {
                return Some(ScopeToken {
                    location,
                    language_id: Some(language_id.to_string()),
                });
            }
        }
        location.map(|location| ScopeToken {
            location: Some(location),
            language_id: None,
        })
    }

    /// Build a pointer for an entry at the given edit intent.
    pub fn pointer(
        &self,
        entry: &SettingsEntry,
        target: ConfigurationTarget,
        override_in_language: bool,
    ) -> SettingsPointer {
        SettingsPointer {
            id: entry.id.clone(),
            detail_id: Vec::new(),
            target,
            override_in_language,
            scope: self.resolve_scope(target, override_in_language),
        }
    }
}

/// Walk up from `start` looking for a `.git` marker; falls back to `start`.
pub fn find_workspace_root(start: &Path) -> PathBuf {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return start.to_path_buf(),
        }
    }
}

/// Guess a language id from a file extension.
fn language_from_path(uri: &str) -> String {
    let extension = Path::new(uri)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let mapped = match extension {
        "" => "plaintext",
        "rs" => "rust",
        "py" => "python",
        "js" => "javascript",
        "ts" => "typescript",
        "md" => "markdown",
        "yml" | "yaml" => "yaml",
        "sh" => "shellscript",
        "cpp" | "cc" => "cpp",
        other => other,
    };
    mapped.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(folders: &[&str], doc: Option<(&str, &str)>) -> Environment {
        Environment {
            active_document: doc.map(|(uri, language_id)| ActiveDocument {
                uri: uri.to_string(),
                language_id: language_id.to_string(),
            }),
            workspace_file: None,
            workspace_folders: folders.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_global_has_no_location() {
        let e = env(&["/ws"], None);
        assert_eq!(e.scope_location(ConfigurationTarget::Global), None);
        assert_eq!(e.resolve_scope(ConfigurationTarget::Global, false), None);
    }

    #[test]
    fn test_workspace_prefers_workspace_file() {
        let mut e = env(&["/ws/a", "/ws/b"], None);
        assert_eq!(
            e.scope_location(ConfigurationTarget::Workspace),
            Some("/ws/a".to_string())
        );
        e.workspace_file = Some("/ws/project.code-workspace".to_string());
        assert_eq!(
            e.scope_location(ConfigurationTarget::Workspace),
            Some("/ws/project.code-workspace".to_string())
        );
    }

    #[test]
    fn test_folder_follows_active_document() {
        let e = env(&["/ws/a", "/ws/b"], Some(("/ws/b/src/main.rs", "rust")));
        assert_eq!(
            e.scope_location(ConfigurationTarget::WorkspaceFolder),
            Some("/ws/b".to_string())
        );
    }

    #[test]
    fn test_folder_falls_back_to_first() {
        let e = env(&["/ws/a", "/ws/b"], Some(("/elsewhere/x.rs", "rust")));
        assert_eq!(
            e.scope_location(ConfigurationTarget::WorkspaceFolder),
            Some("/ws/a".to_string())
        );
        let no_doc = env(&["/ws/a", "/ws/b"], None);
        assert_eq!(
            no_doc.scope_location(ConfigurationTarget::WorkspaceFolder),
            Some("/ws/a".to_string())
        );
    }

    #[test]
    fn test_language_override_wins_for_any_target() {
        let e = env(&["/ws"], Some(("/ws/src/lib.rs", "rust")));
        let scope = e.resolve_scope(ConfigurationTarget::Global, true).unwrap();
        assert_eq!(scope.language_id.as_deref(), Some("rust"));
        assert_eq!(scope.location, None);

        let scope = e
            .resolve_scope(ConfigurationTarget::Workspace, true)
            .unwrap();
        assert_eq!(scope.language_id.as_deref(), Some("rust"));
        assert_eq!(scope.location.as_deref(), Some("/ws"));
    }

    #[test]
    fn test_override_without_language_degrades_to_plain_scope() {
        let e = env(&["/ws"], None);
        let scope = e.resolve_scope(ConfigurationTarget::Workspace, true).unwrap();
        assert_eq!(scope.language_id, None);
        assert_eq!(scope.location.as_deref(), Some("/ws"));
        assert_eq!(e.resolve_scope(ConfigurationTarget::Global, true), None);
    }

    #[test]
    fn test_language_guess_from_extension() {
        let e = Environment::detect(Path::new("/ws"), Some("/ws/a.rs"), None, &[]);
        assert_eq!(e.language_id(), Some("rust"));
    }
}
