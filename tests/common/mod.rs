//! Common test utilities for trimtab integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute
//! the user's `~/.local/share/trimtab/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with isolated workspace, data, and schema dirs.
///
/// The `tt()` method returns a `Command` that sets `TT_DATA_DIR` and
/// `TT_SCHEMA_DIR` per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub repo_dir: TempDir,
    pub data_dir: TempDir,
    pub schema_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories and no
    /// contributed settings.
    pub fn new() -> Self {
        Self {
            repo_dir: TempDir::new().unwrap(),
            data_dir: TempDir::new().unwrap(),
            schema_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a test environment seeded with the standard test schema.
    pub fn with_standard_schema() -> Self {
        let env = Self::new();
        env.write_schema(
            "settings.json",
            r#"{
                "properties": {
                    "editor.tabSize": {
                        "type": "integer",
                        "default": 4,
                        "minimum": 1,
                        "scope": "language-overridable",
                        "description": "Tab width."
                    },
                    "editor.wordWrap": {
                        "type": "boolean",
                        "default": false
                    },
                    "foo.list": {
                        "type": "array",
                        "items": {"type": "string"},
                        "default": []
                    },
                    "foo.obj": {
                        "type": "object",
                        "properties": {
                            "x": {"type": "integer"},
                            "y": {"type": "boolean"}
                        }
                    }
                }
            }"#,
        );
        env
    }

    /// Write one schema contribution file.
    pub fn write_schema(&self, name: &str, content: &str) {
        std::fs::write(self.schema_dir.path().join(name), content).unwrap();
    }

    /// Get a Command for the tt binary with isolated directories.
    pub fn tt(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_tt"));
        cmd.current_dir(self.repo_dir.path());
        cmd.env("TT_DATA_DIR", self.data_dir.path());
        cmd.env("TT_SCHEMA_DIR", self.schema_dir.path());
        cmd.env_remove("TT_WORKSPACE");
        cmd
    }

    /// Get the path to the workspace directory.
    pub fn path(&self) -> &std::path::Path {
        self.repo_dir.path()
    }

    /// Get the path to the data directory root.
    pub fn data_path(&self) -> &std::path::Path {
        self.data_dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
