//! CLI argument definitions for trimtab.

use clap::{Parser, Subcommand};

/// Trimtab - browse and edit editor-host settings from the command line.
///
/// Start with `tt list` to see the contributed settings, then `tt edit` for
/// the interactive picker.
#[derive(Parser, Debug)]
#[command(name = "tt")]
#[command(author, version, about = "A settings resolution and editing tool for editor hosts", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Run as if tt was started in <path> instead of the current directory.
    /// Can also be set via the TT_WORKSPACE environment variable.
    #[arg(short = 'C', long = "workspace", global = true, env = "TT_WORKSPACE")]
    pub workspace: Option<std::path::PathBuf>,

    /// Path of the active document, used for folder and language resolution
    #[arg(long, global = true)]
    pub doc: Option<String>,

    /// Language id of the active document (guessed from --doc when omitted)
    #[arg(long, global = true)]
    pub language: Option<String>,

    /// Additional workspace folder (repeatable; the workspace root is
    /// always the first folder)
    #[arg(long = "folder", global = true)]
    pub folders: Vec<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive settings picker
    Edit,

    /// Revert the most recent setting change
    Undo,

    /// Replay the most recently undone setting change
    Redo,

    /// History and recency commands
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Show a setting's default, effective and per-scope values
    Get {
        /// Setting id, e.g. editor.tabSize
        id: String,

        /// Nested detail path segment (repeatable)
        #[arg(long = "detail")]
        detail: Vec<String>,
    },

    /// Set a setting's value without the picker
    Set {
        /// Setting id, e.g. editor.tabSize
        id: String,

        /// New value as JSON; unparseable input is taken as a bare string
        value: String,

        /// Where the write lands: global, workspace or folder
        #[arg(long, default_value = "global")]
        target: String,

        /// Write into the active language's override section
        #[arg(long = "in-language")]
        in_language: bool,

        /// Nested detail path segment (repeatable)
        #[arg(long = "detail")]
        detail: Vec<String>,
    },

    /// Remove a setting's value
    Unset {
        /// Setting id, e.g. editor.tabSize
        id: String,

        /// Where the removal applies: global, workspace or folder
        #[arg(long, default_value = "global")]
        target: String,

        /// Remove from the active language's override section
        #[arg(long = "in-language")]
        in_language: bool,

        /// Nested detail path segment (repeatable)
        #[arg(long = "detail")]
        detail: Vec<String>,
    },

    /// List every contributed setting with its type and effective value
    List,
}

/// History subcommands
#[derive(Subcommand, Debug)]
pub enum HistoryCommands {
    /// Show undo/redo stacks and recently edited settings
    Show,

    /// Clear undo/redo history and all recency lists
    Clear,
}
