//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Telemetry snapshot editor.
///
/// Rewrites recorded telemetry snapshots, either by applying a rule document
/// that combines several sources into one output, or by running a single
/// edit over every snapshot matching a glob.
#[derive(Debug, Parser)]
#[command(name = "snapedit", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Write log output to this file instead of stderr.
    #[arg(short, long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Overwrite existing output files without asking.
    #[arg(short = 'y', long, global = true)]
    pub overwrite: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply a rule document and write the combined snapshot.
    Apply {
        /// Rule document (JSON).
        #[arg(short, long)]
        input: PathBuf,

        /// Output snapshot.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Edit every snapshot matching a glob.
    Edit {
        /// Input glob, e.g. `captures/*.jsonl`.
        #[arg(short, long)]
        input: String,

        /// Output file template. `*` in the file stem is replaced by the
        /// input's stem, `*` in the extension by the input's extension.
        #[arg(short, long)]
        output: PathBuf,

        #[command(subcommand)]
        action: EditAction,
    },
}

/// Namespace selection shared by every edit.
#[derive(Debug, Clone, Args)]
pub struct NamespaceArgs {
    /// Namespace patterns (case-insensitive, `*` wildcards).
    #[arg(short = 'n', long = "namespace", required = true, num_args = 1..)]
    pub namespaces: Vec<String>,
}

/// Edits that can be applied to a snapshot.
#[derive(Debug, Clone, Subcommand)]
pub enum EditAction {
    /// Delete matching namespaces.
    DeleteNamespace {
        #[command(flatten)]
        target: NamespaceArgs,
    },

    /// Delete matching IDs.
    DeleteId {
        #[command(flatten)]
        target: NamespaceArgs,

        /// ID patterns.
        #[arg(long = "id", required = true, num_args = 1..)]
        ids: Vec<String>,
    },

    /// Rename matching namespaces.
    RenameNamespace {
        #[command(flatten)]
        target: NamespaceArgs,

        /// New name; `*` is replaced by the old name.
        #[arg(long = "new")]
        new_name: String,
    },

    /// Rename matching IDs.
    RenameId {
        #[command(flatten)]
        target: NamespaceArgs,

        /// ID patterns.
        #[arg(long = "id", required = true, num_args = 1..)]
        ids: Vec<String>,

        /// New ID; `*` is replaced by the old ID.
        #[arg(long = "new")]
        new_id: String,
    },

    /// Copy matching namespaces.
    CopyNamespace {
        #[command(flatten)]
        target: NamespaceArgs,

        /// Name of the copy; `*` is replaced by the original name.
        #[arg(long = "new")]
        new_name: String,
    },

    /// Copy matching IDs, optionally into another namespace.
    CopyId {
        #[command(flatten)]
        target: NamespaceArgs,

        /// ID patterns.
        #[arg(long = "id", required = true, num_args = 1..)]
        ids: Vec<String>,

        /// Destination namespace; `*` is replaced by the source namespace.
        #[arg(long, default_value = "*")]
        new_namespace: String,

        /// Destination ID; `*` is replaced by the source ID.
        #[arg(long)]
        new_id: String,
    },
}
