//! Edit command: one direct edit over every snapshot matching a glob.
//!
//! Unlike `apply`, editing keeps each snapshot's timeline as recorded and
//! writes one output per input.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use se_core::{EditError, NamespaceIndex};

use super::util::{confirm_overwrite, target_file_name};
use crate::cli::EditAction;

/// Result of editing one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Entries written, or `None` if the output was skipped.
    pub written: Option<usize>,
    /// Namespaces, points or IDs touched by the edit.
    pub affected: usize,
}

pub fn run(
    pattern: &str,
    template: &Path,
    action: &EditAction,
    overwrite: bool,
) -> Result<Vec<FileOutcome>> {
    let inputs = glob::glob(pattern)
        .with_context(|| format!("invalid input pattern {pattern}"))?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to read input directory")?;
    if inputs.is_empty() {
        anyhow::bail!("no input files match {pattern}");
    }

    // Every input is loaded and edited before the first output is written.
    let mut edited = Vec::with_capacity(inputs.len());
    for input in inputs {
        let raw = se_store::load_snapshot(&input)
            .with_context(|| format!("failed to load {}", input.display()))?;
        let mut index = NamespaceIndex::from_entries(raw);
        let affected = apply_action(&mut index, action)
            .with_context(|| format!("failed to edit {}", input.display()))?;
        let output = target_file_name(template, &input);
        edited.push((input, output, index, affected));
    }

    let mut outcomes = Vec::with_capacity(edited.len());
    for (input, output, index, affected) in edited {
        let written = if confirm_overwrite(&output, overwrite)? {
            let entries = index.flatten();
            Some(
                se_store::store_snapshot(&output, &entries, true)
                    .with_context(|| format!("failed to write {}", output.display()))?,
            )
        } else {
            tracing::warn!(output = %output.display(), "skipping existing output file");
            None
        };
        tracing::info!(input = %input.display(), affected, ?written, "edited snapshot");
        outcomes.push(FileOutcome {
            input,
            output,
            written,
            affected,
        });
    }
    Ok(outcomes)
}

/// Runs one edit against every namespace pattern (and ID pattern) given.
pub fn apply_action(index: &mut NamespaceIndex, action: &EditAction) -> Result<usize, EditError> {
    let mut affected = 0;
    match action {
        EditAction::DeleteNamespace { target } => {
            for namespace in &target.namespaces {
                affected += index.delete_namespaces(namespace);
            }
        }
        EditAction::DeleteId { target, ids } => {
            for pattern in &target.namespaces {
                for namespace in index.match_namespaces(pattern) {
                    for id in ids {
                        affected += index.delete_id(&namespace, id)?;
                    }
                }
            }
        }
        EditAction::RenameNamespace { target, new_name } => {
            for namespace in &target.namespaces {
                affected += index.rename_namespace(namespace, new_name)?;
            }
        }
        EditAction::RenameId {
            target,
            ids,
            new_id,
        } => {
            for namespace in &target.namespaces {
                for id in ids {
                    let (_, renamed) = index.rename_ids(namespace, id, new_id)?;
                    affected += renamed;
                }
            }
        }
        EditAction::CopyNamespace { target, new_name } => {
            for namespace in &target.namespaces {
                affected += index.copy_namespace(namespace, new_name)?;
            }
        }
        EditAction::CopyId {
            target,
            ids,
            new_namespace,
            new_id,
        } => {
            for namespace in &target.namespaces {
                for id in ids {
                    affected += index.copy_id(namespace, id, new_namespace, new_id)?;
                }
            }
        }
    }
    Ok(affected)
}
