//! Apply command: run a rule document and write the combined snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use se_core::{Entry, MergeCoordinator, NamespaceIndex, RuleDocument, apply_source, plan_source};

use super::util::confirm_overwrite;

/// Outcome of an apply run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplySummary {
    pub sources: usize,
    pub entries: usize,
}

pub fn run(rules_path: &Path, output: &Path, overwrite: bool) -> Result<ApplySummary> {
    let text = fs::read_to_string(rules_path)
        .with_context(|| format!("failed to read rule document {}", rules_path.display()))?;
    let document: RuleDocument = text
        .parse()
        .with_context(|| format!("invalid rule document {}", rules_path.display()))?;
    let base_dir = rules_path.parent().unwrap_or_else(|| Path::new(""));

    let entries = process(&document, base_dir)?;

    if !confirm_overwrite(output, overwrite)? {
        anyhow::bail!(
            "{} already exists; pass --overwrite to replace it",
            output.display()
        );
    }
    let written = se_store::store_snapshot(output, &entries, true)
        .with_context(|| format!("failed to write {}", output.display()))?;

    Ok(ApplySummary {
        sources: document.sources.len(),
        entries: written,
    })
}

/// Loads, edits and merges every source of a document.
///
/// Relative `File` paths resolve against `base_dir`. Every source file must
/// exist before any of them is processed.
pub fn process(document: &RuleDocument, base_dir: &Path) -> Result<Vec<Entry>> {
    let mut plans = Vec::with_capacity(document.sources.len());
    for (idx, source) in document.sources.iter().enumerate() {
        let plan = plan_source(source).with_context(|| format!("invalid source #{}", idx + 1))?;
        let path = resolve(base_dir, &plan.file);
        if !path.is_file() {
            anyhow::bail!("specified file {} does not exist", path.display());
        }
        plans.push((plan, path));
    }

    let mut coordinator = MergeCoordinator::new();
    for (source, (plan, path)) in document.sources.iter().zip(plans) {
        tracing::info!(file = %path.display(), insert_time = ?plan.insert_time, "processing source");
        let raw = se_store::load_snapshot(&path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        let mut index = NamespaceIndex::build(raw, plan.insert_time);
        apply_source(&mut index, source)
            .with_context(|| format!("failed to apply rules to {}", path.display()))?;
        coordinator.push(plan.insert_time, index);
    }

    let merged = coordinator.finish();
    tracing::debug!(entries = merged.len(), "merged sources");
    Ok(merged)
}

fn resolve(base_dir: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
