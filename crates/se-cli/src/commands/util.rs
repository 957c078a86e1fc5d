//! Shared utilities for CLI commands.

use std::ffi::OsStr;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Builds an output path from a template and an input file.
///
/// The template's directory is kept. A `*` in the template's stem becomes
/// the input's stem and a `*` in its extension becomes the input's
/// extension, so `out/*_fixed.*` maps `caps/run1.jsonl` to
/// `out/run1_fixed.jsonl`.
pub fn target_file_name(template: &Path, input: &Path) -> PathBuf {
    let input_stem = os_str(input.file_stem());
    let input_ext = os_str(input.extension());

    let mut name = os_str(template.file_stem()).replace('*', &input_stem);
    if let Some(ext) = template.extension() {
        let ext = ext.to_string_lossy().replace('*', &input_ext);
        if !ext.is_empty() {
            name.push('.');
            name.push_str(&ext);
        }
    }
    template
        .parent()
        .map_or_else(|| PathBuf::from(&name), |dir| dir.join(&name))
}

fn os_str(part: Option<&OsStr>) -> String {
    part.unwrap_or_default().to_string_lossy().into_owned()
}

/// Whether `path` may be written.
///
/// Missing paths and `overwrite` always allow it. Otherwise the user is
/// asked when stdin is a terminal; without a terminal the answer is no.
pub fn confirm_overwrite(path: &Path, overwrite: bool) -> anyhow::Result<bool> {
    if overwrite || !path.exists() {
        return Ok(true);
    }
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Ok(false);
    }
    ask_overwrite(path, &mut stdin.lock(), &mut io::stderr())
}

fn ask_overwrite(path: &Path, input: &mut impl BufRead, output: &mut impl Write) -> anyhow::Result<bool> {
    write!(output, "{} already exists. Overwrite? [y/N] ", path.display())
        .context("failed to write prompt")?;
    output.flush().context("failed to write prompt")?;
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("failed to read answer")?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
