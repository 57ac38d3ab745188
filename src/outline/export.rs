use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::UiOutlineNode;

pub const DEFAULT_EXPORT_NAME: &str = "outline.json";

/// Serializes the outline with two space indentation.
pub fn to_json(outline: &[UiOutlineNode]) -> Result<String> {
    Ok(serde_json::to_string_pretty(outline)?)
}

/// Writes the outline as json into `dir/file_name`. Returns `Ok(None)` without touching the disk
/// when no outline has been loaded.
pub fn export_outline(
    outline: Option<&[UiOutlineNode]>,
    dir: &Path,
    file_name: &str,
) -> Result<Option<PathBuf>> {
    match outline {
        Some(outline) => write_outline(outline, &dir.join(file_name)).map(Some),
        None => {
            debug!("No outline loaded, skipping export");
            Ok(None)
        }
    }
}

/// Writes the outline to exactly `target`. The file is staged next to the target and renamed
/// into place so a failed write never leaves a truncated file behind.
pub fn write_outline(outline: &[UiOutlineNode], target: &Path) -> Result<PathBuf> {
    let json = to_json(outline)?;
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("Creating export directory {dir:?}"))?;

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(json.as_bytes())?;
    staged.flush()?;
    staged
        .persist(target)
        .map_err(|e| anyhow!("Could not write {target:?}: {}", e.error))?;

    info!("Exported outline to {target:?}");
    Ok(target.to_path_buf())
}

pub fn copy_to_clipboard(outline: Option<&[UiOutlineNode]>) -> Result<bool> {
    let Some(outline) = outline else {
        return Ok(false);
    };
    let json = to_json(outline)?;
    arboard::Clipboard::new()?.set_text(json)?;
    debug!("Copied outline json to clipboard");
    Ok(true)
}
