//! Error page file lookup.
//!
//! # Lookup Order
//! ```text
//! <base>/<code><ext>     for each ext   → countable
//! <base>/<class>xx<ext>  for each ext   → not countable
//! otherwise                              → NotFound
//! ```
//!
//! Class fallbacks are excluded from metrics so a handful of generic pages
//! does not inflate the per-code counters.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{PageError, PageResult};

/// The page chosen for a request, already opened.
#[derive(Debug)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub file: File,
    /// Exact code match rather than a status class fallback.
    pub countable: bool,
}

/// Find the page for `code` among `extensions` under `base`.
pub fn locate(base: &Path, code: u16, extensions: &[String]) -> PageResult<ResolvedFile> {
    let extensions: Vec<String> = extensions.iter().map(|ext| normalize_extension(ext)).collect();

    if let Some((path, file)) = open_first(base, &code.to_string(), &extensions) {
        return Ok(ResolvedFile {
            path,
            file,
            countable: true,
        });
    }
    tracing::debug!(code, extensions = ?extensions, "No page for exact code");

    let class = code / 100;
    if let Some((path, file)) = open_first(base, &format!("{class}xx"), &extensions) {
        return Ok(ResolvedFile {
            path,
            file,
            countable: false,
        });
    }
    tracing::warn!(
        code,
        class = %format!("{class}xx"),
        extensions = ?extensions,
        base = %base.display(),
        "No page for code or status class"
    );

    Err(PageError::NotFound { code })
}

fn open_first(base: &Path, stem: &str, extensions: &[String]) -> Option<(PathBuf, File)> {
    extensions.iter().find_map(|ext| {
        let path = base.join(format!("{stem}{ext}"));
        match File::open(&path) {
            Ok(file) => Some((path, file)),
            Err(e) => {
                tracing::trace!(path = %path.display(), error = %e, "Candidate not usable");
                None
            }
        }
    })
}

fn normalize_extension(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}
