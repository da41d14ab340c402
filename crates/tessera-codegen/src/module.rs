//! Resolution of kernel module paths.

use crate::error::{CodegenError, Result};
use std::path::{Path, PathBuf};

/// Resolve a kernel module to a canonical absolute path.
///
/// `relative` is joined to `working_dir` (or the process working directory
/// when `None`) with `extension` appended, canonicalized, and returned with
/// the extension stripped again. Backends import modules by that
/// extension-less path.
pub fn resolve_module_path(
    working_dir: Option<&Path>,
    relative: &str,
    extension: &str,
) -> Result<PathBuf> {
    let base = match working_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().map_err(|source| CodegenError::ModuleResolutionFailed {
            path: PathBuf::from("."),
            source,
        })?,
    };

    let candidate = base.join(format!("{relative}.{extension}"));
    let canonical = candidate
        .canonicalize()
        .map_err(|source| CodegenError::ModuleResolutionFailed {
            path: candidate.clone(),
            source,
        })?;

    tracing::debug!(module = %canonical.display(), "resolved kernel module");
    Ok(canonical.with_extension(""))
}
