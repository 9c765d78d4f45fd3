use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{PROJECT_INDICATORS, SOURCE_DIRS};
use crate::error::AgentError;

/// Resolve `dir` to an absolute path and make sure it exists.
pub fn resolve_directory(dir: &Path) -> Result<PathBuf, AgentError> {
    let absolute = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(dir)
    };

    if !absolute.is_dir() {
        return Err(AgentError::DirectoryNotFound(absolute.display().to_string()));
    }

    Ok(absolute.canonicalize().unwrap_or(absolute))
}

/// Whether `dir` looks like a code project: a known manifest or a common
/// source directory.
pub fn is_code_project(dir: &Path) -> bool {
    if PROJECT_INDICATORS.iter().any(|f| dir.join(f).exists()) {
        return true;
    }
    SOURCE_DIRS.iter().any(|d| dir.join(d).is_dir())
}

/// Directory checks that run before the first pass. A directory that does not
/// look like a project only produces a warning.
pub fn check_directory(dir: &Path) -> Result<PathBuf, AgentError> {
    let dir = resolve_directory(dir)?;
    if is_code_project(&dir) {
        info!("Project directory: {:?}", dir);
    } else {
        warn!(
            "{:?} doesn't appear to contain a typical code project; results may be limited",
            dir
        );
    }
    Ok(dir)
}
