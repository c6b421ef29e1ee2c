//! Discovery of pipeline files under a directory.

use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Every `*.conf` file under `root`, recursively, sorted by path.
pub fn discover_configs(root: &Path) -> Result<Vec<PathBuf>, DiscoverError> {
    if !root.is_dir() {
        return Err(DiscoverError::NotADirectory(root.to_path_buf()));
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "conf")
        {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

/// Target path for `source`.
///
/// Without `output_dir` the target sits next to the source. With one, the
/// source's path relative to `root` is kept under `output_dir`.
pub fn target_for(source: &Path, root: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        None => source.with_extension("toml"),
        Some(dir) => {
            let relative = source
                .strip_prefix(root)
                .ok()
                .filter(|rel| !rel.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .or_else(|| source.file_name().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("pipeline.conf"));
            dir.join(relative).with_extension("toml")
        }
    }
}
