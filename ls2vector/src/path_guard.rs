//! Checks run before any generated file is written.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("refusing to overwrite {target}: it is an input of this run ({input})")]
    InputCollision { target: PathBuf, input: PathBuf },
    #[error("refusing to write {0}: .conf paths are reserved for Logstash pipelines")]
    PipelineExtension(PathBuf),
    #[error("failed to resolve {path}: {source}")]
    Resolve { path: PathBuf, source: io::Error },
}

/// Whether a target file may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDecision {
    Write,
    /// The target already exists and `force` was not given.
    SkipExisting,
}

/// Reject a generated file `target` that would clobber a pipeline.
///
/// `inputs` are every path read or written earlier in the same run: the
/// pipeline sources, and for reports the generated config as well.
pub fn check_target(target: &Path, inputs: &[&Path]) -> Result<(), GuardError> {
    if target.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("conf")) {
        return Err(GuardError::PipelineExtension(target.to_path_buf()));
    }

    let resolved = resolve(target)?;
    for input in inputs {
        if resolve(input)? == resolved {
            return Err(GuardError::InputCollision {
                target: target.to_path_buf(),
                input: input.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Decide whether `target` may be written; existing files need `force`.
pub fn write_decision(target: &Path, force: bool) -> WriteDecision {
    if target.exists() && !force {
        WriteDecision::SkipExisting
    } else {
        WriteDecision::Write
    }
}

/// Absolute path with symlinks resolved as far as the filesystem allows.
///
/// A target that does not exist yet is resolved through its parent directory,
/// so `out/../report.md` still matches `report.md` when `out` exists.
fn resolve(path: &Path) -> Result<PathBuf, GuardError> {
    let err = |source| GuardError::Resolve {
        path: path.to_path_buf(),
        source,
    };
    if path.exists() {
        return path.canonicalize().map_err(err);
    }

    let absolute = std::path::absolute(path).map_err(err)?;
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) if parent.exists() => {
            Ok(parent.canonicalize().map_err(err)?.join(name))
        }
        _ => Ok(absolute),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{check_target, write_decision, GuardError, WriteDecision};

    #[test]
    fn rejects_target_equal_to_input() {
        let dir = tempdir().expect("tempdir");
        let source = dir.path().join("pipeline.toml");
        fs::write(&source, "").expect("write");

        let err = check_target(&source, &[source.as_path()]).expect_err("same path");
        assert!(matches!(err, GuardError::InputCollision { .. }));
        assert!(err.to_string().contains("refusing to overwrite"));

        let target = dir.path().join("pipeline.md");
        check_target(&target, &[source.as_path()]).expect("different path");
    }

    #[test]
    fn dot_dot_segments_still_collide() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("out")).expect("mkdir");
        let report = dir.path().join("report.md");
        fs::write(&report, "").expect("write");

        let sneaky = dir.path().join("out").join("..").join("report.md");
        let err = check_target(&sneaky, &[report.as_path()]).expect_err("same file");
        assert!(matches!(err, GuardError::InputCollision { .. }));
    }

    #[test]
    fn conf_targets_are_refused() {
        let dir = tempdir().expect("tempdir");
        let target = dir.path().join("other.CONF");
        let err = check_target(&target, &[]).expect_err("pipeline extension");
        assert!(matches!(err, GuardError::PipelineExtension(_)));
    }

    #[test]
    fn existing_targets_need_force() {
        let dir = tempdir().expect("tempdir");
        let target = dir.path().join("out.toml");
        assert_eq!(write_decision(&target, false), WriteDecision::Write);

        fs::write(&target, "").expect("write");
        assert_eq!(write_decision(&target, false), WriteDecision::SkipExisting);
        assert_eq!(write_decision(&target, true), WriteDecision::Write);
    }
}
