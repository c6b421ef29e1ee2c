//! External syntax validation of generated Vector configs.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Default timeout for one `vector validate` run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of validating one generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum ValidationOutcome {
    Valid,
    Invalid(String),
    /// The validator could not run at all.
    Unavailable(String),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Checks a generated config file.
pub trait Validator: Send + Sync {
    fn validate(&self, path: &Path) -> ValidationOutcome;
}

/// Runs `vector validate --no-environment <path>`.
#[derive(Debug, Clone)]
pub struct VectorCli {
    binary: PathBuf,
    timeout: Duration,
}

impl Default for VectorCli {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("vector"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl VectorCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the configured binary resolves on `PATH` (or exists as given).
    pub fn is_available(&self) -> bool {
        which::which(&self.binary).is_ok()
    }
}

impl Validator for VectorCli {
    fn validate(&self, path: &Path) -> ValidationOutcome {
        if !self.is_available() {
            return ValidationOutcome::Unavailable(format!(
                "{} not found in PATH",
                self.binary.display()
            ));
        }

        debug!(path = %path.display(), "running vector validate");
        let mut child = match Command::new(&self.binary)
            .arg("validate")
            .arg("--no-environment")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                return ValidationOutcome::Unavailable(format!(
                    "failed to spawn {}: {err}",
                    self.binary.display()
                ))
            }
        };

        match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => {
                let output = match child.wait_with_output() {
                    Ok(output) => output,
                    Err(err) => return ValidationOutcome::Unavailable(err.to_string()),
                };
                if status.success() {
                    ValidationOutcome::Valid
                } else {
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    let message = format!("{}{}", stdout.trim(), stderr.trim());
                    ValidationOutcome::Invalid(if message.is_empty() {
                        format!("vector validate exited with {status}")
                    } else {
                        message
                    })
                }
            }
            Ok(None) => {
                // timed out
                let _ = child.kill();
                let _ = child.wait();
                warn!(path = %path.display(), "vector validate timed out");
                ValidationOutcome::Unavailable(format!(
                    "vector validate timed out after {}s",
                    self.timeout.as_secs()
                ))
            }
            Err(err) => ValidationOutcome::Unavailable(err.to_string()),
        }
    }
}
