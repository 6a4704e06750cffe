//! Node configuration.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// File extensions listed by default, lowercase and without the dot.
pub const DEFAULT_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "gif"];

/// Configuration for the output-as-input node.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the host writes generated images to.
    pub output_dir: PathBuf,

    /// Accepted file extensions, lowercase, without the leading dot.
    pub extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no extensions are configured or one of them is malformed.
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(Error::InvalidParameter {
                name: "extensions".to_string(),
                reason: "must list at least one extension".to_string(),
            });
        }

        for ext in &self.extensions {
            if ext.is_empty() || ext.contains(['.', '/', '\\']) {
                return Err(Error::InvalidParameter {
                    name: "extensions".to_string(),
                    reason: format!("{ext:?} must be a bare extension such as \"png\""),
                });
            }
        }

        Ok(())
    }
}
