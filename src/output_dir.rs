//! Enumeration of the host's output directory.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};

/// Choice offered when the output directory holds no images.
pub const NONE_CHOICE: &str = "None";

/// Selectable values for the `image` input, plus the preselected one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choices {
    pub options: Vec<String>,
    pub default: String,
}

impl Choices {
    fn from_listing(listing: Vec<String>) -> Self {
        match listing.first() {
            Some(newest) => Self {
                default: newest.clone(),
                options: listing,
            },
            None => Self {
                options: vec![NONE_CHOICE.to_string()],
                default: NONE_CHOICE.to_string(),
            },
        }
    }

    /// Whether only the `None` sentinel is on offer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.len() == 1 && self.options[0] == NONE_CHOICE
    }
}

/// A directory of generated images, filtered by extension.
#[derive(Debug, Clone)]
pub struct OutputDirectory {
    root: PathBuf,
    extensions: Vec<String>,
}

impl OutputDirectory {
    /// Create a view over `root` accepting the given extensions (case-insensitive).
    ///
    /// No validation happens here; empty extensions are dropped so they cannot
    /// match names ending in a bare dot. Use [`OutputDirectory::from_config`] to
    /// reject malformed extensions instead.
    pub fn new<P: Into<PathBuf>>(root: P, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions
                .iter()
                .filter(|e| !e.is_empty())
                .map(|e| e.to_lowercase())
                .collect(),
        }
    }

    /// Create a view from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.output_dir.clone(), &config.extensions))
    }

    /// The directory being listed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a file name carries one of the accepted extensions.
    #[must_use]
    pub fn is_image_name(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.extensions.iter().any(|ext| {
            lower
                .strip_suffix(ext.as_str())
                .is_some_and(|stem| stem.ends_with('.'))
        })
    }

    /// List image file names, newest first.
    ///
    /// A missing output directory yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub fn list_images(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            tracing::debug!("Output directory {} does not exist", self.root.display());
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.root).map_err(|source| Error::ReadDir {
            path: self.root.clone(),
            source,
        })?;

        let mut found: Vec<(SystemTime, String)> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| Error::ReadDir {
                path: self.root.clone(),
                source,
            })?;

            let Ok(name) = entry.file_name().into_string() else {
                tracing::debug!("Skipping non UTF-8 entry {:?}", entry.file_name());
                continue;
            };

            if !self.is_image_name(&name) {
                continue;
            }

            // fs::metadata follows symlinks, DirEntry::metadata does not.
            let modified = match fs::metadata(entry.path()).and_then(|m| {
                if m.is_file() {
                    m.modified().map(Some)
                } else {
                    Ok(None)
                }
            }) {
                Ok(Some(modified)) => modified,
                Ok(None) => continue,
                Err(err) => {
                    tracing::debug!("Skipping {name}: {err}");
                    continue;
                }
            };

            found.push((modified, name));
        }

        found.sort_by(|(a_time, a_name), (b_time, b_name)| {
            b_time.cmp(a_time).then_with(|| a_name.cmp(b_name))
        });

        tracing::debug!(
            "Found {} image(s) in {}",
            found.len(),
            self.root.display()
        );

        Ok(found.into_iter().map(|(_, name)| name).collect())
    }

    /// List images as node input choices.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub fn choices(&self) -> Result<Choices> {
        self.list_images().map(Choices::from_listing)
    }

    /// Resolve a selected file name to a path inside the output directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelection`] for the `None` sentinel, empty names, and
    /// anything other than a single file name; [`Error::ImageNotFound`] if the file
    /// does not exist.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name == NONE_CHOICE {
            return Err(Error::InvalidSelection {
                name: name.to_string(),
                reason: "no image selected".to_string(),
            });
        }

        let mut components = Path::new(name).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(Error::InvalidSelection {
                name: name.to_string(),
                reason: "must be a file name inside the output directory".to_string(),
            });
        }

        let path = self.root.join(name);
        if !path.exists() {
            return Err(Error::ImageNotFound { path });
        }

        Ok(path)
    }
}
