//! Names of the directories and files that make up a submission package.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONTENT_DIR: &str = "content";
pub const DEFAULT_STREAMS_DIR: &str = "streams";
pub const DEFAULT_DESCRIPTOR_FILE: &str = "ie.xml";
pub const DEFAULT_LOCK_FILE: &str = "LOCKED";

/// Directory and file names used inside `<target>/<id>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLayout {
    pub content_dir: String,
    pub streams_dir: String,
    pub descriptor_file: String,
    pub lock_file: String,
}

impl Default for PackageLayout {
    fn default() -> Self {
        Self {
            content_dir: DEFAULT_CONTENT_DIR.to_string(),
            streams_dir: DEFAULT_STREAMS_DIR.to_string(),
            descriptor_file: DEFAULT_DESCRIPTOR_FILE.to_string(),
            lock_file: DEFAULT_LOCK_FILE.to_string(),
        }
    }
}

impl PackageLayout {
    /// Reject names that would escape or collapse the package directory.
    pub fn validate(&self) -> Result<()> {
        validate_segment(&self.content_dir, "content_dir")?;
        validate_segment(&self.streams_dir, "streams_dir")?;
        validate_segment(&self.descriptor_file, "descriptor_file")?;
        validate_segment(&self.lock_file, "lock_file")?;
        if self.lock_file == self.content_dir {
            bail!(
                "lock_file and content_dir must differ (both '{}')",
                self.lock_file
            );
        }
        if self.descriptor_file == self.streams_dir {
            bail!(
                "descriptor_file and streams_dir must differ (both '{}')",
                self.descriptor_file
            );
        }
        Ok(())
    }

    /// Resolve the layout under `package_dir` (`<target>/<id>`).
    pub fn resolve(&self, package_dir: &Path) -> PackagePaths {
        let content = package_dir.join(&self.content_dir);
        PackagePaths {
            package: package_dir.to_path_buf(),
            lock: package_dir.join(&self.lock_file),
            streams: content.join(&self.streams_dir),
            descriptor: content.join(&self.descriptor_file),
            content,
        }
    }
}

/// Absolute locations of one staged package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePaths {
    pub package: PathBuf,
    pub lock: PathBuf,
    pub content: PathBuf,
    pub streams: PathBuf,
    pub descriptor: PathBuf,
}

/// A single, non-empty path segment: no separators, no `.`/`..`.
pub(crate) fn validate_segment(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{field} must not be empty");
    }
    if value.contains('/') || value.contains('\\') {
        bail!("{field} must not contain path separators: '{value}'");
    }
    if value == "." || value == ".." {
        bail!("{field} must not be '.' or '..'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_default_layout() {
        let paths = PackageLayout::default().resolve(Path::new("/deposit/IE1"));

        assert_eq!(paths.lock, Path::new("/deposit/IE1/LOCKED"));
        assert_eq!(paths.content, Path::new("/deposit/IE1/content"));
        assert_eq!(paths.streams, Path::new("/deposit/IE1/content/streams"));
        assert_eq!(paths.descriptor, Path::new("/deposit/IE1/content/ie.xml"));
    }

    #[test]
    fn validate_rejects_traversal() {
        let layout = PackageLayout {
            streams_dir: "../streams".to_string(),
            ..PackageLayout::default()
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn validate_rejects_colliding_names() {
        let layout = PackageLayout {
            lock_file: "content".to_string(),
            ..PackageLayout::default()
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn validate_segment_rejects_dot_dot() {
        assert!(validate_segment("..", "test").is_err());
        assert!(validate_segment("", "test").is_err());
        assert!(validate_segment("ok", "test").is_ok());
    }
}
