//! Package staging: `<target>/<id>/` with its lock marker and
//! `content/streams` tree.
//!
//! The lock marker is a plain file that tells external consumers a package
//! is still being written. It is not a mutual-exclusion primitive: two runs
//! for the same identifier are not guarded against.

pub mod copy;
pub mod layout;

use anyhow::{bail, Context, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

pub use layout::{PackageLayout, PackagePaths};

/// What to do when `<target>/<id>` already exists with content in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistingPackage {
    /// Refuse to stage over a non-empty package directory.
    #[default]
    Fail,
    /// Remove the old package directory recursively, then stage.
    Replace,
}

/// Sentinel file present while a package is being staged.
///
/// Dropping the marker leaves the file on disk on purpose: only
/// [`LockMarker::release`] removes it, after a fully successful run.
#[derive(Debug)]
#[must_use = "the lock marker must be released once the package is complete"]
pub struct LockMarker {
    path: PathBuf,
}

impl LockMarker {
    fn create(path: &Path) -> Result<Self> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(|| format!("creating lock marker '{}'", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the marker, signalling the package is complete.
    pub fn release(self) -> Result<()> {
        fs::remove_file(&self.path)
            .with_context(|| format!("removing lock marker '{}'", self.path.display()))
    }
}

/// Create `<target>/<id>/`, its lock marker and the `content/streams` tree.
///
/// An existing empty package directory is recreated silently. A non-empty
/// one is handled according to `existing`.
pub fn stage_package(
    target: &Path,
    id: &str,
    layout: &PackageLayout,
    existing: ExistingPackage,
) -> Result<(PackagePaths, LockMarker)> {
    if !target.is_dir() {
        bail!("target directory not found: {}", target.display());
    }

    let paths = layout.resolve(&target.join(id));
    clear_existing_package(&paths.package, existing)?;

    fs::create_dir(&paths.package)
        .with_context(|| format!("creating package directory '{}'", paths.package.display()))?;

    let lock = LockMarker::create(&paths.lock)?;

    fs::create_dir(&paths.content)
        .with_context(|| format!("creating content directory '{}'", paths.content.display()))?;
    fs::create_dir(&paths.streams)
        .with_context(|| format!("creating streams directory '{}'", paths.streams.display()))?;

    tracing::debug!(package = %paths.package.display(), "staged package directories");
    Ok((paths, lock))
}

fn clear_existing_package(package: &Path, existing: ExistingPackage) -> Result<()> {
    let metadata = match fs::symlink_metadata(package) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(anyhow::Error::new(err)
                .context(format!("inspecting package path '{}'", package.display())))
        }
    };

    if !metadata.is_dir() {
        bail!(
            "package path exists and is not a directory: {}",
            package.display()
        );
    }

    if is_empty_dir(package)? {
        fs::remove_dir(package).with_context(|| {
            format!(
                "removing empty package directory before recreation '{}'",
                package.display()
            )
        })?;
        return Ok(());
    }

    match existing {
        ExistingPackage::Fail => bail!(
            "package directory already exists and is not empty: {}",
            package.display()
        ),
        ExistingPackage::Replace => {
            tracing::warn!(package = %package.display(), "replacing existing package directory");
            fs::remove_dir_all(package).with_context(|| {
                format!(
                    "removing existing package directory '{}'",
                    package.display()
                )
            })
        }
    }
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries =
        fs::read_dir(path).with_context(|| format!("reading directory '{}'", path.display()))?;
    Ok(entries.next().is_none())
}
