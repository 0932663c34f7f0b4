//! The file manifest: every staged file with its identifier, label and
//! path relative to the streams root.
//!
//! A [`Manifest`] is built once from a sorted walk of the streams directory
//! and never mutated afterwards. Order is depth-first with siblings sorted
//! by file name, so a subdirectory's files appear where the subdirectory's
//! name sorts among its siblings.

pub mod ids;

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path};
use walkdir::WalkDir;

pub use ids::{IdAllocator, SequentialIds};

/// One staged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub id: String,
    /// File name without its last extension.
    pub label: String,
    /// `/`-separated path relative to the streams root.
    pub path: String,
    pub size: u64,
    /// Lowercase hex SHA-256 of the staged bytes, when recorded.
    pub sha256: Option<String>,
}

impl FileEntry {
    /// Directory components of [`FileEntry::path`], excluding the file name.
    pub fn parent_dirs(&self) -> Vec<&str> {
        let mut parts: Vec<&str> = self.path.split('/').collect();
        parts.pop();
        parts
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<FileEntry>,
}

impl Manifest {
    /// Wrap `entries`, checking identifiers and paths are unique.
    pub fn new(entries: Vec<FileEntry>) -> Result<Self> {
        let mut ids = HashSet::new();
        let mut paths = HashSet::new();
        for entry in &entries {
            if !ids.insert(entry.id.as_str()) {
                bail!("duplicate file identifier in manifest: {}", entry.id);
            }
            if !paths.insert(entry.path.as_str()) {
                bail!("duplicate file path in manifest: {}", entry.path);
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&FileEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|entry| entry.size).sum()
    }
}

/// Options for [`build_manifest`].
#[derive(Debug, Clone, Copy)]
pub struct ManifestOptions {
    pub checksums: bool,
}

impl Default for ManifestOptions {
    fn default() -> Self {
        Self { checksums: true }
    }
}

/// Walk `streams_root` in sorted order and build the manifest.
///
/// Every regular file gets the next identifier from `ids`. Empty
/// directories contribute nothing.
pub fn build_manifest(
    streams_root: &Path,
    ids: &mut dyn IdAllocator,
    options: ManifestOptions,
) -> Result<Manifest> {
    if !streams_root.is_dir() {
        bail!("streams directory not found: {}", streams_root.display());
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(streams_root)
        .follow_links(true)
        .min_depth(1)
        .sort_by_file_name()
    {
        let entry = entry
            .with_context(|| format!("walking streams directory '{}'", streams_root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let full = entry.path();
        let rel = full
            .strip_prefix(streams_root)
            .with_context(|| format!("path outside streams root: {}", full.display()))?;
        let path = relative_path_string(rel)?;
        let label = label_for(rel)?;
        let size = entry
            .metadata()
            .with_context(|| format!("reading metadata for '{}'", full.display()))?
            .len();
        let sha256 = if options.checksums {
            Some(sha256_file(full)?)
        } else {
            None
        };
        let id = ids.next_id()?;

        tracing::debug!(%id, %path, %label, "manifest entry");
        entries.push(FileEntry {
            id,
            label,
            path,
            size,
            sha256,
        });
    }

    Manifest::new(entries)
}

/// File name cut at its last `.`; a name with no `.` is kept whole.
///
/// A leading dot counts as an extension separator, so `.hidden` yields an
/// empty label.
pub fn label_for(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .with_context(|| format!("path has no file name: {}", path.display()))?;
    let name = name
        .to_str()
        .with_context(|| format!("file name is not valid UTF-8: {}", path.display()))?;
    let label = match name.rfind('.') {
        Some(dot) => &name[..dot],
        None => name,
    };
    Ok(label.to_string())
}

fn relative_path_string(rel: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().with_context(|| {
                    format!("file path is not valid UTF-8: {}", rel.display())
                })?;
                parts.push(part);
            }
            other => bail!(
                "unexpected component {:?} in relative path '{}'",
                other,
                rel.display()
            ),
        }
    }
    Ok(parts.join("/"))
}

fn sha256_file(path: &Path) -> Result<String> {
    let f = File::open(path).with_context(|| format!("opening '{}'", path.display()))?;
    let mut r = BufReader::new(f);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = r
            .read(&mut buf)
            .with_context(|| format!("reading '{}'", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
