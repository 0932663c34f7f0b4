//! Recursive copy of the source tree into the staged streams directory.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Totals for one copy run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: u64,
    pub bytes: u64,
}

/// Copy every file under `src` into `dst`, preserving relative structure.
///
/// Symlinks are followed, so linked files land as regular files. Empty
/// directories are recreated. The first failure aborts the copy; files
/// already written are left in place.
///
/// # Example
///
/// ```rust,ignore
/// use derivative_submission::stage::copy::copy_tree;
/// use std::path::Path;
///
/// let stats = copy_tree(Path::new("/data/derivatives"), Path::new("/deposit/IE1/content/streams"))?;
/// println!("{} files", stats.files);
/// ```
pub fn copy_tree(src: &Path, dst: &Path) -> Result<CopyStats> {
    if !src.is_dir() {
        bail!("source directory not found: {}", src.display());
    }
    fs::create_dir_all(dst)
        .with_context(|| format!("creating directory '{}'", dst.display()))?;
    ensure_disjoint(src, dst)?;

    let mut stats = CopyStats::default();
    for entry in WalkDir::new(src).follow_links(true).min_depth(1) {
        let entry = entry.with_context(|| format!("walking source tree '{}'", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("path outside source tree: {}", entry.path().display()))?;
        let dst_path = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dst_path)
                .with_context(|| format!("creating directory '{}'", dst_path.display()))?;
            continue;
        }

        let bytes = fs::copy(entry.path(), &dst_path).with_context(|| {
            format!(
                "copying '{}' to '{}'",
                entry.path().display(),
                dst_path.display()
            )
        })?;
        tracing::debug!(file = %rel.display(), bytes, "copied");
        stats.files += 1;
        stats.bytes += bytes;
    }

    Ok(stats)
}

/// Refuse a destination inside the source tree; the walk would otherwise
/// descend into its own output.
fn ensure_disjoint(src: &Path, dst: &Path) -> Result<()> {
    let src_real = src
        .canonicalize()
        .with_context(|| format!("resolving source directory '{}'", src.display()))?;
    let dst_real = dst
        .canonicalize()
        .with_context(|| format!("resolving destination directory '{}'", dst.display()))?;
    if dst_real.starts_with(&src_real) {
        bail!(
            "destination '{}' lies inside source directory '{}'",
            dst.display(),
            src.display()
        );
    }
    Ok(())
}
