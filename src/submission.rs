//! End-to-end run: stage, copy, build the manifest, write the descriptor,
//! release the lock marker.
//!
//! Any failure returns early with the lock marker still on disk and
//! whatever was copied so far left in place.

use anyhow::{Context, Result};
use std::path::PathBuf;
use time::OffsetDateTime;

use crate::config::Settings;
use crate::descriptor::Descriptor;
use crate::manifest::{build_manifest, IdAllocator, SequentialIds};
use crate::request::SubmissionRequest;
use crate::stage::copy::copy_tree;
use crate::stage::stage_package;

/// Summary of a completed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub package_dir: PathBuf,
    pub descriptor: PathBuf,
    pub files: usize,
    pub bytes: u64,
}

/// Run a submission with the bundled sequential identifier allocator.
pub fn run(request: &SubmissionRequest, settings: &Settings) -> Result<SubmissionReport> {
    run_with_ids(request, settings, &mut SequentialIds::default())
}

pub fn run_with_ids(
    request: &SubmissionRequest,
    settings: &Settings,
    ids: &mut dyn IdAllocator,
) -> Result<SubmissionReport> {
    tracing::info!(
        id = request.id(),
        source = %request.source().display(),
        target = %request.target().display(),
        "staging submission"
    );

    let (paths, lock) = stage_package(
        request.target(),
        request.id(),
        &settings.layout,
        settings.existing,
    )
    .with_context(|| format!("staging package '{}'", request.id()))?;

    let copied = copy_tree(request.source(), &paths.streams).with_context(|| {
        format!(
            "copying '{}' into '{}'",
            request.source().display(),
            paths.streams.display()
        )
    })?;
    tracing::info!(files = copied.files, bytes = copied.bytes, "copied source files");

    let manifest = build_manifest(&paths.streams, ids, settings.manifest_options())
        .context("building file manifest")?;
    tracing::info!(entries = manifest.len(), "built manifest");

    let descriptor = Descriptor {
        ie_pid: request.id(),
        entity_type: request.entity_type(),
        code: request.code(),
        structure_label: &settings.structure_label,
        created: OffsetDateTime::now_utc(),
        manifest: &manifest,
    };
    descriptor.write_to(&paths.descriptor)?;

    lock.release()?;
    tracing::info!(descriptor = %paths.descriptor.display(), "submission complete");

    Ok(SubmissionReport {
        package_dir: paths.package,
        descriptor: paths.descriptor,
        files: manifest.len(),
        bytes: manifest.total_bytes(),
    })
}
