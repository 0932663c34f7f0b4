//! Optional TOML configuration.
//!
//! Every key has a default, so an absent file and an empty file behave the
//! same.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::descriptor::DEFAULT_STRUCTURE_LABEL;
use crate::manifest::ManifestOptions;
use crate::stage::layout::{
    PackageLayout, DEFAULT_CONTENT_DIR, DEFAULT_DESCRIPTOR_FILE, DEFAULT_LOCK_FILE,
    DEFAULT_STREAMS_DIR,
};
use crate::stage::ExistingPackage;

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub layout: PackageLayout,
    pub existing: ExistingPackage,
    pub checksums: bool,
    pub structure_label: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            layout: PackageLayout::default(),
            existing: ExistingPackage::Fail,
            checksums: true,
            structure_label: DEFAULT_STRUCTURE_LABEL.to_string(),
        }
    }
}

impl Settings {
    pub fn manifest_options(&self) -> ManifestOptions {
        ManifestOptions {
            checksums: self.checksums,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsToml {
    #[serde(default)]
    layout: LayoutToml,
    #[serde(default)]
    staging: StagingToml,
    #[serde(default)]
    manifest: ManifestToml,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutToml {
    content_dir: Option<String>,
    streams_dir: Option<String>,
    descriptor_file: Option<String>,
    lock_file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StagingToml {
    replace_existing: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestToml {
    checksums: Option<bool>,
    structure_label: Option<String>,
}

/// Load settings from `path`, or defaults when no path is given.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config '{}'", path.display()))?;
    parse_settings(&raw).with_context(|| format!("parsing config '{}'", path.display()))
}

pub fn parse_settings(raw: &str) -> Result<Settings> {
    let parsed: SettingsToml = toml::from_str(raw)?;

    let layout = PackageLayout {
        content_dir: parsed
            .layout
            .content_dir
            .unwrap_or_else(|| DEFAULT_CONTENT_DIR.to_string()),
        streams_dir: parsed
            .layout
            .streams_dir
            .unwrap_or_else(|| DEFAULT_STREAMS_DIR.to_string()),
        descriptor_file: parsed
            .layout
            .descriptor_file
            .unwrap_or_else(|| DEFAULT_DESCRIPTOR_FILE.to_string()),
        lock_file: parsed
            .layout
            .lock_file
            .unwrap_or_else(|| DEFAULT_LOCK_FILE.to_string()),
    };
    layout.validate().context("invalid [layout] section")?;

    let existing = if parsed.staging.replace_existing.unwrap_or(false) {
        ExistingPackage::Replace
    } else {
        ExistingPackage::Fail
    };

    Ok(Settings {
        layout,
        existing,
        checksums: parsed.manifest.checksums.unwrap_or(true),
        structure_label: parsed
            .manifest
            .structure_label
            .unwrap_or_else(|| DEFAULT_STRUCTURE_LABEL.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(parse_settings("").unwrap(), Settings::default());
    }

    #[test]
    fn no_path_is_default() {
        assert_eq!(load_settings(None).unwrap(), Settings::default());
    }

    #[test]
    fn overrides_apply() {
        let settings = parse_settings(
            r#"
            [layout]
            descriptor_file = "mets.xml"

            [staging]
            replace_existing = true

            [manifest]
            checksums = false
            structure_label = "Access Copy"
            "#,
        )
        .unwrap();

        assert_eq!(settings.layout.descriptor_file, "mets.xml");
        assert_eq!(settings.layout.streams_dir, DEFAULT_STREAMS_DIR);
        assert_eq!(settings.existing, ExistingPackage::Replace);
        assert!(!settings.checksums);
        assert_eq!(settings.structure_label, "Access Copy");
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(parse_settings("[layout]\nstreams = \"s\"\n").is_err());
        assert!(parse_settings("[extra]\n").is_err());
    }

    #[test]
    fn invalid_layout_rejected() {
        assert!(parse_settings("[layout]\nlock_file = \"a/b\"\n").is_err());
    }

    #[test]
    fn load_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("submission.toml");
        fs::write(&path, "[manifest]\nchecksums = \"yes\"\n").unwrap();

        let err = load_settings(Some(&path)).unwrap_err();

        assert!(format!("{err}").contains("submission.toml"));
    }
}
