//! METS-style descriptor for a staged package.
//!
//! The document carries:
//! - an IE-level `amdSec` with the internal identifier
//! - a representation `amdSec` with the classification fields
//! - a `fileSec` listing every manifest entry with its location
//! - a logical `structMap` nesting files under their directories
//!
//! Everything is rendered in one pass from an immutable [`Manifest`].

pub mod dnx;
pub mod structmap;
mod xml;

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use time::{OffsetDateTime, UtcOffset};

use crate::manifest::Manifest;
use dnx::{DnxDocument, USAGE_TYPE};
use structmap::{structure_tree, StructNode};
use xml::XmlOut;

pub const METS_NS: &str = "http://www.loc.gov/METS/";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

pub const DEFAULT_STRUCTURE_LABEL: &str = "Derivative Copy";

const IE_AMD_ID: &str = "ie-amd";
const REP_ID: &str = "rep1";
const REP_AMD_ID: &str = "rep1-amd";
const STRUCT_MAP_ID: &str = "rep1-1";

/// Inputs for one descriptor document.
#[derive(Debug, Clone)]
pub struct Descriptor<'a> {
    pub ie_pid: &'a str,
    pub entity_type: &'a str,
    pub code: &'a str,
    pub structure_label: &'a str,
    pub created: OffsetDateTime,
    pub manifest: &'a Manifest,
}

impl Descriptor<'_> {
    /// Render the pretty-printed XML document.
    pub fn render(&self) -> Result<Vec<u8>> {
        let mut out = XmlOut::new(Vec::new());
        out.declaration()?;
        out.start("mets:mets", &[("xmlns:mets", METS_NS), ("xmlns:xlink", XLINK_NS)])?;

        let created = format_utc(self.created);
        out.empty("mets:metsHdr", &[("CREATEDATE", created.as_str())])?;

        write_amd_sec(
            &mut out,
            IE_AMD_ID,
            &DnxDocument::intellectual_entity(self.ie_pid),
        )?;
        write_amd_sec(
            &mut out,
            REP_AMD_ID,
            &DnxDocument::representation(self.entity_type, self.code),
        )?;
        self.write_file_sec(&mut out)?;
        self.write_struct_map(&mut out)?;

        out.end("mets:mets")?;
        let mut bytes = out.into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Render and write to `path` via a temp file in the same directory.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let payload = self.render().context("rendering descriptor XML")?;
        write_atomic(path, &payload)
            .with_context(|| format!("writing descriptor '{}'", path.display()))
    }

    fn write_file_sec<W: Write>(&self, out: &mut XmlOut<W>) -> Result<()> {
        out.start("mets:fileSec", &[])?;
        let group_attrs = [("ID", REP_ID), ("USE", USAGE_TYPE), ("ADMID", REP_AMD_ID)];
        if self.manifest.is_empty() {
            out.empty("mets:fileGrp", &group_attrs)?;
            return out.end("mets:fileSec");
        }

        out.start("mets:fileGrp", &group_attrs)?;
        for entry in self.manifest.entries() {
            let size = entry.size.to_string();
            let mut attrs = vec![("ID", entry.id.as_str()), ("SIZE", size.as_str())];
            if let Some(sha256) = &entry.sha256 {
                attrs.push(("CHECKSUM", sha256.as_str()));
                attrs.push(("CHECKSUMTYPE", "SHA-256"));
            }
            out.start("mets:file", &attrs)?;
            out.empty(
                "mets:FLocat",
                &[("LOCTYPE", "URL"), ("xlink:href", entry.path.as_str())],
            )?;
            out.end("mets:file")?;
        }
        out.end("mets:fileGrp")?;
        out.end("mets:fileSec")
    }

    fn write_struct_map<W: Write>(&self, out: &mut XmlOut<W>) -> Result<()> {
        out.start(
            "mets:structMap",
            &[("ID", STRUCT_MAP_ID), ("TYPE", "LOGICAL")],
        )?;
        let tree = structure_tree(self.manifest);
        let root_attrs = [("LABEL", self.structure_label)];
        if tree.is_empty() {
            out.empty("mets:div", &root_attrs)?;
        } else {
            out.start("mets:div", &root_attrs)?;
            for node in &tree {
                write_struct_node(out, node)?;
            }
            out.end("mets:div")?;
        }
        out.end("mets:structMap")
    }
}

fn write_struct_node<W: Write>(out: &mut XmlOut<W>, node: &StructNode) -> Result<()> {
    match node {
        StructNode::Directory { label, children } => {
            out.start(
                "mets:div",
                &[("LABEL", label.as_str()), ("TYPE", "DIRECTORY")],
            )?;
            for child in children {
                write_struct_node(out, child)?;
            }
            out.end("mets:div")
        }
        StructNode::File { label, file_id } => {
            out.start("mets:div", &[("LABEL", label.as_str()), ("TYPE", "FILE")])?;
            out.empty("mets:fptr", &[("FILEID", file_id.as_str())])?;
            out.end("mets:div")
        }
    }
}

fn write_amd_sec<W: Write>(out: &mut XmlOut<W>, id: &str, dnx: &DnxDocument) -> Result<()> {
    let tech_id = format!("{id}-tech");
    out.start("mets:amdSec", &[("ID", id)])?;
    out.start("mets:techMD", &[("ID", tech_id.as_str())])?;
    out.start(
        "mets:mdWrap",
        &[("MDTYPE", "OTHER"), ("OTHERMDTYPE", "dnx")],
    )?;
    out.start("mets:xmlData", &[])?;
    dnx.write(out)?;
    out.end("mets:xmlData")?;
    out.end("mets:mdWrap")?;
    out.end("mets:techMD")?;
    out.end("mets:amdSec")
}

/// `xs:dateTime` in UTC with second precision.
fn format_utc(at: OffsetDateTime) -> String {
    let at = at.to_offset(UtcOffset::UTC);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        at.year(),
        at.month() as u8,
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    )
}

fn write_atomic(path: &Path, payload: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("path without parent '{}'", path.display()))?;
    if !parent.is_dir() {
        return Err(anyhow!("directory not found: {}", parent.display()));
    }
    let tmp = path.with_extension(format!("tmp-{}", std::process::id()));
    fs::write(&tmp, payload).with_context(|| format!("writing temp file '{}'", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| {
        format!(
            "renaming temp file '{}' to '{}'",
            tmp.display(),
            path.display()
        )
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::FileEntry;
    use quick_xml::events::Event;
    use quick_xml::Reader;
    use tempfile::TempDir;

    fn entry(id: &str, label: &str, path: &str) -> FileEntry {
        FileEntry {
            id: id.to_string(),
            label: label.to_string(),
            path: path.to_string(),
            size: 3,
            sha256: None,
        }
    }

    fn render(manifest: &Manifest, entity_type: &str, code: &str) -> String {
        let descriptor = Descriptor {
            ie_pid: "IE1001",
            entity_type,
            code,
            structure_label: DEFAULT_STRUCTURE_LABEL,
            created: OffsetDateTime::UNIX_EPOCH,
            manifest,
        };
        String::from_utf8(descriptor.render().unwrap()).unwrap()
    }

    /// Parse the whole document, returning `(element name, attribute)` pairs
    /// for every element carrying `attr`, in document order.
    fn attribute_values(xml: &str, attr: &str) -> Vec<(String, String)> {
        let mut reader = Reader::from_str(xml);
        let mut found = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    if let Some(value) = e.try_get_attribute(attr).unwrap() {
                        found.push((
                            String::from_utf8(e.name().as_ref().to_vec()).unwrap(),
                            String::from_utf8(value.value.to_vec()).unwrap(),
                        ));
                    }
                }
                Ok(_) => {}
                Err(err) => panic!("descriptor is not well-formed: {err}"),
            }
        }
        found
    }

    #[test]
    fn renders_entries_in_manifest_order() {
        let manifest = Manifest::new(vec![
            entry("fid1-1", "a", "a.txt"),
            entry("fid2-1", "p1", "vol1/p1.tif"),
            entry("fid3-1", "z", "z.txt"),
        ])
        .unwrap();

        let xml = render(&manifest, "MASTER", "A1");

        let fptrs: Vec<String> = attribute_values(&xml, "FILEID")
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(fptrs, vec!["fid1-1", "fid2-1", "fid3-1"]);

        let hrefs: Vec<String> = attribute_values(&xml, "xlink:href")
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(hrefs, vec!["a.txt", "vol1/p1.tif", "z.txt"]);

        assert!(xml.contains(r#"<mets:div LABEL="vol1" TYPE="DIRECTORY">"#));
        assert!(xml.contains(r#"<key id="internalIdentifierValue">IE1001</key>"#));
        assert!(xml.contains(r#"<key id="representationEntityType">MASTER</key>"#));
        assert!(xml.contains(r#"<key id="representationCode">A1</key>"#));
        assert!(xml.contains(r#"CREATEDATE="1970-01-01T00:00:00Z""#));
    }

    #[test]
    fn empty_manifest_still_has_structure_map() {
        let xml = render(&Manifest::default(), "", "");

        let labels = attribute_values(&xml, "LABEL");
        assert_eq!(
            labels,
            vec![("mets:div".to_string(), DEFAULT_STRUCTURE_LABEL.to_string())]
        );
        assert!(xml.contains("<mets:structMap"));
        assert!(attribute_values(&xml, "FILEID").is_empty());
    }

    #[test]
    fn empty_classification_fields_are_omitted() {
        let xml = render(&Manifest::default(), "", "");

        assert!(!xml.contains("representationEntityType"));
        assert!(!xml.contains("representationCode"));
        assert!(xml.contains(r#"<key id="preservationType">DERIVATIVE_COPY</key>"#));
    }

    #[test]
    fn labels_and_paths_are_escaped() {
        let manifest = Manifest::new(vec![entry("fid1-1", "R&D <draft>", "R&D <draft>.pdf")]).unwrap();

        let xml = render(&manifest, "", "");

        assert!(xml.contains("R&amp;D &lt;draft&gt;"));
        let hrefs = attribute_values(&xml, "xlink:href");
        assert_eq!(hrefs[0].1, "R&amp;D &lt;draft&gt;.pdf");
    }

    #[test]
    fn checksum_attributes_when_recorded() {
        let mut with_sum = entry("fid1-1", "a", "a.txt");
        with_sum.sha256 = Some("ab".repeat(32));
        let manifest = Manifest::new(vec![with_sum]).unwrap();

        let xml = render(&manifest, "", "");

        assert!(xml.contains(&format!(r#"CHECKSUM="{}""#, "ab".repeat(32))));
        assert!(xml.contains(r#"CHECKSUMTYPE="SHA-256""#));
        assert!(xml.contains(r#"SIZE="3""#));
    }

    #[test]
    fn write_to_replaces_atomically() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ie.xml");
        std::fs::write(&path, "stale").unwrap();
        let manifest = Manifest::default();
        let descriptor = Descriptor {
            ie_pid: "IE1",
            entity_type: "",
            code: "",
            structure_label: DEFAULT_STRUCTURE_LABEL,
            created: OffsetDateTime::UNIX_EPOCH,
            manifest: &manifest,
        };

        descriptor.write_to(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<?xml"));
        let leftovers: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains("tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let manifest = Manifest::default();
        let descriptor = Descriptor {
            ie_pid: "IE1",
            entity_type: "",
            code: "",
            structure_label: DEFAULT_STRUCTURE_LABEL,
            created: OffsetDateTime::UNIX_EPOCH,
            manifest: &manifest,
        };

        assert!(descriptor.write_to(&temp.path().join("missing/ie.xml")).is_err());
    }
}
