//! DNX-style administrative metadata: named sections of key/value records.

use anyhow::Result;
use std::io::Write;

use super::xml::XmlOut;

pub const DNX_NS: &str = "http://www.exlibrisgroup.com/dps/dnx";

pub const PRESERVATION_TYPE: &str = "DERIVATIVE_COPY";
pub const USAGE_TYPE: &str = "VIEW";
pub const INTERNAL_IDENTIFIER_TYPE: &str = "PID";

/// An ordered list of `key id="..."` values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnxRecord {
    keys: Vec<(String, String)>,
}

impl DnxRecord {
    pub fn key(mut self, id: &str, value: &str) -> Self {
        self.keys.push((id.to_string(), value.to_string()));
        self
    }

    /// Add the key only when `value` has non-whitespace content.
    pub fn key_if_present(self, id: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self
        } else {
            self.key(id, value)
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.keys
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnxSection {
    pub id: String,
    pub records: Vec<DnxRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnxDocument {
    pub sections: Vec<DnxSection>,
}

impl DnxDocument {
    /// IE-level metadata: the internal identifier of the entity.
    pub fn intellectual_entity(pid: &str) -> Self {
        Self {
            sections: vec![DnxSection {
                id: "internalIdentifier".to_string(),
                records: vec![DnxRecord::default()
                    .key("internalIdentifierType", INTERNAL_IDENTIFIER_TYPE)
                    .key("internalIdentifierValue", pid)],
            }],
        }
    }

    /// Representation-level metadata. Empty classification fields are left out.
    pub fn representation(entity_type: &str, code: &str) -> Self {
        Self {
            sections: vec![DnxSection {
                id: "generalRepCharacteristics".to_string(),
                records: vec![DnxRecord::default()
                    .key("preservationType", PRESERVATION_TYPE)
                    .key("usageType", USAGE_TYPE)
                    .key_if_present("representationEntityType", entity_type)
                    .key_if_present("representationCode", code)],
            }],
        }
    }

    pub(crate) fn write<W: Write>(&self, out: &mut XmlOut<W>) -> Result<()> {
        out.start("dnx", &[("xmlns", DNX_NS)])?;
        for section in &self.sections {
            out.start("section", &[("id", section.id.as_str())])?;
            for record in &section.records {
                out.start("record", &[])?;
                for (id, value) in &record.keys {
                    out.text_element("key", &[("id", id.as_str())], value)?;
                }
                out.end("record")?;
            }
            out.end("section")?;
        }
        out.end("dnx")
    }
}
