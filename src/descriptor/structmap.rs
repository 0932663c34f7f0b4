//! Hierarchical logical structure derived from the flat manifest.

use crate::manifest::{FileEntry, Manifest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructNode {
    Directory {
        label: String,
        children: Vec<StructNode>,
    },
    File {
        label: String,
        file_id: String,
    },
}

/// Fold the manifest into a directory tree, keeping manifest order.
///
/// Manifest order keeps each directory's files contiguous, so a file only
/// ever joins the most recently opened directory at each level.
pub fn structure_tree(manifest: &Manifest) -> Vec<StructNode> {
    manifest
        .entries()
        .iter()
        .fold(Vec::new(), |mut nodes, entry| {
            insert(&mut nodes, &entry.parent_dirs(), entry);
            nodes
        })
}

fn insert(nodes: &mut Vec<StructNode>, dirs: &[&str], entry: &FileEntry) {
    let Some((dir, rest)) = dirs.split_first() else {
        nodes.push(StructNode::File {
            label: entry.label.clone(),
            file_id: entry.id.clone(),
        });
        return;
    };

    let reuse = matches!(
        nodes.last(),
        Some(StructNode::Directory { label, .. }) if label == dir
    );
    if !reuse {
        nodes.push(StructNode::Directory {
            label: dir.to_string(),
            children: Vec::new(),
        });
    }
    if let Some(StructNode::Directory { children, .. }) = nodes.last_mut() {
        insert(children, rest, entry);
    }
}
