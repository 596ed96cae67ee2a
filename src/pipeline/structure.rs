//! Structure builder (spec.md §4.2): the Folder/File tree and CONTAINS
//! edges. The only phase allowed to introduce Folder nodes.

use crate::graph::{Edge, EdgeKind, FilePayload, FolderPayload, KnowledgeGraph, Node, NodeId, NodeKind, NodePayload};
use crate::pipeline::walker::WalkedFile;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::Path;

/// Normalize a path relative to `root`: forward slashes, no leading `./`.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let s = rel.to_string_lossy().replace('\\', "/");
    s.trim_start_matches("./").to_string()
}

/// Build the Folder/File hierarchy for the walked files and wire CONTAINS
/// edges from each folder to its direct children. Folder nodes are
/// synthesized for every ancestor directory a file needs, even ones with no
/// direct file child (only subfolders).
pub fn build_structure(graph: &mut KnowledgeGraph, root: &Path, files: &[WalkedFile]) {
    let mut folders: BTreeSet<String> = BTreeSet::new();

    for file in files {
        let rel = relative_path(root, &file.path);
        let mut ancestor = String::new();
        for segment in parent_segments(&rel) {
            ancestor = if ancestor.is_empty() { segment.to_string() } else { format!("{ancestor}/{segment}") };
            folders.insert(ancestor.clone());
        }
    }

    for folder_path in &folders {
        graph.upsert_node(Node {
            id: NodeId::folder(folder_path),
            kind: NodeKind::Folder,
            payload: NodePayload::Folder(FolderPayload { path: folder_path.clone() }),
        });
    }

    for file in files {
        let rel = relative_path(root, &file.path);
        let body = std::fs::read(&file.path).unwrap_or_default();
        let hash = format!("{:x}", Sha256::digest(&body));

        graph.upsert_node(Node {
            id: NodeId::file(&rel),
            kind: NodeKind::File,
            payload: NodePayload::File(FilePayload {
                path: rel.clone(),
                language: file.language,
                byte_size: body.len() as u64,
                hash,
                parse_failed: false,
            }),
        });

        if let Some(parent) = parent_of(&rel) {
            graph.add_edge(Edge::plain(NodeId::folder(&parent), NodeId::file(&rel), EdgeKind::Contains));
        }
    }

    for folder_path in &folders {
        if let Some(parent) = parent_of(folder_path) {
            graph.add_edge(Edge::plain(NodeId::folder(&parent), NodeId::folder(folder_path), EdgeKind::Contains));
        }
    }
}

fn parent_segments(rel_path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = rel_path.split('/').collect();
    segments.pop();
    segments
}

fn parent_of(rel_path: &str) -> Option<String> {
    let mut segments: Vec<&str> = rel_path.split('/').collect();
    segments.pop()?;
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Language;
    use tempfile::TempDir;

    #[test]
    fn builds_folder_file_tree_with_contains_edges() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src/models")).unwrap();
        std::fs::write(dir.path().join("src/models/user.py"), "x = 1").unwrap();

        let files = vec![WalkedFile {
            path: dir.path().join("src/models/user.py"),
            language: Some(Language::Python),
        }];

        let mut graph = KnowledgeGraph::new();
        build_structure(&mut graph, dir.path(), &files);

        assert!(graph.node(&NodeId::folder("src")).is_some());
        assert!(graph.node(&NodeId::folder("src/models")).is_some());
        assert!(graph.node(&NodeId::file("src/models/user.py")).is_some());

        assert!(graph.has_edge(&NodeId::folder("src"), &NodeId::folder("src/models"), EdgeKind::Contains));
        assert!(graph.has_edge(&NodeId::folder("src/models"), &NodeId::file("src/models/user.py"), EdgeKind::Contains));
    }

    #[test]
    fn relative_path_strips_root_and_normalizes() {
        let root = Path::new("/repo");
        let rel = relative_path(root, Path::new("/repo/./src/a.py"));
        assert_eq!(rel, "src/a.py");
    }
}
