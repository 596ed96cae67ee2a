//! Change-coupling analyzer (spec.md §4.11): mines the git log for files
//! that change together often enough to emit COUPLED_WITH. A no-op, not a
//! pipeline failure, when the repo has no git history.

use crate::config::CouplingConfig;
use crate::graph::{Edge, EdgeKind, EdgeProps, KnowledgeGraph, NodeId};
use git2::Repository;
use std::collections::HashMap;
use tracing::warn;

pub fn detect_coupling(graph: &mut KnowledgeGraph, root: &std::path::Path, config: &CouplingConfig) {
    let repo = match Repository::discover(root) {
        Ok(repo) => repo,
        Err(err) => {
            warn!(error = %err, "no git history found; skipping change-coupling analysis");
            return;
        }
    };

    let commits = match commit_file_sets(&repo, config.window_days) {
        Ok(commits) => commits,
        Err(err) => {
            warn!(error = %err, "failed to read git log; skipping change-coupling analysis");
            return;
        }
    };

    let mut changes: HashMap<String, u32> = HashMap::new();
    let mut co_changes: HashMap<(String, String), u32> = HashMap::new();

    for files in &commits {
        for file in files {
            *changes.entry(file.clone()).or_insert(0) += 1;
        }
        let mut sorted: Vec<&String> = files.iter().collect();
        sorted.sort();
        for i in 0..sorted.len() {
            for j in (i + 1)..sorted.len() {
                *co_changes.entry((sorted[i].clone(), sorted[j].clone())).or_insert(0) += 1;
            }
        }
    }

    let mut new_edges = Vec::new();
    for ((a, b), count) in co_changes {
        if count < config.min_co_changes {
            continue;
        }
        let max_changes = changes.get(&a).copied().unwrap_or(1).max(changes.get(&b).copied().unwrap_or(1));
        let strength = count as f32 / max_changes as f32;
        if strength < config.min_strength {
            continue;
        }
        if !graph.contains_node(&NodeId::file(&a)) || !graph.contains_node(&NodeId::file(&b)) {
            continue;
        }
        new_edges.push(Edge::new(
            NodeId::file(&a),
            NodeId::file(&b),
            EdgeKind::CoupledWith,
            EdgeProps::CoupledWith { strength, co_changes: count },
        ));
    }

    for edge in new_edges {
        graph.add_edge(edge);
    }
}

fn commit_file_sets(repo: &Repository, window_days: i64) -> Result<Vec<Vec<String>>, git2::Error> {
    let mut revwalk = repo.revwalk()?;
    revwalk.push_head()?;
    revwalk.set_sorting(git2::Sort::TIME)?;

    let cutoff = repo.head().ok().and_then(|h| h.peel_to_commit().ok()).map(|c| c.time().seconds()).unwrap_or(0) - window_days * 86_400;

    let mut commits = Vec::new();
    for oid in revwalk {
        let oid = oid?;
        let commit = repo.find_commit(oid)?;
        if commit.time().seconds() < cutoff {
            break;
        }
        if commit.parent_count() != 1 {
            continue;
        }
        let parent = commit.parent(0)?;
        let diff = repo.diff_tree_to_tree(Some(&parent.tree()?), Some(&commit.tree()?), None)?;
        let mut files = Vec::new();
        diff.foreach(
            &mut |delta, _| {
                if let Some(path) = delta.new_file().path().and_then(|p| p.to_str()) {
                    files.push(path.replace('\\', "/"));
                }
                true
            },
            None,
            None,
            None,
        )?;
        commits.push(files);
    }
    Ok(commits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_repo_is_a_no_op_not_a_failure() {
        let mut graph = KnowledgeGraph::new();
        let config = CouplingConfig::default();
        let tmp = std::env::temp_dir().join(format!("axon-coupling-test-{}", std::process::id()));
        std::fs::create_dir_all(&tmp).unwrap();
        detect_coupling(&mut graph, &tmp, &config);
        assert_eq!(graph.edges().len(), 0);
        let _ = std::fs::remove_dir_all(&tmp);
    }
}
