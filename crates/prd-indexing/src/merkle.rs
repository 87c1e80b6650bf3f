//! Pure Merkle-tree construction and diffing over a repository tree listing
//! (§4.2 "Merkle tree", "Incremental update").

use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};

use crate::github::TreeEntry;

/// One leaf's identity: `(path, sha, size)` hashed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleLeaf {
    pub path: String,
    pub hash: String,
}

/// A built Merkle tree: the ordered leaves plus every level above them,
/// bottom-up, ending in a single root hash.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    pub leaves: Vec<MerkleLeaf>,
    pub root_hash: String,
}

fn sha256_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    format!("{:x}", hasher.finalize())
}

/// `leafHash = H(path ‖ sha ‖ size)` (§4.2).
#[must_use]
pub fn leaf_hash(path: &str, sha: &str, size: u64) -> String {
    sha256_hex(format!("{path}\u{1f}{sha}\u{1f}{size}").as_bytes())
}

/// `H(left ‖ right)`, the interior-node hash (§4.2).
#[must_use]
pub fn interior_hash(left: &str, right: &str) -> String {
    sha256_hex(format!("{left}{right}").as_bytes())
}

/// Build the tree bottom-up over `entries` in their listing order (only
/// `blob` entries participate), duplicating an odd trailing node at each
/// level for promotion (§4.2).
#[must_use]
pub fn build_tree(entries: &[TreeEntry]) -> MerkleTree {
    let leaves: Vec<MerkleLeaf> = entries
        .iter()
        .filter(|e| e.is_blob())
        .map(|e| MerkleLeaf {
            path: e.path.clone(),
            hash: leaf_hash(&e.path, &e.sha, e.size.unwrap_or(0)),
        })
        .collect();

    let root_hash = root_from_hashes(leaves.iter().map(|l| l.hash.clone()).collect());
    MerkleTree { leaves, root_hash }
}

fn root_from_hashes(mut level: Vec<String>) -> String {
    if level.is_empty() {
        return sha256_hex(b"");
    }
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            let last = level.last().expect("level is non-empty").clone();
            level.push(last);
        }
        level = level
            .chunks(2)
            .map(|pair| interior_hash(&pair[0], &pair[1]))
            .collect();
    }
    level.into_iter().next().unwrap_or_else(|| sha256_hex(b""))
}

/// Recompute the root hash for a set of already-hashed leaves, used when
/// folding in just the changed subset during an incremental update.
#[must_use]
pub fn root_from_leaves(leaves: &[MerkleLeaf]) -> String {
    root_from_hashes(leaves.iter().map(|l| l.hash.clone()).collect())
}

/// The changed set: paths whose leaf hash differs between `previous` and
/// `current`, plus paths present in only one side (symmetric difference of
/// leaves, §4.2 "Incremental update").
#[must_use]
pub fn diff_leaves(previous: &[MerkleLeaf], current: &[MerkleLeaf]) -> Vec<String> {
    let prev_by_path: BTreeMap<&str, &str> =
        previous.iter().map(|l| (l.path.as_str(), l.hash.as_str())).collect();
    let curr_by_path: BTreeMap<&str, &str> =
        current.iter().map(|l| (l.path.as_str(), l.hash.as_str())).collect();

    let mut changed = HashSet::new();
    for (path, hash) in &curr_by_path {
        match prev_by_path.get(path) {
            Some(prev_hash) if prev_hash == hash => {}
            _ => {
                changed.insert((*path).to_string());
            }
        }
    }
    for path in prev_by_path.keys() {
        if !curr_by_path.contains_key(path) {
            changed.insert((*path).to_string());
        }
    }

    let mut changed: Vec<String> = changed.into_iter().collect();
    changed.sort();
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, sha: &str, size: u64) -> TreeEntry {
        TreeEntry {
            path: path.to_string(),
            mode: "100644".to_string(),
            entry_type: "blob".to_string(),
            sha: sha.to_string(),
            size: Some(size),
        }
    }

    #[test]
    fn build_is_deterministic_for_same_listing_order() {
        let entries = vec![entry("a.rs", "sha-a", 10), entry("b.rs", "sha-b", 20), entry("c.rs", "sha-c", 30)];
        let first = build_tree(&entries);
        let second = build_tree(&entries);
        assert_eq!(first.root_hash, second.root_hash);
    }

    #[test]
    fn tree_entries_are_excluded_from_leaves() {
        let mut entries = vec![entry("a.rs", "sha-a", 10)];
        entries.push(TreeEntry {
            path: "src".to_string(),
            mode: "040000".to_string(),
            entry_type: "tree".to_string(),
            sha: "sha-tree".to_string(),
            size: None,
        });
        let tree = build_tree(&entries);
        assert_eq!(tree.leaves.len(), 1);
    }

    #[test]
    fn odd_leaf_count_promotes_by_duplication() {
        let two = build_tree(&[entry("a.rs", "sha-a", 10), entry("b.rs", "sha-b", 20)]);
        let three = build_tree(&[entry("a.rs", "sha-a", 10), entry("b.rs", "sha-b", 20), entry("c.rs", "sha-c", 30)]);
        assert_ne!(two.root_hash, three.root_hash);
    }

    #[test]
    fn diff_detects_changed_added_and_removed_paths() {
        let previous = vec![
            MerkleLeaf { path: "a.rs".into(), hash: "h1".into() },
            MerkleLeaf { path: "b.rs".into(), hash: "h2".into() },
        ];
        let current = vec![
            MerkleLeaf { path: "a.rs".into(), hash: "h1-changed".into() },
            MerkleLeaf { path: "c.rs".into(), hash: "h3".into() },
        ];
        let changed = diff_leaves(&previous, &current);
        assert_eq!(changed, vec!["a.rs".to_string(), "b.rs".to_string(), "c.rs".to_string()]);
    }

    #[test]
    fn diff_is_empty_when_unchanged() {
        let leaves = vec![MerkleLeaf { path: "a.rs".into(), hash: "h1".into() }];
        assert!(diff_leaves(&leaves, &leaves).is_empty());
    }
}
