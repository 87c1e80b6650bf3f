//! Deterministic chunk ID generation (§3 `CodeChunk.id`).

use sha2::{Digest, Sha256};
use uuid::{Uuid, uuid};

/// Namespace UUID for this crate's content-addressed identifiers.
const PRD_STORE_NAMESPACE: Uuid = uuid!("a8f5c3e2-7b9d-4f2a-9e1c-3d5a7b9f1e3c");

/// Generate a deterministic chunk ID, stable for a given
/// `(project, file path, byte range)`. Byte ranges are used instead of a
/// chunk index so IDs stay stable across re-chunking of unrelated parts of
/// the same file.
#[must_use]
pub fn generate_chunk_id(
    project_id: Uuid,
    file_path: &str,
    byte_start: usize,
    byte_end: usize,
) -> Uuid {
    let data = format!("{project_id}:{file_path}:{byte_start}:{byte_end}");
    Uuid::new_v5(&PRD_STORE_NAMESPACE, data.as_bytes())
}

/// SHA-256 content hash, used for file/chunk dedup and Merkle leaves (§4.2).
#[must_use]
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_is_deterministic() {
        let project = Uuid::new_v4();
        let id1 = generate_chunk_id(project, "src/main.rs", 0, 100);
        let id2 = generate_chunk_id(project, "src/main.rs", 0, 100);
        assert_eq!(id1, id2);
        assert_eq!(id1.get_version(), Some(uuid::Version::Sha1));
    }

    #[test]
    fn chunk_id_varies_with_range_and_project() {
        let project = Uuid::new_v4();
        let id1 = generate_chunk_id(project, "src/main.rs", 0, 100);
        let id2 = generate_chunk_id(project, "src/main.rs", 100, 200);
        let id3 = generate_chunk_id(Uuid::new_v4(), "src/main.rs", 0, 100);
        assert_ne!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn content_hash_is_stable_and_distinguishes_content() {
        let content = "fn main() {\n    println!(\"hi\");\n}";
        assert_eq!(hash_content(content), hash_content(content));
        assert_ne!(hash_content(content), hash_content("fn main() {}"));
    }
}
