use sha2::{Digest, Sha256};

/// Durable store key of a chunk: lowercase hex SHA-256 of `source|start_line|content`.
///
/// Identical input yields the identical id in every process, so re-indexing an
/// unchanged file upserts instead of duplicating.
pub fn chunk_id(source: &str, start_line: usize, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b"|");
    hasher.update(start_line.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
