//! Content digest over an emitted artifact set.

use sha2::{Digest, Sha256};

use crate::emit::ArtifactSet;

/// Hex SHA-256 of every artifact name and content, in set order.
pub fn digest(set: &ArtifactSet) -> String {
    let mut hasher = Sha256::new();
    for artifact in set.iter() {
        hasher.update(artifact.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(artifact.content.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}
