//! Per-repository collection addressing.
//!
//! Each repository gets its own vector collection, named by hashing the
//! repository identifier and keeping a short prefix of the digest. The
//! mapping is stable across restarts and one-way; truncation makes
//! collisions between distinct repositories possible in principle, which
//! callers accept as a soft invariant. The literal repository identifier is
//! stored in the collection's creation metadata so administrative listings
//! never need to invert the hash.

use sha2::{Digest, Sha256};

/// Namespace prefix for collection ids.
const COLLECTION_PREFIX: &str = "repo_";

/// How many hex digits of the digest the collection id keeps.
const DIGEST_PREFIX_LEN: usize = 8;

/// Derive the collection id for a repository identifier.
pub fn collection_id(repository: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(repository.as_bytes()));
    format!("{COLLECTION_PREFIX}{}", &digest[..DIGEST_PREFIX_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collection_id_is_deterministic() {
        assert_eq!(
            collection_id("owner/repo"),
            collection_id("owner/repo")
        );
    }

    #[test]
    fn test_collection_id_shape() {
        let id = collection_id("owner/repo");
        assert!(id.starts_with("repo_"));
        assert_eq!(id.len(), "repo_".len() + 8);
        assert!(id["repo_".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_distinct_repositories_get_distinct_ids() {
        assert_ne!(collection_id("owner/alpha"), collection_id("owner/beta"));
    }
}
