//! Content hashing
//!
//! SHA-256 digests for whole files and in-memory page bitmaps. Both forms
//! produce the same lowercase hex encoding, so a file hashed from disk and
//! the same bytes hashed from memory compare equal.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read size used when streaming a file through the hasher
const CHUNK_SIZE: usize = 4096;

/// Hash a file's exact bytes, reading it in bounded chunks
pub fn hash_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut file = File::open(path.as_ref())?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hash an in-memory buffer
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_hash_bytes_known_value() {
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_bytes(b"page one"), hash_bytes(b"page one"));
        assert_ne!(hash_bytes(b"page one"), hash_bytes(b"page two"));
    }

    #[test]
    fn test_file_and_buffer_digests_agree() {
        // larger than one chunk so the streaming loop runs more than once
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();

        assert_eq!(hash_file(file.path()).unwrap(), hash_bytes(&data));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = hash_file("/nonexistent/scrawl2org/file.pdf").unwrap_err();
        assert!(matches!(err, crate::error::ScrawlError::Io(_)));
    }
}
