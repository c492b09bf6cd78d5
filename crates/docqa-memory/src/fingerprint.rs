//! Content fingerprints used as cache and snapshot tags.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::MemoryError;

const READ_BUF: usize = 8192;
const HASH_PREFIX_LEN: usize = 16;

/// First 16 hex characters of the SHA-256 digest of the file's bytes.
///
/// # Errors
///
/// Returns [`MemoryError::Io`] if the file cannot be opened or read.
pub fn file_hash(path: &Path) -> Result<String, MemoryError> {
    let mut file = File::open(path).map_err(|e| MemoryError::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; READ_BUF];
    loop {
        let n = file.read(&mut buf).map_err(|e| MemoryError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(HASH_PREFIX_LEN);
    Ok(hex)
}

/// Per-file hashes joined with `-`, in the order given.
///
/// The same files in a different order produce a different tag.
///
/// # Errors
///
/// Returns the first [`MemoryError::Io`] encountered.
pub fn fingerprint<P: AsRef<Path>>(paths: &[P]) -> Result<String, MemoryError> {
    let hashes = paths
        .iter()
        .map(|p| file_hash(p.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(hashes.join("-"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn hash_is_sixteen_hex_chars() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.pdf", b"hello");
        let hash = file_hash(&path).unwrap();
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        // sha256("hello") = 2cf24dba5fb0a30e...
        assert_eq!(hash, "2cf24dba5fb0a30e");
    }

    #[test]
    fn empty_file_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "empty.pdf", b"");
        assert_eq!(file_hash(&path).unwrap(), "e3b0c44298fc1c14");
    }

    #[test]
    fn identical_bytes_different_names() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "report.pdf", b"same content");
        let b = write_file(dir.path(), "copy-of-report.pdf", b"same content");
        assert_eq!(file_hash(&a).unwrap(), file_hash(&b).unwrap());
    }

    #[test]
    fn large_file_spans_many_reads() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = vec![7u8; READ_BUF * 3 + 17];
        let path = write_file(dir.path(), "big.bin", &bytes);
        let expected = format!("{:x}", Sha256::digest(&bytes));
        assert_eq!(file_hash(&path).unwrap(), &expected[..16]);
    }

    #[test]
    fn fingerprint_joins_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.pdf", b"first");
        let b = write_file(dir.path(), "b.pdf", b"second");

        let ab = fingerprint(&[&a, &b]).unwrap();
        let ba = fingerprint(&[&b, &a]).unwrap();
        let ha = file_hash(&a).unwrap();
        let hb = file_hash(&b).unwrap();

        assert_eq!(ab, format!("{ha}-{hb}"));
        assert_eq!(ba, format!("{hb}-{ha}"));
        assert_ne!(ab, ba);
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.pdf", b"stable");
        assert_eq!(fingerprint(&[&a]).unwrap(), fingerprint(&[&a]).unwrap());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = fingerprint(&[Path::new("/nonexistent/file.pdf")]).unwrap_err();
        assert!(matches!(err, MemoryError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/file.pdf"));
    }
}
