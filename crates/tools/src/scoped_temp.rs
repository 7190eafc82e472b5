//! A scoped temp-file guard for ephemeral material a tool call or duplex
//! audio stage materializes to disk (media blobs, short-lived keys) —
//! created owner-only on Unix and removed on every exit path, including
//! panic, via `Drop`.

use std::path::{Path, PathBuf};

use conductor_domain::error::{Error, Result};

/// Owns a single file under a given directory and deletes it when dropped.
///
/// The file is created with mode `0o600` on Unix from the start, the same
/// avoid-a-TOCTOU-window approach used for the on-disk OAuth token store,
/// since the contents this guards (media payloads, short-lived keys) are
/// just as sensitive while they sit on disk.
pub struct ScopedTempFile {
    path: PathBuf,
}

impl ScopedTempFile {
    /// Create `dir/name`, writing `contents` to it immediately.
    pub fn create(dir: &Path, name: &str, contents: &[u8]) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(name);

        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&path)?;
            file.write_all(contents)?;
        }

        #[cfg(not(unix))]
        {
            std::fs::write(&path, contents)?;
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file back; mostly useful in tests and short-lived re-reads
    /// before the guard goes out of scope.
    pub fn read(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(Error::from)
    }
}

impl Drop for ScopedTempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_exists_while_in_scope_and_is_gone_after_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let guard = ScopedTempFile::create(dir.path(), "payload.bin", b"hello").unwrap();
            let p = guard.path().to_path_buf();
            assert!(p.exists());
            assert_eq!(guard.read().unwrap(), b"hello");
            p
        };
        assert!(!path.exists());
    }

    #[test]
    fn file_is_removed_even_when_the_guard_is_dropped_during_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        let result = std::panic::catch_unwind(|| {
            let _guard = ScopedTempFile::create(dir.path(), "payload.bin", b"data").unwrap();
            panic!("boom");
        });
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn file_is_created_owner_only_on_unix() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let guard = ScopedTempFile::create(dir.path(), "payload.bin", b"secret").unwrap();
        let mode = std::fs::metadata(guard.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
