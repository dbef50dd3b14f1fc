//! A local-file [`Reader`](crate::reader::Reader) using positioned reads.
//!
//! Positioned reads (`pread`) let multiple threads read the same file handle concurrently without
//! contending on a shared seek cursor, which is what the parallel read strategy (§4.8) needs.

use std::fs::File;
use std::io;
#[cfg(unix)]
use std::os::unix::fs::FileExt;

use crate::error::TiffError;
use crate::reader::{ByteView, Reader};

/// Reads from a local file via positioned reads.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    size: u64,
}

impl FileSource {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, TiffError> {
        let file = File::open(path.as_ref()).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                TiffError::FileNotFound(path.as_ref().display().to_string())
            } else {
                TiffError::IOError(e.to_string())
            }
        })?;
        let size = file.metadata().map_err(|e| TiffError::IOError(e.to_string()))?.len();
        Ok(FileSource { file, size })
    }

    #[cfg(unix)]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.file.read_exact_at(buf, offset)
    }

    #[cfg(not(unix))]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        use std::io::{Read, Seek, SeekFrom};
        // Non-unix fallback: no shared positioned-read syscall, so serialise via a clone of the
        // handle. This path is not exercised by the test suite (CI runs on Linux).
        let mut file = self.file.try_clone()?;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)
    }
}

impl Reader for FileSource {
    fn read(&self, offset: u64, size: usize) -> Result<ByteView<'_>, TiffError> {
        if offset.saturating_add(size as u64) > self.size {
            return Err(TiffError::UnexpectedEndOfFile {
                offset,
                expected: size as u64,
                size: self.size,
            });
        }
        let mut buf = vec![0u8; size];
        match self.read_at(offset, &mut buf) {
            Ok(()) => Ok(ByteView::owned(buf)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(TiffError::UnexpectedEndOfFile {
                offset,
                expected: size as u64,
                size: self.size,
            }),
            Err(e) => Err(TiffError::IOError(e.to_string())),
        }
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn is_valid(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct TempPath(std::path::PathBuf);

    impl Drop for TempPath {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn write_temp_file(contents: &[u8]) -> TempPath {
        let path = std::env::temp_dir().join(format!(
            "tiletiff-test-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::File::create(&path).unwrap().write_all(contents).unwrap();
        TempPath(path)
    }

    #[test]
    fn reads_bytes_at_offset() {
        let tmp = write_temp_file(b"hello tiletiff world");
        let src = FileSource::open(&tmp.0).unwrap();
        let view = src.read(6, 9).unwrap();
        assert_eq!(view.data(), b"tiletiff ");
    }

    #[test]
    fn missing_file_reports_not_found() {
        let err = FileSource::open("/no/such/path/tiletiff-test").unwrap_err();
        assert!(matches!(err, TiffError::FileNotFound(_)));
    }
}
