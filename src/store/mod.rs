//! Resource store contract
//!
//! The store is the host's view of individually addressable resources. The engine only
//! asks it two things: metadata for an identifier, and a byte stream for a resolved entry.

pub mod fs;

use std::io::{self, Cursor, Read};
use std::time::SystemTime;

use crate::resource::ResourceIdentifier;

pub use fs::FsResourceStore;

/// A readable resource body with explicit close semantics
///
/// Dropping a stream releases it as usual; `close` exists so that callers can observe
/// failures that happen while releasing.
pub trait ByteStream: Read + Send {
    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

impl ByteStream for std::fs::File {}

impl<R: Read + Send> ByteStream for io::BufReader<R> {}

impl<T: AsRef<[u8]> + Send> ByteStream for Cursor<T> {}

/// Metadata of a resource found in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResource {
    pub identifier: ResourceIdentifier,
    pub content_length: u64,
    pub last_modified: SystemTime,
    pub mime_type: String,
}

/// Host-provided lookup of individual resources
pub trait ResourceStore: Send + Sync {
    /// Look up a resource, returning `None` when it does not exist
    fn resolve(&self, id: &ResourceIdentifier) -> Option<StoredResource>;

    /// Open the body of a previously resolved resource
    fn open(&self, resource: &StoredResource) -> io::Result<Box<dyn ByteStream>>;
}

/// Run `read` over a stream, then close it whether or not reading succeeded
///
/// A read failure takes precedence over a close failure, which is then only logged.
pub fn read_and_close<T>(
    mut stream: Box<dyn ByteStream>,
    read: impl FnOnce(&mut dyn ByteStream) -> io::Result<T>,
) -> io::Result<T> {
    let result = read(stream.as_mut());
    let closed = stream.close();
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) | (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close)) => {
            tracing::warn!(error = %close, "failed to close stream after a read error");
            Err(e)
        }
    }
}

/// Guess a MIME type from a resource name's extension
pub fn mime_type_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for("a.css"), "text/css");
        assert!(mime_type_for("sub/app.min.JS").ends_with("/javascript"));
        assert_eq!(mime_type_for("clip.mp4"), "video/mp4");
        assert_eq!(mime_type_for("app.wasm"), "application/wasm");
        assert_eq!(mime_type_for("dir.v2/README"), "application/octet-stream");
    }

    #[test]
    fn test_cursor_stream_closes_cleanly() {
        let stream: Box<dyn ByteStream> = Box::new(Cursor::new(b"abc".to_vec()));
        assert!(stream.close().is_ok());
    }

    /// Stream failing on read and/or close, recording whether it was closed
    struct Faulty {
        fail_read: bool,
        fail_close: bool,
        closed: Arc<AtomicBool>,
    }

    impl Read for Faulty {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            if self.fail_read {
                Err(io::Error::other("read failed"))
            } else {
                Ok(0)
            }
        }
    }

    impl ByteStream for Faulty {
        fn close(self: Box<Self>) -> io::Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            if self.fail_close {
                Err(io::Error::other("close failed"))
            } else {
                Ok(())
            }
        }
    }

    fn faulty(fail_read: bool, fail_close: bool) -> (Box<dyn ByteStream>, Arc<AtomicBool>) {
        let closed = Arc::new(AtomicBool::new(false));
        let stream = Faulty {
            fail_read,
            fail_close,
            closed: Arc::clone(&closed),
        };
        (Box::new(stream), closed)
    }

    fn drain(stream: &mut dyn ByteStream) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    #[test]
    fn test_read_and_close_closes_after_read_error() {
        let (stream, closed) = faulty(true, true);
        let err = read_and_close(stream, drain).unwrap_err();
        assert_eq!(err.to_string(), "read failed");
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_read_and_close_reports_close_error() {
        let (stream, closed) = faulty(false, true);
        let err = read_and_close(stream, drain).unwrap_err();
        assert_eq!(err.to_string(), "close failed");
        assert!(closed.load(Ordering::SeqCst));

        let (stream, _) = faulty(false, false);
        assert!(read_and_close(stream, drain).unwrap().is_empty());
    }
}
