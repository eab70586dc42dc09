//! Stream source abstraction.
//!
//! The consumer pulls bytes through the [`StreamSource`] trait. How a
//! connection is negotiated and authenticated is out of scope — callers
//! hand the consumer an already-open source. [`ReaderSource`] adapts any
//! [`std::io::Read`] (a file, a socket, an HTTP response body) to the trait.

use std::io::{self, Read};

/// A handle to an open, chunked byte stream.
///
/// `read_chunk` is a blocking pull of up to `max` bytes. An empty return
/// value means the stream has ended; an error terminates the session early
/// (or, on the very first read, marks the session as never having started).
pub trait StreamSource {
    /// Read the next chunk, up to `max` bytes. Empty means end of stream.
    fn read_chunk(&mut self, max: usize) -> io::Result<Vec<u8>>;

    /// Release the underlying handle.
    ///
    /// Called exactly once by the consumer on every exit path. The default
    /// implementation does nothing, which suits sources whose `Drop` already
    /// closes the handle.
    fn close(&mut self) {}
}

/// Adapter exposing any [`Read`] as a [`StreamSource`].
///
/// # Example
///
/// ```no_run
/// use std::fs::File;
///
/// use framesalvage::ReaderSource;
///
/// let source = ReaderSource::new(File::open("capture.bin").unwrap());
/// ```
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: R,
}

impl<R: Read> ReaderSource<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Consume the adapter, returning the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> StreamSource for ReaderSource<R> {
    fn read_chunk(&mut self, max: usize) -> io::Result<Vec<u8>> {
        let mut chunk = vec![0u8; max];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(read) => {
                    chunk.truncate(read);
                    return Ok(chunk);
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(error),
            }
        }
    }
}

impl<S: StreamSource + ?Sized> StreamSource for &mut S {
    fn read_chunk(&mut self, max: usize) -> io::Result<Vec<u8>> {
        (**self).read_chunk(max)
    }

    fn close(&mut self) {
        (**self).close();
    }
}
