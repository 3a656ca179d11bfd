//! Concatenation of bundle members into one byte stream
//!
//! Members are read in declaration order and each one is followed by a CRLF, so that two
//! members never run into each other even when a file lacks a trailing newline.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::Arc;

use crate::store::{ByteStream, ResourceStore, StoredResource};

/// Bytes emitted after every member
pub const SEPARATOR: &[u8; 2] = b"\r\n";

/// Reads bundle members one after another, opening each only when it is needed
pub struct ConcatenatedStream {
    store: Arc<dyn ResourceStore>,
    pending: VecDeque<StoredResource>,
    current: Option<Box<dyn ByteStream>>,
    finished: Vec<Box<dyn ByteStream>>,
    /// Position within [`SEPARATOR`] while the separator is being emitted
    separator: Option<usize>,
}

impl ConcatenatedStream {
    /// Start concatenating, opening the first member right away
    pub fn new(store: Arc<dyn ResourceStore>, resources: Vec<StoredResource>) -> io::Result<Self> {
        let mut pending: VecDeque<StoredResource> = resources.into();
        let current = match pending.pop_front() {
            Some(first) => Some(store.open(&first)?),
            None => None,
        };

        Ok(Self {
            store,
            pending,
            current,
            finished: Vec::new(),
            separator: None,
        })
    }

    /// Close every stream that was opened
    ///
    /// All streams get closed even when one of them fails. The first failure is returned
    /// once everything has been attempted; later failures are dropped.
    pub fn close(mut self) -> io::Result<()> {
        let mut first_error = None;
        let streams = self.finished.drain(..).chain(self.current.take());
        for stream in streams {
            if let Err(e) = stream.close() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn read_separator(&mut self, position: usize, buf: &mut [u8]) -> usize {
        let remaining = &SEPARATOR[position..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.separator = if position + n < SEPARATOR.len() {
            Some(position + n)
        } else {
            None
        };
        n
    }
}

impl Read for ConcatenatedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            if let Some(position) = self.separator {
                return Ok(self.read_separator(position, buf));
            }

            match self.current.as_mut() {
                Some(stream) => {
                    let n = stream.read(buf)?;
                    if n > 0 {
                        return Ok(n);
                    }
                    if let Some(done) = self.current.take() {
                        self.finished.push(done);
                    }
                    self.separator = Some(0);
                }
                None => match self.pending.pop_front() {
                    Some(next) => self.current = Some(self.store.open(&next)?),
                    None => return Ok(0),
                },
            }
        }
    }
}

impl ByteStream for ConcatenatedStream {
    fn close(self: Box<Self>) -> io::Result<()> {
        ConcatenatedStream::close(*self)
    }
}
