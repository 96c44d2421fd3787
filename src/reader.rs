//! Buffered byte source for the tokenizer.
//!
//! Reads fixed-size blocks from the underlying stream and hands them out one
//! byte at a time. A failed read is surfaced to the caller; the buffer is
//! never consulted after a failure.
use std::io::{self, Read};

use log::{debug, trace};

use crate::error::{ErrorKind, ShellError, ShellResult};

pub const READER_BUFFER_SIZE: usize = 1024;

pub struct ByteReader<R> {
    inner: R,
    buf: [u8; READER_BUFFER_SIZE],
    offset: usize,
    len: usize,
    eof: bool,
}

impl<R: Read> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: [0; READER_BUFFER_SIZE],
            offset: 0,
            len: 0,
            eof: false,
        }
    }

    /// Pull the next byte, blocking until data or end of stream.
    ///
    /// Returns `Ok(None)` once the stream is exhausted; further calls keep
    /// returning `Ok(None)` without touching the stream again.
    pub fn next_byte(&mut self) -> ShellResult<Option<u8>> {
        if self.offset == self.len {
            if self.eof || !self.refill()? {
                return Ok(None);
            }
        }
        let byte = self.buf[self.offset];
        self.offset += 1;
        Ok(Some(byte))
    }

    fn refill(&mut self) -> ShellResult<bool> {
        loop {
            match self.inner.read(&mut self.buf) {
                Ok(0) => {
                    debug!("reader event=eof");
                    self.eof = true;
                    self.offset = 0;
                    self.len = 0;
                    return Ok(false);
                }
                Ok(n) => {
                    trace!("reader event=refill bytes={}", n);
                    self.offset = 0;
                    self.len = n;
                    return Ok(true);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    std::thread::yield_now();
                    continue;
                }
                Err(err) => {
                    self.offset = 0;
                    self.len = 0;
                    return Err(ShellError::io(ErrorKind::Read, "cannot read input", &err));
                }
            }
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }
}
