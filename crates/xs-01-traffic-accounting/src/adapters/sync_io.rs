//! Blocking `std::io` wrappers.

use std::io::{self, Read, Write};
use std::sync::Arc;

use crate::domain::TrafficCounter;

/// A reader that adds every byte it reads to the inbound total.
#[derive(Debug)]
pub struct CountingReader<R> {
    inner: R,
    counter: Arc<TrafficCounter>,
}

impl<R> CountingReader<R> {
    pub fn new(inner: R, counter: Arc<TrafficCounter>) -> Self {
        Self { inner, counter }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.counter.add_incoming(n as u64);
        Ok(n)
    }
}

/// A writer that adds every byte it writes to the outbound total.
#[derive(Debug)]
pub struct CountingWriter<W> {
    inner: W,
    counter: Arc<TrafficCounter>,
}

impl<W> CountingWriter<W> {
    pub fn new(inner: W, counter: Arc<TrafficCounter>) -> Self {
        Self { inner, counter }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.counter.add_outgoing(n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
