//! Counting decorators over byte streams.

pub mod async_io;
pub mod sync_io;

pub use async_io::CountingStream;
pub use sync_io::{CountingReader, CountingWriter};
