//! Interface for reading archives.

use std::io::{Read, Seek};

use crate::Result;

mod reader;
pub use reader::*;

/// Options for reading an archive.
///
/// The default options decode header fields leniently.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    strict: bool,
}

impl ReadOptions {
    /// Create the default options.
    pub fn new() -> Self {
        ReadOptions::default()
    }

    /// Set whether header fields are validated.
    ///
    /// When set, a numeric field that contains anything other than digits
    /// and space padding, or a header that is not terminated by `` `\n ``,
    /// is an error instead of being read as 0 or ignored. Empty fields are
    /// always read as 0.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Return true if header fields are validated.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Start reading an archive from a stream that can only be read forward.
    ///
    /// Unread member data is discarded by reading it.
    pub fn open<R: Read>(self, inner: R) -> Result<Reader<R>> {
        Reader::with_skip(inner, self, reader::skip_by_reading)
    }

    /// Start reading an archive from a stream that can seek.
    ///
    /// Unread member data is skipped by seeking past it.
    pub fn open_seekable<R: Read + Seek>(self, inner: R) -> Result<Reader<R>> {
        Reader::with_skip(inner, self, reader::skip_by_seeking)
    }
}
