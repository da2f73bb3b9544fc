//! # `arfile`
//!
//! The `arfile` crate provides sequential reading and writing of Unix `ar`
//! archives, in both the GNU and BSD variants of the format.
//!
//! ## Reading
//!
//! [`read::Reader`] wraps any [`std::io::Read`]. Each call to
//! [`read::Reader::next_member`] returns the [`Header`] of the next member,
//! after which the member's data can be read from the reader itself.
//! Symbol tables and the GNU string table are consumed internally and are
//! never returned.
//!
//! ## Writing
//!
//! [`write::Writer`] wraps any [`std::io::Write`]. Call
//! [`write::Writer::write_header`] to begin a member, supply exactly
//! `header.size` bytes of data, and call [`write::Writer::close`] when done.
//!
//! ## Example
//!
//! ```
//! # #[cfg(all(feature = "read", feature = "write"))] {
//! use std::io::{Read, Write};
//! use arfile::{Header, Variant};
//!
//! let mut writer = arfile::write::Writer::new(Vec::new(), Variant::Gnu);
//! writer.write_header(&Header::new("hello.txt", 13)).unwrap();
//! writer.write_all(b"Hello world!\n").unwrap();
//! writer.close().unwrap();
//! let bytes = writer.into_inner();
//!
//! let mut reader = arfile::read::Reader::new(&bytes[..]).unwrap();
//! let header = reader.next_member().unwrap().unwrap();
//! assert_eq!(header.name, b"hello.txt");
//! let mut data = String::new();
//! reader.read_to_string(&mut data).unwrap();
//! assert_eq!(data, "Hello world!\n");
//! assert!(reader.next_member().unwrap().is_none());
//! # }
//! ```

#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

#[macro_use]
mod pod;

pub mod archive;
pub use archive::Variant;

mod error;
pub use error::*;

mod header;
pub use header::Header;

#[cfg(feature = "read")]
pub mod read;

#[cfg(feature = "write")]
pub mod write;
