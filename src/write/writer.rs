use core::convert::TryFrom;
use std::io::{self, Write};

use log::{debug, trace};

use crate::archive::{self, Variant};
use crate::error::{Error, FieldError, FileNameError, Result, StringTableError};
use crate::header::{Header, MemberSize};
use crate::pod;
use crate::write::StringTable;

/// A sequential writer for an archive.
///
/// Each member is started with [`Writer::write_header`], followed by
/// exactly `header.size` bytes of data written with [`Writer::append`] or
/// through [`Write`]. The padding after odd sized members is written
/// automatically. The global header is written before the first member, or
/// by [`Writer::close`] for an empty archive.
#[derive(Debug)]
pub struct Writer<W> {
    inner: W,
    variant: Variant,
    wrote_magic: bool,
    wrote_member: bool,
    string_table: Option<StringTable>,
    // Data still expected for the current member, and whether a pad byte
    // follows it.
    nb: u64,
    pad: bool,
    closed: bool,
}

impl<W: Write> Writer<W> {
    /// Create a writer for the given archive variant.
    ///
    /// Nothing is written until the first member or [`Writer::close`].
    pub fn new(inner: W, variant: Variant) -> Self {
        Writer {
            inner,
            variant,
            wrote_magic: false,
            wrote_member: false,
            string_table: None,
            nb: 0,
            pad: false,
            closed: false,
        }
    }

    /// Write the GNU string table for the long member names of the archive.
    ///
    /// Names that fit in a header are ignored. Every long name given to
    /// [`Writer::write_header`] must be included. This must be called at
    /// most once, before any other member. Nothing is written if none of
    /// the names are long.
    pub fn write_string_table<I, N>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = N>,
        N: AsRef<[u8]>,
    {
        self.check_open()?;
        if self.variant != Variant::Gnu {
            return Err(StringTableError::Unsupported.into());
        }
        if self.string_table.is_some() {
            return Err(StringTableError::Duplicate.into());
        }
        if self.wrote_member {
            return Err(StringTableError::NotFirst.into());
        }

        let mut table = StringTable::new();
        for name in names {
            let name = name.as_ref();
            if name.len() > archive::GNU_MAX_INLINE_NAME {
                check_long_gnu_name(name)?;
                table.add(name);
            }
        }
        if !table.is_empty() {
            let header = Header {
                name: archive::GNU_STRING_TABLE.to_vec(),
                mode: archive::GNU_STRING_TABLE_MODE,
                size: table.len() as u64,
                ..Header::default()
            };
            let size = MemberSize::from_disk(header.size);
            let raw = header.encode(archive::GNU_STRING_TABLE, size.disk)?;
            self.write_magic()?;
            self.inner.write_all(pod::bytes_of(&raw))?;
            self.inner.write_all(table.data())?;
            if size.pad() != 0 {
                self.inner.write_all(b"\n")?;
            }
            debug!("Wrote string table of {} bytes", table.len());
        }
        self.string_table = Some(table);
        Ok(())
    }

    /// Start a new member.
    ///
    /// The previous member's data must be complete.
    pub fn write_header(&mut self, header: &Header) -> Result<()> {
        self.check_open()?;
        self.check_complete()?;

        let name = &header.name[..];
        if name.is_empty() {
            return Err(Error::file_name(name, FileNameError::ZeroLength));
        }
        if memchr::memchr(b'/', name).is_some() {
            return Err(Error::file_name(name, FileNameError::IllegalSlash));
        }
        if self.variant.is_symbol_table(name) {
            return Err(Error::file_name(name, FileNameError::Reserved));
        }

        let mut extended_name = Vec::new();
        let (name_field, size) = match self.variant {
            Variant::Gnu => {
                let mut field = Vec::new();
                if name.len() > archive::GNU_MAX_INLINE_NAME {
                    check_long_gnu_name(name)?;
                    let offset = self
                        .string_table
                        .as_ref()
                        .ok_or(StringTableError::Missing)?
                        .get(name)
                        .ok_or(StringTableError::MissingEntry)?;
                    field.extend_from_slice(format!("/{}", offset).as_bytes());
                } else {
                    field.extend_from_slice(name);
                    field.push(b'/');
                }
                (field, MemberSize::from_disk(header.size))
            }
            Variant::Bsd => {
                if name.len() > archive::BSD_MAX_INLINE_NAME
                    || memchr::memchr(b' ', name).is_some()
                {
                    extended_name.extend_from_slice(name);
                    extended_name.resize(name.len() + name.len() % 2, 0);
                    let len = extended_name.len() as u64;
                    let size = MemberSize::with_name_added(header.size, len)
                        .ok_or_else(|| Error::field("size", FieldError::Overflow))?;
                    (format!("#1/{}", len).into_bytes(), size)
                } else {
                    (name.to_vec(), MemberSize::from_disk(header.size))
                }
            }
        };

        let raw = header.encode(&name_field, size.disk)?;
        self.write_magic()?;
        self.inner.write_all(pod::bytes_of(&raw))?;
        self.inner.write_all(&extended_name)?;
        self.wrote_member = true;
        self.nb = size.payload();
        self.pad = size.pad() != 0;
        self.finish_data()?;
        Ok(())
    }

    /// Write data for the current member.
    ///
    /// Returns the number of bytes written. If `data` is longer than the
    /// data still expected, the excess is discarded and
    /// [`Error::WriteTooLong`] is returned.
    pub fn append(&mut self, data: &[u8]) -> Result<usize> {
        self.check_open()?;
        let written = self.write_data(data)?;
        if written < data.len() {
            return Err(Error::WriteTooLong { written });
        }
        Ok(written)
    }

    /// Finish the archive and flush the underlying stream.
    ///
    /// The global header is written if no members were written. The
    /// underlying stream is not closed.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::ClosedTwice);
        }
        self.check_complete()?;
        self.write_magic()?;
        self.closed = true;
        self.inner.flush()?;
        Ok(())
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::WriterClosed);
        }
        Ok(())
    }

    fn check_complete(&self) -> Result<()> {
        if self.nb != 0 {
            return Err(Error::PayloadIncomplete { remaining: self.nb });
        }
        Ok(())
    }

    fn write_magic(&mut self) -> io::Result<()> {
        if !self.wrote_magic {
            self.inner.write_all(&archive::MAGIC)?;
            self.wrote_magic = true;
        }
        Ok(())
    }

    fn write_data(&mut self, data: &[u8]) -> io::Result<usize> {
        let len = usize::try_from(self.nb).map_or(data.len(), |nb| nb.min(data.len()));
        self.inner.write_all(&data[..len])?;
        self.nb -= len as u64;
        self.finish_data()?;
        Ok(len)
    }

    fn finish_data(&mut self) -> io::Result<()> {
        if self.nb == 0 && self.pad {
            trace!("Writing pad byte");
            self.inner.write_all(b"\n")?;
            self.pad = false;
        }
        Ok(())
    }
}

impl<W> Writer<W> {
    /// The variant of the archive.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Return a reference to the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Return the underlying stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

// String table entries end at the first newline.
fn check_long_gnu_name(name: &[u8]) -> Result<()> {
    if memchr::memchr(b'\n', name).is_some() {
        return Err(Error::file_name(name, FileNameError::IllegalNewline));
    }
    Ok(())
}

/// Writes data for the current member.
///
/// Data beyond the size declared by the header is not written. A write
/// that can not write any data because the member is complete fails with
/// [`io::ErrorKind::InvalidInput`].
impl<W: Write> Write for Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_open()?;
        if buf.is_empty() {
            return Ok(0);
        }
        if self.nb == 0 {
            return Err(Error::WriteTooLong { written: 0 }.into());
        }
        self.write_data(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
