//! The member header record, and its conversion to and from the fixed
//! width fields of [`RawHeader`].

// Decoding is only used by the reader and encoding only by the writer.
#![cfg_attr(not(all(feature = "read", feature = "write")), allow(dead_code))]

use core::convert::TryFrom;
use std::fmt;
use std::io::Write;

use crate::archive::{self, RawHeader};
use crate::error::{Error, FieldError, Result};

/// The metadata of an archive member.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Header {
    /// The member name.
    ///
    /// Long names have already been resolved, and the GNU trailing `/` has
    /// been removed. A name returned by the reader never contains `/`.
    pub name: Vec<u8>,
    /// The modification time in seconds since the Unix epoch.
    ///
    /// Times before the epoch can not be stored and are written as 0.
    pub mod_time: i64,
    /// The user ID. It must fit in 6 decimal digits.
    pub uid: u32,
    /// The group ID. It must fit in 6 decimal digits.
    pub gid: u32,
    /// The file mode.
    ///
    /// Only the permission bits are written, and they are always written
    /// with the regular file type, so `0o644` is read back as `0o100644`.
    pub mode: u32,
    /// The size of the member data in bytes.
    ///
    /// This does not include a BSD extended name stored in front of the data.
    pub size: u64,
}

impl Header {
    /// Create a header for a regular file with mode `0o100644`.
    pub fn new(name: impl Into<Vec<u8>>, size: u64) -> Header {
        Header {
            name: name.into(),
            mode: 0o100644,
            size,
            ..Header::default()
        }
    }

    /// Decode the fields of a raw header.
    ///
    /// The name is the raw name field without its space padding, and `size`
    /// is the on-disk size. Long names are resolved by the reader.
    ///
    /// Unless `strict` is set, numeric fields that can not be parsed are
    /// read as 0.
    pub(crate) fn parse(raw: &RawHeader, strict: bool) -> Result<Header> {
        if strict && raw.terminator != archive::TERMINATOR {
            return Err(Error::field("terminator", FieldError::Invalid));
        }
        Ok(Header {
            name: archive::trim_spaces(&raw.name).to_vec(),
            mod_time: parse_field("date", &raw.date, 10, strict)?,
            uid: parse_field("uid", &raw.uid, 10, strict)?,
            gid: parse_field("gid", &raw.gid, 10, strict)?,
            mode: parse_field("mode", &raw.mode, 8, strict)?,
            size: parse_field("size", &raw.size, 10, strict)?,
        })
    }

    /// Encode the header with the given name field and on-disk size.
    ///
    /// Fails without side effects if any value does not fit its field.
    pub(crate) fn encode(&self, name_field: &[u8], size: u64) -> Result<RawHeader> {
        let mut raw = RawHeader {
            name: [b' '; 16],
            date: [b' '; 12],
            uid: [b' '; 6],
            gid: [b' '; 6],
            mode: [b' '; 8],
            size: [b' '; 10],
            terminator: archive::TERMINATOR,
        };
        if name_field.len() > raw.name.len() {
            return Err(Error::field("name", FieldError::Overflow));
        }
        raw.name[..name_field.len()].copy_from_slice(name_field);
        write_field("date", &mut raw.date, format_args!("{}", self.mod_time.max(0)))?;
        write_field("uid", &mut raw.uid, format_args!("{}", self.uid))?;
        write_field("gid", &mut raw.gid, format_args!("{}", self.gid))?;
        write_field("mode", &mut raw.mode, format_args!("100{:o}", self.mode & 0o7777))?;
        write_field("size", &mut raw.size, format_args!("{}", size))?;
        Ok(raw)
    }
}

/// The size of a member as declared on disk, and how much of it is taken
/// by a BSD extended name in front of the data.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MemberSize {
    pub disk: u64,
    pub name: u64,
}

impl MemberSize {
    pub fn from_disk(disk: u64) -> MemberSize {
        MemberSize { disk, name: 0 }
    }

    /// Reserve `name` bytes of the declared size for an extended name.
    pub fn with_name_in_disk(self, name: u64) -> Option<MemberSize> {
        if name > self.disk {
            return None;
        }
        Some(MemberSize {
            disk: self.disk,
            name,
        })
    }

    /// Grow the declared size to make room for an extended name.
    pub fn with_name_added(payload: u64, name: u64) -> Option<MemberSize> {
        Some(MemberSize {
            disk: payload.checked_add(name)?,
            name,
        })
    }

    /// The size of the member data seen by callers.
    pub fn payload(self) -> u64 {
        self.disk - self.name
    }

    /// The number of padding bytes following the data.
    pub fn pad(self) -> u64 {
        self.disk & 1
    }
}

/// Parse a decimal number that must contain at least one digit.
pub(crate) fn parse_decimal(digits: &[u8]) -> Option<u64> {
    if digits.is_empty() {
        return None;
    }
    parse_u64_digits(digits, 10)
}

// An empty field is 0.
fn parse_u64_digits(digits: &[u8], radix: u32) -> Option<u64> {
    let mut result: u64 = 0;
    for &c in digits {
        let x = (c as char).to_digit(radix)?;
        result = result
            .checked_mul(u64::from(radix))?
            .checked_add(u64::from(x))?;
    }
    Some(result)
}

fn parse_field<T>(field: &'static str, digits: &[u8], radix: u32, strict: bool) -> Result<T>
where
    T: TryFrom<u64> + Default,
{
    let value = parse_u64_digits(archive::trim_spaces(digits), radix)
        .and_then(|value| T::try_from(value).ok());
    match value {
        Some(value) => Ok(value),
        None if strict => Err(Error::field(field, FieldError::Invalid)),
        None => Ok(T::default()),
    }
}

// The field is already filled with spaces.
fn write_field(field: &'static str, dest: &mut [u8], value: fmt::Arguments<'_>) -> Result<()> {
    let mut tail = dest;
    tail.write_fmt(value)
        .map_err(|_| Error::field(field, FieldError::Overflow))
}
