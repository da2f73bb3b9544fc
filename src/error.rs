use std::{error, fmt, io, result};

/// The error type used within this crate.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error from the underlying stream.
    ///
    /// This includes truncated headers and data, which are reported with
    /// [`io::ErrorKind::UnexpectedEof`].
    Io(io::Error),
    /// The stream ended before the 8 byte global header.
    MissingGlobalHeader,
    /// The global header is not `!<arch>\n`.
    InvalidGlobalHeader,
    /// A problem with the GNU string table.
    StringTable(StringTableError),
    /// A problem with the name of an archive member.
    FileName {
        /// The member name as stored in the header, or as given to the writer.
        name: String,
        /// The problem with the name.
        cause: FileNameError,
    },
    /// A header field that can not be parsed or does not fit.
    HeaderField {
        /// The name of the field.
        field: &'static str,
        /// The problem with the field.
        cause: FieldError,
    },
    /// More data was written than the header declared.
    ///
    /// The excess was discarded.
    WriteTooLong {
        /// The number of bytes of the write that were accepted.
        written: usize,
    },
    /// A new member or the end of the archive was started before all of the
    /// data declared by the previous header was written.
    PayloadIncomplete {
        /// The number of bytes that are still expected.
        remaining: u64,
    },
    /// The writer has been closed.
    WriterClosed,
    /// The writer was closed more than once.
    ClosedTwice,
}

/// A problem with the GNU string table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StringTableError {
    /// The archive contains more than one string table.
    Multiple,
    /// A member refers to the string table, but there is none.
    Missing,
    /// A member refers to an offset outside of the string table.
    InvalidOffset,
    /// The string table entry is not terminated by a newline.
    MissingNewline,
    /// A long member name was not registered in the string table.
    MissingEntry,
    /// The string table was written more than once.
    Duplicate,
    /// The string table was written after other members.
    NotFirst,
    /// The archive variant does not use a string table.
    Unsupported,
}

/// A problem with the name of an archive member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FileNameError {
    /// The name is empty.
    ZeroLength,
    /// The name contains a `/`.
    IllegalSlash,
    /// The length of a BSD extended name is invalid.
    InvalidLongNameLength,
    /// A GNU name is not terminated by `/`.
    MissingTrailingSlash,
    /// The name is reserved for a symbol table.
    Reserved,
    /// A long GNU name contains a newline.
    IllegalNewline,
}

/// A problem with a header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FieldError {
    /// The field contains characters other than digits.
    Invalid,
    /// The value is too wide for the field.
    Overflow,
}

impl fmt::Display for StringTableError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StringTableError::Multiple => "archive contains multiple string tables",
            StringTableError::Missing => "missing string table",
            StringTableError::InvalidOffset => "invalid string table offset",
            StringTableError::MissingNewline => "missing trailing newline",
            StringTableError::MissingEntry => "missing string table entry",
            StringTableError::Duplicate => "string table written twice",
            StringTableError::NotFirst => "string table must precede all members",
            StringTableError::Unsupported => "BSD archives have no string table",
        })
    }
}

impl fmt::Display for FileNameError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileNameError::ZeroLength => "zero-length file name",
            FileNameError::IllegalSlash => "file name contains illegal '/'",
            FileNameError::InvalidLongNameLength => "invalid long file name length",
            FileNameError::MissingTrailingSlash => "file name is missing trailing '/'",
            FileNameError::Reserved => "file name is reserved for the symbol table",
            FileNameError::IllegalNewline => "file name contains illegal newline",
        })
    }
}

impl fmt::Display for FieldError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldError::Invalid => "invalid value",
            FieldError::Overflow => "value does not fit",
        })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "ar: {}", e),
            Error::MissingGlobalHeader => f.write_str("ar: missing global header"),
            Error::InvalidGlobalHeader => f.write_str("ar: invalid global header"),
            Error::StringTable(cause) => write!(f, "ar: string table: {}", cause),
            Error::FileName { name, cause } => {
                write!(f, "ar: archive member '{}': {}", name, cause)
            }
            Error::HeaderField { field, cause } => {
                write!(f, "ar: header field '{}': {}", field, cause)
            }
            Error::WriteTooLong { .. } => f.write_str("ar: write too long"),
            Error::PayloadIncomplete { remaining } => {
                write!(f, "ar: missed writing {} bytes", remaining)
            }
            Error::WriterClosed => f.write_str("ar: write to closed writer"),
            Error::ClosedTwice => f.write_str("ar: writer closed twice"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Error {
        Error::Io(error)
    }
}

impl From<StringTableError> for Error {
    fn from(cause: StringTableError) -> Error {
        Error::StringTable(cause)
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> io::Error {
        match error {
            Error::Io(e) => e,
            e @ Error::WriteTooLong { .. } => io::Error::new(io::ErrorKind::InvalidInput, e),
            e => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

impl Error {
    pub(crate) fn file_name(name: &[u8], cause: FileNameError) -> Error {
        Error::FileName {
            name: String::from_utf8_lossy(name).into_owned(),
            cause,
        }
    }

    pub(crate) fn field(field: &'static str, cause: FieldError) -> Error {
        Error::HeaderField { field, cause }
    }
}

/// Return true if an I/O error was caused by writing more member data than
/// the header declared.
///
/// The writer's `io::Write` impl reports [`Error::WriteTooLong`] wrapped in
/// an [`io::Error`], so this is how callers of `write_all` or `io::copy`
/// detect it.
///
/// ```
/// # #[cfg(feature = "write")] {
/// use std::io::Write;
/// use arfile::{Header, Variant};
///
/// let mut writer = arfile::write::Writer::new(Vec::new(), Variant::Gnu);
/// writer.write_header(&Header::new("a.txt", 2)).unwrap();
/// let e = writer.write_all(b"abc").unwrap_err();
/// assert!(arfile::is_write_too_long(&e));
/// # }
/// ```
pub fn is_write_too_long(error: &io::Error) -> bool {
    error
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<Error>())
        .map_or(false, |e| matches!(e, Error::WriteTooLong { .. }))
}

/// The result type used within this crate.
pub type Result<T> = result::Result<T, Error>;
