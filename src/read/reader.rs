use core::convert::TryFrom;
use std::io::{self, Read, Seek, SeekFrom};
use std::{fmt, mem};

use log::{debug, trace};

use crate::archive::{self, RawHeader, Variant};
use crate::error::{Error, FileNameError, Result, StringTableError};
use crate::header::{self, Header, MemberSize};
use crate::pod;
use crate::read::ReadOptions;

/// A sequential reader for an archive.
///
/// [`Reader::next_member`] advances to the next member and returns its
/// header, and the member's data is then read through [`Read`].
pub struct Reader<R> {
    inner: R,
    skip: fn(&mut R, u64) -> io::Result<()>,
    options: ReadOptions,
    variant: Variant,
    // The start of the first member header, read when detecting the variant.
    lookahead: Vec<u8>,
    lookahead_error: Option<io::Error>,
    // Unread member data, and the padding after it.
    nb: u64,
    pad: u64,
    string_table: Option<Vec<u8>>,
}

impl<R: fmt::Debug> fmt::Debug for Reader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("inner", &self.inner)
            .field("options", &self.options)
            .field("variant", &self.variant)
            .field("nb", &self.nb)
            .field("pad", &self.pad)
            .finish_non_exhaustive()
    }
}

impl<R: Read> Reader<R> {
    /// Start reading an archive with the default options.
    ///
    /// This reads the global header and enough of the first member header to
    /// determine the archive variant.
    pub fn new(inner: R) -> Result<Self> {
        ReadOptions::default().open(inner)
    }

    pub(super) fn with_skip(
        mut inner: R,
        options: ReadOptions,
        skip: fn(&mut R, u64) -> io::Result<()>,
    ) -> Result<Self> {
        let mut magic = [0; 8];
        if read_full(&mut inner, &mut magic)? < magic.len() {
            return Err(Error::MissingGlobalHeader);
        }
        if magic != archive::MAGIC {
            return Err(Error::InvalidGlobalHeader);
        }

        let mut lookahead = vec![0; archive::HEADER_SIZE];
        let mut lookahead_error = None;
        match read_full(&mut inner, &mut lookahead) {
            Ok(len) => lookahead.truncate(len),
            Err(e) => {
                lookahead.clear();
                lookahead_error = Some(e);
            }
        }
        let variant = match lookahead.get(..16) {
            Some(name) => Variant::detect(name),
            None => Variant::Bsd,
        };
        debug!("Detected {:?} archive", variant);

        Ok(Reader {
            inner,
            skip,
            options,
            variant,
            lookahead,
            lookahead_error,
            nb: 0,
            pad: 0,
            string_table: None,
        })
    }

    /// Advance to the next member and return its header.
    ///
    /// Any unread data of the current member is skipped. Symbol tables and
    /// the GNU string table are handled internally and never returned.
    ///
    /// Returns `Ok(None)` when there are no more members.
    pub fn next_member(&mut self) -> Result<Option<Header>> {
        loop {
            let remaining = self.nb + self.pad;
            if remaining != 0 {
                (self.skip)(&mut self.inner, remaining)?;
                self.nb = 0;
                self.pad = 0;
            }

            let raw = match self.read_raw_header()? {
                Some(raw) => raw,
                None => return Ok(None),
            };
            let mut header = Header::parse(&raw, self.options.is_strict())?;
            let mut size = MemberSize::from_disk(header.size);
            self.nb = size.disk;
            self.pad = size.pad();

            if self.variant.is_symbol_table(&header.name) {
                trace!("Skipping symbol table of {} bytes", size.disk);
                continue;
            }
            match self.variant {
                Variant::Gnu => {
                    if header.name == archive::GNU_STRING_TABLE {
                        self.read_string_table(size.disk)?;
                        continue;
                    }
                    header.name = self.resolve_gnu_name(&header.name)?;
                }
                Variant::Bsd => {
                    if let Some(digits) = header.name.strip_prefix(archive::BSD_EXTENDED_NAME) {
                        size = header::parse_decimal(digits)
                            .and_then(|len| size.with_name_in_disk(len))
                            .ok_or_else(|| {
                                Error::file_name(&header.name, FileNameError::InvalidLongNameLength)
                            })?;
                        let mut name = self.read_data(size.name)?;
                        let len = name.iter().rposition(|&c| c != 0).map_or(0, |i| i + 1);
                        name.truncate(len);
                        if self.variant.is_symbol_table(&name) {
                            trace!("Skipping symbol table of {} bytes", size.payload());
                            continue;
                        }
                        header.name = name;
                    }
                }
            }

            if header.name.is_empty() {
                return Err(Error::file_name(&header.name, FileNameError::ZeroLength));
            }
            if memchr::memchr(b'/', &header.name).is_some() {
                return Err(Error::file_name(&header.name, FileNameError::IllegalSlash));
            }
            header.size = size.payload();
            return Ok(Some(header));
        }
    }

    /// Read the next header block.
    ///
    /// Returns `None` if the stream ends at a header boundary.
    fn read_raw_header(&mut self) -> Result<Option<RawHeader>> {
        if let Some(e) = self.lookahead_error.take() {
            return Err(e.into());
        }
        let lookahead = mem::take(&mut self.lookahead);
        let mut raw = RawHeader::default();
        let bytes = pod::bytes_of_mut(&mut raw);
        bytes[..lookahead.len()].copy_from_slice(&lookahead);
        let len = lookahead.len() + read_full(&mut self.inner, &mut bytes[lookahead.len()..])?;
        match len {
            0 => Ok(None),
            archive::HEADER_SIZE => Ok(Some(raw)),
            _ => Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()),
        }
    }

    /// Read `len` bytes of the current member's data.
    fn read_data(&mut self, len: u64) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        let read = self.inner.by_ref().take(len).read_to_end(&mut data)?;
        self.nb -= read as u64;
        if (read as u64) < len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        Ok(data)
    }

    fn read_string_table(&mut self, len: u64) -> Result<()> {
        if self.string_table.is_some() {
            return Err(StringTableError::Multiple.into());
        }
        let table = self.read_data(len)?;
        debug!("Loaded string table of {} bytes", table.len());
        self.string_table = Some(table);
        Ok(())
    }

    fn resolve_gnu_name(&self, name: &[u8]) -> Result<Vec<u8>> {
        if name.is_empty() {
            return Err(Error::file_name(name, FileNameError::ZeroLength));
        }
        if let Some(digits) = name.strip_prefix(b"/") {
            let table = self
                .string_table
                .as_deref()
                .ok_or(StringTableError::Missing)?;
            let entry = header::parse_decimal(digits)
                .and_then(|offset| usize::try_from(offset).ok())
                .and_then(|offset| table.get(offset..))
                .ok_or(StringTableError::InvalidOffset)?;
            let end = memchr::memchr(b'\n', entry).ok_or(StringTableError::MissingNewline)?;
            let entry = &entry[..end];
            let end = memchr::memchr(b'/', entry).unwrap_or(entry.len());
            return Ok(entry[..end].to_vec());
        }
        match name.strip_suffix(b"/") {
            Some(name) => Ok(name.to_vec()),
            None => Err(Error::file_name(name, FileNameError::MissingTrailingSlash)),
        }
    }
}

impl<R: Read + Seek> Reader<R> {
    /// Start reading an archive with the default options, skipping unread
    /// member data by seeking.
    pub fn new_seekable(inner: R) -> Result<Self> {
        ReadOptions::default().open_seekable(inner)
    }
}

impl<R> Reader<R> {
    /// The variant of the archive, determined from the first member.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Return a reference to the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Return the underlying stream.
    ///
    /// Its position is unspecified.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Reads the data of the current member.
///
/// Returns `Ok(0)` at the end of the data, even if the archive continues.
impl<R: Read> Read for Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.nb == 0 || buf.is_empty() {
            return Ok(0);
        }
        let len = usize::try_from(self.nb).map_or(buf.len(), |nb| nb.min(buf.len()));
        let read = self.inner.read(&mut buf[..len])?;
        if read == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        self.nb -= read as u64;
        Ok(read)
    }
}

/// Fill `buf` as far as possible, returning the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut len = 0;
    while len < buf.len() {
        match reader.read(&mut buf[len..]) {
            Ok(0) => break,
            Ok(n) => len += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(len)
}

pub(super) fn skip_by_reading<R: Read>(reader: &mut R, len: u64) -> io::Result<()> {
    let skipped = io::copy(&mut reader.by_ref().take(len), &mut io::sink())?;
    if skipped < len {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(())
}

pub(super) fn skip_by_seeking<R: Read + Seek>(reader: &mut R, len: u64) -> io::Result<()> {
    let offset = i64::try_from(len).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
    reader.seek(SeekFrom::Current(offset))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldError;
    use std::io::Cursor;

    fn read_all<R: Read>(reader: &mut Reader<R>) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut members = Vec::new();
        while let Some(header) = reader.next_member().unwrap() {
            let mut data = Vec::new();
            reader.read_to_end(&mut data).unwrap();
            assert_eq!(data.len() as u64, header.size);
            members.push((header.name, data));
        }
        members
    }

    fn member(name: &[u8], data: &[u8]) -> (Vec<u8>, Vec<u8>) {
        (name.to_vec(), data.to_vec())
    }

    #[test]
    fn hello() {
        let data = b"\
            !<arch>\n\
            hello.txt       1361157466  501   20    100644  13        `\n\
            Hello world!\n\n\
            lamp.txt        1361157466  501   20    100644  12        `\n\
            I love lamp.";
        let mut reader = Reader::new(&data[..]).unwrap();
        assert_eq!(reader.variant(), Variant::Bsd);

        let header = reader.next_member().unwrap().unwrap();
        assert_eq!(
            header,
            Header {
                name: b"hello.txt".to_vec(),
                mod_time: 1361157466,
                uid: 501,
                gid: 20,
                mode: 0o100644,
                size: 13,
            }
        );
        let mut contents = String::new();
        reader.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "Hello world!\n");

        let header = reader.next_member().unwrap().unwrap();
        assert_eq!(header.name, b"lamp.txt");
        assert_eq!(header.size, 12);
        let mut contents = String::new();
        reader.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "I love lamp.");

        assert!(reader.next_member().unwrap().is_none());
        assert!(reader.next_member().unwrap().is_none());
    }

    #[test]
    fn empty() {
        let data = b"!<arch>\n";
        let mut reader = Reader::new(&data[..]).unwrap();
        assert_eq!(reader.variant(), Variant::Bsd);
        assert!(reader.next_member().unwrap().is_none());
        let mut buf = [0; 4];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn global_header() {
        match Reader::new(&b"!<arch>"[..]) {
            Err(Error::MissingGlobalHeader) => {}
            other => panic!("unexpected result {:?}", other),
        }
        match Reader::new(&b""[..]) {
            Err(Error::MissingGlobalHeader) => {}
            other => panic!("unexpected result {:?}", other),
        }
        match Reader::new(&b"<bigaf>\n"[..]) {
            Err(Error::InvalidGlobalHeader) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn gnu_names() {
        let data = b"\
            !<arch>\n\
            //              0           0     0     644     18        `\n\
            0123456789abcdef/\n\
            s p a c e/      0           0     0     644     4         `\n\
            0000\
            0123456789abcde/0           0     0     644     3         `\n\
            odd\n\
            /0              0           0     0     644     4         `\n\
            even";
        let mut reader = Reader::new(&data[..]).unwrap();
        assert_eq!(reader.variant(), Variant::Gnu);
        assert_eq!(
            read_all(&mut reader),
            vec![
                member(b"s p a c e", b"0000"),
                member(b"0123456789abcde", b"odd"),
                member(b"0123456789abcdef", b"even"),
            ]
        );
    }

    #[test]
    fn gnu_special_members() {
        let data = b"\
            !<arch>\n\
            /               0           0     0     644     4         `\n\
            \0\0\0\0\
            /SYM64/         0           0     0     644     8         `\n\
            \0\0\0\0\0\0\0\0\
            //              0           0     0     644     18        `\n\
            0123456789abcdef/\n\
            /0              0           0     0     644     4         `\n\
            even";
        let mut reader = Reader::new(&data[..]).unwrap();
        assert_eq!(reader.variant(), Variant::Gnu);
        assert_eq!(
            read_all(&mut reader),
            vec![member(b"0123456789abcdef", b"even")]
        );
    }

    #[test]
    fn bsd_names() {
        let data = b"\
            !<arch>\n\
            0123456789abcde 0           0     0     644     3         `\n\
            odd\n\
            #1/16           0           0     0     644     20        `\n\
            0123456789abcdefeven";
        let mut reader = Reader::new(&data[..]).unwrap();
        assert_eq!(reader.variant(), Variant::Bsd);
        assert_eq!(
            read_all(&mut reader),
            vec![
                member(b"0123456789abcde", b"odd"),
                member(b"0123456789abcdef", b"even"),
            ]
        );
    }

    #[test]
    fn bsd_padded_name() {
        let data = b"\
            !<arch>\n\
            #1/24           0           0     0     644     37        `\n\
            abcdefghijklmnopqrstuvw\0Hello world!\n\n";
        let mut reader = Reader::new(&data[..]).unwrap();
        let header = reader.next_member().unwrap().unwrap();
        assert_eq!(header.name, b"abcdefghijklmnopqrstuvw");
        assert_eq!(header.size, 13);
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"Hello world!\n");
        assert!(reader.next_member().unwrap().is_none());
    }

    #[test]
    fn bsd_symbol_tables() {
        let data = b"\
            !<arch>\n\
            __.SYMDEF       0           0     0     644     4         `\n\
            \0\0\0\0\
            #1/12           0           0     0     644     20        `\n\
            __.SYMDEF\0\0\0\0\0\0\0\0\0\0\0\
            hello.txt       1361157466  501   20    100644  13        `\n\
            Hello world!\n\n";
        let mut reader = Reader::new(&data[..]).unwrap();
        assert_eq!(reader.variant(), Variant::Bsd);
        assert_eq!(
            read_all(&mut reader),
            vec![member(b"hello.txt", b"Hello world!\n")]
        );
    }

    #[test]
    fn bsd_invalid_names() {
        for &name in &[&b"#1/30           "[..], &b"#1/x            "[..]] {
            let mut data = b"!<arch>\n".to_vec();
            data.extend_from_slice(name);
            data.extend_from_slice(b"0           0     0     644     20        `\n");
            data.extend_from_slice(&[b'x'; 20]);
            let mut reader = Reader::new(&data[..]).unwrap();
            match reader.next_member() {
                Err(Error::FileName { cause, .. }) => {
                    assert_eq!(cause, FileNameError::InvalidLongNameLength)
                }
                other => panic!("unexpected result {:?}", other),
            }
        }

        let data = b"\
            !<arch>\n\
            a/b             0           0     0     644     4         `\n\
            0000";
        let mut reader = Reader::new(&data[..]).unwrap();
        match reader.next_member() {
            Err(Error::FileName { name, cause }) => {
                assert_eq!(name, "a/b");
                assert_eq!(cause, FileNameError::IllegalSlash);
            }
            other => panic!("unexpected result {:?}", other),
        }

        let mut data = b"!<arch>\n".to_vec();
        data.extend_from_slice(&[b' '; 16]);
        data.extend_from_slice(b"0           0     0     644     4         `\n0000");
        let mut reader = Reader::new(&data[..]).unwrap();
        match reader.next_member() {
            Err(Error::FileName { cause, .. }) => assert_eq!(cause, FileNameError::ZeroLength),
            other => panic!("unexpected result {:?}", other),
        }
    }

    fn gnu_error(member: &[u8]) -> Error {
        let mut data = b"\
            !<arch>\n\
            /               0           0     0     644     4         `\n\
            \0\0\0\0"
            .to_vec();
        data.extend_from_slice(member);
        let mut reader = Reader::new(&data[..]).unwrap();
        assert_eq!(reader.variant(), Variant::Gnu);
        match reader.next_member() {
            Err(e) => e,
            Ok(header) => panic!("unexpected header {:?}", header),
        }
    }

    fn string_table_error(member: &[u8]) -> StringTableError {
        match gnu_error(member) {
            Error::StringTable(cause) => cause,
            e => panic!("unexpected error {:?}", e),
        }
    }

    fn file_name_error(member: &[u8]) -> FileNameError {
        match gnu_error(member) {
            Error::FileName { cause, .. } => cause,
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn gnu_errors() {
        assert_eq!(
            string_table_error(
                b"/0              0           0     0     644     4         `\n\
                even"
            ),
            StringTableError::Missing
        );

        let table = b"//              0           0     0     644     18        `\n\
            0123456789abcdef/\n";
        let check = |member: &[u8]| {
            let mut data = table.to_vec();
            data.extend_from_slice(member);
            string_table_error(&data)
        };
        assert_eq!(
            check(
                b"/19             0           0     0     644     4         `\n\
                even"
            ),
            StringTableError::InvalidOffset
        );
        assert_eq!(
            check(
                b"/x              0           0     0     644     4         `\n\
                even"
            ),
            StringTableError::InvalidOffset
        );
        assert_eq!(
            check(
                b"/18             0           0     0     644     4         `\n\
                even"
            ),
            StringTableError::MissingNewline
        );
        assert_eq!(check(&table[..]), StringTableError::Multiple);

        assert_eq!(
            file_name_error(
                b"noslash         0           0     0     644     4         `\n\
                even"
            ),
            FileNameError::MissingTrailingSlash
        );
        assert_eq!(
            file_name_error(
                b"a//             0           0     0     644     4         `\n\
                even"
            ),
            FileNameError::IllegalSlash
        );
    }

    #[test]
    fn skip_unread_data() {
        let data = b"\
            !<arch>\n\
            //              0           0     0     644     18        `\n\
            0123456789abcdef/\n\
            0123456789abcde/0           0     0     644     3         `\n\
            odd\n\
            /0              0           0     0     644     4         `\n\
            even\
            last/           0           0     0     644     1         `\n\
            x\n";

        fn check<R: Read>(mut reader: Reader<R>) {
            let header = reader.next_member().unwrap().unwrap();
            assert_eq!(header.name, b"0123456789abcde");
            let mut buf = [0; 1];
            reader.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"o");

            let header = reader.next_member().unwrap().unwrap();
            assert_eq!(header.name, b"0123456789abcdef");

            let header = reader.next_member().unwrap().unwrap();
            assert_eq!(header.name, b"last");
            let mut contents = Vec::new();
            reader.read_to_end(&mut contents).unwrap();
            assert_eq!(contents, b"x");
            assert!(reader.next_member().unwrap().is_none());
        }

        check(Reader::new(&data[..]).unwrap());
        check(Reader::new_seekable(Cursor::new(&data[..])).unwrap());
    }

    #[test]
    fn read_bounded() {
        let data = b"\
            !<arch>\n\
            hello.txt       1361157466  501   20    100644  13        `\n\
            Hello world!\n\n";
        let mut reader = Reader::new(&data[..]).unwrap();
        reader.next_member().unwrap().unwrap();
        let mut buf = [0; 64];
        assert_eq!(reader.read(&mut buf[..5]).unwrap(), 5);
        assert_eq!(&buf[..5], b"Hello");
        assert_eq!(reader.read(&mut buf).unwrap(), 8);
        assert_eq!(&buf[..8], b" world!\n");
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn truncated() {
        let data = b"\
            !<arch>\n\
            hello.txt       1361157466  501   20    100644  13        `\n\
            Hello";
        let mut reader = Reader::new(&data[..]).unwrap();
        reader.next_member().unwrap().unwrap();
        let mut contents = Vec::new();
        let e = reader.read_to_end(&mut contents).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof);

        let mut reader = Reader::new(&data[..]).unwrap();
        reader.next_member().unwrap().unwrap();
        match reader.next_member() {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected result {:?}", other),
        }

        let data = b"\
            !<arch>\n\
            hello.txt       1361157466";
        let mut reader = Reader::new(&data[..]).unwrap();
        match reader.next_member() {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn deferred_error() {
        struct Failing(usize);

        impl Read for Failing {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.0 == 0 {
                    return Err(io::Error::new(io::ErrorKind::Other, "broken"));
                }
                let magic = &archive::MAGIC[archive::MAGIC.len() - self.0..];
                let len = magic.len().min(buf.len());
                buf[..len].copy_from_slice(&magic[..len]);
                self.0 -= len;
                Ok(len)
            }
        }

        let mut reader = Reader::new(Failing(archive::MAGIC.len())).unwrap();
        assert_eq!(reader.variant(), Variant::Bsd);
        match reader.next_member() {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::Other),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn strict() {
        let data = b"\
            !<arch>\n\
            hello.txt       13611x7466  501   20    100644  13        `\n\
            Hello world!\n\n";
        let mut reader = Reader::new(&data[..]).unwrap();
        let header = reader.next_member().unwrap().unwrap();
        assert_eq!(header.mod_time, 0);

        let options = ReadOptions::new().strict(true);
        assert!(options.is_strict());
        let mut reader = options.open(&data[..]).unwrap();
        match reader.next_member() {
            Err(Error::HeaderField { field, cause }) => {
                assert_eq!(field, "date");
                assert_eq!(cause, FieldError::Invalid);
            }
            other => panic!("unexpected result {:?}", other),
        }

        let data = b"\
            !<arch>\n\
            //              0           0     0     644     18        `\n\
            0123456789abcdef/\n\
            /0              0           0     0     644     4         `\n\
            even";
        let mut reader = ReadOptions::new().strict(true).open(&data[..]).unwrap();
        assert_eq!(
            read_all(&mut reader),
            vec![member(b"0123456789abcdef", b"even")]
        );
    }
}
