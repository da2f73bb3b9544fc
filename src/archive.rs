//! Archive definitions.
//!
//! These definitions are independent of read/write support.

/// File identification bytes stored at the beginning of the file.
pub const MAGIC: [u8; 8] = *b"!<arch>\n";

/// The terminator for each archive member header.
pub const TERMINATOR: [u8; 2] = *b"`\n";

/// The size in bytes of an archive member header.
pub const HEADER_SIZE: usize = 60;

/// The name of the GNU symbol table member.
pub const GNU_SYMBOL_TABLE: &[u8] = b"/";

/// The name of the GNU symbol table member with 64-bit offsets.
pub const GNU_SYMBOL_TABLE_64: &[u8] = b"/SYM64/";

/// The name of the GNU string table member, which holds long member names.
pub const GNU_STRING_TABLE: &[u8] = b"//";

/// The names used for the BSD symbol table member.
///
/// The sorted and 64-bit forms are written by Darwin and llvm-ar.
pub const BSD_SYMBOL_TABLES: [&[u8]; 4] = [
    b"__.SYMDEF",
    b"__.SYMDEF SORTED",
    b"__.SYMDEF_64",
    b"__.SYMDEF_64 SORTED",
];

/// The prefix of a BSD extended name.
///
/// It is followed by the decimal length of the name, which is stored at
/// the start of the member data.
pub const BSD_EXTENDED_NAME: &[u8] = b"#1/";

/// The longest name that a GNU archive stores inline.
///
/// The name is followed by a `/`, so one byte of the field is lost.
pub const GNU_MAX_INLINE_NAME: usize = 15;

/// The longest name that a BSD archive stores inline.
pub const BSD_MAX_INLINE_NAME: usize = 16;

/// The mode of the GNU string table member.
pub const GNU_STRING_TABLE_MODE: u32 = 0o420;

/// The header at the start of an archive member, as stored in the file.
///
/// All fields are ASCII and padded with spaces.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct RawHeader {
    /// The file name.
    pub name: [u8; 16],
    /// File modification timestamp in decimal.
    pub date: [u8; 12],
    /// User ID in decimal.
    pub uid: [u8; 6],
    /// Group ID in decimal.
    pub gid: [u8; 6],
    /// File mode in octal.
    pub mode: [u8; 8],
    /// File size in decimal.
    pub size: [u8; 10],
    /// Must be equal to `TERMINATOR`.
    pub terminator: [u8; 2],
}

unsafe_impl_pod!(RawHeader);

/// The variant of the archive format.
///
/// The variants differ in how they store member names that do not fit in
/// the header, and in the names of their special members.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// The BSD archive format.
    ///
    /// Long names are stored at the start of the member data, and the
    /// symbol table is named `__.SYMDEF`.
    #[default]
    Bsd,
    /// The GNU (or System V) archive format.
    ///
    /// Long names are stored in a `//` string table member, and the symbol
    /// table is named `/`.
    Gnu,
}

impl Variant {
    /// Guess the variant from the name field of the first member header.
    ///
    /// GNU names either begin with `/` (special members and long names) or
    /// end with `/`. Anything else is assumed to be BSD, including an empty
    /// archive.
    pub fn detect(name_field: &[u8]) -> Variant {
        let name = trim_spaces(name_field);
        match (name.first().copied(), name.last().copied()) {
            (Some(b'/'), _) | (_, Some(b'/')) => Variant::Gnu,
            _ => Variant::Bsd,
        }
    }

    /// Return true if `name` is the name of a symbol table member in this variant.
    pub fn is_symbol_table(self, name: &[u8]) -> bool {
        match self {
            Variant::Gnu => name == GNU_SYMBOL_TABLE || name == GNU_SYMBOL_TABLE_64,
            Variant::Bsd => BSD_SYMBOL_TABLES.iter().any(|&table| table == name),
        }
    }
}

/// Remove trailing space padding from a header field.
pub(crate) fn trim_spaces(field: &[u8]) -> &[u8] {
    let len = field.iter().rposition(|&c| c != b' ').map_or(0, |i| i + 1);
    &field[..len]
}
