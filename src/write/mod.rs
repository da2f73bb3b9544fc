//! Interface for writing archives.

mod string_table;
pub(crate) use string_table::StringTable;

mod writer;
pub use writer::Writer;
