use indexmap::IndexMap;

/// A builder for the GNU string table.
///
/// Each name is stored once, followed by `/\n`. Names keep the order in
/// which they were first added.
#[derive(Debug, Default)]
pub(crate) struct StringTable {
    offsets: IndexMap<Vec<u8>, usize>,
    data: Vec<u8>,
}

impl StringTable {
    /// Create an empty string table.
    pub fn new() -> Self {
        StringTable::default()
    }

    /// Add a name to the table if it is not already present.
    ///
    /// Returns the offset of the name's entry.
    pub fn add(&mut self, name: &[u8]) -> usize {
        if let Some(&offset) = self.offsets.get(name) {
            return offset;
        }
        let offset = self.data.len();
        self.data.extend_from_slice(name);
        self.data.extend_from_slice(b"/\n");
        self.offsets.insert(name.to_vec(), offset);
        offset
    }

    /// Return the offset of the entry for `name`.
    pub fn get(&self, name: &[u8]) -> Option<usize> {
        self.offsets.get(name).copied()
    }

    /// The encoded table.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The length in bytes of the encoded table.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Return true if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
