use hashbrown::HashMap;

/// An error returned by [`desymbolize_labels`] for references that do not form labels.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DesymbolizeError {
    /// A reference points past the end of the symbol table.
    #[error("symbol reference {reference} out of range, table has {len} symbols")]
    OutOfRange {
        /// The offending reference.
        reference: u32,
        /// Number of symbols in the table.
        len: usize,
    },
    /// References must come in name and value pairs.
    #[error("odd number of label references: {0}")]
    OddCount(usize),
}

/// Interns strings for the 2.0 protocol.
///
/// Every distinct string gets a reference, which is its index in [`symbols`](Self::symbols). The
/// empty string always has reference `0`. A table is meant to be built for one request, then
/// [`reset`](Self::reset) and reused for the next.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    symbols: Vec<String>,
    refs: HashMap<String, u32>,
}

impl SymbolTable {
    /// Creates a table containing only the empty string.
    pub fn new() -> Self {
        let mut table = Self {
            symbols: Vec::new(),
            refs: HashMap::new(),
        };
        table.reset();
        table
    }

    /// Returns the reference of `symbol`, adding it to the table if it is new.
    pub fn symbolize(&mut self, symbol: &str) -> u32 {
        if let Some(&reference) = self.refs.get(symbol) {
            return reference;
        }

        let reference = self.symbols.len() as u32;
        self.symbols.push(symbol.to_owned());
        self.refs.insert(symbol.to_owned(), reference);
        reference
    }

    /// Symbolizes a flat list of alternating label names and values.
    ///
    /// The references are written into `buf`, which is cleared first and returned. The result has
    /// twice as many entries as there are labels. A trailing name without a value is paired with
    /// the empty string.
    pub fn symbolize_labels<S: AsRef<str>>(&mut self, labels: &[S], mut buf: Vec<u32>) -> Vec<u32> {
        buf.clear();
        buf.reserve(labels.len() + labels.len() % 2);

        for pair in labels.chunks(2) {
            buf.push(self.symbolize(pair[0].as_ref()));
            buf.push(pair.get(1).map_or(0, |value| self.symbolize(value.as_ref())));
        }

        buf
    }

    /// Returns all symbols in the order they were added.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Removes all symbols except the empty string.
    pub fn reset(&mut self) {
        self.symbols.clear();
        self.refs.clear();
        self.symbols.push(String::new());
        self.refs.insert(String::new(), 0);
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves label references against `symbols`.
///
/// The flat list of alternating names and values is written into `buf`, whose strings are reused
/// where possible. The buffer is returned on success.
pub fn desymbolize_labels(
    refs: &[u32],
    symbols: &[String],
    mut buf: Vec<String>,
) -> Result<Vec<String>, DesymbolizeError> {
    if refs.len() % 2 != 0 {
        return Err(DesymbolizeError::OddCount(refs.len()));
    }

    buf.truncate(refs.len());
    for (index, &reference) in refs.iter().enumerate() {
        let symbol = symbols
            .get(reference as usize)
            .ok_or(DesymbolizeError::OutOfRange {
                reference,
                len: symbols.len(),
            })?;

        match buf.get_mut(index) {
            Some(slot) => symbol.clone_into(slot),
            None => buf.push(symbol.clone()),
        }
    }

    Ok(buf)
}
