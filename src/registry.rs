use std::collections::HashMap;

/// An insertion-ordered table mapping many alias names to one value.
///
/// Every alias of a registered entry resolves to the same value. Iteration
/// yields values in registration order, which is what help rendering
/// wants; name lookups go through a side index and are O(1).
#[derive(Clone, Debug)]
pub struct Registry<V> {
    entries: Vec<V>,
    index: HashMap<String, usize>,
}

impl<V> Registry<V> {
    pub fn new() -> Registry<V> {
        Registry { entries: Vec::new(), index: HashMap::new() }
    }

    /// Registers `value` under every name in `names`. If any name is
    /// already taken the whole insertion is rejected and the offending
    /// name returned; no alias is kept.
    pub fn insert(&mut self, names: &[String], value: V) -> Result<(), String> {
        for name in names {
            if self.index.contains_key(name) {
                return Err(name.clone());
            }
        }
        let at = self.entries.len();
        self.entries.push(value);
        for name in names {
            self.index.insert(name.clone(), at);
        }
        Ok(())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Looks up the entry registered under the bare single-character
    /// name, as used by short-option bundling.
    pub fn single(&self, ch: char) -> Option<usize> {
        let mut buf = [0u8; 4];
        self.index_of(ch.encode_utf8(&mut buf))
    }

    pub fn at(&self, index: usize) -> &V {
        &self.entries[index]
    }

    pub fn at_mut(&mut self, index: usize) -> &mut V {
        &mut self.entries[index]
    }

    /// All registered values, in registration order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter()
    }

    /// All registered alias names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }
}
