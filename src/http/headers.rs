/// Ordered, case-insensitive, multi-valued header collection.
///
/// Used for both request and response headers. Lookups ignore key casing;
/// iteration yields values in insertion order under the first-seen casing of
/// each key. [`HeaderMap::set`] replaces, while [`HeaderMap::extend_raw`]
/// accumulates; the latter is the path raw wire headers take, where
/// repeated names (e.g. multiple `Set-Cookie` lines) are legal.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    entries: Vec<Entry>,
}

#[derive(Debug, Clone)]
struct Entry {
    lower: String,
    name: String,
    values: Vec<String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values (not distinct keys).
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.values.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the key is present, including keys cleared via [`HeaderMap::unset`].
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Replace all values for the key, remembering the first-seen casing.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.find_mut(&name) {
            Some(entry) => entry.values = vec![value],
            None => self.entries.push(Entry {
                lower: name.to_ascii_lowercase(),
                name,
                values: vec![value],
            }),
        }
    }

    /// Mark the key present with no values.
    ///
    /// A cleared key is never emitted on the wire but still counts as
    /// present, which lets callers suppress a default the client would
    /// otherwise fill in (Host, Content-Length, Authorization).
    pub fn unset(&mut self, name: impl Into<String>) {
        let name = name.into();
        match self.find_mut(&name) {
            Some(entry) => entry.values.clear(),
            None => self.entries.push(Entry {
                lower: name.to_ascii_lowercase(),
                name,
                values: Vec::new(),
            }),
        }
    }

    /// First value for the key, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.find(name)
            .and_then(|e| e.values.first())
            .map(String::as_str)
    }

    /// Every value for the key in insertion order.
    pub fn get_all(&self, name: &str) -> Option<&[String]> {
        self.find(name).map(|e| e.values.as_slice())
    }

    /// Remove the key entirely.
    pub fn remove(&mut self, name: &str) {
        let lower = name.to_ascii_lowercase();
        self.entries.retain(|e| e.lower != lower);
    }

    /// Accumulating bulk load used when absorbing headers parsed off the
    /// wire. Unlike [`HeaderMap::set`], an already-present key gains an
    /// additional value instead of being replaced.
    pub fn extend_raw<K, V, I>(&mut self, pairs: I)
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (name, value) in pairs {
            let name = name.into();
            let value = value.into();
            match self.find_mut(&name) {
                Some(entry) => entry.values.push(value),
                None => self.entries.push(Entry {
                    lower: name.to_ascii_lowercase(),
                    name,
                    values: vec![value],
                }),
            }
        }
    }

    /// Iterate `(name, value)` pairs, one per stored value, in insertion
    /// order, under each key's first-seen casing.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|e| {
            e.values.iter().map(move |v| (e.name.as_str(), v.as_str()))
        })
    }

    /// Iterate distinct keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    fn find(&self, name: &str) -> Option<&Entry> {
        let lower = name.to_ascii_lowercase();
        self.entries.iter().find(|e| e.lower == lower)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut Entry> {
        let lower = name.to_ascii_lowercase();
        self.entries.iter_mut().find(|e| e.lower == lower)
    }
}

/// Equality over the lowercased key → values mapping; original casing and
/// entry order do not participate.
impl PartialEq for HeaderMap {
    fn eq(&self, other: &Self) -> bool {
        let canonical = |map: &HeaderMap| {
            let mut pairs: Vec<(String, Vec<String>)> = map
                .entries
                .iter()
                .map(|e| (e.lower.clone(), e.values.clone()))
                .collect();
            pairs.sort();
            pairs
        };
        canonical(self) == canonical(other)
    }
}

impl Eq for HeaderMap {}

/// Dict-like construction: duplicate keys replace rather than accumulate.
impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (name, value) in iter {
            map.set(name, value);
        }
        map
    }
}
