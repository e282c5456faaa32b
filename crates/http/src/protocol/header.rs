//! Insertion-ordered, case-insensitive, multi-value header container.
//!
//! [`HeaderMap`] is used on both sides of a connection: the request parser
//! fills one with [`HeaderMap::add`] so repeated headers survive in arrival
//! order, and a [`Response`](crate::protocol::Response) serializes one line
//! per stored value.
//!
//! Names are lower-cased on the way in, so every lookup is case-insensitive.
//! [`HeaderMap::get`] answers with the *last* value stored under a name,
//! which is what most single-valued headers want when a peer repeats them.

use std::fmt;

/// A header map keyed by lower-cased name, keeping every value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, Vec<String>)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` under `name`, keeping any values already present.
    pub fn add<N, V>(&mut self, name: N, value: V)
    where
        N: AsRef<str>,
        V: Into<String>,
    {
        let name = name.as_ref().to_ascii_lowercase();
        match self.position(&name) {
            Some(index) => self.entries[index].1.push(value.into()),
            None => self.entries.push((name, vec![value.into()])),
        }
    }

    /// Replaces every value under `name` with the single `value`.
    ///
    /// The name keeps its original position if it was already present.
    pub fn set<N, V>(&mut self, name: N, value: V)
    where
        N: AsRef<str>,
        V: Into<String>,
    {
        let name = name.as_ref().to_ascii_lowercase();
        match self.position(&name) {
            Some(index) => self.entries[index].1 = vec![value.into()],
            None => self.entries.push((name, vec![value.into()])),
        }
    }

    /// Returns the last value added under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).last().map(String::as_str)
    }

    /// Returns every value under `name` in insertion order, or an empty slice.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.lookup(name).map(|(_, values)| values.as_slice()).unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Removes `name`, returning its values if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        let index = self.entries.iter().position(|(key, _)| key.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(index).1)
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, value)` pairs, one per stored value.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().flat_map(|(name, values)| values.iter().map(move |value| (name.as_str(), value.as_str())))
    }

    fn position(&self, lower_name: &str) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key == lower_name)
    }

    fn lookup(&self, name: &str) -> Option<&(String, Vec<String>)> {
        self.entries.iter().find(|(key, _)| key.eq_ignore_ascii_case(name))
    }
}

impl fmt::Debug for HeaderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<N: AsRef<str>, V: Into<String>> FromIterator<(N, V)> for HeaderMap {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut headers = HeaderMap::new();
        headers.extend(iter);
        headers
    }
}

impl<N: AsRef<str>, V: Into<String>> Extend<(N, V)> for HeaderMap {
    fn extend<T: IntoIterator<Item = (N, V)>>(&mut self, iter: T) {
        for (name, value) in iter {
            self.add(name, value);
        }
    }
}
