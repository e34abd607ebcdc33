use std::fmt::{self, Debug, Formatter};

use crate::value::{eq_ignore_case, RouteValue};

/// The values produced by matching a route pattern against a request path.
///
/// Keys are compared ordinally, ignoring case, and iteration yields entries
/// in insertion order. Route maps are small, so the map is a plain vector
/// underneath; lookups probe linearly, which also keeps iteration
/// deterministic for tests and diagnostics.
///
/// A map is produced fresh for every successful match and owned exclusively
/// by the request that receives it.
#[derive(Default, Clone)]
pub struct RouteValueMap {
    entries: Vec<(String, RouteValue)>,
}

impl RouteValueMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any entry whose key matches ignoring
    /// case. A replaced entry keeps its position and original key casing.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RouteValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| eq_ignore_case(k, &name)) {
            Some((_, v)) => *v = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Returns the value for `name`, comparing keys ignoring case.
    ///
    /// `None` means the name is absent, which is distinct from a present
    /// [`RouteValue::Null`].
    pub fn get(&self, name: &str) -> Option<&RouteValue> {
        self.entries
            .iter()
            .find(|(k, _)| eq_ignore_case(k, name))
            .map(|(_, v)| v)
    }

    /// Returns the value for `name` when it is a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(RouteValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns `true` when `name` is present, ignoring case.
    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes and returns the value for `name`, ignoring case.
    pub fn remove(&mut self, name: &str) -> Option<RouteValue> {
        let pos = self.entries.iter().position(|(k, _)| eq_ignore_case(k, name))?;
        Some(self.entries.remove(pos).1)
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Debug for RouteValueMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl PartialEq for RouteValueMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |o| o == v))
    }
}

impl<K, V> FromIterator<(K, V)> for RouteValueMap
where
    K: Into<String>,
    V: Into<RouteValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = RouteValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<K, V> Extend<(K, V)> for RouteValueMap
where
    K: Into<String>,
    V: Into<RouteValue>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}
