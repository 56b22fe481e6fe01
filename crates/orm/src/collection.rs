//! Ordered model collections
//!
//! [`Collection`] keeps result order. Keyed and grouped views compare keys
//! with [`key_of`], so an integer `5` and the string `"5"` land in the same
//! bucket.

use std::slice;

use indexmap::IndexMap;
use serde_json::Value;

use crate::model::Record;

/// Ordered list of models
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn into_first(self) -> Option<T> {
        self.items.into_iter().next()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn count(&self) -> usize {
        self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_not_empty(&self) -> bool {
        !self.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Collection<U> {
        self.items.into_iter().map(f).collect()
    }

    pub fn filter<F: FnMut(&T) -> bool>(self, mut predicate: F) -> Self {
        self.items.into_iter().filter(|item| predicate(item)).collect()
    }

    pub fn find<F: FnMut(&T) -> bool>(&self, mut predicate: F) -> Option<&T> {
        self.items.iter().find(|item| predicate(item))
    }

    pub fn each<F: FnMut(&T)>(&self, f: F) {
        self.items.iter().for_each(f);
    }

    pub fn sort_by<F>(mut self, compare: F) -> Self
    where
        F: FnMut(&T, &T) -> std::cmp::Ordering,
    {
        self.items.sort_by(compare);
        self
    }

    /// Split into collections of at most `size` items; a size of 0 yields
    /// no chunks
    pub fn chunk(self, size: usize) -> Vec<Collection<T>>
    where
        T: Clone,
    {
        if size == 0 {
            return Vec::new();
        }
        self.items
            .chunks(size)
            .map(|chunk| Collection::from(chunk.to_vec()))
            .collect()
    }
}

impl<T: AsRef<Record>> Collection<T> {
    /// Attribute values in order, `Null` where missing
    pub fn pluck(&self, column: &str) -> Vec<Value> {
        self.items
            .iter()
            .map(|item| item.as_ref().get_attribute(column).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Distinct non-null attribute values in first-seen order
    pub fn unique_values(&self, column: &str) -> Vec<Value> {
        let mut seen: IndexMap<String, Value> = IndexMap::new();
        for item in &self.items {
            if let Some(value) = item.as_ref().get_attribute(column) {
                if let Some(key) = key_of(value) {
                    seen.entry(key).or_insert_with(|| value.clone());
                }
            }
        }
        seen.into_values().collect()
    }

    /// Index by attribute; later items win on duplicate keys
    pub fn key_by(&self, column: &str) -> IndexMap<String, &T> {
        self.items
            .iter()
            .filter_map(|item| {
                let key = item.as_ref().get_attribute(column).and_then(key_of)?;
                Some((key, item))
            })
            .collect()
    }

    /// Group by attribute, keeping order within each group
    pub fn group_by(&self, column: &str) -> IndexMap<String, Collection<T>>
    where
        T: Clone,
    {
        let mut groups: IndexMap<String, Collection<T>> = IndexMap::new();
        for item in &self.items {
            if let Some(key) = item.as_ref().get_attribute(column).and_then(key_of) {
                groups.entry(key).or_default().push(item.clone());
            }
        }
        groups
    }

    pub fn to_json(&self) -> Value {
        Value::Array(self.items.iter().map(|item| item.as_ref().to_json()).collect())
    }
}

/// Comparable key of an attribute value. `None` for null, which never
/// matches anything.
pub fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            match trimmed.parse::<i64>() {
                Ok(n) => Some(n.to_string()),
                Err(_) => Some(s.clone()),
            }
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i.to_string()),
            None => Some(n.to_string()),
        },
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        other => Some(other.to_string()),
    }
}

impl<T> From<Vec<T>> for Collection<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
