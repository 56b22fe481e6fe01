//! Attribute storage shared by every model
//!
//! A [`Record`] holds the current attributes, the snapshot taken when it was
//! last loaded or saved, the cache of resolved relations and whether it
//! exists in the database. Typed models are thin wrappers around one.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::backends::Row;
use crate::collection::Collection;

/// A resolved relation value
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    One(Option<Record>),
    Many(Collection<Record>),
}

impl Related {
    pub fn as_one(&self) -> Option<&Record> {
        match self {
            Related::One(record) => record.as_ref(),
            Related::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> Option<&Collection<Record>> {
        match self {
            Related::Many(records) => Some(records),
            Related::One(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Related::One(Some(record)) => record.to_json(),
            Related::One(None) => Value::Null,
            Related::Many(records) => records.to_json(),
        }
    }
}

/// Result of the attribute-then-relation lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    Attribute(&'a Value),
    Relation(&'a Related),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    attributes: IndexMap<String, Value>,
    original: IndexMap<String, Value>,
    relations: IndexMap<String, Related>,
    exists: bool,
}

impl Record {
    /// A new, unsaved record
    pub fn new() -> Self {
        Self::default()
    }

    /// A new, unsaved record with attributes filled in
    pub fn from_attributes<I, K, V>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut record = Self::new();
        record.fill(attributes);
        record
    }

    /// A record loaded from the database: marked existing and snapshotted
    pub fn new_instance(row: Row) -> Self {
        Self {
            original: row.clone(),
            attributes: row,
            relations: IndexMap::new(),
            exists: true,
        }
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub(crate) fn set_exists(&mut self, exists: bool) {
        self.exists = exists;
    }

    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    pub fn original(&self) -> &IndexMap<String, Value> {
        &self.original
    }

    pub fn get_attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn set_attribute<V: Into<Value>>(&mut self, key: &str, value: V) {
        self.attributes.insert(key.to_string(), value.into());
    }

    pub fn fill<I, K, V>(&mut self, attributes: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in attributes {
            self.attributes.insert(key.into(), value.into());
        }
    }

    pub fn get_relation(&self, name: &str) -> Option<&Related> {
        self.relations.get(name)
    }

    pub fn set_relation(&mut self, name: &str, related: Related) {
        self.relations.insert(name.to_string(), related);
    }

    pub(crate) fn take_relation(&mut self, name: &str) -> Option<Related> {
        self.relations.shift_remove(name)
    }

    pub fn relation_loaded(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    pub fn relations(&self) -> &IndexMap<String, Related> {
        &self.relations
    }

    /// Attributes first, then resolved relations
    pub fn lookup(&self, key: &str) -> Option<Lookup<'_>> {
        self.attributes
            .get(key)
            .map(Lookup::Attribute)
            .or_else(|| self.relations.get(key).map(Lookup::Relation))
    }

    /// Attributes missing from the snapshot or holding a different value
    pub fn get_dirty(&self) -> IndexMap<String, Value> {
        self.attributes
            .iter()
            .filter(|(key, value)| self.original.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        self.attributes
            .iter()
            .any(|(key, value)| self.original.get(key) != Some(value))
    }

    pub fn is_attribute_dirty(&self, key: &str) -> bool {
        self.attributes.get(key) != self.original.get(key) && self.attributes.contains_key(key)
    }

    /// Take the current attributes as the persisted snapshot
    pub fn sync_original(&mut self) {
        self.original = self.attributes.clone();
    }

    /// Attributes plus loaded relations as a JSON object
    pub fn to_json(&self) -> Value {
        let mut object: Map<String, Value> = self
            .attributes
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        for (name, related) in &self.relations {
            object.insert(name.clone(), related.to_json());
        }
        Value::Object(object)
    }
}
