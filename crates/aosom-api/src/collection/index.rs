// ── Identity index ──
//
// Dual lookup (display name, unique ID) over the records returned by one
// list fetch. Built wholesale by a digest and never patched in place: an
// index is either the consistent snapshot of one list response or absent.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::warn;

use crate::error::Error;
use crate::record::{Record, key_of};
use crate::registry::ResourceSpec;

/// Which key space a lookup uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexMethod {
    /// By the user-assigned display name.
    Name,
    /// By the server-assigned unique ID.
    Id,
}

/// Snapshot of a collection list keyed two ways.
#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    records: Vec<Record>,
    /// Display names in server list order (duplicates kept).
    names: Vec<String>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
}

impl IdentityIndex {
    /// Index `records` by the name and ID fields named in `spec`.
    ///
    /// Every record must carry both fields as a string or number. When two
    /// records share a name or an ID, the later one wins the lookup slot.
    pub fn build(records: Vec<Record>, spec: &ResourceSpec) -> Result<Self, Error> {
        let mut names = Vec::with_capacity(records.len());
        let mut by_name = HashMap::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());

        for (pos, record) in records.iter().enumerate() {
            let name = identity(record, &spec.display_name)?;
            let id = identity(record, &spec.unique_id)?;

            if let Some(prev) = insert_last_wins(&mut by_name, name.clone(), pos) {
                warn!(uri = %spec.uri, name, prev, pos, "duplicate display name in list");
            }
            if let Some(prev) = insert_last_wins(&mut by_id, id.clone(), pos) {
                warn!(uri = %spec.uri, id, prev, pos, "duplicate unique id in list");
            }
            names.push(name);
        }

        Ok(Self {
            records,
            names,
            by_name,
            by_id,
        })
    }

    /// Display names in server list order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Records in server list order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn by_name(&self, name: &str) -> Option<&Record> {
        self.lookup(&self.by_name, name)
    }

    pub fn by_id(&self, id: &str) -> Option<&Record> {
        self.lookup(&self.by_id, id)
    }

    pub fn find(&self, key: &str, method: IndexMethod) -> Option<&Record> {
        match method {
            IndexMethod::Name => self.by_name(key),
            IndexMethod::Id => self.by_id(key),
        }
    }

    fn lookup(&self, map: &HashMap<String, usize>, key: &str) -> Option<&Record> {
        map.get(key).and_then(|&pos| self.records.get(pos))
    }
}

fn identity(record: &Record, field: &str) -> Result<String, Error> {
    record
        .get(field)
        .and_then(key_of)
        .ok_or_else(|| Error::Deserialization {
            message: format!("list record has no usable '{field}' field"),
            body: serde_json::Value::Object(record.clone()).to_string(),
        })
}

/// Insert, returning the displaced position if the key was already taken.
fn insert_last_wins(map: &mut HashMap<String, usize>, key: String, pos: usize) -> Option<usize> {
    match map.entry(key) {
        Entry::Occupied(mut slot) => Some(slot.insert(pos)),
        Entry::Vacant(slot) => {
            slot.insert(pos);
            None
        }
    }
}
