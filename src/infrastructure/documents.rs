//! Raw documents as the realtime store sees them

use serde_json::{Map, Value};

/// A stored document. `id` lives outside `fields`, the way the store keys it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Looks up a dotted field path such as `firstParticipant.id`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.fields, path)
    }
}

/// A value to write at a field path. Sentinels are resolved by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Set(Value),
    /// Replaced by the store's commit time, in microseconds since the epoch.
    ServerTimestamp,
    /// Added to the current numeric value; missing fields count as zero.
    Increment(i64),
}

/// An ordered list of field writes, applied in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldWrites {
    writes: Vec<(String, FieldValue)>,
}

impl FieldWrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.writes
            .push((path.into(), FieldValue::Set(value.into())));
        self
    }

    pub fn server_timestamp(mut self, path: impl Into<String>) -> Self {
        self.writes.push((path.into(), FieldValue::ServerTimestamp));
        self
    }

    pub fn increment(mut self, path: impl Into<String>, delta: i64) -> Self {
        self.writes.push((path.into(), FieldValue::Increment(delta)));
        self
    }

    /// The last write queued for `path`, if any.
    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        self.writes
            .iter()
            .rev()
            .find(|(candidate, _)| candidate == path)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.writes
            .iter()
            .map(|(path, value)| (path.as_str(), value))
    }

    /// Resolves every write against `fields`. `now` is used for all server timestamps, so
    /// several timestamp fields written together carry the same value.
    pub fn apply_to(&self, fields: &mut Map<String, Value>, now: i64) {
        for (path, value) in &self.writes {
            let resolved = match value {
                FieldValue::Set(value) => value.clone(),
                FieldValue::ServerTimestamp => Value::from(now),
                FieldValue::Increment(delta) => {
                    let current = lookup(fields, path).and_then(Value::as_i64).unwrap_or(0);
                    Value::from(current + delta)
                }
            };
            set_path(fields, path, resolved);
        }
    }
}

pub fn lookup<'a>(fields: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    match path.split_once('.') {
        None => fields.get(path),
        Some((head, rest)) => match fields.get(head)? {
            Value::Object(child) => lookup(child, rest),
            _ => None,
        },
    }
}

/// Writes `value` at a dotted path, creating (or replacing non-object) parents.
pub fn set_path(fields: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            fields.insert(path.to_owned(), value);
        }
        Some((head, rest)) => {
            let child = fields
                .entry(head.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child) = child {
                set_path(child, rest, value);
            }
        }
    }
}
