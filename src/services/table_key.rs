//! Remount keys: a string identity derived from the filter record of a table,
//! so the widget drops its sort and page state whenever the filters change.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Write;
use std::sync::Arc;

use super::error_handling::Result;

/// Deterministic key for `dependencies`.
///
/// Entries are ordered by key and nested objects are canonicalised, so two
/// records produce the same key exactly when they are deeply equal.
pub fn compute_table_key(dependencies: &Map<String, Value>) -> String {
    let mut entries: Vec<(&String, &Value)> = dependencies.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut key = String::new();
    for (i, (name, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            key.push('|');
        }
        write_json_string(&mut key, name);
        key.push(':');
        write_canonical(&mut key, value);
    }
    key
}

/// Key for any serializable record. Non-object values are keyed as a single
/// anonymous entry.
pub fn table_key_for<T: Serialize + ?Sized>(dependencies: &T) -> Result<String> {
    match serde_json::to_value(dependencies)? {
        Value::Object(map) => Ok(compute_table_key(&map)),
        Value::Null => Ok(String::new()),
        other => {
            let mut key = String::new();
            write_canonical(&mut key, &other);
            Ok(key)
        }
    }
}

/// Memoises the key on its content: repeated calls with equal records hand
/// back the same `Arc`, even when the record itself is rebuilt every time.
#[derive(Debug, Default)]
pub struct TableKeyMemo {
    last: Option<Arc<str>>,
}

impl TableKeyMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(&mut self, dependencies: &Map<String, Value>) -> Arc<str> {
        let key = compute_table_key(dependencies);
        match &self.last {
            Some(previous) if **previous == *key => Arc::clone(previous),
            _ => {
                let key: Arc<str> = Arc::from(key);
                self.last = Some(Arc::clone(&key));
                key
            }
        }
    }

    pub fn current(&self) -> Option<Arc<str>> {
        self.last.clone()
    }
}

fn write_json_string(out: &mut String, text: &str) {
    let _ = write!(out, "{}", Value::String(text.to_owned()));
}

fn write_canonical(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (name, inner)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json_string(out, name);
                out.push(':');
                write_canonical(out, inner);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        scalar => {
            let _ = write!(out, "{scalar}");
        }
    }
}
