//! Frame property map.
//!
//! Per-frame key/value metadata written by per-frame programs through the
//! property writer builtins. Insertion order is preserved so hosts see
//! deterministic property enumeration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropValue {
    Int(i64),
    Float(f64),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
}

/// Ordered property map. Writes are last-write-wins per key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyMap {
    entries: IndexMap<String, PropValue>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.entries.insert(key.to_string(), PropValue::Int(value));
    }

    pub fn set_float(&mut self, key: &str, value: f64) {
        self.entries
            .insert(key.to_string(), PropValue::Float(value));
    }

    /// Append to an int array property. A fresh array is started when the
    /// key is absent or currently holds a non-array value.
    pub fn append_int(&mut self, key: &str, value: i64) {
        match self.entries.get_mut(key) {
            Some(PropValue::IntArray(values)) => values.push(value),
            _ => {
                self.entries
                    .insert(key.to_string(), PropValue::IntArray(vec![value]));
            }
        }
    }

    /// Append to a float array property, with the same replacement rule as
    /// [`PropertyMap::append_int`].
    pub fn append_float(&mut self, key: &str, value: f64) {
        match self.entries.get_mut(key) {
            Some(PropValue::FloatArray(values)) => values.push(value),
            _ => {
                self.entries
                    .insert(key.to_string(), PropValue::FloatArray(vec![value]));
            }
        }
    }

    /// Remove a key. Removing an absent key is a no-op.
    pub fn remove(&mut self, key: &str) {
        self.entries.shift_remove(key);
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let mut props = PropertyMap::new();
        props.set_int("brightness", 3);
        props.set_float("brightness", 0.5);
        assert_eq!(props.get("brightness"), Some(&PropValue::Float(0.5)));
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_append_accumulates_into_an_array() {
        let mut props = PropertyMap::new();
        props.append_int("hist", 4);
        props.append_int("hist", 7);
        assert_eq!(props.get("hist"), Some(&PropValue::IntArray(vec![4, 7])));

        props.append_float("weights", 0.25);
        props.append_float("weights", 0.75);
        assert_eq!(
            props.get("weights"),
            Some(&PropValue::FloatArray(vec![0.25, 0.75]))
        );
    }

    #[test]
    fn test_append_over_scalar_starts_a_fresh_array() {
        let mut props = PropertyMap::new();
        props.set_int("x", 1);
        props.append_int("x", 2);
        assert_eq!(props.get("x"), Some(&PropValue::IntArray(vec![2])));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut props = PropertyMap::new();
        props.remove("missing");
        assert!(props.is_empty());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut props = PropertyMap::new();
        props.set_int("b", 1);
        props.set_int("a", 2);
        let keys: Vec<&str> = props.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
