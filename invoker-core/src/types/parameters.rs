//! Parameter sets passed to an invocation.
//!
//! A [`ParameterSet`] maps argument names to JSON values. Null is a value
//! like any other: `{"first": null}` and `{}` are different sets.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Named arguments of a single invocation.
///
/// Equality is structural and ignores insertion order. [`Hash`] agrees with
/// equality, so a parameter set can key a map directly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<String, Value>,
}

impl ParameterSet {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a parameter, returning the previous value if the name was present.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    /// Returns the value bound to `name`, `Some(&Value::Null)` for an explicit null.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns true if `name` is present, even when bound to null.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of parameters, null-valued ones included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no parameters at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns true if at least one parameter carries a non-null value.
    pub fn has_input(&self) -> bool {
        self.values.values().any(|v| !v.is_null())
    }
}

impl Hash for ParameterSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.values.len());
        for (name, value) in &self.values {
            name.hash(state);
            hash_value(value, state);
        }
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => state.write_u8(0),
        Value::Bool(b) => {
            state.write_u8(1);
            b.hash(state);
        }
        Value::Number(n) => {
            state.write_u8(2);
            hash_number(n, state);
        }
        Value::String(s) => {
            state.write_u8(3);
            s.hash(state);
        }
        Value::Array(items) => {
            state.write_u8(4);
            state.write_usize(items.len());
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Object(map) => {
            state.write_u8(5);
            state.write_usize(map.len());
            // Map iteration order depends on serde_json features; equality does not.
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            for (k, v) in entries {
                k.hash(state);
                hash_value(v, state);
            }
        }
    }
}

fn hash_number<H: Hasher>(n: &Number, state: &mut H) {
    if let Some(u) = n.as_u64() {
        state.write_u8(0);
        state.write_u64(u);
    } else if let Some(i) = n.as_i64() {
        state.write_u8(1);
        state.write_i64(i);
    } else if let Some(f) = n.as_f64() {
        state.write_u8(2);
        // 0.0 == -0.0
        let f = if f == 0.0 { 0.0 } else { f };
        state.write_u64(f.to_bits());
    }
}

impl From<BTreeMap<String, Value>> for ParameterSet {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    use proptest::prelude::*;
    use serde_json::json;
    use test_case::test_case;

    fn hash_of(params: &ParameterSet) -> u64 {
        let mut hasher = DefaultHasher::new();
        params.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_null_values_are_part_of_the_key() {
        let empty = ParameterSet::new();
        let nulls = ParameterSet::new()
            .with("first", Value::Null)
            .with("second", Value::Null);

        assert_ne!(empty, nulls);
        assert_eq!(nulls.len(), 2);
        assert!(nulls.contains("first"));
        assert_eq!(nulls.get("first"), Some(&Value::Null));
        assert_eq!(nulls.get("third"), None);
    }

    #[test]
    fn test_extra_null_entry_is_a_different_set() {
        let base = ParameterSet::new().with("test", "value");
        let extended = base.clone().with("something", Value::Null);
        assert_ne!(base, extended);
    }

    #[test]
    fn test_insertion_order_is_irrelevant() {
        let a = ParameterSet::new().with("x", 1).with("y", "two");
        let b = ParameterSet::new().with("y", "two").with("x", 1);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_nested_objects_hash_structurally() {
        let a = ParameterSet::new().with("filter", json!({"b": [1, 2], "a": null}));
        let b = ParameterSet::new().with("filter", json!({"a": null, "b": [1, 2]}));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_signed_zero_hashes_equal() {
        let a = ParameterSet::new().with("z", 0.0);
        let b = ParameterSet::new().with("z", -0.0);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test_case(ParameterSet::new(), false ; "empty")]
    #[test_case(ParameterSet::new().with("a", Value::Null), false ; "only nulls")]
    #[test_case(ParameterSet::new().with("a", Value::Null).with("b", 0), true ; "one value")]
    #[test_case(ParameterSet::new().with("a", false), true ; "false is input")]
    fn test_has_input(params: ParameterSet, expected: bool) {
        assert_eq!(params.has_input(), expected);
    }

    #[test]
    fn test_json_shape() {
        let params: ParameterSet = [("name", json!("ferris")), ("age", Value::Null)]
            .into_iter()
            .collect();
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, json!({"age": null, "name": "ferris"}));

        let back: ParameterSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_iter_is_name_ordered() {
        let params = ParameterSet::new().with("b", 2).with("a", 1);
        let names: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    proptest! {
        #[test]
        fn prop_equality_and_hash_ignore_order(
            entries in proptest::collection::btree_map("[a-z]{1,6}", proptest::option::of(any::<i64>()), 0..8)
        ) {
            let forward: ParameterSet = entries.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
            let backward: ParameterSet = entries.iter().rev().map(|(k, v)| (k.clone(), json!(v))).collect();
            prop_assert_eq!(&forward, &backward);
            prop_assert_eq!(hash_of(&forward), hash_of(&backward));
        }

        #[test]
        fn prop_adding_a_null_changes_the_set(
            entries in proptest::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..8)
        ) {
            let base: ParameterSet = entries.iter().map(|(k, v)| (k.clone(), *v)).collect();
            let extended = base.clone().with("ZZ_extra", Value::Null);
            prop_assert_ne!(base, extended);
        }
    }
}
