use std::hash::{Hash, Hasher};

use ahash::{AHashSet, AHasher};
use num_cmp::NumCmp;
use serde_json::{Map, Number, Value};

// Up to this length a pairwise scan beats hashing
const ITEMS_SIZE_THRESHOLD: usize = 15;

/// Deep equality where numbers compare by value, so `1` equals `1.0`.
pub(crate) fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(left), Value::String(right)) => left == right,
        (Value::Bool(left), Value::Bool(right)) => left == right,
        (Value::Null, Value::Null) => true,
        (Value::Number(left), Value::Number(right)) => equal_numbers(left, right),
        (Value::Array(left), Value::Array(right)) => equal_arrays(left, right),
        (Value::Object(left), Value::Object(right)) => equal_objects(left, right),
        (_, _) => false,
    }
}

#[inline]
pub(crate) fn equal_arrays(left: &[Value], right: &[Value]) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(left, right)| equal(left, right))
}

#[inline]
pub(crate) fn equal_objects(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .all(|(key, value)| right.get(key).is_some_and(|other| equal(value, other)))
}

pub(crate) fn equal_numbers(left: &Number, right: &Number) -> bool {
    if let Some(left) = left.as_u64() {
        equal_to(left, right)
    } else if let Some(left) = left.as_i64() {
        equal_to(left, right)
    } else {
        left.as_f64().is_some_and(|left| equal_to(left, right))
    }
}

fn equal_to<T>(left: T, right: &Number) -> bool
where
    T: Copy + NumCmp<u64> + NumCmp<i64> + NumCmp<f64>,
{
    if let Some(right) = right.as_u64() {
        NumCmp::num_eq(left, right)
    } else if let Some(right) = right.as_i64() {
        NumCmp::num_eq(left, right)
    } else {
        right.as_f64().is_some_and(|right| NumCmp::num_eq(left, right))
    }
}

/// Whether no two items of `items` are equal.
pub(crate) fn is_unique(items: &[Value]) -> bool {
    match items {
        [] | [_] => true,
        [first, second] => !equal(first, second),
        [first, second, third] => !equal(first, second) && !equal(first, third) && !equal(second, third),
        _ if items.len() <= ITEMS_SIZE_THRESHOLD => items
            .iter()
            .enumerate()
            .all(|(idx, item)| items[idx + 1..].iter().all(|other| !equal(item, other))),
        _ => {
            let mut seen = AHashSet::with_capacity(items.len());
            items.iter().map(HashedValue).all(move |item| seen.insert(item))
        }
    }
}

/// A value whose `Hash` and `Eq` agree with [`equal`].
struct HashedValue<'a>(&'a Value);

impl PartialEq for HashedValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        equal(self.0, other.0)
    }
}

impl Eq for HashedValue<'_> {}

impl Hash for HashedValue<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(self.0, state);
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => state.write_u8(0),
        Value::Bool(value) => {
            state.write_u8(1);
            value.hash(state);
        }
        Value::Number(number) => {
            state.write_u8(2);
            // Numbers equal by value share their `f64` image. Adding zero folds `-0.0` into `0.0`
            let number = number.as_f64().unwrap_or_default() + 0.0;
            state.write_u64(number.to_bits());
        }
        Value::String(value) => {
            state.write_u8(3);
            value.hash(state);
        }
        Value::Array(items) => {
            state.write_u8(4);
            state.write_usize(items.len());
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Object(object) => {
            state.write_u8(5);
            // Order independent, so it does not depend on how the map stores its keys
            let mut combined = 0u64;
            for (key, value) in object {
                let mut hasher = AHasher::default();
                key.hash(&mut hasher);
                hash_value(value, &mut hasher);
                combined = combined.wrapping_add(hasher.finish());
            }
            state.write_usize(object.len());
            state.write_u64(combined);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(&json!(1), &json!(1.0), true)]
    #[test_case(&json!(-1), &json!(-1.0), true)]
    #[test_case(&json!(u64::MAX), &json!(-1), false)]
    #[test_case(&json!([1, {"a": 2.0}]), &json!([1.0, {"a": 2}]), true)]
    #[test_case(&json!({"a": 1}), &json!({"a": 1, "b": 2}), false)]
    #[test_case(&json!(false), &json!(0), false)]
    #[test_case(&json!(null), &json!(null), true)]
    fn equality(left: &Value, right: &Value, expected: bool) {
        assert_eq!(equal(left, right), expected);
        assert_eq!(equal(right, left), expected);
    }

    #[test_case(&json!([]), true)]
    #[test_case(&json!([1, "1", [1]]), true)]
    #[test_case(&json!([{"a": 1}, {"a": 1.0}]), false)]
    fn uniqueness(items: &Value, expected: bool) {
        assert_eq!(is_unique(items.as_array().expect("Array")), expected);
    }

    fn long(last: Value) -> Vec<Value> {
        let mut items: Vec<Value> = (0..40)
            .map(|idx| json!({"id": idx, "tags": [idx, "x"]}))
            .collect();
        items.push(last);
        items
    }

    #[test_case(json!({"id": 41, "tags": [41, "x"]}), true)]
    #[test_case(json!({"tags": [7.0, "x"], "id": 7.0}), false)]
    #[test_case(json!(-0.0), true)]
    fn uniqueness_of_long_arrays(last: Value, expected: bool) {
        assert_eq!(is_unique(&long(last)), expected);
    }

    #[test]
    fn long_arrays_with_numeric_duplicates() {
        let mut items: Vec<Value> = (1..=20).map(Value::from).collect();
        assert!(is_unique(&items));
        items.push(json!(20.0));
        assert!(!is_unique(&items));
        let mut zeros: Vec<Value> = (1..=20).map(Value::from).collect();
        zeros.push(json!(0));
        zeros.push(json!(-0.0));
        assert!(!is_unique(&zeros));
    }
}
