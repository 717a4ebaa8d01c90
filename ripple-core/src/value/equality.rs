//! Deep structural equality.

use super::{Key, Value};

/// Whether `a` and `b` are deeply equal.
///
/// - Values that are the same ([`Value::same_value`]) are equal.
/// - Arrays are equal when they have the same length and equal elements.
/// - Dates compare by timestamp, regular expressions by source and flags.
/// - Plain objects are equal when they list the same enumerable keys in the
///   same order and the values under each key are equal. Accessors are read
///   through their getters.
/// - Byte buffers compare byte by byte.
///
/// Everything else, including objects with a class prototype, is only equal
/// to itself.
pub fn is_equal(a: &Value, b: &Value) -> bool {
    if a.same_value(b) {
        return true;
    }

    match (a, b) {
        (Value::Array(x), Value::Array(y)) => {
            let (left, right) = (x.borrow().items.clone(), y.borrow().items.clone());
            left.len() == right.len() && left.iter().zip(&right).all(|(l, r)| is_equal(l, r))
        }
        (Value::Date(x), Value::Date(y)) => x == y,
        (Value::Bytes(x), Value::Bytes(y)) => x == y,
        (Value::Object(_), Value::Object(_)) if is_plain(a) && is_plain(b) => same_object(a, b),
        _ => false,
    }
}

/// Plain in the equality sense: inherits from `Object` itself. Objects
/// without a prototype have no constructor and do not qualify.
fn is_plain(value: &Value) -> bool {
    matches!(value, Value::Object(o) if o.borrow().prototype == super::Prototype::Object)
}

fn same_object(a: &Value, b: &Value) -> bool {
    let (left, right) = (a.keys(), b.keys());
    if left != right {
        return false;
    }

    left.iter().all(|key: &Key| is_equal(&a.get(key), &b.get(key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ObjectData, Property, Prototype};
    use std::rc::Rc;

    #[test]
    fn compares_undefined_and_null() {
        assert!(is_equal(&Value::Undefined, &Value::Undefined));
        assert!(is_equal(&Value::Null, &Value::Null));
        assert!(!is_equal(&Value::Undefined, &Value::Null));
        assert!(!is_equal(&Value::Null, &Value::object::<&str, i32>([])));
    }

    #[test]
    fn compares_simple_values() {
        assert!(is_equal(&Value::from(1), &Value::from(1)));
        assert!(!is_equal(&Value::from(1), &Value::from(2)));
        assert!(is_equal(&Value::from("a"), &Value::from("a")));
        assert!(!is_equal(&Value::from("1"), &Value::from(1)));
        assert!(is_equal(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));
    }

    #[test]
    fn deep_compares_objects() {
        let a = Value::object([("a", Value::from(1)), ("b", Value::object([("c", 2)]))]);
        let b = Value::object([("a", Value::from(1)), ("b", Value::object([("c", 2)]))]);
        let c = Value::object([("a", Value::from(1)), ("b", Value::object([("c", 3)]))]);

        assert!(is_equal(&a, &b));
        assert!(!is_equal(&a, &c));
    }

    #[test]
    fn key_order_matters() {
        let a = Value::object([("a", 1), ("b", 2)]);
        let b = Value::object([("b", 2), ("a", 1)]);
        assert!(!is_equal(&a, &b));
    }

    #[test]
    fn compares_nested_arrays() {
        let a = Value::array([Value::array([1, 2]), Value::object([("x", 3)])]);
        let b = Value::array([Value::array([1, 2]), Value::object([("x", 3)])]);
        let c = Value::array([Value::array([1, 2, 3])]);

        assert!(is_equal(&a, &b));
        assert!(!is_equal(&a, &c));
    }

    #[test]
    fn compares_dates_and_regexps() {
        assert!(is_equal(&Value::date(1_000.0), &Value::date(1_000.0)));
        assert!(!is_equal(&Value::date(1_000.0), &Value::date(2_000.0)));
        assert!(is_equal(&Value::regexp("a+", "g"), &Value::regexp("a+", "g")));
        assert!(!is_equal(&Value::regexp("a+", "g"), &Value::regexp("a+", "i")));
    }

    #[test]
    fn compares_byte_buffers() {
        let a = Value::bytes(vec![1, 2, 3]);
        let b = Value::bytes(vec![1, 2, 3]);
        let c = Value::bytes(vec![1, 2]);

        assert!(is_equal(&a, &b));
        assert!(!is_equal(&a, &c));
    }

    #[test]
    fn class_instances_are_only_equal_to_themselves() {
        let instance = || {
            let mut data = ObjectData::with_prototype(Prototype::Class("Error".into()));
            data.properties.insert("message".into(), Property::data("test error"));
            Value::object_from(data)
        };

        let a = instance();
        assert!(is_equal(&a, &a.clone()));
        assert!(!is_equal(&a, &instance()));
    }

    #[test]
    fn null_prototype_objects_are_not_compared_structurally() {
        let a = Value::object_from(ObjectData::with_prototype(Prototype::Null));
        let b = Value::object_from(ObjectData::with_prototype(Prototype::Null));
        assert!(!is_equal(&a, &b));
    }

    #[test]
    fn accessors_are_compared_by_result() {
        let getter: crate::value::Getter = Rc::new(|_: &Value| Value::from(7));
        let mut data = ObjectData::new();
        data.properties
            .insert("seven".into(), Property::accessor(Some(getter), None));

        let a = Value::object_from(data);
        let b = Value::object([("seven", 7)]);
        assert!(is_equal(&a, &b));
    }
}
