//! Dynamic Values
//!
//! Deep tracking needs to intercept every read and write of a nested
//! structure, which plain Rust types do not allow. [`Value`] is a small
//! dynamic object model whose arrays and objects are shared, identity-bearing
//! nodes that the [membrane](crate::membrane) can wrap in proxies.
//!
//! # Identity
//!
//! Cloning a `Value::Array` or `Value::Object` clones the handle, not the
//! node. Two handles to the same node are the *same value*
//! ([`Value::same_value`]); two nodes with equal contents are merely *equal*
//! ([`Value::is_equal`]).

mod equality;

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

pub use equality::is_equal;

/// Getter stored on an accessor property. Receives the object it is read
/// from.
pub type Getter = Rc<dyn Fn(&Value) -> Value>;

/// Setter stored on an accessor property. Receives the object and the new
/// value.
pub type Setter = Rc<dyn Fn(&Value, Value)>;

/// A property key.
///
/// Canonical numeric strings (`"0"`, `"12"`, not `"01"`) become indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Name(Rc<str>),
    Index(usize),
}

impl Key {
    pub fn length() -> Self {
        Key::Name("length".into())
    }

    pub fn is_length(&self) -> bool {
        matches!(self, Key::Name(name) if &**name == "length")
    }

    /// The key as an object property name.
    pub fn to_name(&self) -> Rc<str> {
        match self {
            Key::Name(name) => Rc::clone(name),
            Key::Index(index) => index.to_string().into(),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        let canonical = name == "0" || (!name.starts_with('0') && !name.starts_with('+'));
        match name.parse::<usize>() {
            Ok(index) if canonical => Key::Index(index),
            _ => Key::Name(name.into()),
        }
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::from(name.as_str())
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Index(index) => write!(f, "{index}"),
        }
    }
}

/// What an object inherits from.
///
/// Only objects inheriting from `Object` or from nothing are plain objects;
/// everything else is opaque to deep equality and deep tracking.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Prototype {
    #[default]
    Object,
    Null,
    Class(Rc<str>),
}

/// An own property of an object.
#[derive(Clone)]
pub enum Property {
    Data {
        value: Value,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    Accessor {
        get: Option<Getter>,
        set: Option<Setter>,
        enumerable: bool,
        configurable: bool,
    },
}

impl Property {
    /// A writable, enumerable, configurable data property.
    pub fn data(value: impl Into<Value>) -> Self {
        Property::Data {
            value: value.into(),
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// An enumerable, configurable accessor property.
    pub fn accessor(get: Option<Getter>, set: Option<Setter>) -> Self {
        Property::Accessor {
            get,
            set,
            enumerable: true,
            configurable: true,
        }
    }

    pub fn frozen(value: impl Into<Value>) -> Self {
        Property::Data {
            value: value.into(),
            writable: false,
            enumerable: true,
            configurable: false,
        }
    }

    pub fn is_enumerable(&self) -> bool {
        match self {
            Property::Data { enumerable, .. } | Property::Accessor { enumerable, .. } => *enumerable,
        }
    }

    pub fn is_configurable(&self) -> bool {
        match self {
            Property::Data { configurable, .. } | Property::Accessor { configurable, .. } => {
                *configurable
            }
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Data { value, writable, .. } => f
                .debug_struct("Data")
                .field("value", value)
                .field("writable", writable)
                .finish(),
            Property::Accessor { get, set, .. } => f
                .debug_struct("Accessor")
                .field("get", &get.is_some())
                .field("set", &set.is_some())
                .finish(),
        }
    }
}

/// Contents of an object node.
#[derive(Debug, Clone, Default)]
pub struct ObjectData {
    pub properties: IndexMap<Rc<str>, Property>,
    pub prototype: Prototype,
    pub extensible: bool,
}

impl ObjectData {
    pub fn new() -> Self {
        Self {
            extensible: true,
            ..Self::default()
        }
    }

    pub fn with_prototype(prototype: Prototype) -> Self {
        Self {
            prototype,
            ..Self::new()
        }
    }
}

/// Contents of an array node.
#[derive(Debug, Clone)]
pub struct ArrayData {
    pub items: Vec<Value>,
    pub extensible: bool,
}

/// Shared handle to an object node.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<ObjectData>>);

impl ObjectRef {
    pub fn new(data: ObjectData) -> Self {
        Self(Rc::new(RefCell::new(data)))
    }

    pub fn borrow(&self) -> Ref<'_, ObjectData> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, ObjectData> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Stable address of the node, valid while any handle is alive.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

/// Shared handle to an array node.
#[derive(Clone)]
pub struct ArrayRef(Rc<RefCell<ArrayData>>);

impl ArrayRef {
    pub fn new(items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(ArrayData {
            items,
            extensible: true,
        })))
    }

    pub fn borrow(&self) -> Ref<'_, ArrayData> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, ArrayData> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    /// Milliseconds since the Unix epoch.
    Date(f64),
    RegExp { source: Rc<str>, flags: Rc<str> },
    /// Typed-array-like byte buffer.
    Bytes(Rc<[u8]>),
    Array(ArrayRef),
    Object(ObjectRef),
}

impl Value {
    /// A fresh plain object with the given data properties, in order.
    pub fn object<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Rc<str>>,
        V: Into<Value>,
    {
        let mut data = ObjectData::new();
        for (key, value) in entries {
            data.properties.insert(key.into(), Property::data(value));
        }
        Value::Object(ObjectRef::new(data))
    }

    /// A fresh object from explicit contents.
    pub fn object_from(data: ObjectData) -> Self {
        Value::Object(ObjectRef::new(data))
    }

    /// A fresh array.
    pub fn array<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Value::Array(ArrayRef::new(items.into_iter().map(Into::into).collect()))
    }

    pub fn date(millis: f64) -> Self {
        Value::Date(millis)
    }

    pub fn regexp(source: &str, flags: &str) -> Self {
        Value::RegExp {
            source: source.into(),
            flags: flags.into(),
        }
    }

    pub fn bytes(bytes: impl Into<Rc<[u8]>>) -> Self {
        Value::Bytes(bytes.into())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Address of the node for arrays and objects.
    pub fn node_addr(&self) -> Option<usize> {
        match self {
            Value::Array(array) => Some(array.addr()),
            Value::Object(object) => Some(object.addr()),
            _ => None,
        }
    }

    /// Whether this is an object inheriting from `Object` or from nothing.
    pub fn is_plain_object(&self) -> bool {
        match self {
            Value::Object(object) => matches!(
                object.borrow().prototype,
                Prototype::Object | Prototype::Null
            ),
            _ => false,
        }
    }

    /// The prototype of objects and arrays. Primitives have none.
    pub fn prototype(&self) -> Option<Prototype> {
        match self {
            Value::Object(object) => Some(object.borrow().prototype.clone()),
            Value::Array(_) => Some(Prototype::Class("Array".into())),
            _ => None,
        }
    }

    /// Identity comparison: same node, or same primitive.
    ///
    /// `NaN` is the same as `NaN`; `0.0` and `-0.0` are not the same.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) | (Value::Date(a), Value::Date(b)) => {
                (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
            }
            (Value::String(a), Value::String(b)) => a == b,
            (
                Value::RegExp { source: s1, flags: f1 },
                Value::RegExp { source: s2, flags: f2 },
            ) => s1 == s2 && f1 == f2,
            (Value::Bytes(a), Value::Bytes(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Deep structural equality, see [`is_equal`].
    pub fn is_equal(&self, other: &Value) -> bool {
        is_equal(self, other)
    }

    /// Read a property. Accessor properties run their getter with `self` as
    /// the receiver. Missing properties read as `Undefined`.
    pub fn get(&self, key: &Key) -> Value {
        match self {
            Value::Array(array) => {
                let data = array.borrow();
                match key {
                    Key::Index(index) => data.items.get(*index).cloned().unwrap_or_default(),
                    key if key.is_length() => Value::Number(data.items.len() as f64),
                    _ => Value::Undefined,
                }
            }
            Value::Object(object) => {
                let property = object.borrow().properties.get(&*key.to_name()).cloned();
                match property {
                    Some(Property::Data { value, .. }) => value,
                    Some(Property::Accessor { get: Some(get), .. }) => get(self),
                    _ => Value::Undefined,
                }
            }
            Value::String(s) if key.is_length() => Value::Number(s.chars().count() as f64),
            Value::Bytes(bytes) => match key {
                Key::Index(index) => bytes
                    .get(*index)
                    .map_or(Value::Undefined, |b| Value::Number(f64::from(*b))),
                key if key.is_length() => Value::Number(bytes.len() as f64),
                _ => Value::Undefined,
            },
            _ => Value::Undefined,
        }
    }

    /// Write a property, returning whether the write was applied.
    ///
    /// Accessor properties run their setter. Writes to read-only data
    /// properties, and new properties on non-extensible nodes, are refused.
    /// Arrays accept indices and `length`; other names are refused.
    pub fn set(&self, key: &Key, value: Value) -> bool {
        match self {
            Value::Array(array) => {
                let mut data = array.borrow_mut();
                match key {
                    Key::Index(index) => {
                        let index = *index;
                        if index >= data.items.len() {
                            let Some(len) = array_length_for(key, &value) else {
                                return false;
                            };
                            if !data.extensible || !grow(&mut data.items, len) {
                                return false;
                            }
                        }
                        data.items[index] = value;
                        true
                    }
                    key if key.is_length() => match array_length_for(key, &value) {
                        Some(len) => {
                            if len > data.items.len()
                                && (!data.extensible || !grow(&mut data.items, len))
                            {
                                return false;
                            }
                            data.items.truncate(len);
                            true
                        }
                        None => false,
                    },
                    _ => false,
                }
            }
            Value::Object(object) => {
                let name = key.to_name();
                let setter = {
                    let mut data = object.borrow_mut();
                    let extensible = data.extensible;
                    match data.properties.get_mut(&*name) {
                        Some(Property::Data { value: slot, writable, .. }) => {
                            if !*writable {
                                return false;
                            }
                            *slot = value;
                            return true;
                        }
                        Some(Property::Accessor { set, .. }) => set.clone(),
                        None => {
                            if !extensible {
                                return false;
                            }
                            data.properties.insert(name, Property::data(value));
                            return true;
                        }
                    }
                };

                match setter {
                    Some(set) => {
                        set(self, value);
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }

    /// Whether writing `value` under `key` leaves an array with a valid
    /// length: at most [`MAX_ARRAY_LENGTH`], and for `length` writes a whole
    /// non-negative number. Always true for non-arrays, for keys arrays
    /// ignore, and for non-numeric `length` values (those are refused
    /// without being invalid).
    pub fn is_array_write_in_range(&self, key: &Key, value: &Value) -> bool {
        match self {
            Value::Array(_) if matches!(key, Key::Index(_)) || key.is_length() => {
                array_length_for(key, value).is_some()
                    || (key.is_length() && value.as_f64().is_none())
            }
            _ => true,
        }
    }

    /// Remove an own property, returning whether it is gone afterwards.
    ///
    /// Deleting an array index leaves a hole (`Undefined`); the length is
    /// unchanged.
    pub fn delete(&self, key: &Key) -> bool {
        match self {
            Value::Array(array) => match key {
                Key::Index(index) => {
                    if let Some(slot) = array.borrow_mut().items.get_mut(*index) {
                        *slot = Value::Undefined;
                    }
                    true
                }
                key => !key.is_length(),
            },
            Value::Object(object) => {
                let mut data = object.borrow_mut();
                let name = key.to_name();
                let configurable = data.properties.get(&*name).map(Property::is_configurable);
                match configurable {
                    Some(false) => false,
                    Some(true) => {
                        data.properties.shift_remove(&*name);
                        true
                    }
                    None => true,
                }
            }
            _ => true,
        }
    }

    /// Define or redefine an own property.
    pub fn define_property(&self, key: &Key, property: Property) -> bool {
        match self {
            Value::Array(_) => match (key, property) {
                (Key::Index(_), Property::Data { value, .. }) => self.set(key, value),
                _ => false,
            },
            Value::Object(object) => {
                let mut data = object.borrow_mut();
                let name = key.to_name();
                let allowed = match data.properties.get(&*name) {
                    Some(existing) => existing.is_configurable(),
                    None => data.extensible,
                };
                if allowed {
                    data.properties.insert(name, property);
                }
                allowed
            }
            _ => false,
        }
    }

    pub fn has(&self, key: &Key) -> bool {
        match self {
            Value::Array(array) => match key {
                Key::Index(index) => *index < array.borrow().items.len(),
                key => key.is_length(),
            },
            Value::Object(object) => object.borrow().properties.contains_key(&*key.to_name()),
            _ => false,
        }
    }

    /// Own property descriptor.
    pub fn own_property(&self, key: &Key) -> Option<Property> {
        match self {
            Value::Array(array) => {
                let data = array.borrow();
                match key {
                    Key::Index(index) => data.items.get(*index).map(|value| Property::Data {
                        value: value.clone(),
                        writable: true,
                        enumerable: true,
                        configurable: data.extensible,
                    }),
                    key if key.is_length() => Some(Property::Data {
                        value: Value::Number(data.items.len() as f64),
                        writable: true,
                        enumerable: false,
                        configurable: false,
                    }),
                    _ => None,
                }
            }
            Value::Object(object) => object.borrow().properties.get(&*key.to_name()).cloned(),
            _ => None,
        }
    }

    /// Every own key, enumerable or not, in definition order. Arrays list
    /// their indices followed by `length`.
    pub fn own_keys(&self) -> SmallVec<[Key; 8]> {
        match self {
            Value::Array(array) => {
                let len = array.borrow().items.len();
                (0..len).map(Key::Index).chain([Key::length()]).collect()
            }
            Value::Object(object) => object
                .borrow()
                .properties
                .keys()
                .map(|name| Key::from(&**name))
                .collect(),
            _ => SmallVec::new(),
        }
    }

    /// Own enumerable keys, in definition order.
    pub fn keys(&self) -> SmallVec<[Key; 8]> {
        match self {
            Value::Array(array) => (0..array.borrow().items.len()).map(Key::Index).collect(),
            Value::Object(object) => object
                .borrow()
                .properties
                .iter()
                .filter(|(_, property)| property.is_enumerable())
                .map(|(name, _)| Key::from(&**name))
                .collect(),
            _ => SmallVec::new(),
        }
    }

    pub fn is_extensible(&self) -> bool {
        match self {
            Value::Array(array) => array.borrow().extensible,
            Value::Object(object) => object.borrow().extensible,
            _ => false,
        }
    }

    pub fn prevent_extensions(&self) {
        match self {
            Value::Array(array) => array.borrow_mut().extensible = false,
            Value::Object(object) => object.borrow_mut().extensible = false,
            _ => {}
        }
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Value::Undefined => "undefined".into(),
            Value::Null => "null".into(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.to_string(),
            Value::Date(ms) => format!("[object Date {ms}]"),
            Value::RegExp { source, flags } => format!("/{source}/{flags}"),
            Value::Bytes(_) => "[object Uint8Array]".into(),
            Value::Array(_) => "[object Array]".into(),
            Value::Object(object) => match &object.borrow().prototype {
                Prototype::Class(name) => format!("[object {name}]"),
                _ => "[object Object]".into(),
            },
        }
    }

    /// Convert to JSON. Accessors are read through their getters; dates
    /// become epoch milliseconds; `Undefined` becomes `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Undefined | Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) | Value::Date(n) => {
                serde_json::Number::from_f64(*n).map_or(Json::Null, Json::Number)
            }
            Value::String(s) => Json::String(s.to_string()),
            Value::RegExp { .. } => Json::String(self.describe()),
            Value::Bytes(bytes) => Json::Array(bytes.iter().map(|b| Json::from(*b)).collect()),
            Value::Array(array) => {
                let items = array.borrow().items.clone();
                Json::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(_) => {
                let mut map = serde_json::Map::new();
                for key in self.keys() {
                    map.insert(key.to_string(), self.get(&key).to_json());
                }
                Json::Object(map)
            }
        }
    }
}

/// Largest length an array can reach, and one past its largest index.
pub const MAX_ARRAY_LENGTH: usize = u32::MAX as usize;

fn is_whole_number(value: &Value) -> bool {
    value.as_f64().is_some_and(|n| n >= 0.0 && n.fract() == 0.0)
}

/// The array length a write under `key` asks for, if it is a valid one.
fn array_length_for(key: &Key, value: &Value) -> Option<usize> {
    let len = match key {
        Key::Index(index) => index.checked_add(1)?,
        _ => {
            let len = value.as_f64().filter(|_| is_whole_number(value))?;
            if len > MAX_ARRAY_LENGTH as f64 {
                return None;
            }
            len as usize
        }
    };
    (len <= MAX_ARRAY_LENGTH).then_some(len)
}

/// Extend `items` with holes up to `len`, refusing when the allocation fails.
fn grow(items: &mut Vec<Value>, len: usize) -> bool {
    if items.try_reserve(len - items.len()).is_err() {
        return false;
    }
    items.resize(len, Value::Undefined);
    true
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        is_equal(self, other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Date(ms) => write!(f, "Date({ms})"),
            Value::RegExp { source, flags } => write!(f, "/{source}/{flags}"),
            Value::Bytes(bytes) => write!(f, "Bytes({bytes:?})"),
            Value::Array(array) => f.debug_list().entries(array.borrow().items.iter()).finish(),
            Value::Object(object) => f
                .debug_map()
                .entries(object.borrow().properties.iter())
                .finish(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s.into()),
            Json::Array(items) => Value::array(items.into_iter().map(Value::from)),
            Json::Object(map) => Value::object(map.into_iter().map(|(k, v)| (k, Value::from(v)))),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn numeric_strings_become_indices() {
        assert_eq!(Key::from("0"), Key::Index(0));
        assert_eq!(Key::from("12"), Key::Index(12));
        assert_eq!(Key::from("012"), Key::Name("012".into()));
        assert_eq!(Key::from("-1"), Key::Name("-1".into()));
        assert!(Key::from("length").is_length());
    }

    #[test]
    fn clones_share_the_node() {
        let a = Value::object([("x", 1)]);
        let b = a.clone();

        b.set(&Key::from("x"), Value::from(2));
        assert_eq!(a.get(&Key::from("x")).as_f64(), Some(2.0));
        assert!(a.same_value(&b));
    }

    #[test]
    fn array_length_grows_and_truncates() {
        let array = Value::array([1, 2, 3]);
        assert!(array.set(&Key::Index(4), Value::from(5)));
        assert_eq!(array.get(&Key::length()).as_f64(), Some(5.0));
        assert!(array.get(&Key::Index(3)).is_undefined());

        assert!(array.set(&Key::length(), Value::from(1)));
        assert_eq!(array.to_json(), json!([1.0]));
    }

    #[test]
    fn array_writes_past_max_length_are_refused() {
        let array = Value::array([1]);

        assert!(!array.set(&Key::Index(usize::MAX), Value::from(1)));
        assert!(!array.set(&Key::Index(MAX_ARRAY_LENGTH), Value::from(1)));
        assert!(!array.set(&Key::length(), Value::from(1e300)));
        assert!(!array.set(&Key::length(), Value::from(f64::INFINITY)));
        assert!(!array.is_array_write_in_range(&Key::length(), &Value::from(1e300)));
        assert!(!array.is_array_write_in_range(&Key::length(), &Value::from(-1)));
        assert!(array.is_array_write_in_range(&Key::length(), &Value::from(3)));
        assert!(array.is_array_write_in_range(&Key::from("name"), &Value::from(1e300)));

        assert_eq!(array.to_json(), json!([1.0]));
    }

    #[test]
    fn accessors_run_with_the_object_as_receiver() {
        let calls = Rc::new(Cell::new(0));
        let mut data = ObjectData::new();
        data.properties.insert("base".into(), Property::data(2));
        data.properties.insert(
            "double".into(),
            Property::accessor(
                Some(Rc::new(|this: &Value| {
                    let base = this.get(&Key::from("base")).as_f64().unwrap_or(0.0);
                    Value::Number(base * 2.0)
                })),
                Some(Rc::new({
                    let calls = calls.clone();
                    move |this: &Value, value: Value| {
                        calls.set(calls.get() + 1);
                        let half = value.as_f64().unwrap_or(0.0) / 2.0;
                        this.set(&Key::from("base"), Value::Number(half));
                    }
                })),
            ),
        );
        let object = Value::object_from(data);

        assert_eq!(object.get(&Key::from("double")).as_f64(), Some(4.0));
        assert!(object.set(&Key::from("double"), Value::from(10)));
        assert_eq!(calls.get(), 1);
        assert_eq!(object.get(&Key::from("base")).as_f64(), Some(5.0));
    }

    #[test]
    fn frozen_properties_and_sealed_objects_refuse_writes() {
        let mut data = ObjectData::new();
        data.properties.insert("id".into(), Property::frozen(1));
        let object = Value::object_from(data);

        assert!(!object.set(&Key::from("id"), Value::from(2)));
        assert!(!object.delete(&Key::from("id")));

        object.prevent_extensions();
        assert!(!object.set(&Key::from("other"), Value::from(1)));
        assert!(!object.has(&Key::from("other")));
    }

    #[test]
    fn keys_skip_non_enumerable_properties() {
        let object = Value::object([("a", 1), ("b", 2)]);
        object.define_property(
            &Key::from("hidden"),
            Property::Data {
                value: Value::Null,
                writable: true,
                enumerable: false,
                configurable: true,
            },
        );

        assert_eq!(object.keys().len(), 2);
        assert_eq!(object.own_keys().len(), 3);
    }

    #[test]
    fn same_value_distinguishes_signed_zero() {
        assert!(Value::Number(f64::NAN).same_value(&Value::Number(f64::NAN)));
        assert!(!Value::Number(0.0).same_value(&Value::Number(-0.0)));
    }

    #[test]
    fn json_round_trip_preserves_shape() {
        let json = json!({"name": "ripple", "tags": ["a", "b"], "nested": {"n": 1.5}, "none": null});
        let value = Value::from(json.clone());

        assert!(value.is_plain_object());
        assert_eq!(value.to_json(), json);
        assert_eq!(value.describe(), "[object Object]");
    }
}
