//! Observable properties and their wire codecs.
//!
//! A [`Property`] couples a declared name, a typed value and the observers
//! notified when that value changes. The wire form of each type is given by
//! [`WireValue`]; binary-backed values are moved out of the JSON structure
//! into a side-buffer list and replaced by a reference marker.

use bytes::Bytes;
use serde_json::Value;

use crate::error::CodecError;

/// Prefix of the string marker that stands in for a side buffer.
pub const BUFFER_REFERENCE_PREFIX: &str = "@buffer_reference@";

/// Conversion between a Rust value and its wire representation.
pub trait WireValue: Clone + PartialEq + Send + 'static {
    /// Convert to wire form, pushing any binary payload onto `buffers`.
    fn to_wire(&self, buffers: &mut Vec<Bytes>) -> Value;

    /// Decode from wire form, resolving buffer references against `buffers`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the value has the wrong shape or references
    /// a missing buffer.
    fn from_wire(value: &Value, buffers: &[Bytes]) -> Result<Self, CodecError>;
}

fn mismatch(expected: &'static str, found: &Value) -> CodecError {
    CodecError::TypeMismatch {
        expected,
        found: found.to_string(),
    }
}

impl WireValue for bool {
    fn to_wire(&self, _buffers: &mut Vec<Bytes>) -> Value {
        Value::Bool(*self)
    }

    fn from_wire(value: &Value, _buffers: &[Bytes]) -> Result<Self, CodecError> {
        value.as_bool().ok_or_else(|| mismatch("boolean", value))
    }
}

impl WireValue for i32 {
    fn to_wire(&self, _buffers: &mut Vec<Bytes>) -> Value {
        Value::from(*self)
    }

    fn from_wire(value: &Value, _buffers: &[Bytes]) -> Result<Self, CodecError> {
        value
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| mismatch("32-bit integer", value))
    }
}

impl WireValue for i64 {
    fn to_wire(&self, _buffers: &mut Vec<Bytes>) -> Value {
        Value::from(*self)
    }

    fn from_wire(value: &Value, _buffers: &[Bytes]) -> Result<Self, CodecError> {
        value.as_i64().ok_or_else(|| mismatch("integer", value))
    }
}

impl WireValue for u32 {
    fn to_wire(&self, _buffers: &mut Vec<Bytes>) -> Value {
        Value::from(*self)
    }

    fn from_wire(value: &Value, _buffers: &[Bytes]) -> Result<Self, CodecError> {
        value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| mismatch("unsigned 32-bit integer", value))
    }
}

/// JSON has no NaN or infinity, so those travel as these strings.
const NAN: &str = "NaN";
const INFINITY: &str = "Infinity";
const NEG_INFINITY: &str = "-Infinity";

impl WireValue for f64 {
    fn to_wire(&self, _buffers: &mut Vec<Bytes>) -> Value {
        if self.is_nan() {
            Value::from(NAN)
        } else if self.is_infinite() {
            Value::from(if *self > 0.0 { INFINITY } else { NEG_INFINITY })
        } else {
            Value::from(*self)
        }
    }

    fn from_wire(value: &Value, _buffers: &[Bytes]) -> Result<Self, CodecError> {
        match value {
            Value::String(s) if s == NAN => Ok(f64::NAN),
            Value::String(s) if s == INFINITY => Ok(f64::INFINITY),
            Value::String(s) if s == NEG_INFINITY => Ok(f64::NEG_INFINITY),
            _ => value.as_f64().ok_or_else(|| mismatch("number", value)),
        }
    }
}

impl WireValue for String {
    fn to_wire(&self, _buffers: &mut Vec<Bytes>) -> Value {
        Value::String(self.clone())
    }

    fn from_wire(value: &Value, _buffers: &[Bytes]) -> Result<Self, CodecError> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| mismatch("string", value))
    }
}

impl WireValue for Vec<String> {
    fn to_wire(&self, buffers: &mut Vec<Bytes>) -> Value {
        Value::Array(self.iter().map(|s| s.to_wire(buffers)).collect())
    }

    fn from_wire(value: &Value, buffers: &[Bytes]) -> Result<Self, CodecError> {
        value
            .as_array()
            .ok_or_else(|| mismatch("array of strings", value))?
            .iter()
            .map(|item| String::from_wire(item, buffers))
            .collect()
    }
}

impl<T: WireValue> WireValue for Option<T> {
    fn to_wire(&self, buffers: &mut Vec<Bytes>) -> Value {
        match self {
            Some(inner) => inner.to_wire(buffers),
            None => Value::Null,
        }
    }

    fn from_wire(value: &Value, buffers: &[Bytes]) -> Result<Self, CodecError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_wire(value, buffers).map(Some)
        }
    }
}

/// A binary payload carried out of band as a side buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binary(pub Bytes);

impl Binary {
    /// Borrow the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Binary {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<Bytes> for Binary {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl WireValue for Binary {
    fn to_wire(&self, buffers: &mut Vec<Bytes>) -> Value {
        let index = buffers.len();
        buffers.push(self.0.clone());
        Value::String(format!("{BUFFER_REFERENCE_PREFIX}{index}"))
    }

    fn from_wire(value: &Value, buffers: &[Bytes]) -> Result<Self, CodecError> {
        let index = value
            .as_str()
            .and_then(|s| s.strip_prefix(BUFFER_REFERENCE_PREFIX))
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| mismatch("buffer reference", value))?;
        buffers
            .get(index)
            .cloned()
            .map(Self)
            .ok_or(CodecError::MissingBuffer {
                index,
                available: buffers.len(),
            })
    }
}

type Observer<T> = Box<dyn FnMut(&T) + Send>;

/// A named, typed value with change notification.
pub struct Property<T> {
    name: &'static str,
    value: T,
    observers: Vec<Observer<T>>,
}

impl<T: WireValue> Property<T> {
    /// Declare a property with its default value.
    #[must_use]
    pub fn new(name: &'static str, default: T) -> Self {
        Self {
            name,
            value: default,
            observers: Vec::new(),
        }
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Assign a new value, notifying observers if it differs.
    ///
    /// Returns whether the value changed.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        for observer in &mut self.observers {
            observer(&self.value);
        }
        true
    }

    /// Register a change observer.
    pub fn observe(&mut self, observer: impl FnMut(&T) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Type-erased view of a property used by the state codec.
pub trait PropertyCodec {
    /// Declared property name.
    fn name(&self) -> &'static str;

    /// Wire form of the current value.
    fn serialize(&self, buffers: &mut Vec<Bytes>) -> Value;

    /// Decode `value` and assign it through the property's setter.
    ///
    /// Returns whether the value changed.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if `value` cannot be decoded; the property is
    /// left untouched.
    fn apply(&mut self, value: &Value, buffers: &[Bytes]) -> Result<bool, CodecError>;
}

impl<T: WireValue> PropertyCodec for Property<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn serialize(&self, buffers: &mut Vec<Bytes>) -> Value {
        self.value.to_wire(buffers)
    }

    fn apply(&mut self, value: &Value, buffers: &[Bytes]) -> Result<bool, CodecError> {
        let decoded = T::from_wire(value, buffers)?;
        Ok(self.set(decoded))
    }
}
