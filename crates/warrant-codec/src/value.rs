//! The typed value model.

use crate::error::CodecError;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

/// Entry identifier within a [`Values`] structure.
pub type Tag = u32;

/// Kind discriminator written in front of every encoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Kind {
    String = 1,
    Bytes = 2,
    UInt = 3,
    Bool = 4,
    Nested = 5,
}

impl Kind {
    pub(crate) fn from_byte(byte: u8, offset: usize) -> Result<Self, CodecError> {
        match byte {
            1 => Ok(Kind::String),
            2 => Ok(Kind::Bytes),
            3 => Ok(Kind::UInt),
            4 => Ok(Kind::Bool),
            5 => Ok(Kind::Nested),
            kind => Err(CodecError::UnknownKind { kind, offset }),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::String => "string",
            Kind::Bytes => "bytes",
            Kind::UInt => "uint64",
            Kind::Bool => "bool",
            Kind::Nested => "nested",
        };
        f.write_str(name)
    }
}

/// A single value carried by an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Bytes(Vec<u8>),
    UInt(u64),
    Bool(bool),
    Nested(Values),
}

impl Value {
    /// The kind discriminator used when this value is encoded.
    pub fn kind(&self) -> Kind {
        match self {
            Value::String(_) => Kind::String,
            Value::Bytes(_) => Kind::Bytes,
            Value::UInt(_) => Kind::UInt,
            Value::Bool(_) => Kind::Bool,
            Value::Nested(_) => Kind::Nested,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_nested(&self) -> Option<&Values> {
        match self {
            Value::Nested(v) => Some(v),
            _ => None,
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInt(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Values> for Value {
    fn from(value: Values) -> Self {
        Value::Nested(value)
    }
}

/// An ordered tag → value structure.
///
/// Iteration order is ascending by tag, which is also the encoding order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values(BTreeMap<Tag, Value>);

impl Values {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, tag: Tag, value: impl Into<Value>) -> Self {
        self.0.insert(tag, value.into());
        self
    }

    /// Insert a value, returning the one previously stored under `tag`.
    pub fn insert(&mut self, tag: Tag, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(tag, value.into())
    }

    pub fn remove(&mut self, tag: Tag) -> Option<Value> {
        self.0.remove(&tag)
    }

    pub fn get(&self, tag: Tag) -> Option<&Value> {
        self.0.get(&tag)
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.0.contains_key(&tag)
    }

    pub fn get_str(&self, tag: Tag) -> Option<&str> {
        self.get(tag).and_then(Value::as_str)
    }

    pub fn get_bytes(&self, tag: Tag) -> Option<&[u8]> {
        self.get(tag).and_then(Value::as_bytes)
    }

    pub fn get_u64(&self, tag: Tag) -> Option<u64> {
        self.get(tag).and_then(Value::as_u64)
    }

    pub fn get_bool(&self, tag: Tag) -> Option<bool> {
        self.get(tag).and_then(Value::as_bool)
    }

    pub fn get_nested(&self, tag: Tag) -> Option<&Values> {
        self.get(tag).and_then(Value::as_nested)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Tag, Value> {
        self.0.iter()
    }

    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.0.keys().copied()
    }
}

impl FromIterator<(Tag, Value)> for Values {
    fn from_iter<I: IntoIterator<Item = (Tag, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Values {
    type Item = (&'a Tag, &'a Value);
    type IntoIter = btree_map::Iter<'a, Tag, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Values {
    type Item = (Tag, Value);
    type IntoIter = btree_map::IntoIter<Tag, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let values = Values::new()
            .with(1, "acme")
            .with(2, vec![0xde, 0xad])
            .with(3, 42u64)
            .with(4, false)
            .with(5, Values::new().with(1, true));

        assert_eq!(values.get_str(1), Some("acme"));
        assert_eq!(values.get_bytes(2), Some(&[0xde, 0xad][..]));
        assert_eq!(values.get_u64(3), Some(42));
        assert_eq!(values.get_bool(4), Some(false));
        assert_eq!(values.get_nested(5).and_then(|s| s.get_bool(1)), Some(true));

        // Wrong kind is not coerced.
        assert_eq!(values.get_u64(1), None);
        assert_eq!(values.get_str(9), None);
    }

    #[test]
    fn test_iteration_is_tag_ordered() {
        let values = Values::new().with(9, 1u64).with(2, 2u64).with(5, 3u64);
        let tags: Vec<Tag> = values.tags().collect();
        assert_eq!(tags, vec![2, 5, 9]);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(Value::from(7u64).kind().to_string(), "uint64");
        assert_eq!(Value::from(Values::new()).kind(), Kind::Nested);
    }
}
