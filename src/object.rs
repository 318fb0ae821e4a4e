//! Object model consumed by the interpreter.
//!
//! Dictionaries are held behind [`Arc`] so that graphics states, the state
//! stack and the document can all refer to the same resource dictionary
//! without copying it.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Dictionary payload: name keys (without the leading slash) to objects.
pub type Dictionary = HashMap<String, Object>;

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array), literal or hexadecimal
    String(Vec<u8>),
    /// Name (starting with /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Shared dictionary
    Dictionary(Arc<Dictionary>),
    /// Stream (shared dictionary + raw, still-encoded data)
    Stream {
        /// Stream dictionary
        dict: Arc<Dictionary>,
        /// Stream data
        data: bytes::Bytes,
    },
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

impl Object {
    /// Wrap a dictionary.
    pub fn dictionary(dict: Dictionary) -> Self {
        Object::Dictionary(Arc::new(dict))
    }

    /// Build a stream from a dictionary and its raw bytes.
    pub fn stream(dict: Dictionary, data: impl Into<bytes::Bytes>) -> Self {
        Object::Stream {
            dict: Arc::new(dict),
            data: data.into(),
        }
    }

    /// Shorthand for a name object.
    pub fn name(name: &str) -> Self {
        Object::Name(name.to_string())
    }

    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream { .. } => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value of an integer or real.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to dictionary. Works for both Dictionary and Stream objects.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Shared handle to the dictionary of a Dictionary or Stream object.
    pub fn shared_dict(&self) -> Option<Arc<Dictionary>> {
        match self {
            Object::Dictionary(d) => Some(Arc::clone(d)),
            Object::Stream { dict, .. } => Some(Arc::clone(dict)),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to cast to string (bytes).
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Raw stream bytes, if this is a stream.
    pub fn stream_data(&self) -> Option<&bytes::Bytes> {
        match self {
            Object::Stream { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Check if object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// True for integers and reals.
    pub fn is_number(&self) -> bool {
        matches!(self, Object::Integer(_) | Object::Real(_))
    }

    /// True for name objects.
    pub fn is_name(&self) -> bool {
        matches!(self, Object::Name(_))
    }

    /// True when this is the name `name`.
    pub fn is_name_eq(&self, name: &str) -> bool {
        self.as_name() == Some(name)
    }

    /// True for arrays.
    pub fn is_array(&self) -> bool {
        matches!(self, Object::Array(_))
    }

    /// True for dictionaries and streams.
    pub fn is_dictionary(&self) -> bool {
        matches!(self, Object::Dictionary(_) | Object::Stream { .. })
    }

    /// True for literal and hex strings.
    pub fn is_any_string(&self) -> bool {
        matches!(self, Object::String(_))
    }

    /// True for streams.
    pub fn is_stream(&self) -> bool {
        matches!(self, Object::Stream { .. })
    }

    /// Look up `key` in a dictionary or stream dictionary.
    pub fn get(&self, key: &str) -> Option<&Object> {
        self.as_dict().and_then(|d| d.get(key))
    }

    /// Filter names declared by a stream, in application order.
    pub fn filters(&self) -> Vec<String> {
        match self.get("Filter") {
            Some(Object::Name(name)) => vec![name.clone()],
            Some(Object::Array(arr)) => arr
                .iter()
                .filter_map(|f| f.as_name().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Decode stream data using filters specified in the stream dictionary.
    ///
    /// `max_size` bounds the decoded size (0 disables the check).
    pub fn decode_stream_data(&self, max_size: usize) -> Result<Vec<u8>> {
        match self {
            Object::Stream { data, .. } => {
                crate::decoders::decode_stream(data, &self.filters(), max_size)
            },
            _ => Err(Error::wrong_type("Stream", self.type_name())),
        }
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Object::Real(value)
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Object::Integer(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_number_accepts_integer_and_real() {
        assert_eq!(Object::Integer(3).as_number(), Some(3.0));
        assert_eq!(Object::Real(2.5).as_number(), Some(2.5));
        assert_eq!(Object::name("X").as_number(), None);
    }

    #[test]
    fn test_stream_dict_access() {
        let mut dict = Dictionary::new();
        dict.insert("Subtype".to_string(), Object::name("Form"));
        let stream = Object::stream(dict, &b"0 0 m"[..]);
        assert!(stream.is_dictionary());
        assert!(stream.is_stream());
        assert!(stream.get("Subtype").is_some_and(|s| s.is_name_eq("Form")));
    }

    #[test]
    fn test_shared_dict_is_same_allocation() {
        let obj = Object::dictionary(Dictionary::new());
        let a = obj.shared_dict().unwrap();
        let b = obj.clone().shared_dict().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_filters_name_and_array() {
        let mut dict = Dictionary::new();
        dict.insert("Filter".to_string(), Object::name("FlateDecode"));
        assert_eq!(Object::stream(dict, Vec::<u8>::new()).filters(), vec!["FlateDecode"]);

        let mut dict = Dictionary::new();
        dict.insert(
            "Filter".to_string(),
            Object::Array(vec![Object::name("ASCIIHexDecode"), Object::name("RunLengthDecode")]),
        );
        assert_eq!(
            Object::stream(dict, Vec::<u8>::new()).filters(),
            vec!["ASCIIHexDecode", "RunLengthDecode"]
        );
    }

    #[test]
    fn test_decode_unfiltered_stream() {
        let stream = Object::stream(Dictionary::new(), &b"q Q"[..]);
        assert_eq!(stream.decode_stream_data(0).unwrap(), b"q Q");
    }

    #[test]
    fn test_decode_non_stream_fails() {
        let err = Object::Integer(1).decode_stream_data(0).unwrap_err();
        assert!(matches!(err, Error::InvalidObjectType { .. }));
    }

    #[test]
    fn test_object_ref_display() {
        assert_eq!(ObjectRef::new(12, 0).to_string(), "12 0 R");
    }
}
