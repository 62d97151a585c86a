use crate::{Error, Result};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::io::Write;

/// Create a value from JSON.
pub trait FromJson: DeserializeOwned {
    /// Creates an object from JSON bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use satsearch::{FromJson, Page};
    ///
    /// let page = Page::from_json_slice(br#"{"features": [], "links": []}"#).unwrap();
    /// assert!(page.features.is_empty());
    /// ```
    fn from_json_slice(slice: &[u8]) -> Result<Self> {
        serde_json::from_slice(slice).map_err(Error::from)
    }
}

/// Writes a value to JSON bytes.
pub trait ToJson: Serialize {
    /// Writes a value as JSON.
    ///
    /// # Examples
    ///
    /// ```
    /// use satsearch::{SearchSpec, ToJson};
    ///
    /// let mut buf = Vec::new();
    /// SearchSpec::new().to_json_writer(&mut buf, true).unwrap();
    /// ```
    fn to_json_writer(&self, writer: impl Write, pretty: bool) -> Result<()> {
        if pretty {
            serde_json::to_writer_pretty(writer, self).map_err(Error::from)
        } else {
            serde_json::to_writer(writer, self).map_err(Error::from)
        }
    }

    /// Writes a value as JSON bytes.
    fn to_json_vec(&self, pretty: bool) -> Result<Vec<u8>> {
        if pretty {
            serde_json::to_vec_pretty(self).map_err(Error::from)
        } else {
            serde_json::to_vec(self).map_err(Error::from)
        }
    }
}

impl<T: DeserializeOwned> FromJson for T {}
impl<T: Serialize> ToJson for T {}

/// Recursively merges `other` into `map`.
///
/// Nested objects are merged key by key, so sibling keys already in `map`
/// survive. Any other value in `other` replaces the one in `map`.
///
/// # Examples
///
/// ```
/// use serde_json::json;
///
/// let mut map = json!({"a": {"gt": "1"}}).as_object().unwrap().clone();
/// let other = json!({"a": {"lt": "10"}}).as_object().unwrap().clone();
/// satsearch::merge(&mut map, other);
/// assert_eq!(serde_json::Value::Object(map), json!({"a": {"gt": "1", "lt": "10"}}));
/// ```
pub fn merge(map: &mut Map<String, Value>, other: Map<String, Value>) {
    for (key, value) in other {
        match (map.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => merge(existing, incoming),
            (_, value) => {
                let _ = map.insert(key, value);
            }
        }
    }
}
