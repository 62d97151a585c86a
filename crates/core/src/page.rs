use crate::{Item, Link};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where servers put the number of matched items, in the order we look.
///
/// Servers disagree on the field, and some recompute it on every page, so
/// the first field present wins and it is only trusted on the page it came
/// from.
pub const MATCHED_FIELDS: [&[&str]; 4] = [
    &["numberMatched"],
    &["context", "matched"],
    &["meta", "found"],
    &["properties", "found"],
];

/// A page of search results.
///
/// # Examples
///
/// ```
/// use satsearch::Page;
/// use serde_json::json;
///
/// let page: Page = serde_json::from_value(json!({
///     "type": "FeatureCollection",
///     "features": [],
///     "context": {"matched": 42, "returned": 0},
///     "links": [{"rel": "next", "href": "http://stac.test/search?page=2"}]
/// })).unwrap();
/// assert_eq!(page.matched(), Some(42));
/// assert!(page.next_link().is_some());
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Page {
    /// The returned items.
    #[serde(default)]
    pub features: Vec<Item>,

    /// Links, including the link to the next page.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,

    /// Additional fields, e.g. the search context.
    #[serde(flatten)]
    pub additional_fields: Map<String, Value>,
}

impl Page {
    /// Returns the number of items the server says matched the search.
    pub fn matched(&self) -> Option<u64> {
        self.matched_field().map(|(_, matched)| matched)
    }

    /// Returns the matched count along with the dotted path it was read from.
    ///
    /// # Examples
    ///
    /// ```
    /// use satsearch::Page;
    /// use serde_json::json;
    ///
    /// let page: Page = serde_json::from_value(json!({"meta": {"found": 3}})).unwrap();
    /// assert_eq!(page.matched_field(), Some(("meta.found".to_string(), 3)));
    /// ```
    pub fn matched_field(&self) -> Option<(String, u64)> {
        MATCHED_FIELDS.iter().find_map(|path| {
            let (first, rest) = path.split_first()?;
            let mut value = self.additional_fields.get(*first)?;
            for key in rest {
                value = value.get(*key)?;
            }
            as_count(value).map(|count| (path.join("."), count))
        })
    }

    /// Returns this page's link to the next page, if it has one.
    pub fn next_link(&self) -> Option<&Link> {
        self.links.iter().find(|link| link.is_next())
    }
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f < u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
