use crate::{Collection, Error, Item, Result, SearchSpec, resolve::collection_id};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};
use serde_json::Value;

const FEATURE_COLLECTION_TYPE: &str = "FeatureCollection";

/// The complete, immutable result of a search.
///
/// A result set holds the items in the order the server returned them, the
/// collections those items reference, and the search that produced them. It
/// serializes as a GeoJSON FeatureCollection:
///
/// ```json
/// {
///   "type": "FeatureCollection",
///   "features": [],
///   "collections": [],
///   "properties": {"search": {}}
/// }
/// ```
///
/// # Examples
///
/// ```
/// use indexmap::IndexMap;
/// use satsearch::{ResultSet, SearchSpec};
/// use serde_json::json;
///
/// let item = json!({"id": "a", "collection": "c1"}).as_object().unwrap().clone();
/// let result_set = ResultSet::aggregate(SearchSpec::new(), vec![item], IndexMap::new());
/// assert_eq!(result_set.len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    items: Vec<Item>,
    collections: IndexMap<String, Collection>,
    search: SearchSpec,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    r#type: &'static str,
    features: &'a [Item],
    collections: Vec<&'a Collection>,
    properties: PropertiesRef<'a>,
}

#[derive(Serialize)]
struct PropertiesRef<'a> {
    search: &'a SearchSpec,
}

#[derive(Deserialize)]
struct Document {
    r#type: String,
    #[serde(default)]
    features: Vec<Item>,
    #[serde(default)]
    collections: Vec<Collection>,
    #[serde(default)]
    properties: Properties,
}

#[derive(Default, Deserialize)]
struct Properties {
    #[serde(default)]
    search: SearchSpec,
}

impl ResultSet {
    /// Builds a result set from fetched items and resolved collections.
    ///
    /// Items are kept as-is. Collections that no item references are dropped.
    pub fn aggregate(
        search: SearchSpec,
        items: Vec<Item>,
        mut collections: IndexMap<String, Collection>,
    ) -> ResultSet {
        let referenced: IndexSet<&str> = items.iter().filter_map(collection_id).collect();
        collections.retain(|id, _| referenced.contains(id.as_str()));
        ResultSet {
            items,
            collections,
            search,
        }
    }

    /// Returns the items, in server order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Returns the collections, keyed by id.
    pub fn collections(&self) -> &IndexMap<String, Collection> {
        &self.collections
    }

    /// Returns the search that produced these results.
    pub fn search(&self) -> &SearchSpec {
        &self.search
    }

    /// Returns the collection an item belongs to, if it was resolved.
    ///
    /// # Examples
    ///
    /// ```
    /// use indexmap::IndexMap;
    /// use satsearch::{ResultSet, SearchSpec};
    /// use serde_json::json;
    ///
    /// let item = json!({"id": "a", "collection": "c1"}).as_object().unwrap().clone();
    /// let mut collections = IndexMap::new();
    /// collections.insert("c1".to_string(), json!({"id": "c1"}).as_object().unwrap().clone());
    /// let result_set = ResultSet::aggregate(SearchSpec::new(), vec![item], collections);
    /// let collection = result_set.collection_for(&result_set.items()[0]).unwrap();
    /// assert_eq!(collection["id"], "c1");
    /// ```
    pub fn collection_for(&self, item: &Item) -> Option<&Collection> {
        collection_id(item).and_then(|id| self.collections.get(id))
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns every distinct asset key, in the order they first appear.
    pub fn asset_keys(&self) -> Vec<String> {
        let keys: IndexSet<&String> = self
            .items
            .iter()
            .filter_map(|item| item.get("assets").and_then(Value::as_object))
            .flat_map(|assets| assets.keys())
            .collect();
        keys.into_iter().cloned().collect()
    }

    /// Consumes this result set and returns its items.
    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    fn from_document(document: Document) -> Result<ResultSet> {
        if document.r#type != FEATURE_COLLECTION_TYPE {
            return Err(Error::IncorrectType {
                actual: document.r#type,
                expected: FEATURE_COLLECTION_TYPE.to_string(),
            });
        }
        let collections = document
            .collections
            .into_iter()
            .filter_map(|collection| {
                let id = collection.get("id")?.as_str()?.to_string();
                Some((id, collection))
            })
            .collect();
        Ok(ResultSet::aggregate(
            document.properties.search,
            document.features,
            collections,
        ))
    }
}

impl TryFrom<Value> for ResultSet {
    type Error = Error;

    /// Loads a saved result set.
    ///
    /// # Examples
    ///
    /// ```
    /// use satsearch::{Error, ResultSet};
    /// use serde_json::json;
    ///
    /// let result_set = ResultSet::try_from(json!({"type": "FeatureCollection", "features": []})).unwrap();
    /// assert!(result_set.is_empty());
    ///
    /// let error = ResultSet::try_from(json!({"type": "Feature"})).unwrap_err();
    /// assert!(matches!(error, Error::IncorrectType { .. }));
    /// ```
    fn try_from(value: Value) -> Result<ResultSet> {
        let document: Document = serde_json::from_value(value)?;
        ResultSet::from_document(document)
    }
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        DocumentRef {
            r#type: FEATURE_COLLECTION_TYPE,
            features: &self.items,
            collections: self.collections.values().collect(),
            properties: PropertiesRef {
                search: &self.search,
            },
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResultSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let document = Document::deserialize(deserializer)?;
        ResultSet::from_document(document).map_err(D::Error::custom)
    }
}
