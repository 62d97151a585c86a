use crate::{Error, Result, Sortby, filter};
use geojson::Geometry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The parameters a caller supplies for a search.
///
/// Everything the API understands has a named field. Anything else goes in
/// [SearchSpec::additional_fields] and is forwarded verbatim.
///
/// # Examples
///
/// ```
/// use satsearch::SearchSpec;
///
/// let spec = SearchSpec::new()
///     .collections(vec!["sentinel-s2-l2a-cogs".to_string()])
///     .datetime("2020-06-01/2020-06-30")
///     .query(vec!["eo:cloud_cover<=10".to_string()])
///     .limit(50);
/// let search = spec.translate().unwrap();
/// assert_eq!(search.collections, vec!["sentinel-s2-l2a-cogs"]);
/// ```
#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchSpec {
    /// Searches items by performing intersection between their geometry and provided GeoJSON geometry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intersects: Option<Geometry>,

    /// Requested bounding box.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    /// Single date+time, or a range ('/' separator).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    /// Collection ids that each matching item must be in.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub collections: Vec<String>,

    /// Item ids to return.
    ///
    /// When set, the other filters are ignored.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ids: Vec<String>,

    /// Property comparisons, e.g. `eo:cloud_cover<=10`.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub query: Vec<String>,

    /// Signed field names to sort by, e.g. `-datetime`.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sortby: Vec<String>,

    /// The maximum number of items to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// Server-specific parameters.
    #[serde(flatten)]
    pub additional_fields: Map<String, Value>,
}

/// A translated search, ready to be sent as a request body.
#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
pub struct Search {
    /// Searches items by performing intersection between their geometry and provided GeoJSON geometry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intersects: Option<Geometry>,

    /// Requested bounding box.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    /// Single date+time, or a range ('/' separator).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    /// Collection ids that each matching item must be in.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub collections: Vec<String>,

    /// Item ids to return.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ids: Vec<String>,

    /// The number of items per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// The structured query object, keyed by field and then by operator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Map<String, Value>>,

    /// Sort directives, in precedence order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sortby: Vec<Sortby>,

    /// Server-specific parameters.
    #[serde(flatten)]
    pub additional_fields: Map<String, Value>,
}

/// GET parameters for the search endpoint.
#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
pub struct GetSearch {
    /// The intersects geometry, as a JSON string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intersects: Option<String>,

    /// Comma-delimited bounding box.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<String>,

    /// Single date+time, or a range ('/' separator).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    /// Comma-delimited list of collection ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<String>,

    /// Comma-delimited list of item ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<String>,

    /// The page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,

    /// The query object, as a JSON string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Comma-delimited list of `+field`/`-field` sorts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sortby: Option<String>,

    /// Server-specific parameters.
    #[serde(flatten)]
    pub additional_fields: IndexMap<String, String>,
}

impl SearchSpec {
    /// Creates a new, empty search spec.
    ///
    /// # Examples
    ///
    /// ```
    /// use satsearch::SearchSpec;
    ///
    /// let spec = SearchSpec::new();
    /// ```
    pub fn new() -> SearchSpec {
        SearchSpec::default()
    }

    /// Sets the intersects geometry.
    pub fn intersects(mut self, intersects: impl Into<Geometry>) -> SearchSpec {
        self.intersects = Some(intersects.into());
        self
    }

    /// Sets the bbox.
    pub fn bbox(mut self, bbox: Vec<f64>) -> SearchSpec {
        self.bbox = Some(bbox);
        self
    }

    /// Sets the datetime.
    pub fn datetime(mut self, datetime: impl ToString) -> SearchSpec {
        self.datetime = Some(datetime.to_string());
        self
    }

    /// Sets the collections.
    pub fn collections(mut self, collections: Vec<String>) -> SearchSpec {
        self.collections = collections;
        self
    }

    /// Sets the ids.
    pub fn ids(mut self, ids: Vec<String>) -> SearchSpec {
        self.ids = ids;
        self
    }

    /// Sets the query expressions.
    pub fn query(mut self, query: Vec<String>) -> SearchSpec {
        self.query = query;
        self
    }

    /// Sets the sortby tokens.
    pub fn sortby(mut self, sortby: Vec<String>) -> SearchSpec {
        self.sortby = sortby;
        self
    }

    /// Sets the maximum number of items to return.
    pub fn limit(mut self, limit: u64) -> SearchSpec {
        self.limit = Some(limit);
        self
    }

    /// Sets a server-specific parameter.
    ///
    /// # Examples
    ///
    /// ```
    /// use satsearch::SearchSpec;
    ///
    /// let spec = SearchSpec::new().field("token", "next:abc");
    /// assert_eq!(spec.additional_fields["token"], "next:abc");
    /// ```
    pub fn field(mut self, key: impl ToString, value: impl Into<Value>) -> SearchSpec {
        let _ = self.additional_fields.insert(key.to_string(), value.into());
        self
    }

    /// Translates this spec into the structured search the API expects.
    ///
    /// Query expressions are parsed and merged field by field, and sortby
    /// tokens become sort directives. Everything else passes through. If ids
    /// are set, only ids, collections, and limit are kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use satsearch::SearchSpec;
    /// use serde_json::json;
    ///
    /// let search = SearchSpec::new()
    ///     .query(vec!["a>1".to_string(), "a<10".to_string()])
    ///     .translate()
    ///     .unwrap();
    /// assert_eq!(
    ///     serde_json::to_value(search).unwrap(),
    ///     json!({"query": {"a": {"gt": "1", "lt": "10"}}})
    /// );
    /// ```
    pub fn translate(&self) -> Result<Search> {
        let query = if self.query.is_empty() {
            None
        } else {
            Some(filter::parse_query(&self.query)?)
        };
        let sortby = self
            .sortby
            .iter()
            .map(|s| s.parse())
            .collect::<Result<Vec<Sortby>>>()?;
        if !self.ids.is_empty() {
            if self.has_filters() {
                tracing::debug!("ids are set, ignoring other search filters");
            }
            return Ok(Search {
                ids: self.ids.clone(),
                collections: self.collections.clone(),
                limit: self.limit,
                ..Default::default()
            });
        }
        let search = Search {
            intersects: self.intersects.clone(),
            bbox: self.bbox.clone(),
            datetime: self.datetime.clone(),
            collections: self.collections.clone(),
            ids: Vec::new(),
            limit: self.limit,
            query,
            sortby,
            additional_fields: self.additional_fields.clone(),
        };
        tracing::debug!(?search, "translated search");
        Ok(search)
    }

    fn has_filters(&self) -> bool {
        self.intersects.is_some()
            || self.bbox.is_some()
            || self.datetime.is_some()
            || !self.query.is_empty()
            || !self.sortby.is_empty()
            || !self.additional_fields.is_empty()
    }
}

impl Search {
    /// Returns this search with a different limit.
    pub fn with_limit(mut self, limit: u64) -> Search {
        self.limit = Some(limit);
        self
    }

    /// Returns this search as a JSON object.
    pub fn to_map(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            value => Err(Error::NotAnObject(value)),
        }
    }
}

impl TryFrom<Search> for GetSearch {
    type Error = Error;

    fn try_from(search: Search) -> Result<GetSearch> {
        let intersects = search
            .intersects
            .map(|intersects| serde_json::to_string(&intersects))
            .transpose()?;
        let bbox = search.bbox.map(|bbox| {
            bbox.iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(",")
        });
        let query = search
            .query
            .map(|query| serde_json::to_string(&query))
            .transpose()?;
        let sortby = if search.sortby.is_empty() {
            None
        } else {
            Some(
                search
                    .sortby
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
            )
        };
        let additional_fields = search
            .additional_fields
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(s) => (key, s),
                value => (key, value.to_string()),
            })
            .collect();
        Ok(GetSearch {
            intersects,
            bbox,
            datetime: search.datetime,
            collections: join(search.collections),
            ids: join(search.ids),
            limit: search.limit.map(|limit| limit.to_string()),
            query,
            sortby,
            additional_fields,
        })
    }
}

fn join(values: Vec<String>) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}
