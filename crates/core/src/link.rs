use crate::{Error, GetSearch, Result, Search, SearchMethod};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// The `rel` of a link to the next page of results.
pub const NEXT_REL: &str = "next";

/// A link to a resource, possibly with the request needed to fetch it.
///
/// Servers use links with `rel="next"` to describe how to get the next page
/// of a search. The first request of a search is also a link, so every page
/// is fetched the same way.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Link {
    /// The actual link in the format of an URL.
    pub href: String,

    /// Relationship between the current document and the linked document.
    pub rel: String,

    /// Media type of the referenced entity.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,

    /// A human readable title to be used in rendered displays of the link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// The HTTP method of the request, usually `GET` or `POST`. Defaults to `GET`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Headers to send with the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,

    /// The JSON body of a POST request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Map<String, Value>>,

    /// If true, the headers and body are merged over the ones of the search's
    /// first request.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub merge: bool,

    /// Additional fields on the link.
    #[serde(flatten)]
    pub additional_fields: Map<String, Value>,
}

impl Link {
    /// Creates a new link.
    ///
    /// # Examples
    ///
    /// ```
    /// use satsearch::Link;
    ///
    /// let link = Link::new("http://stac.test/search?page=2", "next");
    /// assert!(link.is_next());
    /// ```
    pub fn new(href: impl ToString, rel: impl ToString) -> Link {
        Link {
            href: href.to_string(),
            rel: rel.to_string(),
            ..Default::default()
        }
    }

    /// Creates the link for the first page of a search.
    ///
    /// POST searches put the search in the JSON body. GET searches encode it
    /// in the query string.
    ///
    /// # Examples
    ///
    /// ```
    /// use satsearch::{Link, Search, SearchMethod};
    ///
    /// let url = "http://stac.test/search".parse().unwrap();
    /// let search = Search::default().with_limit(10);
    /// let link = Link::search(SearchMethod::Get, url, &search).unwrap();
    /// assert_eq!(link.href, "http://stac.test/search?limit=10");
    /// ```
    pub fn search(method: SearchMethod, mut url: Url, search: &Search) -> Result<Link> {
        match method {
            SearchMethod::Post => Ok(Link {
                href: url.to_string(),
                rel: "search".to_string(),
                r#type: Some("application/geo+json".to_string()),
                method: Some("POST".to_string()),
                body: Some(search.to_map()?),
                ..Default::default()
            }),
            SearchMethod::Get => {
                let get_search: GetSearch = search.clone().try_into()?;
                let query = serde_urlencoded::to_string(get_search)?;
                let query = match url.query() {
                    Some(existing) if !existing.is_empty() && !query.is_empty() => {
                        format!("{existing}&{query}")
                    }
                    Some(existing) if !existing.is_empty() => existing.to_string(),
                    _ => query,
                };
                url.set_query(if query.is_empty() { None } else { Some(&query) });
                Ok(Link {
                    href: url.to_string(),
                    rel: "search".to_string(),
                    r#type: Some("application/geo+json".to_string()),
                    method: Some("GET".to_string()),
                    ..Default::default()
                })
            }
        }
    }

    /// Returns true if this is a link to the next page.
    pub fn is_next(&self) -> bool {
        self.rel == NEXT_REL
    }

    /// Returns this link's HTTP method, defaulting to `GET`.
    ///
    /// # Examples
    ///
    /// ```
    /// use satsearch::Link;
    ///
    /// let mut link = Link::new("http://stac.test/search", "next");
    /// assert_eq!(link.method().unwrap(), http::Method::GET);
    /// link.method = Some("post".to_string());
    /// assert_eq!(link.method().unwrap(), http::Method::POST);
    /// ```
    pub fn method(&self) -> Result<Method> {
        match self.method.as_deref() {
            None => Ok(Method::GET),
            Some(method) => Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .map_err(|_| Error::InvalidMethod(method.to_string())),
        }
    }

    /// Applies this link's merge policy against the search's first request.
    ///
    /// If `merge` is true, this link's headers and body are merged over the
    /// original's, so criteria the server left out are carried forward.
    /// Otherwise the link is returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use satsearch::Link;
    /// use serde_json::json;
    ///
    /// let mut original = Link::new("http://stac.test/search", "search");
    /// original.body = json!({"collections": ["c1"], "limit": 10}).as_object().cloned();
    /// let mut next = Link::new("http://stac.test/search", "next");
    /// next.body = json!({"token": "abc"}).as_object().cloned();
    /// next.merge = true;
    /// let next = next.continue_from(&original);
    /// assert_eq!(
    ///     serde_json::Value::Object(next.body.unwrap()),
    ///     json!({"collections": ["c1"], "limit": 10, "token": "abc"})
    /// );
    /// ```
    pub fn continue_from(mut self, original: &Link) -> Link {
        if self.merge {
            self.headers = merge_over(original.headers.as_ref(), self.headers);
            self.body = merge_over(original.body.as_ref(), self.body);
        }
        self
    }
}

fn merge_over(
    original: Option<&Map<String, Value>>,
    map: Option<Map<String, Value>>,
) -> Option<Map<String, Value>> {
    match (original, map) {
        (None, map) => map,
        (Some(original), None) => Some(original.clone()),
        (Some(original), Some(map)) => {
            let mut merged = original.clone();
            crate::merge(&mut merged, map);
            Some(merged)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Link;
    use crate::{Search, SearchMethod, Sortby};
    use serde_json::{Value, json};

    fn object(value: Value) -> Option<serde_json::Map<String, Value>> {
        value.as_object().cloned()
    }

    #[test]
    fn deserialize_stac_link() {
        let link: Link = serde_json::from_value(json!({
            "rel": "next",
            "href": "http://stac.test/search",
            "method": "POST",
            "body": {"token": "next:abc"},
            "merge": true
        }))
        .unwrap();
        assert!(link.is_next());
        assert!(link.merge);
        assert_eq!(link.method().unwrap(), http::Method::POST);
    }

    #[test]
    fn merge_defaults_to_false() {
        let link: Link =
            serde_json::from_value(json!({"rel": "next", "href": "http://stac.test"})).unwrap();
        assert!(!link.merge);
        assert_eq!(
            serde_json::to_value(link).unwrap(),
            json!({"rel": "next", "href": "http://stac.test"})
        );
    }

    #[test]
    fn continue_with_merge() {
        let mut original = Link::new("http://stac.test/search", "search");
        original.headers = object(json!({"x-original": "yes", "x-shared": "original"}));
        original.body = object(json!({"collections": ["c1"], "query": {"a": {"gt": "1"}}}));
        let mut next = Link::new("http://stac.test/search", "next");
        next.headers = object(json!({"x-shared": "link"}));
        next.body = object(json!({"page": 2, "query": {"a": {"lt": "10"}}}));
        next.merge = true;

        let next = next.continue_from(&original);
        assert_eq!(
            Value::Object(next.headers.unwrap()),
            json!({"x-original": "yes", "x-shared": "link"})
        );
        assert_eq!(
            Value::Object(next.body.unwrap()),
            json!({"collections": ["c1"], "query": {"a": {"gt": "1", "lt": "10"}}, "page": 2})
        );
    }

    #[test]
    fn continue_without_merge() {
        let mut original = Link::new("http://stac.test/search", "search");
        original.body = object(json!({"collections": ["c1"]}));
        let mut next = Link::new("http://stac.test/search", "next");
        next.body = object(json!({"page": 2}));

        let next = next.continue_from(&original);
        assert_eq!(Value::Object(next.body.unwrap()), json!({"page": 2}));
        assert!(next.headers.is_none());
    }

    #[test]
    fn post_search() {
        let search = Search {
            collections: vec!["c1".to_string()],
            limit: Some(10),
            ..Default::default()
        };
        let link = Link::search(
            SearchMethod::Post,
            "http://stac.test/search".parse().unwrap(),
            &search,
        )
        .unwrap();
        assert_eq!(link.method().unwrap(), http::Method::POST);
        assert_eq!(
            Value::Object(link.body.unwrap()),
            json!({"collections": ["c1"], "limit": 10})
        );
    }

    #[test]
    fn get_search() {
        let search = Search {
            collections: vec!["c1".to_string()],
            sortby: vec![Sortby::desc("datetime")],
            ..Default::default()
        };
        let link = Link::search(
            SearchMethod::Get,
            "http://stac.test/search".parse().unwrap(),
            &search,
        )
        .unwrap();
        assert_eq!(link.method().unwrap(), http::Method::GET);
        assert!(link.body.is_none());
        assert_eq!(
            link.href,
            "http://stac.test/search?collections=c1&sortby=-datetime"
        );
    }

    #[test]
    fn get_search_keeps_root_query() {
        let search = Search {
            collections: vec!["c1".to_string()],
            ..Default::default()
        };
        let link = Link::search(
            SearchMethod::Get,
            "http://stac.test/search?api_key=secret".parse().unwrap(),
            &search,
        )
        .unwrap();
        assert_eq!(
            link.href,
            "http://stac.test/search?api_key=secret&collections=c1"
        );
        let link = Link::search(
            SearchMethod::Get,
            "http://stac.test/search?api_key=secret".parse().unwrap(),
            &Search::default(),
        )
        .unwrap();
        assert_eq!(link.href, "http://stac.test/search?api_key=secret");
    }

    #[test]
    fn invalid_method() {
        let mut link = Link::new("http://stac.test", "next");
        link.method = Some("NOT A METHOD".to_string());
        let _ = link.method().unwrap_err();
    }
}
