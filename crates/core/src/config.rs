use crate::{Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use url::Url;

/// The environment variable that holds the API url.
pub const URL_ENV_VAR: &str = "STAC_API_URL";

/// The default number of items requested per page.
pub const DEFAULT_PAGE_SIZE: u64 = 1000;

/// The default number of collections fetched at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// The HTTP method used for the search endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SearchMethod {
    /// POST with a JSON body.
    #[default]
    Post,

    /// GET with query-string parameters.
    Get,
}

/// Configuration for a [Client](crate::Client).
///
/// # Examples
///
/// ```
/// use satsearch::{Config, SearchMethod};
///
/// let config = Config::new("https://earth-search.aws.element84.com/v1")
///     .unwrap()
///     .with_method(SearchMethod::Get)
///     .with_page_size(100);
/// assert_eq!(
///     config.search_url().unwrap().as_str(),
///     "https://earth-search.aws.element84.com/v1/search"
/// );
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The root url of the API.
    pub url: Url,

    /// Headers sent with every request.
    pub headers: IndexMap<String, String>,

    /// The method used for search requests.
    pub method: SearchMethod,

    /// The number of items requested per page.
    pub page_size: u64,

    /// The number of collections fetched at once.
    pub concurrency: usize,
}

impl Config {
    /// Creates a new configuration for an API root url.
    pub fn new(url: &str) -> Result<Config> {
        Ok(Config {
            url: url.parse()?,
            headers: IndexMap::new(),
            method: SearchMethod::default(),
            page_size: DEFAULT_PAGE_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
        })
    }

    /// Creates a new configuration from the `STAC_API_URL` environment variable.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// let config = satsearch::Config::from_env().unwrap();
    /// ```
    pub fn from_env() -> Result<Config> {
        match std::env::var(URL_ENV_VAR) {
            Ok(url) => Config::new(&url),
            Err(_) => Err(Error::Configuration(format!(
                "no API url provided and {URL_ENV_VAR} is not set"
            ))),
        }
    }

    /// Sets the headers sent with every request.
    pub fn with_headers(mut self, headers: IndexMap<String, String>) -> Config {
        self.headers = headers;
        self
    }

    /// Sets the search method.
    pub fn with_method(mut self, method: SearchMethod) -> Config {
        self.method = method;
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: u64) -> Config {
        self.page_size = page_size;
        self
    }

    /// Sets the number of collections fetched at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Config {
        self.concurrency = concurrency;
        self
    }

    /// Returns the url of the search endpoint.
    pub fn search_url(&self) -> Result<Url> {
        self.endpoint(&["search"])
    }

    /// Returns the url of a collection.
    ///
    /// # Examples
    ///
    /// ```
    /// use satsearch::Config;
    ///
    /// let config = Config::new("http://stac.test/").unwrap();
    /// assert_eq!(
    ///     config.collection_url("sentinel-2").unwrap().as_str(),
    ///     "http://stac.test/collections/sentinel-2"
    /// );
    /// ```
    pub fn collection_url(&self, id: &str) -> Result<Url> {
        self.endpoint(&["collections", id])
    }

    /// Returns the headers as a [HeaderMap].
    pub fn header_map(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (key, value) in &self.headers {
            let _ = headers.insert(
                HeaderName::from_str(key)?,
                HeaderValue::from_str(value)?,
            );
        }
        Ok(headers)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.url.clone();
        let _ = url
            .path_segments_mut()
            .map_err(|_| Error::Configuration(format!("url cannot be a base: {}", self.url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl FromStr for SearchMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<SearchMethod> {
        match s.to_ascii_uppercase().as_str() {
            "POST" => Ok(SearchMethod::Post),
            "GET" => Ok(SearchMethod::Get),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

impl Display for SearchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchMethod::Post => f.write_str("POST"),
            SearchMethod::Get => f.write_str("GET"),
        }
    }
}
