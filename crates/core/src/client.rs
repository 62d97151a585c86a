use crate::{
    Collection, Config, Error, Link, Page, Result, ResultSet, Search, SearchSpec, paginate,
    resolve,
};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::{future::Future, str::FromStr};
use url::Url;

/// Fetches pages and collections from a search API.
///
/// [Client] is the HTTP implementation. The pagination driver and the
/// collection resolver only depend on this trait.
pub trait Fetch: Send + Sync {
    /// Returns the link for the first page of a search.
    fn search_link(&self, search: &Search) -> Result<Link>;

    /// Performs one request and decodes the page it returns.
    fn fetch(&self, link: &Link) -> impl Future<Output = Result<Page>> + Send;

    /// Fetches a collection by id.
    fn collection(&self, id: &str) -> impl Future<Output = Result<Collection>> + Send;
}

/// A client for a STAC API.
///
/// A client holds no per-search state, so one client can run many searches
/// at once.
///
/// # Examples
///
/// ```no_run
/// use satsearch::{Client, Config, SearchSpec};
///
/// let config = Config::new("https://earth-search.aws.element84.com/v1").unwrap();
/// let client = Client::new(config).unwrap();
/// let spec = SearchSpec::new()
///     .collections(vec!["sentinel-2-l2a".to_string()])
///     .datetime("2023-06-01/2023-06-02")
///     .limit(10);
/// # tokio_test::block_on(async {
/// let result_set = client.search(&spec).await.unwrap();
/// assert!(result_set.len() <= 10);
/// # })
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    client: reqwest::Client,
    config: Config,
}

impl Client {
    /// Creates a new client.
    pub fn new(config: Config) -> Result<Client> {
        let client = reqwest::Client::builder()
            .user_agent(crate::user_agent())
            .build()?;
        Ok(Client::with_client(client, config))
    }

    /// Creates a new client with the given [reqwest::Client].
    pub fn with_client(client: reqwest::Client, config: Config) -> Client {
        Client { client, config }
    }

    /// Returns this client's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs a search to completion.
    ///
    /// Translates the search parameters, fetches pages until the limit or the
    /// last page, resolves the referenced collections, and returns everything
    /// as one [ResultSet]. Nothing is returned unless every page was fetched.
    pub async fn search(&self, spec: &SearchSpec) -> Result<ResultSet> {
        let search = spec.translate()?;
        let items = paginate(self, &search, spec.limit, self.config.page_size).await?;
        tracing::info!("fetched {} items", items.len());
        let collections = resolve(self, &items, self.config.concurrency).await;
        Ok(ResultSet::aggregate(spec.clone(), items, collections))
    }

    /// Returns the number of items matching a search, without fetching them.
    ///
    /// Returns `None` if the server doesn't report a count.
    pub async fn found(&self, spec: &SearchSpec) -> Result<Option<u64>> {
        let search = spec.translate()?.with_limit(0);
        let page = self.fetch(&self.search_link(&search)?).await?;
        Ok(page.matched())
    }

    fn headers(&self, link_headers: Option<&Map<String, Value>>) -> Result<HeaderMap> {
        let mut headers = self.config.header_map()?;
        for (key, value) in link_headers.into_iter().flatten() {
            let value = match value {
                Value::String(s) => HeaderValue::from_str(s)?,
                value => HeaderValue::from_str(&value.to_string())?,
            };
            let _ = headers.insert(HeaderName::from_str(key)?, value);
        }
        Ok(headers)
    }
}

impl Fetch for Client {
    fn search_link(&self, search: &Search) -> Result<Link> {
        Link::search(self.config.method, self.config.search_url()?, search)
    }

    async fn fetch(&self, link: &Link) -> Result<Page> {
        let method = link.method()?;
        let url: Url = link.href.parse()?;
        tracing::debug!("{method} {url}");
        let mut request = self
            .client
            .request(method.clone(), url)
            .headers(self.headers(link.headers.as_ref())?);
        if method == Method::POST
            && let Some(body) = &link.body
        {
            request = request.json(body);
        }
        send(request).await
    }

    async fn collection(&self, id: &str) -> Result<Collection> {
        let url = self.config.collection_url(id)?;
        tracing::debug!("GET {url}");
        let request = self.client.get(url).headers(self.headers(None)?);
        match send(request).await? {
            Value::Object(collection) => Ok(collection),
            value => Err(Error::NotAnObject(value)),
        }
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(Error::from)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(Error::Api {
            status: status.as_u16(),
            body,
        })
    }
}
