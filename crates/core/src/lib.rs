//! Search a [STAC API](https://github.com/radiantearth/stac-api-spec) for
//! geospatial items.
//!
//! A search goes through four steps:
//!
//! 1. A [SearchSpec] is translated into the wire-level [Search], parsing
//!    query expressions like `eo:cloud_cover<=10` and sort tokens like
//!    `-datetime`.
//! 2. [paginate] asks the server how many items match, then follows `next`
//!    links until it has enough.
//! 3. [resolve] fetches every collection the items reference, once each.
//! 4. [ResultSet::aggregate] bundles the items, their collections, and the
//!    search into one immutable value.
//!
//! [Client::search] does all four:
//!
//! ```no_run
//! use satsearch::{Client, Config, SearchSpec};
//!
//! let client = Client::new(Config::from_env().unwrap()).unwrap();
//! let spec = SearchSpec::new()
//!     .collections(vec!["sentinel-s2-l2a-cogs".to_string()])
//!     .datetime("2020-01-01/2020-01-31")
//!     .query(vec!["eo:cloud_cover<10".to_string()]);
//! # tokio_test::block_on(async {
//! let result_set = client.search(&spec).await.unwrap();
//! println!("{} items found", result_set.len());
//! # })
//! ```
//!
//! The HTTP side sits behind the [Fetch] trait, so the pagination driver and
//! the collection resolver work against any implementation.

#![warn(missing_docs, unused_qualifications)]

mod client;
mod config;
mod error;
pub mod filter;
mod json;
mod link;
mod page;
mod paginate;
mod resolve;
mod result;
mod search;
mod sort;

pub use {
    client::{Client, Fetch},
    config::{Config, DEFAULT_CONCURRENCY, DEFAULT_PAGE_SIZE, SearchMethod, URL_ENV_VAR},
    error::Error,
    filter::{FilterExpression, Operator},
    json::{FromJson, ToJson, merge},
    link::{Link, NEXT_REL},
    page::{MATCHED_FIELDS, Page},
    paginate::paginate,
    resolve::resolve,
    result::ResultSet,
    search::{GetSearch, Search, SearchSpec},
    sort::{Direction, Sortby},
};

/// A search result item, a GeoJSON Feature.
///
/// Items are kept as raw JSON. Only the `collection` field is ever read.
pub type Item = serde_json::Map<String, serde_json::Value>;

/// A collection, as returned by the collections endpoint.
pub type Collection = serde_json::Map<String, serde_json::Value>;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns a string suitable for use as a HTTP user agent.
pub fn user_agent() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
}
