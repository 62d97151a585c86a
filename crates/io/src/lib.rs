//! Save, load, and download the results of STAC API searches.
//!
//! Result sets are saved as GeoJSON FeatureCollections that carry the
//! search that produced them:
//!
//! ```no_run
//! use satsearch::ResultSet;
//!
//! let result_set = ResultSet::default();
//! satsearch_io::write("results.json", &result_set, true).unwrap();
//! let result_set = satsearch_io::read("results.json").unwrap();
//! ```
//!
//! Assets are downloaded with a [Downloader], which names files after a
//! [FilenameTemplate].

mod download;
mod error;
mod json;
mod read;
mod template;
mod write;

pub use {
    download::Downloader,
    error::Error,
    json::{FromJsonPath, ToJsonPath},
    read::read,
    template::{DEFAULT_FILENAME_TEMPLATE, FilenameTemplate, item_date, item_field},
    write::write,
};

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns a string suitable for use as a HTTP user agent.
pub fn user_agent() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use satsearch::{ResultSet, SearchSpec};
    use serde_json::json;
    use tempfile::TempDir;

    fn result_set() -> ResultSet {
        let item = json!({"type": "Feature", "id": "a", "collection": "c1"});
        let mut collections = IndexMap::new();
        let _ = collections.insert(
            "c1".to_string(),
            json!({"type": "Collection", "id": "c1"})
                .as_object()
                .unwrap()
                .clone(),
        );
        ResultSet::aggregate(
            SearchSpec::new().collections(vec!["c1".to_string()]),
            vec![item.as_object().unwrap().clone()],
            collections,
        )
    }

    #[test]
    fn write_then_read() {
        let tempdir = TempDir::new().unwrap();
        let path = tempdir.path().join("results.json");
        super::write(&path, &result_set(), true).unwrap();
        assert_eq!(super::read(&path).unwrap(), result_set());
    }

    #[test]
    fn read_wrong_type() {
        let tempdir = TempDir::new().unwrap();
        let path = tempdir.path().join("item.json");
        std::fs::write(&path, r#"{"type": "Feature", "id": "a"}"#).unwrap();
        assert!(matches!(
            super::read(&path).unwrap_err(),
            crate::Error::Satsearch(satsearch::Error::IncorrectType { .. })
        ));
    }

    #[test]
    fn read_missing_file() {
        let tempdir = TempDir::new().unwrap();
        assert!(matches!(
            super::read(tempdir.path().join("nope.json")).unwrap_err(),
            crate::Error::FromPath { .. }
        ));
    }
}
