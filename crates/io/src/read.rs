use crate::{Error, FromJsonPath, Result};
use satsearch::ResultSet;
use serde_json::Value;
use std::path::Path;

/// Reads a saved result set from a path.
///
/// # Examples
///
/// ```no_run
/// let result_set = satsearch_io::read("results.json").unwrap();
/// println!("{} items found", result_set.len());
/// ```
pub fn read(path: impl AsRef<Path>) -> Result<ResultSet> {
    let path = path.as_ref();
    let value = Value::from_json_path(path).map_err(|err| {
        if let Error::Io(err) = err {
            Error::FromPath {
                io: err,
                path: path.to_string_lossy().into_owned(),
            }
        } else {
            err
        }
    })?;
    tracing::debug!("read {}", path.display());
    ResultSet::try_from(value).map_err(Error::from)
}
