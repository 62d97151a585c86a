use crate::{Result, ToJsonPath};
use satsearch::ResultSet;
use std::path::Path;

/// Writes a result set to a path as a GeoJSON FeatureCollection.
///
/// # Examples
///
/// ```no_run
/// use satsearch::ResultSet;
///
/// satsearch_io::write("results.json", &ResultSet::default(), true).unwrap();
/// ```
pub fn write(path: impl AsRef<Path>, result_set: &ResultSet, pretty: bool) -> Result<()> {
    let path = path.as_ref();
    result_set.to_json_path(path, pretty)?;
    tracing::info!("saved {} items to {}", result_set.len(), path.display());
    Ok(())
}
