use crate::Result;
use satsearch::{FromJson, ToJson};
use serde::Serialize;
use std::{
    fs::{self, File},
    io::Read,
    path::Path,
};

/// Create a value from a JSON file.
pub trait FromJsonPath: FromJson {
    /// Reads JSON data from a file.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use satsearch::ResultSet;
    /// use satsearch_io::FromJsonPath;
    ///
    /// let result_set = ResultSet::from_json_path("results.json").unwrap();
    /// ```
    fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut buf = Vec::new();
        let _ = File::open(path)?.read_to_end(&mut buf)?;
        Self::from_json_slice(&buf).map_err(Into::into)
    }
}

/// Write a value to a JSON file.
pub trait ToJsonPath: ToJson {
    /// Writes a value to a path as JSON, creating parent directories.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use satsearch::SearchSpec;
    /// use satsearch_io::ToJsonPath;
    ///
    /// SearchSpec::new().to_json_path("search.json", true).unwrap();
    /// ```
    fn to_json_path(&self, path: impl AsRef<Path>, pretty: bool) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        self.to_json_writer(file, pretty)?;
        Ok(())
    }
}

impl<T: FromJson> FromJsonPath for T {}
impl<T: Serialize> ToJsonPath for T {}
