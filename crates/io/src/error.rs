use thiserror::Error;

/// Crate-specific error enum
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Every href for an asset failed to download.
    #[error("could not download asset {key} of item {id} from any of {hrefs:?}")]
    AllCandidatesFailed {
        /// The item id.
        id: String,

        /// The asset key.
        key: String,

        /// The hrefs that were tried, in order.
        hrefs: Vec<String>,
    },

    /// Returned when unable to read a result set from a path.
    #[error("{io}: {path}")]
    FromPath {
        /// The [std::io::Error]
        #[source]
        io: std::io::Error,

        /// The path.
        path: String,
    },

    /// [std::io::Error]
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An item has no asset with the requested key.
    #[error("item {id} has no asset {key}")]
    MissingAsset {
        /// The item id.
        id: String,

        /// The asset key.
        key: String,
    },

    #[error(transparent)]
    /// [reqwest::Error]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    /// [satsearch::Error]
    Satsearch(#[from] satsearch::Error),

    #[error(transparent)]
    /// [serde_json::Error]
    SerdeJson(#[from] serde_json::Error),
}
