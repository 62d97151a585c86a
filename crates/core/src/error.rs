use thiserror::Error;

/// Error enum for crate-specific errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The server returned a non-success HTTP status.
    #[error("api error: status={status}, body={body}")]
    Api {
        /// The HTTP status code.
        status: u16,

        /// The response body, as text.
        body: String,
    },

    /// Required configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Returned when a document has the wrong type field.
    #[error("incorrect type: expected={expected}, actual={actual}")]
    IncorrectType {
        /// The actual type field on the object.
        actual: String,

        /// The expected value.
        expected: String,
    },

    /// A query expression could not be split into a field, operator, and value.
    #[error("invalid filter syntax: {0}")]
    InvalidFilterSyntax(String),

    /// [http::header::InvalidHeaderName]
    #[error(transparent)]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    /// [http::header::InvalidHeaderValue]
    #[error(transparent)]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// A link carried an HTTP method we can't send.
    #[error("invalid method: {0}")]
    InvalidMethod(String),

    /// A sortby token had no field name.
    #[error("invalid sort syntax: {0:?}")]
    InvalidSortSyntax(String),

    /// This is not a JSON object.
    #[error("json value is not an object")]
    NotAnObject(serde_json::Value),

    /// [serde_json::Error]
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    /// [serde_urlencoded::ser::Error]
    #[error(transparent)]
    SerdeUrlencoded(#[from] serde_urlencoded::ser::Error),

    /// Network-level failure reaching the API.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// [url::ParseError]
    #[error(transparent)]
    UrlParse(#[from] url::ParseError),
}
