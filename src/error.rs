use thiserror::Error;

pub type Result<T> = std::result::Result<T, LocboardError>;

#[derive(Error, Debug)]
pub enum LocboardError {
    #[error("Git error: {0}")]
    Git(String),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("GitHub API error: {0}")]
    Api(String),
    #[error("HTTP error: {0}")]
    Http(Box<ureq::Error>),
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session error: {0}")]
    Session(String),
    #[error("Store error: {0}")]
    Store(String),
    #[error("Other: {0}")]
    Other(String),
}

// ureq's error carries the whole response body, so it is boxed to keep the
// enum small.
impl From<ureq::Error> for LocboardError {
    fn from(err: ureq::Error) -> Self {
        LocboardError::Http(Box::new(err))
    }
}
