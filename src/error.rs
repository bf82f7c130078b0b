use thiserror::Error;

pub type Result<T> = std::result::Result<T, GcontribError>;

#[derive(Error, Debug)]
pub enum GcontribError {
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
    #[error("Git repository error: {0}")]
    GitRepo(String),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Blame failed for {path}: {message}")]
    Blame { path: String, message: String },
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Malformed path: {0:?}")]
    MalformedPath(String),
    #[error("Invalid day buckets: {0}")]
    InvalidBuckets(String),
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] ignore::Error),
}

// Manual From implementations for unboxed to boxed conversions
impl From<gix::discover::Error> for GcontribError {
    fn from(err: gix::discover::Error) -> Self {
        GcontribError::GitDiscover(Box::new(err))
    }
}

impl From<gix::object::find::existing::Error> for GcontribError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        GcontribError::ObjectFind(Box::new(err))
    }
}
