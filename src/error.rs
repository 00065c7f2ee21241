use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    BadBindAddress(String),
    BadPort(String),
    EmptyStoragePath,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::BadBindAddress(e) => write!(f, "Bind address error: {}", e),
            ConfigError::BadPort(e) => write!(f, "Port error: {}", e),
            ConfigError::EmptyStoragePath => write!(f, "Storage path must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug)]
pub enum StoreError {
    NotFound,
    InvalidVote,
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "No stories with this id"),
            StoreError::InvalidVote => {
                write!(f, "Can't downvote a story with a score of 0")
            }
            StoreError::Unavailable(e) => write!(f, "Storage unavailable: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug, PartialEq, Eq)]
pub enum QueryError {
    InvalidSortField,
    InvalidSortOrder,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::InvalidSortField => write!(
                f,
                "'sort' query parameter takes values 'title', 'score', 'created', 'modified'"
            ),
            QueryError::InvalidSortOrder => write!(
                f,
                "'order' query parameter only takes values 'ascending', 'descending'"
            ),
        }
    }
}

impl std::error::Error for QueryError {}
