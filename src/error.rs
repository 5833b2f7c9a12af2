//! Error types

/// Failures of the filter list itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// A query arrived before the source list finished loading.
    #[error("source list not loaded yet")]
    Unloaded,

    /// The source list can only be loaded once.
    #[error("source list already loaded")]
    AlreadyLoaded,
}

/// Failures while fetching the source list.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Failed to read \"{path}\": {source}")]
    File {
        path: String,
        source: std::io::Error,
    },

    /// The body was not the expected `{ field: [string, ...] }` object.
    #[error("Malformed source payload: {0}")]
    Malformed(String),
}

/// Failures reading or writing a YAML file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to open \"{0}\": {1}")]
    File(String, std::io::Error),

    #[error("Failed to parse \"{0}\": {1}")]
    Yaml(String, serde_yaml::Error),

    #[error("Invalid log level \"{0}\"")]
    LogLevel(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logger error: {0}")]
    Logger(#[from] log::SetLoggerError),
}
