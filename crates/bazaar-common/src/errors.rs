use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures surfaced by the presence layer.
///
/// None of these are fatal. A denied permission keeps the tracker stopped,
/// a failed write is dropped until the next heartbeat, and a broken feed
/// leaves the peer view stale until the caller subscribes again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresenceError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("presence write failed: {0}")]
    TransientWriteFailure(String),

    #[error("presence subscription error: {0}")]
    Subscription(String),

    #[error("presence tracking already started")]
    AlreadyStarted,

    #[error("presence tracking cancelled before first fix")]
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum BazaarError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Presence(#[from] PresenceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
