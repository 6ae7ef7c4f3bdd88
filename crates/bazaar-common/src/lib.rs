pub mod errors;
pub mod id;

pub use errors::{BazaarError, ConfigError, PresenceError};
pub use id::{new_id, UserId};

pub type Result<T> = std::result::Result<T, BazaarError>;
