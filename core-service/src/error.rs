use bridge_traits::storage::FilesystemError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Driver [{driver}] is not supported (disk [{disk}]).")]
    UnsupportedDriver { driver: String, disk: String },

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),

    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
