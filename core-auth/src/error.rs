use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Graph client credentials are not configured. Set GRAPH_CLIENT_ID and GRAPH_CLIENT_SECRET.")]
    CredentialsNotConfigured,

    #[error("Token endpoint returned {status}: {body}")]
    TokenRequestFailed { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
