use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TmsError {
    #[error("unauthorized: {body}")]
    Unauthorized { body: String },

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("request rejected: status={status}, body={body}")]
    Validation { status: u16, body: String },

    #[error("api error: status={status}, body={body}")]
    Api { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("export failed: {reason}")]
    Export { reason: String },

    #[error("an export is already in progress")]
    ExportInProgress,

    #[error("token store error: {reason}")]
    TokenStore { reason: String },

    #[error("config parse error in {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TmsError {
    /// HTTP status carried by the error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } | Self::InvalidCredentials => Some(401),
            Self::Validation { status, .. } | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

pub type Result<T> = std::result::Result<T, TmsError>;
