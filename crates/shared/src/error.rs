use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize)]
pub enum CommonError {
    #[error("could not find resource")]
    NotFound {
        msg: String,
        lookup_id: String,
        #[serde(skip)]
        #[source]
        source: Option<anyhow::Error>,
    },
    #[error("unknown error")]
    Unknown(
        #[serde(skip)]
        #[from]
        anyhow::Error,
    ),
    #[error("invalid request")]
    InvalidRequest {
        msg: String,
        #[serde(skip)]
        #[source]
        source: Option<anyhow::Error>,
    },
    #[error("invalid response")]
    InvalidResponse {
        msg: String,
        #[serde(skip)]
        #[source]
        source: Option<anyhow::Error>,
    },
    #[error("repository error")]
    Repository {
        msg: String,
        #[serde(skip)]
        #[source]
        source: Option<anyhow::Error>,
    },
    #[error("external call timed out")]
    Timeout { operation: String },
    #[error("sqlite database error")]
    SqliteError {
        #[serde(skip)]
        #[from]
        #[source]
        source: libsql::Error,
    },
    #[error("io error")]
    IoError {
        #[serde(skip)]
        #[from]
        #[source]
        source: std::io::Error,
    },
    #[error("url parse error")]
    UrlParseError {
        #[serde(skip)]
        #[from]
        #[source]
        source: url::ParseError,
    },
    #[error("serde json error")]
    SerdeSerializationError {
        #[serde(skip)]
        #[from]
        #[source]
        source: serde_json::Error,
    },
    #[error("var error")]
    VarError {
        #[serde(skip)]
        #[from]
        #[source]
        source: std::env::VarError,
    },
    #[error("reqwest error")]
    ReqwestError {
        #[serde(skip)]
        #[from]
        #[source]
        source: reqwest::Error,
    },
}

impl CommonError {
    /// Short machine-readable name, used in log fields and error payloads.
    pub fn name(&self) -> &'static str {
        match self {
            CommonError::NotFound { .. } => "NotFound",
            CommonError::InvalidRequest { .. } => "InvalidRequest",
            CommonError::InvalidResponse { .. } => "InvalidResponse",
            CommonError::Repository { .. } => "Repository",
            CommonError::Timeout { .. } => "Timeout",
            CommonError::Unknown(_)
            | CommonError::SqliteError { .. }
            | CommonError::IoError { .. }
            | CommonError::UrlParseError { .. }
            | CommonError::SerdeSerializationError { .. }
            | CommonError::VarError { .. }
            | CommonError::ReqwestError { .. } => "InternalServerError",
        }
    }

    /// Wrap any displayable error as a repository failure.
    pub fn repository(msg: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        CommonError::Repository {
            msg: msg.into(),
            source: Some(source.into()),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    name: String,
    message: String,
}

impl From<&CommonError> for ErrorResponse {
    fn from(error: &CommonError) -> Self {
        Self {
            name: error.name().to_string(),
            message: error.to_string(),
        }
    }
}
