use miette::Diagnostic;
use thiserror::Error;

/// Coarse classification of [`Error`], stable across variant additions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    Auth,
    MalformedResponse,
    MissingField,
    Configuration,
}

#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    #[error("failed to reach smd at `{url}`: {message}")]
    #[diagnostic(
        code(smd::connection),
        help("check that `smd_server` points at a running smd instance")
    )]
    Connection { url: String, message: String },

    #[error("smd rejected the request to `{url}` (status {status})")]
    #[diagnostic(
        code(smd::auth),
        help("the bearer token is read from the variable named by `access_token_envvar`")
    )]
    Auth { url: String, status: u16 },

    #[error("smd returned unexpected status {status} for `{url}`")]
    #[diagnostic(code(smd::unexpected_status))]
    UnexpectedStatus { url: String, status: u16 },

    #[error("malformed response from {source_name}: {message}")]
    #[diagnostic(code(smd::malformed_response))]
    MalformedResponse {
        source_name: String,
        message: String,
    },

    #[error("component {component} is missing required field `{field}`")]
    #[diagnostic(code(smd::missing_field))]
    MissingField {
        field: &'static str,
        component: String,
    },

    #[error("invalid configuration: {0}")]
    #[diagnostic(code(smd::configuration))]
    Configuration(String),

    #[error("components `{first}` and `{second}` both map to host `{host}`")]
    #[diagnostic(
        code(smd::host_name_collision),
        help("two components share a NID; fix the smd data before building the inventory")
    )]
    HostNameCollision {
        host: String,
        first: String,
        second: String,
    },
}

impl Error {
    pub fn malformed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } | Self::UnexpectedStatus { .. } => ErrorKind::Connection,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Self::MissingField { .. } => ErrorKind::MissingField,
            Self::Configuration(_) | Self::HostNameCollision { .. } => ErrorKind::Configuration,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
