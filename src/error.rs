use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Transport,
    Protocol,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{flag} '{path}' doesn't exist")]
    MissingFile { flag: &'static str, path: String },

    #[error("invalid controller URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("certificate file contains no certificate blocks")]
    EmptyBundle,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("controller answered {0}")]
    Status(StatusCode),

    /// `actual` is `None` when the header was absent altogether.
    #[error("expected content type '{expected}', got {actual:?}")]
    UnexpectedContentType {
        expected: &'static str,
        actual: Option<String>,
    },

    #[error("response is missing the '{0}' marker")]
    MissingMarker(&'static str),

    #[error("response XML has no {0} element")]
    MissingElement(&'static str),

    #[error("malformed XML response: {0}")]
    MalformedXml(#[from] quick_xml::DeError),

    #[error("attribute {name} has unexpected value '{value}'")]
    InvalidAttribute { name: &'static str, value: String },

    #[error("controller rejected the operation: {0}")]
    Rejected(&'static str),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingFile { .. } | Self::InvalidUrl { .. } | Self::EmptyBundle => {
                ErrorKind::Input
            }
            Self::Transport(_) => ErrorKind::Transport,
            Self::Status(_)
            | Self::UnexpectedContentType { .. }
            | Self::MissingMarker(_)
            | Self::MissingElement(_)
            | Self::MalformedXml(_)
            | Self::InvalidAttribute { .. }
            | Self::Rejected(_) => ErrorKind::Protocol,
        }
    }

    pub(crate) fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
