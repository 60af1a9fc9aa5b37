use crate::constants::NO_ROWS_ERROR_CODE;

/// Failures reported by a [`Gateway`](crate::gateway::Gateway) call.
///
/// Upstream errors keep the remote store's message verbatim; it is what the views show to the
/// user as a notification description.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{message}")]
    Upstream {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },
    #[error("request to remote store failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to encode {collection} row: {source}")]
    Encode {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode {collection} row: {source}")]
    Decode {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid {collection} row: {reason}")]
    InvalidRow {
        collection: &'static str,
        reason: String,
    },
    #[error("{collection} row {id} was changed by another session")]
    Conflict {
        collection: &'static str,
        id: uuid::Uuid,
    },
}

impl GatewayError {
    /// Builds an upstream error with only a message, as the in-memory gateway reports them.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    /// The upstream error code, when the remote store supplied one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Upstream { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// True when a single-row read found nothing. Callers treat this as an empty result.
    pub fn is_no_rows(&self) -> bool {
        self.code() == Some(NO_ROWS_ERROR_CODE)
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("unknown record type: {0}")]
    UnknownRecordType(String),
    #[error("unknown gender: {0}")]
    UnknownGender(String),
    #[error("unknown profile field: {0}")]
    UnknownProfileField(String),
    #[error("the email address cannot be edited from the portal")]
    ReadOnlyField,
    #[error("invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("no profile is loaded")]
    ProfileNotLoaded,
    #[error("symptoms cannot be empty")]
    EmptySymptoms,
    #[error("unknown language: {0}")]
    UnknownLanguage(String),
    #[error("failed to read seed file: {0}")]
    SeedRead(std::io::Error),
    #[error("failed to parse seed file: {0}")]
    SeedParse(serde_yaml::Error),
}

pub type PortalResult<T> = std::result::Result<T, PortalError>;
