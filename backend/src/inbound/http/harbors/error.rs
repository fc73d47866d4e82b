//! Failure taxonomy for a harbor batch upsert.

use actix_web::http::StatusCode;

use super::decoder::{DecodeError, Delimiter};
use super::response::FlushError;
use crate::domain::ports::HarborRepositoryError;
use crate::domain::{Unloc, ValidationErrors};

/// Reasons a batch upsert aborts. The display text is what clients see,
/// except for validation failures which are sent as a JSON array.
#[derive(Debug, thiserror::Error)]
pub enum UpsertError {
    #[error("{}", .delimiter.client_message())]
    MalformedEnvelope {
        delimiter: Delimiter,
        #[source]
        source: DecodeError,
    },
    #[error("invalid JSON key")]
    InvalidKey(#[source] DecodeError),
    #[error("invalid JSON harbor structure")]
    MalformedRecord(#[source] DecodeError),
    #[error("{0}")]
    ValidationFailed(ValidationErrors),
    #[error("error upserting harbor")]
    StorageFailure {
        unloc: Unloc,
        #[source]
        source: HarborRepositoryError,
    },
    #[error(transparent)]
    FlushFailure(#[from] FlushError),
}

impl From<DecodeError> for UpsertError {
    fn from(source: DecodeError) -> Self {
        match source {
            DecodeError::MalformedEnvelope { delimiter, .. } => {
                Self::MalformedEnvelope { delimiter, source }
            }
            DecodeError::InvalidKey { .. } => Self::InvalidKey(source),
            DecodeError::MalformedRecord { .. } => Self::MalformedRecord(source),
        }
    }
}

impl UpsertError {
    /// HTTP status sent for this failure.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedEnvelope { .. }
            | Self::InvalidKey(_)
            | Self::MalformedRecord(_)
            | Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::StorageFailure { .. } | Self::FlushFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text placed under `error` in the response body.
    ///
    /// # Errors
    ///
    /// Fails only when validation violations cannot be serialized.
    pub fn client_message(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::ValidationFailed(errors) => errors.to_json(),
            other => Ok(other.to_string()),
        }
    }
}
