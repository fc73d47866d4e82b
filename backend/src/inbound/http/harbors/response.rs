//! JSON response writer for the harbor endpoint.
//!
//! Encoding and head flushing are strategies held by [`JsonResponder`], so
//! tests can substitute failing implementations without global state.

use std::convert::Infallible;
use std::future::ready;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::web::Bytes;
use actix_web::{HttpResponse, HttpResponseBuilder};
use futures_util::stream;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

/// Body sent when a response cannot be encoded.
pub const INTERNAL_ERROR_BODY: &str = r#"{"error": "internal server error"}"#;

/// Message returned once every harbor in a batch has been stored.
pub const UPSERT_SUCCESS_MESSAGE: &str = "harbors upserted";

/// Success payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageBody {
    #[schema(example = "harbors upserted")]
    pub message: String,
}

/// Failure payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "invalid JSON harbor structure")]
    pub error: String,
}

/// Either payload the endpoint can emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Message(MessageBody),
    Error(ErrorBody),
}

impl ResponseBody {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(MessageBody {
            message: message.into(),
        })
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error(ErrorBody {
            error: error.into(),
        })
    }
}

/// Failure to turn a [`ResponseBody`] into bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to encode response body: {message}")]
pub struct EncodeError {
    message: String,
}

impl EncodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for EncodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Strategy serializing response bodies.
pub trait ResponseEncoder: Send + Sync {
    /// Encode `body` to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] when serialization fails.
    fn encode(&self, body: &ResponseBody) -> Result<Bytes, EncodeError>;
}

/// Encoder backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeJsonEncoder;

impl ResponseEncoder for SerdeJsonEncoder {
    fn encode(&self, body: &ResponseBody) -> Result<Bytes, EncodeError> {
        Ok(Bytes::from(serde_json::to_vec(body)?))
    }
}

/// Failure to commit the response head. Its message is sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FlushError {
    message: String,
}

impl FlushError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Strategy preparing the response head before the body is written.
///
/// actix-web writes the head itself once the streamed body starts; this
/// hook only adjusts the builder beforehand and cannot force an early send.
pub trait ResponseController: Send + Sync {
    /// Prepare `head` before the body is attached. Nothing is sent here.
    ///
    /// # Errors
    ///
    /// Returns [`FlushError`] when the head cannot be committed.
    fn flush(&self, head: &mut HttpResponseBuilder) -> Result<(), FlushError>;
}

/// Controller that marks the response unbuffered for reverse proxies.
///
/// The head still goes out when actix-web starts streaming the body; the
/// `X-Accel-Buffering: no` header only stops proxies holding it back.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingResponseController;

impl ResponseController for StreamingResponseController {
    fn flush(&self, head: &mut HttpResponseBuilder) -> Result<(), FlushError> {
        head.insert_header(("X-Accel-Buffering", "no"));
        Ok(())
    }
}

/// Fixed `500` response used when encoding fails.
pub fn internal_error_response() -> HttpResponse {
    HttpResponse::InternalServerError()
        .content_type(ContentType::json())
        .body(INTERNAL_ERROR_BODY)
}

/// Writes JSON responses through the injected strategies.
#[derive(Clone)]
pub struct JsonResponder {
    encoder: Arc<dyn ResponseEncoder>,
    controller: Arc<dyn ResponseController>,
}

impl Default for JsonResponder {
    fn default() -> Self {
        Self::new(Arc::new(SerdeJsonEncoder), Arc::new(StreamingResponseController))
    }
}

impl JsonResponder {
    pub fn new(
        encoder: Arc<dyn ResponseEncoder>,
        controller: Arc<dyn ResponseController>,
    ) -> Self {
        Self {
            encoder,
            controller,
        }
    }

    /// Encode `body` and send it with `status`.
    pub fn respond(&self, status: StatusCode, body: &ResponseBody) -> HttpResponse {
        match self.encode(body) {
            Some(bytes) => HttpResponse::build(status)
                .content_type(ContentType::json())
                .body(bytes),
            None => internal_error_response(),
        }
    }

    /// Send `{"error": message}` with `status`.
    pub fn respond_error(&self, status: StatusCode, message: impl Into<String>) -> HttpResponse {
        self.respond(status, &ResponseBody::error(message))
    }

    /// Commit the response head through the controller.
    ///
    /// # Errors
    ///
    /// Propagates the controller's [`FlushError`].
    pub fn flush(&self, head: &mut HttpResponseBuilder) -> Result<(), FlushError> {
        self.controller.flush(head)
    }

    /// Write `body` after a successful [`flush`](Self::flush) of `head`.
    pub fn respond_after_flush(
        &self,
        head: &mut HttpResponseBuilder,
        body: &ResponseBody,
    ) -> HttpResponse {
        match self.encode(body) {
            Some(bytes) => head
                .content_type(ContentType::json())
                .streaming(stream::once(ready(Ok::<_, Infallible>(bytes)))),
            None => internal_error_response(),
        }
    }

    fn encode(&self, body: &ResponseBody) -> Option<Bytes> {
        self.encoder
            .encode(body)
            .inspect_err(|err| error!(error = %err, "response body encoding failed"))
            .ok()
    }
}
