//! Harbor batch ingestion endpoint.
//!
//! ```text
//! POST /api/v1/harbors
//! {"USLAX": {"name": "Los Angeles", "city": "Los Angeles", "country": "USA"}}
//! ```

pub mod decoder;
pub mod error;
pub mod handler;
pub mod payload;
pub mod response;

use std::io;

use actix_web::{HttpResponse, post, web};
use futures_util::TryStreamExt;
use futures_util::io::BufReader;

pub use self::decoder::{BODY_BUFFER_CAPACITY, DecodeError, HarborDecoder, MAX_ENTRY_BYTES};
pub use self::error::UpsertError;
pub use self::handler::{HarborUpsertHandler, UpsertPhase};
pub use self::payload::{HarborBatch, HarborPayload};
pub use self::response::{
    ErrorBody, JsonResponder, MessageBody, ResponseController, ResponseEncoder,
};
use crate::inbound::http::state::HttpState;

/// Insert or update every harbor in the request body.
///
/// Entries are stored one at a time in body order. The first failure stops
/// the batch; harbors stored before it are kept.
#[utoipa::path(
    post,
    path = "/api/v1/harbors",
    tags = ["harbors"],
    request_body(content = HarborBatch, content_type = "application/json"),
    responses(
        (status = 200, description = "All harbors stored", body = MessageBody),
        (
            status = 400,
            description = "Malformed body or invalid harbor fields",
            body = ErrorBody
        ),
        (
            status = 500,
            description = "Storage or response failure",
            body = ErrorBody
        )
    )
)]
#[post("/harbors")]
pub async fn upsert_harbors(state: web::Data<HttpState>, payload: web::Payload) -> HttpResponse {
    let body = BufReader::with_capacity(
        BODY_BUFFER_CAPACITY,
        payload.map_err(io::Error::other).into_async_read(),
    );
    state.harbor_upserts.handle(body).await
}

#[cfg(test)]
mod tests;
