//! Drives one batch upsert from request body to response.

use std::sync::Arc;

use actix_web::{HttpResponse, HttpResponseBuilder};
use futures_util::io::AsyncBufRead;
use tracing::{error, info, warn};

use super::decoder::{HarborDecoder, HarborEntry};
use super::error::UpsertError;
use super::response::{
    JsonResponder, ResponseBody, UPSERT_SUCCESS_MESSAGE, internal_error_response,
};
use crate::domain::HarborDraft;
use crate::domain::ports::HarborRepository;
use crate::middleware::trace::TraceId;

/// Progress of a single upsert request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertPhase {
    AwaitOpen,
    ProcessingEntries,
    AwaitClose,
    Flushed,
    Responded,
    /// Terminal state after the first failure.
    Aborted,
}

impl UpsertPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AwaitOpen => "await_open",
            Self::ProcessingEntries => "processing_entries",
            Self::AwaitClose => "await_close",
            Self::Flushed => "flushed",
            Self::Responded => "responded",
            Self::Aborted => "aborted",
        }
    }
}

#[derive(Debug)]
struct UpsertRun {
    phase: UpsertPhase,
    upserted: usize,
}

fn current_trace_id() -> String {
    TraceId::current()
        .map(|id| id.to_string())
        .unwrap_or_default()
}

/// Decodes, validates and stores each harbor in a batch, stopping at the
/// first failure. Harbors stored before a failure stay stored.
#[derive(Clone)]
pub struct HarborUpsertHandler {
    repository: Arc<dyn HarborRepository>,
    responder: JsonResponder,
}

impl HarborUpsertHandler {
    pub fn new(repository: Arc<dyn HarborRepository>) -> Self {
        Self {
            repository,
            responder: JsonResponder::default(),
        }
    }

    /// Replace the response writer.
    #[must_use]
    pub fn with_responder(mut self, responder: JsonResponder) -> Self {
        self.responder = responder;
        self
    }

    /// Process a whole batch body and build the response.
    pub async fn handle<R>(&self, body: R) -> HttpResponse
    where
        R: AsyncBufRead + Unpin,
    {
        let mut run = UpsertRun {
            phase: UpsertPhase::AwaitOpen,
            upserted: 0,
        };

        match self.process(body, &mut run).await {
            Ok(mut head) => {
                run.phase = UpsertPhase::Responded;
                info!(
                    trace_id = %current_trace_id(),
                    phase = run.phase.as_str(),
                    upserted = run.upserted,
                    "harbor batch upserted"
                );
                self.responder
                    .respond_after_flush(&mut head, &ResponseBody::message(UPSERT_SUCCESS_MESSAGE))
            }
            Err(err) => self.abort(&run, &err),
        }
    }

    async fn process<R>(
        &self,
        body: R,
        run: &mut UpsertRun,
    ) -> Result<HttpResponseBuilder, UpsertError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut decoder = HarborDecoder::new(body);
        decoder.open().await?;
        run.phase = UpsertPhase::ProcessingEntries;

        while let Some(HarborEntry { unloc, payload }) = decoder.next_entry().await? {
            let harbor = HarborDraft::from(payload)
                .into_harbor(unloc)
                .map_err(UpsertError::ValidationFailed)?;
            self.repository
                .upsert_harbor(&harbor)
                .await
                .map_err(|source| UpsertError::StorageFailure {
                    unloc: harbor.unloc.clone(),
                    source,
                })?;
            run.upserted += 1;
        }

        run.phase = UpsertPhase::AwaitClose;
        decoder.close().await?;

        let mut head = HttpResponse::Ok();
        self.responder.flush(&mut head)?;
        run.phase = UpsertPhase::Flushed;
        Ok(head)
    }

    fn abort(&self, run: &UpsertRun, err: &UpsertError) -> HttpResponse {
        let phase = run.phase.as_str();
        let trace_id = current_trace_id();
        match err {
            UpsertError::StorageFailure { unloc, source } => error!(
                %trace_id,
                phase,
                upserted = run.upserted,
                unloc = %unloc,
                error = %source,
                "harbor batch aborted"
            ),
            other => warn!(
                %trace_id,
                phase,
                upserted = run.upserted,
                error = %other,
                detail = ?std::error::Error::source(other).map(ToString::to_string),
                "harbor batch aborted"
            ),
        }

        match err.client_message() {
            Ok(message) => self.responder.respond_error(err.status_code(), message),
            Err(encode_err) => {
                error!(error = %encode_err, "failed to serialize validation errors");
                internal_error_response()
            }
        }
    }
}
