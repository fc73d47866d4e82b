//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::HarborRepository;
use crate::inbound::http::harbors::{HarborUpsertHandler, JsonResponder};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub harbor_upserts: HarborUpsertHandler,
}

impl HttpState {
    /// Build state around the harbor persistence port.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use harbor_service::domain::ports::FixtureHarborRepository;
    /// use harbor_service::inbound::http::state::HttpState;
    ///
    /// let _state = HttpState::new(Arc::new(FixtureHarborRepository));
    /// ```
    pub fn new(harbors: Arc<dyn HarborRepository>) -> Self {
        Self {
            harbor_upserts: HarborUpsertHandler::new(harbors),
        }
    }

    /// Replace the response writer used by the harbor endpoint.
    #[must_use]
    pub fn with_responder(mut self, responder: JsonResponder) -> Self {
        self.harbor_upserts = self.harbor_upserts.with_responder(responder);
        self
    }
}
