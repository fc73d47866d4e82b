//! Request correlation and access logging.
//!
//! [`Trace`] gives every request a UUID [`TraceId`], keeps it in task-local
//! storage while the inner service runs, echoes it in a `trace-id` response
//! header and logs one line when the request starts and one when it ends.
//!
//! Task-locals do not follow spawned tasks or blocking closures; wrap that
//! work in [`TraceId::scope`] to keep the identifier.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tokio::task_local;
use tracing::{info, warn};
use uuid::Uuid;

/// Response header carrying the request's trace identifier.
pub const TRACE_ID_HEADER: HeaderName = HeaderName::from_static("trace-id");

task_local! {
    static CURRENT: TraceId;
}

/// Identifier shared by every log line of one request.
///
/// ```
/// use harbor_service::middleware::trace::TraceId;
///
/// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
/// let id: TraceId = "6f1c2a5e-0d4b-4c1e-9a57-2f1b8d3e4c77".parse().expect("uuid");
/// let seen = TraceId::scope(id, async { TraceId::current() }).await;
/// assert_eq!(seen, Some(id));
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Identifier of the request being served, if any.
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    /// Run `fut` with `id` as the current identifier.
    pub async fn scope<Fut: Future>(id: Self, fut: Fut) -> Fut::Output {
        CURRENT.scope(id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Request fields repeated on the start and completion log lines.
struct AccessLog {
    trace_id: TraceId,
    method: String,
    path: String,
    remote_addr: String,
    started: Instant,
}

impl AccessLog {
    fn begin(req: &ServiceRequest, trace_id: TraceId) -> Self {
        let remote_addr = req
            .connection_info()
            .peer_addr()
            .unwrap_or("unknown")
            .to_owned();
        let log = Self {
            trace_id,
            method: req.method().to_string(),
            path: req.path().to_owned(),
            remote_addr,
            started: Instant::now(),
        };
        info!(
            trace_id = %log.trace_id,
            method = %log.method,
            path = %log.path,
            remote_addr = %log.remote_addr,
            "request started"
        );
        log
    }

    fn finish(&self, status: u16) {
        info!(
            trace_id = %self.trace_id,
            method = %self.method,
            path = %self.path,
            remote_addr = %self.remote_addr,
            status,
            duration_ms = self.started.elapsed().as_millis(),
            "request completed"
        );
    }
}

/// Middleware factory. Wrap it outermost so rejected requests are traced too.
///
/// ```
/// use actix_web::App;
/// use harbor_service::middleware::Trace;
///
/// let _app = App::new().wrap(Trace);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware { service }))
    }
}

/// Service produced by [`Trace`].
pub struct TraceMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = TraceId::random();
        let log = AccessLog::begin(&req, trace_id);
        let inner = self.service.call(req);

        Box::pin(TraceId::scope(trace_id, async move {
            let mut res = inner.await?;
            log.finish(res.status().as_u16());
            match HeaderValue::from_str(&trace_id.to_string()) {
                Ok(value) => {
                    res.headers_mut().insert(TRACE_ID_HEADER, value);
                }
                Err(error) => warn!(%error, %trace_id, "trace id is not a valid header value"),
            }
            Ok(res)
        }))
    }
}
