//! Guard against request smuggling through conflicting framing headers.
//!
//! A request carrying both `Transfer-Encoding` and `Content-Length` can be
//! framed differently by a proxy and by this server, so it is refused
//! before any handler reads the body.

use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, ContentType};
use actix_web::{Error, HttpResponse};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::warn;

/// Body sent when a request is refused.
pub const AMBIGUOUS_FRAMING_MESSAGE: &str = "Invalid Transfer-Encoding header";

/// Middleware answering `400` to requests that set both framing headers.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use harbor_service::middleware::RejectAmbiguousFraming;
///
/// let _app = App::new().wrap(RejectAmbiguousFraming);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAmbiguousFraming;

impl<S, B> Transform<S, ServiceRequest> for RejectAmbiguousFraming
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RejectAmbiguousFramingMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RejectAmbiguousFramingMiddleware { service }))
    }
}

/// Service wrapper produced by [`RejectAmbiguousFraming`].
pub struct RejectAmbiguousFramingMiddleware<S> {
    service: S,
}

fn has_ambiguous_framing(req: &ServiceRequest) -> bool {
    let headers = req.headers();
    headers.contains_key(header::TRANSFER_ENCODING) && headers.contains_key(header::CONTENT_LENGTH)
}

impl<S, B> Service<ServiceRequest> for RejectAmbiguousFramingMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if has_ambiguous_framing(&req) {
            warn!(
                method = %req.method(),
                path = %req.path(),
                "rejected request with both transfer-encoding and content-length"
            );
            let response = HttpResponse::BadRequest()
                .content_type(ContentType::plaintext())
                .body(AMBIGUOUS_FRAMING_MESSAGE);
            let res = req.into_response(response).map_into_right_body();
            return Box::pin(async move { Ok(res) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
