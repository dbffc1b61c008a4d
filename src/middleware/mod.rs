use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Give each request a fresh trace id on its span and echo it in the response headers.
pub async fn assign_trace_id(req: Request<Body>, next: Next) -> Response {
    let trace_id = Uuid::new_v4().to_string();

    let span = tracing::info_span!(
        "request",
        trace_id = %trace_id,
        method = %req.method(),
        path = %req.uri().path()
    );
    let mut res = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        res.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    res
}
