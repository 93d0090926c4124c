// Admin API middleware
// Author: kelexine (https://github.com/kelexine)

use axum::http::{header, HeaderValue, Request};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::Span;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Stamp each admin call with an `x-request-id` and echo it on the response.
pub fn request_id_layers() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    (
        SetRequestIdLayer::x_request_id(MakeRequestUuid),
        PropagateRequestIdLayer::x_request_id(),
    )
}

/// Usage snapshots and cache stats are live views; intermediaries must not keep them.
pub fn no_store_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))
}

/// Request span carrying the id assigned by [`request_id_layers`].
pub fn make_request_span<B>(request: &Request<B>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "admin_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}
