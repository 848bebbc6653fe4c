use std::any::Any as PanicPayload;

use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

use crate::core::error::AppError;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([axum::http::header::CONTENT_DISPOSITION]);

    // If origins list contains "*", allow any origin
    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

/// Panic handler for `CatchPanicLayer`: logs the payload and answers with a 500 envelope
pub fn handle_panic(payload: Box<dyn PanicPayload + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };

    AppError::Internal(format!("Request handler panicked: {}", detail)).into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use axum_test::TestServer;
    use serde_json::Value;
    use tower_http::catch_panic::CatchPanicLayer;

    use super::*;

    async fn explode() -> &'static str {
        panic!("boom")
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_500_envelope() {
        let app = Router::new()
            .route("/explode", get(explode))
            .route("/fine", get(|| async { "fine" }))
            .layer(CatchPanicLayer::custom(handle_panic));
        let server = TestServer::new(app).unwrap();

        let response = server.get("/explode").await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.json::<Value>();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Internal server error");

        // The server keeps serving after a panic
        server.get("/fine").await.assert_status_ok();
    }

    #[test]
    fn test_request_ids_are_fresh_v7_uuids() {
        let request = axum::http::Request::new(());
        let mut maker = MakeRequestUuid;

        let first = maker.make_request_id(&request).unwrap();
        let second = maker.make_request_id(&request).unwrap();

        let first = Uuid::parse_str(first.header_value().to_str().unwrap()).unwrap();
        let second = Uuid::parse_str(second.header_value().to_str().unwrap()).unwrap();
        assert_eq!(first.get_version_num(), 7);
        assert_ne!(first, second);
    }
}
