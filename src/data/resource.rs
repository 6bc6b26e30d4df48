//! Per-handler resources served to workers.
//!
//! Every accessor works on an already looked-up [`Handler`]. Successful
//! reads answer `application/octet-stream` whatever the payload is, so a
//! worker never needs to negotiate content.

use axum::{
    body::{Body, Bytes},
    http::{
        header::{self, HeaderName, HeaderValue},
        StatusCode,
    },
    response::{IntoResponse, Response},
};
use futures_util::{stream, StreamExt};
use thiserror::Error;

use crate::broker::{BrokerError, Handler};

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Errors surfaced to workers as status codes.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("handler {0} not found")]
    HandlerNotFound(String),

    #[error("{kind} {name:?} not found")]
    ResourceNotFound { kind: &'static str, name: String },

    #[error("invalid status code {0:?}")]
    InvalidStatus(String),

    #[error("invalid response header: {0}")]
    InvalidHeader(String),

    #[error("failed to read client body: {0}")]
    BodyRead(String),
}

impl From<BrokerError> for DataError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::HandlerNotFound(id) => DataError::HandlerNotFound(id),
        }
    }
}

impl IntoResponse for DataError {
    fn into_response(self) -> Response {
        let status = match &self {
            DataError::HandlerNotFound(_) | DataError::ResourceNotFound { .. } => {
                tracing::debug!(error = %self, "Data plane lookup missed");
                StatusCode::NOT_FOUND
            }
            DataError::InvalidStatus(_) | DataError::InvalidHeader(_) => {
                tracing::debug!(error = %self, "Rejected data plane write");
                StatusCode::BAD_REQUEST
            }
            DataError::BodyRead(_) => {
                tracing::warn!(error = %self, "Client body unavailable");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

fn octet_stream(body: impl Into<Body>) -> Response {
    ([(header::CONTENT_TYPE, OCTET_STREAM)], body.into()).into_response()
}

/// Stream the client body to the worker.
///
/// A failure on the first read is answered with a 500. Once a chunk has been
/// forwarded the headers are committed, so later failures are passed to the
/// response body and abort the exchange instead of being masked.
pub async fn get_request_body(handler: &Handler) -> Result<Response, DataError> {
    let Some(body) = handler.take_body() else {
        return Ok(octet_stream(Body::empty()));
    };

    let mut chunks = body.into_data_stream();
    let first = match chunks.next().await {
        None => return Ok(octet_stream(Body::empty())),
        Some(Err(e)) => return Err(DataError::BodyRead(e.to_string())),
        Some(Ok(first)) => first,
    };

    let rest = chunks.map(|chunk| {
        chunk.inspect_err(|e| {
            tracing::error!(error = %e, "Client body failed mid-stream, aborting exchange");
        })
    });
    let body = Body::from_stream(stream::once(async move { Ok(first) }).chain(rest));

    Ok(octet_stream(body))
}

pub fn get_request_method(handler: &Handler) -> Response {
    octet_stream(handler.method().as_str().to_owned())
}

pub fn get_request_host(handler: &Handler) -> Response {
    octet_stream(handler.host().unwrap_or_default().to_owned())
}

pub fn get_request_path(handler: &Handler) -> Response {
    octet_stream(handler.path().into_owned())
}

pub fn get_request_match(handler: &Handler, name: &str) -> Result<Response, DataError> {
    handler
        .matched(name)
        .map(|value| octet_stream(value.to_owned()))
        .ok_or_else(|| DataError::ResourceNotFound {
            kind: "match",
            name: name.to_string(),
        })
}

pub fn get_request_param(handler: &Handler, name: &str) -> Result<Response, DataError> {
    handler
        .param(name)
        .map(octet_stream)
        .ok_or_else(|| DataError::ResourceNotFound {
            kind: "param",
            name: name.to_string(),
        })
}

pub fn get_request_header(handler: &Handler, name: &str) -> Result<Response, DataError> {
    handler
        .header(name)
        .map(|value| octet_stream(Bytes::copy_from_slice(value.as_bytes())))
        .ok_or_else(|| DataError::ResourceNotFound {
            kind: "header",
            name: name.to_string(),
        })
}

pub fn get_request_cookie(handler: &Handler, name: &str) -> Result<Response, DataError> {
    handler
        .cookie(name)
        .map(|value| octet_stream(value.to_owned()))
        .ok_or_else(|| DataError::ResourceNotFound {
            kind: "cookie",
            name: name.to_string(),
        })
}

pub fn set_response_status(handler: &Handler, body: &[u8]) -> Result<Response, DataError> {
    let raw = String::from_utf8_lossy(body);
    let status = raw
        .trim()
        .parse::<u16>()
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or_else(|| DataError::InvalidStatus(raw.trim().to_string()))?;

    handler.set_status(status);
    Ok(StatusCode::OK.into_response())
}

pub fn set_response_header(handler: &Handler, name: &str, body: &[u8]) -> Result<Response, DataError> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| DataError::InvalidHeader(format!("bad name {name:?}")))?;
    let value = HeaderValue::from_bytes(body)
        .map_err(|_| DataError::InvalidHeader(format!("bad value for {name}")))?;

    handler.append_header(name, value);
    Ok(StatusCode::OK.into_response())
}

pub fn set_response_body(handler: &Handler, body: &[u8]) -> Response {
    handler.append_body(body);
    StatusCode::OK.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Route, RouteMatch, RoutingTable};
    use axum::http::{Method, Request};
    use std::io;

    fn handler_for(request: Request<Body>) -> Handler {
        Handler::new(RouteMatch::default(), request)
    }

    fn request(method: &str, uri: &str, body: Body) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(body).unwrap()
    }

    fn matched_handler(pattern: &str, path: &str) -> Handler {
        let table = RoutingTable::build(vec![Route::new("GET", pattern, "")]);
        let matched = table.find(&Method::GET, path).unwrap();
        Handler::new(matched, request("GET", path, Body::empty()))
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn content_type(response: &Response) -> &str {
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn body_200s_on_happy_path() {
        let h = handler_for(request("POST", "/", Body::empty()));
        let res = get_request_body(&h).await.into_response();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(content_type(&res), OCTET_STREAM);
    }

    #[tokio::test]
    async fn body_is_forwarded_verbatim() {
        let h = handler_for(request("POST", "/", Body::from("BAR")));
        let res = get_request_body(&h).await.into_response();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(content_type(&res), OCTET_STREAM);
        assert_eq!(body_string(res).await, "BAR");
    }

    #[tokio::test]
    async fn body_500s_when_the_first_read_fails() {
        let failing = Body::from_stream(stream::iter(vec![Err::<Bytes, _>(io::Error::other(
            "User closed the connection",
        ))]));
        let h = handler_for(request("POST", "/", failing));

        let res = get_request_body(&h).await.into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn body_aborts_when_the_reader_fails_after_a_write() {
        let failing = Body::from_stream(stream::iter(vec![
            Ok(Bytes::from_static(b"FOO")),
            Err(io::Error::other("Second read failed")),
        ]));
        let h = handler_for(request("POST", "/", failing));

        let res = get_request_body(&h).await.into_response();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(
            axum::body::to_bytes(res.into_body(), usize::MAX).await.is_err(),
            "exchange completed cleanly after a mid-stream failure"
        );
    }

    #[tokio::test]
    async fn second_body_read_is_empty() {
        let h = handler_for(request("POST", "/", Body::from("BAR")));
        let _ = get_request_body(&h).await;
        let res = get_request_body(&h).await.into_response();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_string(res).await, "");
    }

    #[tokio::test]
    async fn method_is_returned_verbatim() {
        let h = handler_for(request("FOO", "/", Body::empty()));
        let res = get_request_method(&h);
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(content_type(&res), OCTET_STREAM);
        assert_eq!(body_string(res).await, "FOO");
    }

    #[tokio::test]
    async fn host_includes_the_port() {
        let h = handler_for(request("POST", "http://www.foo.bar:8080/", Body::empty()));
        let res = get_request_host(&h);
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(content_type(&res), OCTET_STREAM);
        assert_eq!(body_string(res).await, "www.foo.bar:8080");
    }

    #[tokio::test]
    async fn path_is_returned() {
        let h = handler_for(request("POST", "/foo", Body::empty()));
        let res = get_request_path(&h);
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(content_type(&res), OCTET_STREAM);
        assert_eq!(body_string(res).await, "/foo");
    }

    #[tokio::test]
    async fn path_excludes_the_query_string() {
        let h = handler_for(request("POST", "/foo?bar=1", Body::empty()));
        assert_eq!(body_string(get_request_path(&h)).await, "/foo");
    }

    #[tokio::test]
    async fn match_returns_the_segment_value() {
        let h = matched_handler("/foo/{bar}", "/foo/BAZ");
        let res = get_request_match(&h, "bar").into_response();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(content_type(&res), OCTET_STREAM);
        assert_eq!(body_string(res).await, "BAZ");
    }

    #[tokio::test]
    async fn match_404s_when_segment_does_not_exist() {
        let h = matched_handler("/", "/");
        let res = get_request_match(&h, "foo").into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn param_returns_the_value() {
        let h = handler_for(request("GET", "/foo?bar=BAZ", Body::empty()));
        let res = get_request_param(&h, "bar").into_response();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(content_type(&res), OCTET_STREAM);
        assert_eq!(body_string(res).await, "BAZ");
    }

    #[tokio::test]
    async fn param_404s_when_absent() {
        let h = handler_for(request("GET", "/foo", Body::empty()));
        let res = get_request_param(&h, "bar").into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn param_returns_the_first_of_repeated_values() {
        let h = handler_for(request("GET", "/foo?bar=BAZ&bar=QUX", Body::empty()));
        let res = get_request_param(&h, "bar").into_response();
        assert_eq!(body_string(res).await, "BAZ");
    }

    #[tokio::test]
    async fn header_and_cookie_lookups() {
        let req = Request::builder()
            .uri("/")
            .header("X-Token", "abc")
            .header("Cookie", "session=xyz")
            .body(Body::empty())
            .unwrap();
        let h = handler_for(req);

        assert_eq!(body_string(get_request_header(&h, "x-token").into_response()).await, "abc");
        assert_eq!(body_string(get_request_cookie(&h, "session").into_response()).await, "xyz");
        assert_eq!(
            get_request_header(&h, "x-missing").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_request_cookie(&h, "missing").into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn response_writes_compose_the_client_response() {
        let h = handler_for(request("GET", "/", Body::empty()));

        assert_eq!(set_response_status(&h, b"418\n").unwrap().status(), StatusCode::OK);
        assert!(set_response_header(&h, "x-answer", b"42").is_ok());
        set_response_body(&h, b"short and stout");

        let res = h.take_response();
        assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(res.headers().get("x-answer").unwrap(), "42");
        assert_eq!(body_string(res).await, "short and stout");
    }

    #[test]
    fn invalid_response_writes_are_rejected() {
        let h = handler_for(request("GET", "/", Body::empty()));

        let res = set_response_status(&h, b"teapot").into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let res = set_response_status(&h, b"99").into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let res = set_response_header(&h, "bad header", b"x").into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let res = set_response_header(&h, "x-ok", b"line\nbreak").into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
