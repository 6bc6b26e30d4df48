//! Live request context exposed to workers.
//!
//! # Responsibilities
//! - Keep the head of the client request (method, URI, headers)
//! - Hand the client body out once, as a stream
//! - Collect the response the worker composes through the data plane
//!
//! # Design Decisions
//! - The body is `take`-once: streaming it twice is impossible anyway
//! - Response parts are buffered and sent when the worker exits

use std::borrow::Cow;

use axum::{
    body::{Body, Bytes},
    http::{
        header::{self, HeaderName, HeaderValue},
        request::Parts,
        HeaderMap, Method, Request, StatusCode, Uri,
    },
    response::Response,
};
use parking_lot::Mutex;

use crate::routing::matcher::decode_path;
use crate::routing::{Matches, Route, RouteMatch};

/// Response being composed by a worker.
#[derive(Debug)]
pub struct ResponseDraft {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Default for ResponseDraft {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }
}

/// The in-flight context for one client request.
pub struct Handler {
    route: Route,
    matches: Matches,
    head: Parts,
    body: Mutex<Option<Body>>,
    response: Mutex<ResponseDraft>,
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler")
            .field("route", &self.route.id)
            .field("method", &self.head.method)
            .field("uri", &self.head.uri)
            .finish_non_exhaustive()
    }
}

impl Handler {
    pub fn new(matched: RouteMatch, request: Request<Body>) -> Self {
        let (head, body) = request.into_parts();
        Self {
            route: matched.route,
            matches: matched.matches,
            head,
            body: Mutex::new(Some(body)),
            response: Mutex::new(ResponseDraft::default()),
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// Host the client addressed, port included.
    ///
    /// Absolute-form URIs win over the `Host` header.
    pub fn host(&self) -> Option<&str> {
        self.head
            .uri
            .authority()
            .map(|a| a.as_str())
            .or_else(|| {
                self.head
                    .headers
                    .get(header::HOST)
                    .and_then(|h| h.to_str().ok())
            })
    }

    /// Percent-decoded request path without the query string.
    pub fn path(&self) -> Cow<'_, str> {
        decode_path(self.head.uri.path())
    }

    /// Value bound to a named pattern segment.
    pub fn matched(&self, name: &str) -> Option<&str> {
        self.matches.get(name).map(String::as_str)
    }

    /// First value of a query parameter; later repetitions are ignored.
    pub fn param(&self, name: &str) -> Option<String> {
        let query = self.head.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// First value of a request header.
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.head.headers.get(name)
    }

    /// Value of a cookie sent in the `Cookie` header(s).
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.head
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// Take the client body. Returns `None` once it has been handed out.
    pub fn take_body(&self) -> Option<Body> {
        self.body.lock().take()
    }

    pub fn set_status(&self, status: StatusCode) {
        self.response.lock().status = status;
    }

    pub fn append_header(&self, name: HeaderName, value: HeaderValue) {
        self.response.lock().headers.append(name, value);
    }

    pub fn append_body(&self, chunk: &[u8]) {
        self.response.lock().body.extend_from_slice(chunk);
    }

    /// Turn the draft into the response sent to the client, leaving a fresh
    /// draft behind.
    pub fn take_response(&self) -> Response {
        let draft = std::mem::take(&mut *self.response.lock());

        let mut response = Response::new(Body::from(Bytes::from(draft.body)));
        *response.status_mut() = draft.status;
        *response.headers_mut() = draft.headers;
        response
    }
}
