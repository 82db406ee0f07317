//! Responses produced at the edge.
//!
//! # Responsibilities
//! - Redirects with a `Location` header
//! - Fixed HTML bodies for denials and internal errors
//!
//! # Design Decisions
//! - Error bodies never include internal error details
//! - 418 carries the reason phrase "Forbidden" on HTTP/1

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper::ext::ReasonPhrase;

use crate::edge::EdgeError;

pub const FORBIDDEN_BODY: &str =
    "<html><body><h1>403 Forbidden</h1><p>Access denied.</p></body></html>";
pub const UNAUTHORIZED_BODY: &str =
    "<html><body><h1>401 Unauthorized</h1><p>Authentication required.</p></body></html>";
pub const INTERNAL_ERROR_BODY: &str =
    "<html><body><h1>500 Internal Server Error</h1><p>There was an error processing your request.</p></body></html>";

#[derive(Debug)]
pub struct EdgeResponse {
    status: StatusCode,
    reason: Option<&'static [u8]>,
    headers: HeaderMap,
    body: &'static str,
}

impl EdgeResponse {
    /// Redirect to `location` with a 3xx status.
    pub fn redirect(status: StatusCode, location: &str) -> Result<Self, EdgeError> {
        let value = HeaderValue::from_str(location)
            .map_err(|_| EdgeError::InvalidLocation(location.to_string()))?;
        let mut headers = HeaderMap::new();
        headers.insert(header::LOCATION, value);
        Ok(Self {
            status,
            reason: None,
            headers,
            body: "",
        })
    }

    pub fn forbidden() -> Self {
        Self::html(StatusCode::IM_A_TEAPOT, Some(&b"Forbidden"[..]), FORBIDDEN_BODY)
    }

    pub fn unauthorized() -> Self {
        let mut response = Self::html(StatusCode::UNAUTHORIZED, None, UNAUTHORIZED_BODY);
        response
            .headers
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Basic"));
        response
    }

    pub fn internal_error() -> Self {
        Self::html(StatusCode::INTERNAL_SERVER_ERROR, None, INTERNAL_ERROR_BODY)
    }

    fn html(status: StatusCode, reason: Option<&'static [u8]>, body: &'static str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        Self {
            status,
            reason,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &'static str {
        self.body
    }
}

impl IntoResponse for EdgeResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        if let Some(reason) = self.reason {
            response.extensions_mut().insert(ReasonPhrase::from_static(reason));
        }
        response
    }
}
