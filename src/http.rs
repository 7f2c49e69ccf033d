//! Error responses for rejected requests

use http_body_util::Full;
use bytes::Bytes;
use hyper::header::{CONTENT_TYPE, RETRY_AFTER, USER_AGENT};
use hyper::{Request, Response, StatusCode};

/// Typed API error codes surfaced to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// The node is at its concurrent-request limit
    OperationMaxedOut,
}

impl ApiErrorCode {
    /// Wire name of the error code
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ApiErrorCode::OperationMaxedOut => "OperationMaxedOut",
        }
    }

    /// Human-readable description
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            ApiErrorCode::OperationMaxedOut => {
                "A timeout occurred while trying to lock a resource, please reduce your request rate"
            }
        }
    }

    /// HTTP status for this error
    #[must_use]
    pub fn status(self) -> StatusCode {
        match self {
            ApiErrorCode::OperationMaxedOut => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Guess whether the request comes from a browser
///
/// Browsers get an HTML error page instead of the XML payload API clients
/// expect.
#[must_use]
pub fn guess_is_browser<B>(req: &Request<B>) -> bool {
    req.headers()
        .get(USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .is_some_and(|ua| ua.starts_with("Mozilla"))
}

/// Build the error response for a rejected request
///
/// # Panics
///
/// Panics if the response builder fails (should never happen with valid
/// inputs)
#[must_use]
pub fn error_response(code: ApiErrorCode, is_browser: bool) -> Response<Full<Bytes>> {
    let (content_type, body) = if is_browser {
        (
            "text/html; charset=utf-8",
            format!(
                "<html><head><title>{status}</title></head>\
                 <body><h1>{status}</h1><p>{message}</p></body></html>",
                status = code.status(),
                message = code.message(),
            ),
        )
    } else {
        (
            "application/xml",
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                 <Error><Code>{code}</Code><Message>{message}</Message></Error>",
                code = code.as_str(),
                message = code.message(),
            ),
        )
    };

    Response::builder()
        .status(code.status())
        .header(CONTENT_TYPE, content_type)
        .header(RETRY_AFTER, "120")
        .body(Full::new(Bytes::from(body)))
        .expect("Failed to build error response")
}
