use alloc::vec::Vec;

use crate::error::Result;

/// `200 OK` status code.
pub const STATUS_OK: u16 = 200;
/// `404 Not Found` status code.
pub const STATUS_NOT_FOUND: u16 = 404;

/// `HTTP` methods used by the document store dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Fetches a document.
    Get,
    /// Creates a document.
    Post,
    /// Updates the masked fields of a document.
    Patch,
}

impl core::fmt::Display for Method {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
        })
    }
}

/// An outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    /// Request method.
    pub method: Method,
    /// Complete request `URL`, query string included.
    pub url: &'a str,
    /// `JSON` body.
    pub body: Option<&'a [u8]>,
    /// Time, in milliseconds, after which the request is abandoned.
    pub timeout_ms: u32,
}

/// A response received from the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Creates a [`Response`].
    #[must_use]
    pub const fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// Whether the status code belongs to the `2xx` class.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// An `HTTP` transport over `TLS`.
///
/// Implementations must enforce the [`Request::timeout_ms`] of each request
/// and report an expired timeout, as well as any other connection problem,
/// as an [`crate::error::ErrorKind::Connection`] error.
/// Any status code received from the server, including error codes, is a
/// successful exchange and must be returned as a [`Response`].
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Sends a request and waits for its response.
    async fn send(&mut self, request: Request<'_>) -> Result<Response>;
}
