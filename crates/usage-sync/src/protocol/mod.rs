/// Read-modify-write of a single counter document.
pub mod counter;
/// Append-only log documents.
pub mod log;

use ::log::{debug, error, info};

use crate::endpoint::Endpoint;
use crate::envelope::Document;
use crate::error::{Error, Result};
use crate::transport::{Method, Request, Response, Transport};

use self::counter::Counter;
use self::log::Log;

/// The way usage is stored in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// A single mutable document holding the running total.
    Counter(Counter),
    /// An immutable document for each submission.
    Log(Log),
}

impl Backend {
    /// Returns the backend name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Counter(_) => "counter",
            Self::Log(_) => "log",
        }
    }
}

// All requests of one attempt go through the same session.
pub(crate) struct Session<'a, T: Transport> {
    transport: &'a mut T,
    endpoint: &'a Endpoint,
    timeout_ms: u32,
}

impl<'a, T: Transport> Session<'a, T> {
    pub(crate) const fn new(transport: &'a mut T, endpoint: &'a Endpoint, timeout_ms: u32) -> Self {
        Self {
            transport,
            endpoint,
            timeout_ms,
        }
    }

    pub(crate) async fn fetch(&mut self, collection: &str, document_id: &str) -> Result<Response> {
        let url = self.endpoint.document_url(collection, document_id);
        self.send(Method::Get, collection, document_id, &url, None)
            .await
    }

    pub(crate) async fn patch(
        &mut self,
        collection: &str,
        document_id: &str,
        document: &Document,
        field: &str,
    ) -> Result<Response> {
        let url = self
            .endpoint
            .masked_document_url(collection, document_id, field);
        let body = document.to_vec()?;
        self.send(Method::Patch, collection, document_id, &url, Some(&body))
            .await
    }

    // A create is only successful with a `2xx` status.
    pub(crate) async fn create(
        &mut self,
        collection: &str,
        document_id: &str,
        document: &Document,
    ) -> Result<()> {
        let url = self.endpoint.create_url(collection, document_id);
        let body = document.to_vec()?;
        let response = self
            .send(Method::Post, collection, document_id, &url, Some(&body))
            .await?;

        if response.is_success() {
            Ok(())
        } else {
            Err(Error::status(response.status))
        }
    }

    async fn send(
        &mut self,
        method: Method,
        collection: &str,
        document_id: &str,
        url: &str,
        body: Option<&[u8]>,
    ) -> Result<Response> {
        // Give other tasks a chance to run before blocking on the radio.
        embassy_futures::yield_now().await;

        // The URL carries the API key, log the document path instead.
        debug!(
            "{method} {}",
            self.endpoint.document_path(collection, document_id)
        );
        if let Some(body) = body {
            debug!("Request body: {} bytes", body.len());
        }

        let response = self
            .transport
            .send(Request {
                method,
                url,
                body,
                timeout_ms: self.timeout_ms,
            })
            .await
            .inspect_err(|e| error!("{method} request failed: {e}"))?;

        info!("HTTP response code: {}", response.status);
        debug!("Response length: {} bytes", response.body.len());

        Ok(response)
    }
}
