use alloc::boxed::Box;
use alloc::format;
use alloc::vec;

use esp_hal::rng::Rng;

use embassy_net::Stack;
use embassy_net::dns::DnsSocket;
use embassy_net::tcp::client::{TcpClient, TcpClientState};
use embassy_time::{Duration, with_timeout};

use reqwless::client::{HttpClient, TlsConfig, TlsVerify};
use reqwless::headers::ContentType;
use reqwless::request::{Method as HttpMethod, RequestBuilder};

use usage_sync::error::{Error, ErrorKind, Result};
use usage_sync::transport::{Method, Request, Response, Transport};

// Number of connections open at the same time.
const CONNECTIONS: usize = 1;
// Socket buffer size.
const SOCKET_BUFFER_SIZE: usize = 4096;
// TLS record buffer size.
const TLS_BUFFER_SIZE: usize = 16_640;
// Response buffer size.
const RESPONSE_BUFFER_SIZE: usize = 4096;

fn connection_error(e: reqwless::Error) -> Error {
    Error::new(ErrorKind::Connection, format!("{e:?}"))
}

const fn method(method: Method) -> HttpMethod {
    match method {
        Method::Get => HttpMethod::GET,
        Method::Post => HttpMethod::POST,
        Method::Patch => HttpMethod::PATCH,
    }
}

/// An `HTTPS` [`Transport`].
///
/// Every request opens a new `TLS` connection. Server certificates are not
/// validated, the document store authorizes requests through the `API` key
/// contained in their `URL`.
pub struct HttpsTransport {
    stack: Stack<'static>,
    rng: Rng,
    tcp: Box<TcpClientState<CONNECTIONS, SOCKET_BUFFER_SIZE, SOCKET_BUFFER_SIZE>>,
    tls_read: Box<[u8]>,
    tls_write: Box<[u8]>,
    response: Box<[u8]>,
}

impl HttpsTransport {
    /// Creates an [`HttpsTransport`].
    ///
    /// All buffers are allocated on the heap.
    #[must_use]
    pub fn new(stack: Stack<'static>, rng: Rng) -> Self {
        Self {
            stack,
            rng,
            tcp: Box::new(TcpClientState::new()),
            tls_read: vec![0; TLS_BUFFER_SIZE].into_boxed_slice(),
            tls_write: vec![0; TLS_BUFFER_SIZE].into_boxed_slice(),
            response: vec![0; RESPONSE_BUFFER_SIZE].into_boxed_slice(),
        }
    }
}

impl Transport for HttpsTransport {
    async fn send(&mut self, request: Request<'_>) -> Result<Response> {
        let tcp = TcpClient::new(self.stack, &self.tcp);
        let dns = DnsSocket::new(self.stack);

        let seed = u64::from(self.rng.random()) << 32 | u64::from(self.rng.random());
        let tls = TlsConfig::new(seed, &mut self.tls_read, &mut self.tls_write, TlsVerify::None);

        let mut client = HttpClient::new_with_tls(&tcp, &dns, tls);
        let response_buffer = &mut self.response;

        let exchange = async {
            let handle = client
                .request(method(request.method), request.url)
                .await
                .map_err(connection_error)?;

            let mut handle = handle
                .content_type(ContentType::ApplicationJson)
                .body(request.body.unwrap_or_default());

            let response = handle
                .send(response_buffer)
                .await
                .map_err(connection_error)?;

            let status = response.status.0;
            let body = response
                .body()
                .read_to_end()
                .await
                .map_err(connection_error)?;

            Ok(Response::new(status, body.to_vec()))
        };

        with_timeout(
            Duration::from_millis(u64::from(request.timeout_ms)),
            exchange,
        )
        .await
        .map_err(|_| {
            Error::new(
                ErrorKind::Connection,
                format!("Request timed out after {} ms", request.timeout_ms),
            )
        })?
    }
}
