use crate::endpoint::Endpoint;
use crate::protocol::Backend;
use crate::protocol::counter::Counter;
use crate::protocol::log::Log;

// Minimum interval between two attempts, in milliseconds.
const DEFAULT_MIN_SEND_INTERVAL_MS: u64 = 5_000;

// Request timeout, in milliseconds.
const DEFAULT_REQUEST_TIMEOUT_MS: u32 = 10_000;

/// Synchronization engine configuration.
///
/// ## Parameters
///
/// - **`endpoint`**
///   The Firestore project endpoint, with its `API` key.
///
/// - **`device_id`**
///   The device identity. It names the counter document by default and it
///   is written into every log document.
///
/// - **`backend`**
///   The protocol used to store usage. Defaults to a counter document named
///   after the device in the `devices` collection.
///   See [`SyncConfig::counter()`] and [`SyncConfig::log()`].
///
/// - **`min_send_interval_ms`**
///   Minimum time between the start of two attempts. Defaults to `5000`.
///   See [`SyncConfig::min_send_interval()`].
///
/// - **`request_timeout_ms`**
///   Time after which a single request is abandoned. Defaults to `10000`.
///   See [`SyncConfig::request_timeout()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub(crate) endpoint: Endpoint,
    pub(crate) device_id: &'static str,
    pub(crate) backend: Backend,
    pub(crate) min_send_interval_ms: u64,
    pub(crate) request_timeout_ms: u32,
}

impl SyncConfig {
    /// Creates a [`SyncConfig`].
    #[must_use]
    pub const fn new(endpoint: Endpoint, device_id: &'static str) -> Self {
        Self {
            endpoint,
            device_id,
            backend: Backend::Counter(Counter::new(device_id)),
            min_send_interval_ms: DEFAULT_MIN_SEND_INTERVAL_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }

    /// Stores usage in a single counter document.
    #[must_use]
    pub const fn counter(mut self, counter: Counter) -> Self {
        self.backend = Backend::Counter(counter);
        self
    }

    /// Stores usage as one log document per submission.
    #[must_use]
    pub const fn log(mut self, log: Log) -> Self {
        self.backend = Backend::Log(log);
        self
    }

    /// Sets the minimum interval, in milliseconds, between two attempts.
    #[must_use]
    pub const fn min_send_interval(mut self, interval_ms: u64) -> Self {
        self.min_send_interval_ms = interval_ms;
        self
    }

    /// Sets the timeout, in milliseconds, of a single request.
    #[must_use]
    pub const fn request_timeout(mut self, timeout_ms: u32) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    /// Returns the endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the device identity.
    #[must_use]
    pub const fn device_id(&self) -> &'static str {
        self.device_id
    }

    /// Returns the backend.
    #[must_use]
    pub const fn backend(&self) -> &Backend {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use crate::endpoint::Endpoint;
    use crate::protocol::Backend;
    use crate::protocol::counter::Counter;
    use crate::protocol::log::Log;

    use super::SyncConfig;

    #[test]
    fn defaults() {
        let config = SyncConfig::new(Endpoint::new("project", "key"), "device_001");

        assert_eq!(config.device_id(), "device_001");
        assert_eq!(config.min_send_interval_ms, 5_000);
        assert_eq!(config.request_timeout_ms, 10_000);
        assert_eq!(
            config.backend(),
            &Backend::Counter(Counter::new("device_001"))
        );
    }

    #[test]
    fn builder() {
        let config = SyncConfig::new(Endpoint::new("project", "key"), "device_001")
            .log(Log::new().collection("events"))
            .min_send_interval(1_000)
            .request_timeout(2_000);

        assert_eq!(config.min_send_interval_ms, 1_000);
        assert_eq!(config.request_timeout_ms, 2_000);
        assert_eq!(
            config.backend(),
            &Backend::Log(Log::new().collection("events"))
        );
    }
}
