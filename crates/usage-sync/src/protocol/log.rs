use alloc::format;
use alloc::string::String;

use ::log::info;

use rand_core::RngCore;

use crate::clock::Clock;
use crate::envelope::Document;
use crate::error::Result;
use crate::timestamp::Timestamp;
use crate::transport::Transport;

use super::Session;

// Default collection of log documents.
const DEFAULT_COLLECTION: &str = "usage_logs";

/// Append-only log documents.
///
/// Every submission creates a new document containing the device identity,
/// the number of uses and a timestamp. Documents are never read nor
/// updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Log {
    collection: &'static str,
}

impl Default for Log {
    fn default() -> Self {
        Self::new()
    }
}

impl Log {
    /// Creates a [`Log`] stored in the `usage_logs` collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            collection: DEFAULT_COLLECTION,
        }
    }

    /// Sets the collection.
    #[must_use]
    pub const fn collection(mut self, collection: &'static str) -> Self {
        self.collection = collection;
        self
    }

    pub(crate) async fn submit<T: Transport, C: Clock, R: RngCore>(
        &self,
        session: &mut Session<'_, T>,
        device_id: &str,
        clock: &C,
        rng: &mut R,
        delta: u32,
    ) -> Result<()> {
        let document_id = document_id(device_id, clock.uptime_ms(), rng);
        let timestamp = Timestamp::now(clock).to_rfc3339();

        info!("Creating log document `{document_id}` with {delta} uses at {timestamp}");

        let document = Document::new()
            .string("device_id", device_id)
            .integer("uses_sent", i64::from(delta))
            .timestamp("timestamp", &timestamp);

        session
            .create(self.collection, &document_id, &document)
            .await
    }
}

/// Builds the identifier of a log document.
///
/// The identifier joins the device identity, the uptime and a random nonce,
/// so two documents created in the same millisecond by the same device still
/// have different identifiers.
pub fn document_id<R: RngCore>(device_id: &str, uptime_ms: u64, rng: &mut R) -> String {
    format!("{device_id}-{uptime_ms}-{:08x}", rng.next_u32())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::endpoint::Endpoint;
    use crate::error::ErrorKind;
    use crate::tests::{CountingRng, MockClock, MockTransport};
    use crate::transport::Method;

    use super::{Log, Session, document_id};

    const ENDPOINT: Endpoint = Endpoint::new("project", "key");

    #[test]
    fn identifiers_in_the_same_millisecond() {
        let mut rng = CountingRng::new(7);

        let first = document_id("device_001", 1_500, &mut rng);
        let second = document_id("device_001", 1_500, &mut rng);

        assert_eq!(first, "device_001-1500-00000007");
        assert_eq!(second, "device_001-1500-00000008");
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn single_create() {
        let transport = MockTransport::new().respond(200, b"{}");
        let clock = MockClock::new(42_000).synchronized_at(1_700_000_000);
        let mut rng = CountingRng::new(0xab);

        let mut sender = transport.clone();
        let mut session = Session::new(&mut sender, &ENDPOINT, 10_000);
        Log::new()
            .submit(&mut session, "device_001", &clock, &mut rng, 10)
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(
            requests[0].url,
            "https://firestore.googleapis.com/v1/projects/project/databases/(default)/documents/usage_logs?documentId=device_001-42000-000000ab&key=key"
        );
        assert_eq!(
            requests[0].body,
            Some(json!({
                "fields": {
                    "device_id": { "stringValue": "device_001" },
                    "uses_sent": { "integerValue": "10" },
                    "timestamp": { "timestampValue": "2023-11-14T22:13:20Z" }
                }
            }))
        );
    }

    #[tokio::test]
    async fn fallback_timestamp() {
        let transport = MockTransport::new().respond(201, b"{}");
        let clock = MockClock::new(3_000);
        let mut rng = CountingRng::new(0);

        let mut sender = transport.clone();
        let mut session = Session::new(&mut sender, &ENDPOINT, 10_000);
        Log::new()
            .collection("events")
            .submit(&mut session, "device_001", &clock, &mut rng, 1)
            .await
            .unwrap();

        let requests = transport.requests();
        assert!(requests[0].url.contains("/documents/events?documentId="));
        assert_eq!(
            requests[0].body.as_ref().unwrap()["fields"]["timestamp"],
            json!({ "timestampValue": "2025-01-01T00:00:03Z" })
        );
    }

    #[tokio::test]
    async fn rejected_create_is_terminal() {
        let transport = MockTransport::new().respond(400, b"{}").respond(200, b"{}");
        let clock = MockClock::new(0);
        let mut rng = CountingRng::new(0);

        let mut sender = transport.clone();
        let mut session = Session::new(&mut sender, &ENDPOINT, 10_000);
        let err = Log::new()
            .submit(&mut session, "device_001", &clock, &mut rng, 1)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Status(400));
        assert_eq!(transport.requests().len(), 1);
    }
}
