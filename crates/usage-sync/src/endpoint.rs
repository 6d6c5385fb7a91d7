use alloc::format;
use alloc::string::String;

/// Default Firestore host.
pub const DEFAULT_HOST: &str = "firestore.googleapis.com";

/// The Firestore `REST` endpoint of a project.
///
/// Every `URL` carries the project `API` key as a query parameter, so they
/// must never be written to the log. Use [`Endpoint::document_path`] to
/// identify a document in log messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    host: &'static str,
    project_id: &'static str,
    api_key: &'static str,
}

impl Endpoint {
    /// Creates an [`Endpoint`] for the given project on the default host.
    #[must_use]
    pub const fn new(project_id: &'static str, api_key: &'static str) -> Self {
        Self {
            host: DEFAULT_HOST,
            project_id,
            api_key,
        }
    }

    /// Sets the host.
    #[must_use]
    pub const fn host(mut self, host: &'static str) -> Self {
        self.host = host;
        self
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn project_id(&self) -> &'static str {
        self.project_id
    }

    /// Resource path of a document, relative to the `v1` root.
    #[must_use]
    pub fn document_path(&self, collection: &str, document_id: &str) -> String {
        format!(
            "projects/{}/databases/(default)/documents/{collection}/{document_id}",
            self.project_id
        )
    }

    /// `URL` to fetch or replace a document.
    #[must_use]
    pub fn document_url(&self, collection: &str, document_id: &str) -> String {
        format!(
            "https://{}/v1/{}?key={}",
            self.host,
            self.document_path(collection, document_id),
            self.api_key
        )
    }

    /// `URL` to update only the `field` of a document.
    ///
    /// An empty `field` produces an unmasked document `URL`.
    #[must_use]
    pub fn masked_document_url(&self, collection: &str, document_id: &str, field: &str) -> String {
        let mut url = self.document_url(collection, document_id);
        if !field.is_empty() {
            url.push_str("&updateMask.fieldPaths=");
            url.push_str(field);
        }
        url
    }

    /// `URL` to create a document with a client-chosen identifier.
    #[must_use]
    pub fn create_url(&self, collection: &str, document_id: &str) -> String {
        format!(
            "https://{}/v1/projects/{}/databases/(default)/documents/{collection}?documentId={document_id}&key={}",
            self.host, self.project_id, self.api_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Endpoint;

    const ENDPOINT: Endpoint = Endpoint::new("project", "secret");

    #[test]
    fn document_path() {
        assert_eq!(
            ENDPOINT.document_path("devices", "device_001"),
            "projects/project/databases/(default)/documents/devices/device_001"
        );
    }

    #[test]
    fn document_url() {
        assert_eq!(
            ENDPOINT.document_url("devices", "device_001"),
            "https://firestore.googleapis.com/v1/projects/project/databases/(default)/documents/devices/device_001?key=secret"
        );
    }

    #[test]
    fn masked_document_url() {
        assert_eq!(
            ENDPOINT.masked_document_url("devices", "device_001", "uses"),
            "https://firestore.googleapis.com/v1/projects/project/databases/(default)/documents/devices/device_001?key=secret&updateMask.fieldPaths=uses"
        );

        // No mask.
        assert_eq!(
            ENDPOINT.masked_document_url("devices", "device_001", ""),
            ENDPOINT.document_url("devices", "device_001")
        );
    }

    #[test]
    fn create_url() {
        assert_eq!(
            ENDPOINT.create_url("devices", "device_001"),
            "https://firestore.googleapis.com/v1/projects/project/databases/(default)/documents/devices?documentId=device_001&key=secret"
        );
    }

    #[test]
    fn custom_host() {
        let endpoint = ENDPOINT.host("localhost:8080");
        assert_eq!(
            endpoint.create_url("logs", "a"),
            "https://localhost:8080/v1/projects/project/databases/(default)/documents/logs?documentId=a&key=secret"
        );
    }
}
