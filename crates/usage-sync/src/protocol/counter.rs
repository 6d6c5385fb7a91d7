use ::log::{info, warn};

use crate::envelope::Document;
use crate::error::{Error, Result};
use crate::transport::{STATUS_NOT_FOUND, STATUS_OK, Transport};

use super::Session;

// Default collection of counter documents.
const DEFAULT_COLLECTION: &str = "devices";
// Default counter field.
const DEFAULT_FIELD: &str = "uses";

/// A counter document.
///
/// The document holds the running usage total of a device in a single
/// integer field. Each submission reads the current total, adds the delta and
/// writes the field back through a masked update, so any other field of the
/// document is preserved.
///
/// A missing document is created with the delta as its initial total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    collection: &'static str,
    document_id: &'static str,
    field: &'static str,
}

impl Counter {
    /// Creates a [`Counter`] for the given document identifier, stored in
    /// the `devices` collection with a `uses` field.
    #[must_use]
    pub const fn new(document_id: &'static str) -> Self {
        Self {
            collection: DEFAULT_COLLECTION,
            document_id,
            field: DEFAULT_FIELD,
        }
    }

    /// Sets the collection.
    #[must_use]
    pub const fn collection(mut self, collection: &'static str) -> Self {
        self.collection = collection;
        self
    }

    /// Sets the integer field holding the total.
    #[must_use]
    pub const fn field(mut self, field: &'static str) -> Self {
        self.field = field;
        self
    }

    /// Returns the document identifier.
    #[must_use]
    pub const fn document_id(&self) -> &'static str {
        self.document_id
    }

    pub(crate) async fn submit<T: Transport>(
        &self,
        session: &mut Session<'_, T>,
        delta: u32,
    ) -> Result<()> {
        let Some(current) = self.read(session).await? else {
            info!(
                "Counter document `{}` not found, creating it with {delta} uses",
                self.document_id
            );
            return self.create(session, i64::from(delta)).await;
        };

        let total = current.saturating_add(i64::from(delta));
        info!("Incrementing `{}` from {current} to {total}", self.field);

        let response = session
            .patch(
                self.collection,
                self.document_id,
                &self.document(total),
                self.field,
            )
            .await?;

        if response.is_success() {
            return Ok(());
        }

        // The document has been deleted after being read.
        if response.status == STATUS_NOT_FOUND {
            warn!(
                "Counter document `{}` disappeared, creating it with {total} uses",
                self.document_id
            );
            return self.create(session, total).await;
        }

        Err(Error::status(response.status))
    }

    // Returns `None` when the document does not exist.
    async fn read<T: Transport>(&self, session: &mut Session<'_, T>) -> Result<Option<i64>> {
        let response = session.fetch(self.collection, self.document_id).await?;

        match response.status {
            STATUS_OK => {
                let document = Document::from_slice(&response.body)?;
                Ok(Some(document.integer_field(self.field)?.unwrap_or(0)))
            }
            STATUS_NOT_FOUND => Ok(None),
            status => Err(Error::status(status)),
        }
    }

    async fn create<T: Transport>(&self, session: &mut Session<'_, T>, total: i64) -> Result<()> {
        session
            .create(self.collection, self.document_id, &self.document(total))
            .await
    }

    fn document(&self, total: i64) -> Document {
        Document::new().integer(self.field, total)
    }
}
