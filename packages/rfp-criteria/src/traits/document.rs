//! Document source trait.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::document::DocumentMetadata;

/// Where documents and their extracted text come from.
///
/// Upload handling and PDF/spreadsheet conversion live behind this trait;
/// the pipeline only ever sees plain or markdown text.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Metadata for a document, `None` if it does not exist.
    async fn get_document(&self, document_id: Uuid) -> Result<Option<DocumentMetadata>>;

    /// Extracted text, `None` if the document has none yet.
    async fn get_content(&self, document_id: Uuid) -> Result<Option<String>>;
}
