//! Local Document Collection
//!
//! The document backend the sync engine reads from and writes into.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Monotonic document revision (a modification counter or timestamp).
pub type Revision = i64;

/// Identifier/revision pair describing a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub rev: Revision,
}

/// A full document as exchanged with the sync engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev")]
    pub rev: Revision,
    #[serde(flatten)]
    pub body: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    pub fn to_ref(&self) -> DocumentRef {
        DocumentRef {
            id: self.id.clone(),
            rev: self.rev,
        }
    }
}

/// Document backend trait
///
/// # Example
///
/// ```ignore
/// use bridge_traits::documents::DocumentStore;
///
/// async fn count(store: &dyn DocumentStore) -> Result<usize> {
///     Ok(store.get_all().await?.len())
/// }
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List every local document as an id/revision pair.
    async fn get_all(&self) -> Result<Vec<DocumentRef>>;

    /// Fetch a document by id. Returns `Ok(None)` if it does not exist.
    async fn get_by_id(&self, id: &str) -> Result<Option<Document>>;

    /// Store a document received from the remote side, returning the stored revision.
    async fn put_by_id(&self, doc: Document) -> Result<Revision>;

    /// Delete a document if its revision still matches.
    async fn delete_by_id(&self, id: &str, rev: Revision) -> Result<()>;

    /// Order two revisions of the same document.
    fn compare_revision(&self, a: Revision, b: Revision) -> Ordering {
        a.cmp(&b)
    }
}
