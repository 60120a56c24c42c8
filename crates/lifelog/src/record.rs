//! The record contract shared by every stored entity.
//!
//! A record is a flat field-map with a stable `id`. Each record type owns one
//! named collection slot in the backing store, and knows how to turn its
//! id-less draft into a full record.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// An untyped record: the plain JSON field-map as it appears on the wire.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Name of the identity field on every record.
pub const ID_FIELD: &str = "id";

/// Trait implemented by every storable record type.
///
/// # Example
///
/// ```
/// use lifelog::{Record, Todo, TodoDraft};
///
/// let todo = Todo::from_draft("t-1".into(), TodoDraft::new("Buy milk"));
/// assert_eq!(todo.id(), "t-1");
/// assert_eq!(Todo::COLLECTION, "todos");
/// ```
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Backing-store key holding the whole collection of this record type.
    const COLLECTION: &'static str;

    /// The record-without-id shape accepted on create.
    type Draft;

    /// Stable unique identifier.
    fn id(&self) -> &str;

    /// Build a full record from a freshly generated id and a draft.
    ///
    /// Auto-generated fields (such as `createdAt`) are filled in here.
    fn from_draft(id: String, draft: Self::Draft) -> Self;

    /// Restore structural invariants after a decode or a merge.
    fn normalize(&mut self) {}
}
