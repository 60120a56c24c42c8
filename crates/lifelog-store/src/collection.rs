use std::marker::PhantomData;
use std::sync::Arc;

use lifelog::{new_id, Document, Record};
use serde::Serialize;
use tracing::{debug, warn};

use crate::codec;
use crate::error::StoreError;
use crate::traits::BackingStore;

/// A named, ordered list of records of one type, persisted as a single
/// JSON array in one slot.
///
/// Every operation re-reads the slot, so writes made by another context
/// are always visible. Records keep insertion order.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lifelog::{Todo, TodoDraft};
/// use lifelog_store::{Collection, MemoryStore};
///
/// let todos: Collection<Todo, _> = Collection::new(Arc::new(MemoryStore::new()));
/// let milk = todos.create(TodoDraft::new("Buy milk")).unwrap();
///
/// let done = todos
///     .update(&milk.id, &serde_json::json!({ "completed": true }))
///     .unwrap()
///     .unwrap();
/// assert!(done.completed);
/// assert_eq!(todos.get_all(), vec![done]);
/// ```
pub struct Collection<T, S> {
    store: Arc<S>,
    key: String,
    _record: PhantomData<fn() -> T>,
}

impl<T, S> Clone for Collection<T, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            key: self.key.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record, S: BackingStore> Collection<T, S> {
    /// The collection stored under the record type's own key.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_key(store, T::COLLECTION)
    }

    /// The collection stored under a custom slot key.
    pub fn with_key(store: Arc<S>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            _record: PhantomData,
        }
    }

    /// The slot key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The raw slot text. A failed read is logged and reads as missing.
    pub fn raw(&self) -> Option<String> {
        match self.store.get(&self.key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read slot");
                None
            }
        }
    }

    /// Every record, in stored order. Never fails.
    pub fn get_all(&self) -> Vec<T> {
        codec::decode(&self.key, self.raw().as_deref())
    }

    /// Every stored object, including ones that don't decode as `T`.
    pub fn documents(&self) -> Vec<Document> {
        codec::decode_documents(&self.key, self.raw().as_deref())
    }

    /// The record with `id`, if any.
    pub fn get_by_id(&self, id: &str) -> Option<T> {
        self.get_all().into_iter().find(|r| r.id() == id)
    }

    /// Records matching `pred`, in stored order.
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.get_all().into_iter().filter(|r| pred(r)).collect()
    }

    /// Append a new record built from `draft` with a fresh id.
    pub fn create(&self, draft: T::Draft) -> Result<T, StoreError> {
        self.create_in(self.documents(), draft)
    }

    /// Shallow-merge `patch` into the record with `id`.
    ///
    /// Returns `Ok(None)` without writing when no record has that id. The
    /// `id` field of the patch, if any, is ignored. Stored fields the record
    /// type does not declare are kept.
    pub fn update<P: Serialize + ?Sized>(
        &self,
        id: &str,
        patch: &P,
    ) -> Result<Option<T>, StoreError> {
        self.update_in(self.documents(), id, patch)
    }

    /// Remove the record with `id`. Returns `Ok(false)` without writing
    /// when no record has that id.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.delete_in(self.documents(), id)
    }

    /// Replace the whole collection.
    pub fn save_all(&self, records: &[T]) -> Result<(), StoreError> {
        let raw = codec::encode(&self.key, records)?;
        self.write_raw(&raw)?;
        debug!(key = %self.key, records = records.len(), bytes = raw.len(), "saved collection");
        Ok(())
    }

    pub(crate) fn write_documents(&self, docs: &[Document]) -> Result<(), StoreError> {
        let raw = codec::encode(&self.key, docs)?;
        self.write_raw(&raw)?;
        debug!(key = %self.key, records = docs.len(), bytes = raw.len(), "saved collection");
        Ok(())
    }

    pub(crate) fn write_raw(&self, raw: &str) -> Result<(), StoreError> {
        self.store.set(&self.key, raw).map_err(|e| {
            warn!(key = %self.key, error = %e, "failed to write slot");
            StoreError::write(&self.key, e)
        })
    }

    pub(crate) fn create_in(
        &self,
        mut docs: Vec<Document>,
        draft: T::Draft,
    ) -> Result<T, StoreError> {
        let record = T::from_draft(new_id(), draft);
        docs.push(codec::to_document(&self.key, &record)?);
        self.write_documents(&docs)?;
        Ok(record)
    }

    pub(crate) fn update_in<P: Serialize + ?Sized>(
        &self,
        mut docs: Vec<Document>,
        id: &str,
        patch: &P,
    ) -> Result<Option<T>, StoreError> {
        let Some(index) = docs.iter().position(|d| codec::document_id(d) == Some(id)) else {
            return Ok(None);
        };
        let (updated, doc) = codec::patch_document(&self.key, &docs[index], patch)?;
        docs[index] = doc;
        self.write_documents(&docs)?;
        Ok(Some(updated))
    }

    pub(crate) fn delete_in(&self, mut docs: Vec<Document>, id: &str) -> Result<bool, StoreError> {
        let before = docs.len();
        docs.retain(|d| codec::document_id(d) != Some(id));
        if docs.len() == before {
            return Ok(false);
        }
        self.write_documents(&docs)?;
        Ok(true)
    }
}
