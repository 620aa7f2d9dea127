use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;

use crate::BlobId;

/// Binary data held in memory on behalf of a pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Debug, Default)]
struct BlobTable {
    next_id: BlobId,
    blobs: HashMap<BlobId, Blob>,
}

/// Shared, session-scoped store for previews and rendered reports.
///
/// Entries live until explicitly released; nothing is evicted behind a pane's back.
#[derive(Debug, Clone, Default)]
pub struct BlobStore {
    inner: Arc<Mutex<BlobTable>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bytes: Bytes, content_type: impl Into<String>) -> BlobId {
        let mut table = self.lock();
        table.next_id += 1;
        let id = table.next_id;
        table.blobs.insert(
            id,
            Blob {
                bytes,
                content_type: content_type.into(),
            },
        );
        id
    }

    pub fn get(&self, id: BlobId) -> Option<Blob> {
        self.lock().blobs.get(&id).cloned()
    }

    /// Returns false when the id was unknown or already released.
    pub fn release(&self, id: BlobId) -> bool {
        self.lock().blobs.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, BlobTable> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
