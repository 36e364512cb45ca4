use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;

use super::rules::{writer_profile_path, AccessPolicy, OpenAccess, WriteRequest};
use super::{Actor, DocumentStore, DocumentWatch, StoreError, StoreResult};
use crate::document::DocumentPath;

/// Injected failure for one document.
#[derive(Debug, Clone)]
struct Fault {
    remaining: usize,
    retryable: bool,
}

#[derive(Debug, Default)]
struct Faults {
    reads: HashMap<DocumentPath, Fault>,
    writes: HashMap<DocumentPath, Fault>,
}

impl Faults {
    fn take(map: &mut HashMap<DocumentPath, Fault>, path: &DocumentPath) -> Option<StoreError> {
        let fault = map.get_mut(path)?;
        if fault.remaining == 0 {
            return None;
        }
        fault.remaining -= 1;
        Some(StoreError::Unavailable {
            message: format!("injected failure on {path}"),
            retryable: fault.retryable,
        })
    }
}

/// In-process document store. Each document is a `watch` channel, so every
/// subscriber sees the current value and every later write.
#[derive(Debug)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<DocumentPath, watch::Sender<Option<Value>>>>,
    writes: Mutex<HashMap<DocumentPath, usize>>,
    faults: Mutex<Faults>,
    policy: Arc<dyn AccessPolicy>,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    /// A store with no access rules.
    pub fn new() -> Self {
        Self::with_policy(OpenAccess)
    }

    pub fn with_policy(policy: impl AccessPolicy + 'static) -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            writes: Mutex::new(HashMap::new()),
            faults: Mutex::new(Faults::default()),
            policy: Arc::new(policy),
        }
    }

    /// Write a document bypassing rules, fault injection and write counts.
    pub fn insert(&self, path: &DocumentPath, document: Value) {
        self.put(path, document);
    }

    /// Read a document bypassing rules.
    pub fn peek(&self, path: &DocumentPath) -> Option<Value> {
        self.read(path)
    }

    /// Number of successful `set` calls on `path`.
    pub fn write_count(&self, path: &DocumentPath) -> usize {
        self.writes.lock().get(path).copied().unwrap_or(0)
    }

    /// Fail the next `times` reads of `path`.
    pub fn fail_reads(&self, path: &DocumentPath, times: usize, retryable: bool) {
        self.faults.lock().reads.insert(
            path.clone(),
            Fault {
                remaining: times,
                retryable,
            },
        );
    }

    /// Fail the next `times` writes of `path`.
    pub fn fail_writes(&self, path: &DocumentPath, times: usize, retryable: bool) {
        self.faults.lock().writes.insert(
            path.clone(),
            Fault {
                remaining: times,
                retryable,
            },
        );
    }

    fn read(&self, path: &DocumentPath) -> Option<Value> {
        self.documents
            .lock()
            .get(path)
            .and_then(|slot| slot.borrow().clone())
    }

    fn put(&self, path: &DocumentPath, document: Value) {
        self.documents
            .lock()
            .entry(path.clone())
            .or_insert_with(|| watch::channel(None).0)
            .send_replace(Some(document));
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, actor: &Actor, path: &DocumentPath) -> StoreResult<Option<Value>> {
        self.policy.authorize_read(actor, path)?;
        if let Some(err) = Faults::take(&mut self.faults.lock().reads, path) {
            return Err(err);
        }
        Ok(self.read(path))
    }

    async fn set(&self, actor: &Actor, path: &DocumentPath, document: Value) -> StoreResult<()> {
        let existing = self.read(path);
        let writer_profile = writer_profile_path(actor).and_then(|p| self.read(&p));
        self.policy.authorize_write(&WriteRequest {
            actor,
            path,
            document: &document,
            existing: existing.as_ref(),
            writer_profile: writer_profile.as_ref(),
        })?;
        if let Some(err) = Faults::take(&mut self.faults.lock().writes, path) {
            return Err(err);
        }

        self.put(path, document);
        *self.writes.lock().entry(path.clone()).or_default() += 1;
        Ok(())
    }

    async fn watch(&self, actor: &Actor, path: &DocumentPath) -> StoreResult<DocumentWatch> {
        self.policy.authorize_read(actor, path)?;
        let rx = self
            .documents
            .lock()
            .entry(path.clone())
            .or_insert_with(|| watch::channel(None).0)
            .subscribe();
        Ok(DocumentWatch::new(path.clone(), rx))
    }
}
