use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::watch;

use super::rules::{writer_profile_path, AccessPolicy, OpenAccess, WriteRequest};
use super::{Actor, DocumentStore, DocumentWatch, StoreResult};
use crate::document::DocumentPath;

/// Documents in the `site_documents` table, one JSONB row per path.
///
/// Change subscriptions fan out in-process from this store's own writes.
/// Single-node; writes from other processes are picked up the next time a
/// document is watched.
pub struct PgDocumentStore {
    pool: PgPool,
    policy: Arc<dyn AccessPolicy>,
    watchers: Mutex<HashMap<DocumentPath, watch::Sender<Option<Value>>>>,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_policy(pool, OpenAccess)
    }

    pub fn with_policy(pool: PgPool, policy: impl AccessPolicy + 'static) -> Self {
        Self {
            pool,
            policy: Arc::new(policy),
            watchers: Mutex::new(HashMap::new()),
        }
    }

    /// Apply the bundled migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn read(&self, path: &DocumentPath) -> StoreResult<Option<Value>> {
        let content = sqlx::query_scalar::<_, Value>(
            "SELECT content FROM site_documents WHERE collection = $1 AND doc_id = $2",
        )
        .bind(path.collection())
        .bind(path.id())
        .fetch_optional(&self.pool)
        .await?;
        Ok(content)
    }

    fn notify(&self, path: &DocumentPath, document: Option<Value>) {
        if let Some(tx) = self.watchers.lock().get(path) {
            tx.send_replace(document);
        }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, actor: &Actor, path: &DocumentPath) -> StoreResult<Option<Value>> {
        self.policy.authorize_read(actor, path)?;
        self.read(path).await
    }

    async fn set(&self, actor: &Actor, path: &DocumentPath, document: Value) -> StoreResult<()> {
        let existing = self.read(path).await?;
        let writer_profile = match writer_profile_path(actor) {
            Some(profile) => self.read(&profile).await?,
            None => None,
        };
        self.policy.authorize_write(&WriteRequest {
            actor,
            path,
            document: &document,
            existing: existing.as_ref(),
            writer_profile: writer_profile.as_ref(),
        })?;

        sqlx::query(
            "INSERT INTO site_documents (collection, doc_id, content) VALUES ($1, $2, $3) \
             ON CONFLICT (collection, doc_id) \
             DO UPDATE SET content = EXCLUDED.content, updated_at = now()",
        )
        .bind(path.collection())
        .bind(path.id())
        .bind(&document)
        .execute(&self.pool)
        .await?;

        tracing::debug!(%path, %actor, "document written");
        self.notify(path, Some(document));
        Ok(())
    }

    async fn watch(&self, actor: &Actor, path: &DocumentPath) -> StoreResult<DocumentWatch> {
        self.policy.authorize_read(actor, path)?;
        let current = self.read(path).await?;

        let mut watchers = self.watchers.lock();
        let rx = match watchers.get(path) {
            Some(tx) => {
                tx.send_if_modified(|value| {
                    if *value == current {
                        false
                    } else {
                        *value = current;
                        true
                    }
                });
                tx.subscribe()
            }
            None => {
                let (tx, rx) = watch::channel(current);
                watchers.insert(path.clone(), tx);
                rx
            }
        };
        Ok(DocumentWatch::new(path.clone(), rx))
    }
}
