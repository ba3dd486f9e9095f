//! Versioned entity storage with an append-only audit trail.
//!
//! # Responsibilities
//! - `create`/`update`/`delete` per registry entity type, each returning
//!   the content-digest version id
//! - One audit row per committed mutation; entity write and audit append
//!   commit together or not at all
//! - Secret settings redacted from audit snapshots before persisting
//!
//! # Design Decisions
//! - The in-memory implementation guards entities and audit log with a
//!   single mutex so a commit is observed whole or not at all

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::versioning::digest::version_id;

/// Marker on settings payloads whose values must not reach the audit log.
const SECRET_FLAG: &str = "secret";
const REDACTED: &str = "********";

/// Registry entity kinds the administrative API mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Apps,
    Routes,
    Templates,
    Settings,
    Credentials,
}

/// One audit row, appended per committed mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub data_before: Option<Value>,
    pub data_after: Option<Value>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// A stored entity row.
#[derive(Debug, Clone)]
pub struct VersionedEntity {
    pub surrogate_id: i64,
    pub payload: Value,
}

impl VersionedEntity {
    /// Version id derived from current content, computed at read time.
    pub fn version_id(&self) -> String {
        version_id(self.surrogate_id, &self.payload)
    }
}

/// Errors from versioned storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity_type:?} entity {entity_id:?} already exists")]
    AlreadyExists {
        entity_type: EntityType,
        entity_id: String,
    },

    #[error("{entity_type:?} entity {entity_id:?} not found")]
    NotFound {
        entity_type: EntityType,
        entity_id: String,
    },
}

/// The mutation contract consumed by the administrative API.
#[async_trait]
pub trait VersionedStore: Send + Sync {
    /// Insert a new entity; returns its version id.
    async fn create(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        payload: Value,
        created_by: &str,
    ) -> Result<String, StoreError>;

    /// Replace an existing entity; returns the new version id.
    async fn update(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        payload: Value,
        created_by: &str,
    ) -> Result<String, StoreError>;

    /// Remove an entity; returns the version id of the removed content.
    async fn delete(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        created_by: &str,
    ) -> Result<String, StoreError>;

    /// Read an entity row.
    async fn get(&self, entity_type: EntityType, entity_id: &str) -> Option<VersionedEntity>;

    /// Snapshot of the audit log, oldest first.
    async fn audit_log(&self) -> Vec<AuditEntry>;
}

#[derive(Default)]
struct Tables {
    entities: HashMap<(EntityType, String), VersionedEntity>,
    audit: Vec<AuditEntry>,
    next_surrogate: i64,
}

/// Reference implementation backed by process memory.
#[derive(Default)]
pub struct InMemoryVersionedStore {
    // One lock over both tables: a mutation's entity write and audit
    // append are observed together or not at all.
    tables: Mutex<Tables>,
}

impl InMemoryVersionedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Strip values of settings entries flagged secret from an audit snapshot.
fn redact_secrets(entity_type: EntityType, payload: &Value) -> Value {
    if !matches!(entity_type, EntityType::Settings | EntityType::Credentials) {
        return payload.clone();
    }
    let mut snapshot = payload.clone();
    if let Value::Object(map) = &mut snapshot {
        let is_secret = map
            .get(SECRET_FLAG)
            .and_then(Value::as_bool)
            .unwrap_or(matches!(entity_type, EntityType::Credentials));
        if is_secret {
            if let Some(value) = map.get_mut("value") {
                *value = Value::String(REDACTED.to_string());
            }
        }
    }
    snapshot
}

#[async_trait]
impl VersionedStore for InMemoryVersionedStore {
    async fn create(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        payload: Value,
        created_by: &str,
    ) -> Result<String, StoreError> {
        let mut tables = self.tables.lock().await;
        let key = (entity_type, entity_id.to_string());
        if tables.entities.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                entity_type,
                entity_id: entity_id.to_string(),
            });
        }

        tables.next_surrogate += 1;
        let entity = VersionedEntity {
            surrogate_id: tables.next_surrogate,
            payload: payload.clone(),
        };
        let version = entity.version_id();

        tables.entities.insert(key, entity);
        tables.audit.push(AuditEntry {
            entity_type,
            entity_id: entity_id.to_string(),
            data_before: None,
            data_after: Some(redact_secrets(entity_type, &payload)),
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        });
        Ok(version)
    }

    async fn update(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        payload: Value,
        created_by: &str,
    ) -> Result<String, StoreError> {
        let mut tables = self.tables.lock().await;
        let key = (entity_type, entity_id.to_string());
        let Some(existing) = tables.entities.get(&key) else {
            return Err(StoreError::NotFound {
                entity_type,
                entity_id: entity_id.to_string(),
            });
        };

        let before = existing.payload.clone();
        let entity = VersionedEntity {
            surrogate_id: existing.surrogate_id,
            payload: payload.clone(),
        };
        let version = entity.version_id();

        tables.entities.insert(key, entity);
        tables.audit.push(AuditEntry {
            entity_type,
            entity_id: entity_id.to_string(),
            data_before: Some(redact_secrets(entity_type, &before)),
            data_after: Some(redact_secrets(entity_type, &payload)),
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        });
        Ok(version)
    }

    async fn delete(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        created_by: &str,
    ) -> Result<String, StoreError> {
        let mut tables = self.tables.lock().await;
        let key = (entity_type, entity_id.to_string());
        let Some(removed) = tables.entities.remove(&key) else {
            return Err(StoreError::NotFound {
                entity_type,
                entity_id: entity_id.to_string(),
            });
        };

        let version = removed.version_id();
        tables.audit.push(AuditEntry {
            entity_type,
            entity_id: entity_id.to_string(),
            data_before: Some(redact_secrets(entity_type, &removed.payload)),
            data_after: None,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        });
        Ok(version)
    }

    async fn get(&self, entity_type: EntityType, entity_id: &str) -> Option<VersionedEntity> {
        let tables = self.tables.lock().await;
        tables
            .entities
            .get(&(entity_type, entity_id.to_string()))
            .cloned()
    }

    async fn audit_log(&self) -> Vec<AuditEntry> {
        self.tables.lock().await.audit.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_identical_content_yields_identical_version_id() {
        let store = InMemoryVersionedStore::new();
        let payload = json!({"spaBundle": "a.js", "kind": "primary"});

        store
            .create(EntityType::Apps, "@portal/news", payload.clone(), "admin")
            .await
            .unwrap();
        let first = store
            .update(EntityType::Apps, "@portal/news", payload.clone(), "admin")
            .await
            .unwrap();
        let second = store
            .update(EntityType::Apps, "@portal/news", payload, "admin")
            .await
            .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_content_change_changes_version_id() {
        let store = InMemoryVersionedStore::new();
        let first = store
            .create(EntityType::Apps, "@portal/news", json!({"kind": "primary"}), "admin")
            .await
            .unwrap();
        let second = store
            .update(EntityType::Apps, "@portal/news", json!({"kind": "essential"}), "admin")
            .await
            .unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_every_mutation_appends_exactly_one_audit_row() {
        let store = InMemoryVersionedStore::new();
        store
            .create(EntityType::Routes, "1", json!({"route": "/news"}), "admin")
            .await
            .unwrap();
        store
            .update(EntityType::Routes, "1", json!({"route": "/news/*"}), "admin")
            .await
            .unwrap();
        store
            .delete(EntityType::Routes, "1", "admin")
            .await
            .unwrap();

        let audit = store.audit_log().await;
        assert_eq!(audit.len(), 3);
        assert_eq!(audit[0].data_before, None);
        assert_eq!(audit[2].data_after, None);
        assert_eq!(
            audit[1].data_before,
            Some(json!({"route": "/news"}))
        );
    }

    #[tokio::test]
    async fn test_failed_mutation_commits_nothing() {
        let store = InMemoryVersionedStore::new();
        let error = store
            .update(EntityType::Apps, "@portal/missing", json!({}), "admin")
            .await
            .unwrap_err();
        assert!(matches!(error, StoreError::NotFound { .. }));
        assert!(store.audit_log().await.is_empty());
        assert!(store.get(EntityType::Apps, "@portal/missing").await.is_none());
    }

    #[tokio::test]
    async fn test_secret_settings_redacted_in_audit_only() {
        let store = InMemoryVersionedStore::new();
        let payload = json!({"key": "authToken", "value": "s3cr3t", "secret": true});
        store
            .create(EntityType::Settings, "authToken", payload.clone(), "admin")
            .await
            .unwrap();

        let audit = store.audit_log().await;
        assert_eq!(audit[0].data_after.as_ref().unwrap()["value"], json!(REDACTED));
        // The stored row keeps the real value.
        let entity = store.get(EntityType::Settings, "authToken").await.unwrap();
        assert_eq!(entity.payload, payload);
    }

    #[tokio::test]
    async fn test_non_secret_settings_survive_audit_unredacted() {
        let store = InMemoryVersionedStore::new();
        let payload = json!({"key": "trailingSlash", "value": "doNothing", "secret": false});
        store
            .create(EntityType::Settings, "trailingSlash", payload, "admin")
            .await
            .unwrap();
        let audit = store.audit_log().await;
        assert_eq!(audit[0].data_after.as_ref().unwrap()["value"], json!("doNothing"));
    }
}
