//! Document store boundary.
//!
//! Records are JSON objects grouped into named collections. The store
//! assigns ids on insert and returns every record with its `id` field set.
//! Only equality filters on top-level fields are supported; anything else
//! (date ranges, sorting) is done by the caller.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

pub type Document = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection}/{id} does not exist")]
    NotFound { collection: String, id: String },
    #[error("Malformed record: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("{collection} records must be JSON objects, got {value}")]
    NotAnObject { collection: &'static str, value: String },
}

/// Equality filter on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    fn matches(&self, record: &Document) -> bool {
        record.get(&self.field) == Some(&self.value)
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, collection: &str, record: Document) -> Result<String, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    async fn query(&self, collection: &str, filters: &[Filter])
    -> Result<Vec<Document>, StoreError>;

    async fn update(&self, collection: &str, id: &str, record: Document)
    -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn with_id(id: &str, mut record: Document) -> Document {
    record.insert("id".to_string(), Value::String(id.to_string()));
    record
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, mut record: Document) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        record.remove("id");
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), record);
        debug!(collection, id = %id, "inserted record");
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|records| records.get(id))
            .map(|record| with_id(id, record.clone())))
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(records) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(records
            .iter()
            .filter(|(id, record)| {
                filters.iter().all(|filter| {
                    if filter.field == "id" {
                        filter.value.as_str() == Some(id.as_str())
                    } else {
                        filter.matches(record)
                    }
                })
            })
            .map(|(id, record)| with_id(id, record.clone()))
            .collect())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        mut record: Document,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let slot = collections
            .get_mut(collection)
            .and_then(|records| records.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        record.remove("id");
        *slot = record;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let removed = self
            .collections
            .write()
            .await
            .get_mut(collection)
            .and_then(|records| records.remove(id));
        match removed {
            Some(_) => {
                debug!(collection, id, "deleted record");
                Ok(())
            }
            None => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_get_returns_it() {
        let store = MemoryStore::new();
        let id = store
            .insert("classes", doc(json!({"name": "Yoga"})))
            .await
            .unwrap();

        let record = store.get("classes", &id).await.unwrap().unwrap();
        assert_eq!(record["id"], json!(id));
        assert_eq!(record["name"], json!("Yoga"));
        assert!(store.get("classes", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_matches_all_filters() {
        let store = MemoryStore::new();
        for (org, status) in [("a", "confirmed"), ("a", "cancelled"), ("b", "confirmed")] {
            store
                .insert(
                    "bookings",
                    doc(json!({"organisationId": org, "status": status})),
                )
                .await
                .unwrap();
        }

        let found = store
            .query(
                "bookings",
                &[
                    Filter::eq("organisationId", "a"),
                    Filter::eq("status", "confirmed"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["organisationId"], json!("a"));

        let all = store.query("bookings", &[]).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(store.query("unknown", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_record() {
        let store = MemoryStore::new();
        let id = store
            .insert("bookings", doc(json!({"status": "confirmed"})))
            .await
            .unwrap();
        store
            .update("bookings", &id, doc(json!({"status": "cancelled"})))
            .await
            .unwrap();
        let record = store.get("bookings", &id).await.unwrap().unwrap();
        assert_eq!(record["status"], json!("cancelled"));

        let err = store
            .update("bookings", "missing", doc(json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_unknown_id_fails() {
        let store = MemoryStore::new();
        let id = store.insert("classes", doc(json!({}))).await.unwrap();
        store.delete("classes", &id).await.unwrap();
        let err = store.delete("classes", &id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
