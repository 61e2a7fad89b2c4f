//! Typed access to one collection of the document store.
//!
//! A repository is instantiated once per entity type and converts between
//! the entity and its stored document.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::store::{Document, DocumentStore, Filter, StoreError};

pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);
}

pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// Inserts the entity and returns it with the id assigned by the store.
    pub async fn create(&self, mut entity: T) -> Result<T, StoreError> {
        let id = self
            .store
            .insert(T::COLLECTION, to_document(T::COLLECTION, &entity)?)
            .await?;
        entity.set_id(id);
        Ok(entity)
    }

    pub async fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(from_document)
            .transpose()
    }

    pub async fn list(&self, filters: &[Filter]) -> Result<Vec<T>, StoreError> {
        self.store
            .query(T::COLLECTION, filters)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    pub async fn count(&self, filters: &[Filter]) -> Result<usize, StoreError> {
        Ok(self.store.query(T::COLLECTION, filters).await?.len())
    }

    pub async fn update(&self, entity: &T) -> Result<(), StoreError> {
        self.store
            .update(T::COLLECTION, entity.id(), to_document(T::COLLECTION, entity)?)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(T::COLLECTION, id).await
    }
}

fn to_document<T: Serialize>(
    collection: &'static str,
    entity: &T,
) -> Result<Document, StoreError> {
    match serde_json::to_value(entity)? {
        Value::Object(mut document) => {
            document.remove("id");
            Ok(document)
        }
        other => Err(StoreError::NotAnObject {
            collection,
            value: other.to_string(),
        }),
    }
}

fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(document))?)
}
