//! Request service: context checks and error wrapping around a [`Storer`]

mod context;

pub use context::RequestContext;

use crate::error::ServiceError;
use crate::storage::Storer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Input for [`KvStoreService::set`]
#[derive(Debug, Clone, PartialEq)]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
}

/// Input for [`KvStoreService::update`]
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub key: String,
    pub value: Value,
}

/// A single key/value item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResponse {
    pub key: String,
    pub value: Value,
}

/// Items returned by [`KvStoreService::list`], ordered by key
pub type ListResponse = Vec<ItemResponse>;

/// Stateless apart from the storage it delegates to
#[derive(Clone)]
pub struct KvStoreService {
    storage: Arc<dyn Storer>,
}

impl KvStoreService {
    pub fn new(storage: Arc<dyn Storer>) -> Self {
        Self { storage }
    }

    pub fn set(&self, ctx: &RequestContext, req: SetRequest) -> Result<ItemResponse, ServiceError> {
        ctx.check()?;
        let value = self
            .storage
            .set(req.key.clone(), req.value)
            .map_err(|e| ServiceError::storage("kvstoreservice.Set storage.Set err", e))?;
        Ok(ItemResponse {
            key: req.key,
            value,
        })
    }

    pub fn get(&self, ctx: &RequestContext, key: &str) -> Result<ItemResponse, ServiceError> {
        ctx.check()?;
        let value = self
            .storage
            .get(key)
            .map_err(|e| ServiceError::storage("kvstoreservice.Get storage.Get err", e))?;
        Ok(ItemResponse {
            key: key.to_string(),
            value,
        })
    }

    pub fn update(
        &self,
        ctx: &RequestContext,
        req: UpdateRequest,
    ) -> Result<ItemResponse, ServiceError> {
        ctx.check()?;
        let value = self
            .storage
            .update(&req.key, req.value)
            .map_err(|e| ServiceError::storage("kvstoreservice.Update storage.Update err", e))?;
        Ok(ItemResponse {
            key: req.key,
            value,
        })
    }

    pub fn delete(&self, ctx: &RequestContext, key: &str) -> Result<(), ServiceError> {
        ctx.check()?;
        self.storage
            .delete(key)
            .map_err(|e| ServiceError::storage("kvstoreservice.Delete storage.Delete err", e))
    }

    pub fn list(&self, ctx: &RequestContext) -> Result<ListResponse, ServiceError> {
        ctx.check()?;
        let mut items: ListResponse = self
            .storage
            .list()
            .into_iter()
            .map(|(key, value)| ItemResponse { key, value })
            .collect();
        items.sort_unstable_by(|a, b| a.key.cmp(&b.key));
        Ok(items)
    }
}
