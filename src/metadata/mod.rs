//! Field metadata and the injectable TTL cache over it.
//!
//! The cache is an explicit service handed to its consumers, not a hidden
//! module-level singleton, so tests can construct and reset it
//! deterministically. The `MetaProvider` trait abstracts over where
//! metadata comes from; the primary implementation is the HTTP client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::api::ApiResult;
use crate::config::MetadataSettings;

/// Whether a field is a measure or a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Measure,
    Dimension,
}

/// The value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Time,
    Boolean,
}

/// Metadata for one semantic field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub kind: FieldKind,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Measures only: fields a drill-member expansion rewrites to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drill_members: Vec<String>,
    /// Dimensions only: hierarchy levels, coarsest first. A dimension at
    /// level `i` refines into level `i + 1`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hierarchy: Vec<String>,
}

/// An immutable snapshot of all known fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaSnapshot {
    fields: HashMap<String, FieldMeta>,
}

impl MetaSnapshot {
    pub fn from_fields(fields: Vec<FieldMeta>) -> Self {
        Self {
            fields: fields.into_iter().map(|f| (f.name.clone(), f)).collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The hierarchy level that follows `field`, if its dimension declares
    /// one.
    pub fn next_hierarchy_level(&self, field: &str) -> Option<&str> {
        let meta = self.field(field)?;
        let pos = meta.hierarchy.iter().position(|level| level == field)?;
        meta.hierarchy.get(pos + 1).map(String::as_str)
    }
}

/// Source of field metadata.
#[async_trait]
pub trait MetaProvider: Send + Sync {
    async fn meta(&self) -> ApiResult<MetaSnapshot>;
}

struct CachedMeta {
    fetched_at: Instant,
    snapshot: Arc<MetaSnapshot>,
}

/// TTL cache over a [`MetaProvider`].
pub struct MetaCache {
    provider: Arc<dyn MetaProvider>,
    ttl: Duration,
    slot: Mutex<Option<CachedMeta>>,
}

impl MetaCache {
    pub fn new(provider: Arc<dyn MetaProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Build a cache with the TTL from [`MetadataSettings`].
    pub fn from_settings(provider: Arc<dyn MetaProvider>, settings: &MetadataSettings) -> Self {
        Self::new(provider, settings.cache_ttl())
    }

    /// The cached snapshot, refetched from the provider when missing or
    /// older than the TTL.
    pub async fn get(&self) -> ApiResult<Arc<MetaSnapshot>> {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&cached.snapshot));
            }
        }

        let snapshot = Arc::new(self.provider.meta().await?);
        *slot = Some(CachedMeta {
            fetched_at: Instant::now(),
            snapshot: Arc::clone(&snapshot),
        });
        Ok(snapshot)
    }

    /// Drop the cached snapshot; the next `get` refetches.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}
