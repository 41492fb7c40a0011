//! Hosted slide store.

use async_trait::async_trait;
use serde_json::{Map, Value};

use micrarium_core::error::{Error, ServiceError};
use micrarium_core::{Result, SlideFilter, SlideId, SlideRecord, SlideStore, StoreUrl};

use crate::client::{RestAuth, RestClient};

/// Table holding slide rows.
const TABLE: &str = "slides";

/// Storage bucket serving slide media.
const DEFAULT_BUCKET: &str = "slides";

/// Slide store backed by the hosted data service.
///
/// Filters are pushed down to the service: each dimension becomes an
/// `or` over the multi-valued column (array containment) and the legacy
/// single-valued column (equality), so rows from either schema
/// generation match server-side.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: RestClient,
    bucket: String,
}

impl RestStore {
    /// Create a store against the hosted service at `store`.
    pub fn new(store: StoreUrl, auth: RestAuth) -> Self {
        Self {
            client: RestClient::new(store, auth),
            bucket: DEFAULT_BUCKET.to_string(),
        }
    }

    /// Override the storage bucket media is served from.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    fn filter_params(filter: &SlideFilter) -> Vec<(&'static str, String)> {
        match filter.color {
            None => vec![(
                "or",
                format!(
                    r#"(categories.cs.{{"{0}"}},category.eq."{0}")"#,
                    filter.category
                ),
            )],
            Some(ref color) => vec![(
                "and",
                format!(
                    r#"(or(categories.cs.{{"{0}"}},category.eq."{0}"),or(colors.cs.{{"{1}"}},color.eq."{1}"))"#,
                    filter.category, color
                ),
            )],
        }
    }
}

#[async_trait]
impl SlideStore for RestStore {
    async fn count(&self, filter: &SlideFilter) -> Result<u64> {
        let mut query = Self::filter_params(filter);
        query.push(("select", "*".to_string()));
        self.client.count(TABLE, &query).await
    }

    async fn fetch_page(
        &self,
        filter: &SlideFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<SlideRecord>> {
        let mut query = Self::filter_params(filter);
        query.push(("select", "*".to_string()));
        query.push(("order", "created_at.desc,id.desc".to_string()));
        query.push(("offset", offset.to_string()));
        query.push(("limit", limit.to_string()));
        self.client.select(TABLE, &query).await
    }

    async fn fetch_record(&self, id: &SlideId) -> Result<SlideRecord> {
        let query = vec![
            ("select", "*".to_string()),
            ("id", format!("eq.{}", id)),
            ("limit", "1".to_string()),
        ];
        let rows: Vec<SlideRecord> = self.client.select(TABLE, &query).await?;
        rows.into_iter().next().ok_or_else(|| {
            Error::Service(ServiceError::new(
                404,
                Some("PGRST116".to_string()),
                Some(format!("Slide {} not found", id)),
            ))
        })
    }

    async fn patch_attribute(&self, id: &SlideId, field: &str, value: Value) -> Result<()> {
        let query = vec![("id", format!("eq.{}", id))];
        let mut body = Map::new();
        body.insert(field.to_string(), value);
        self.client.patch(TABLE, &query, &Value::Object(body)).await
    }

    fn resolve_public_url(&self, storage_path: &str) -> Option<String> {
        if storage_path.is_empty() {
            return None;
        }
        Some(
            self.client
                .store()
                .storage_object_url(&self.bucket, storage_path),
        )
    }
}
