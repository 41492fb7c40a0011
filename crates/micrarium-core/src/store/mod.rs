//! Slide store trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::record::{SlideFilter, SlideRecord};
use crate::types::SlideId;
use crate::Result;

/// A slide store implementation.
///
/// This is the narrow data-access capability the gallery consumes: the
/// hosted REST backend and the local filesystem archive both implement
/// it, and tests inject fakes. The trait is object-safe so galleries can
/// hold a store behind `Arc<dyn SlideStore>`.
///
/// Filter matching is uniform across implementations: a slide matches a
/// label when the label appears in the multi-valued field or equals the
/// legacy single-valued field (see [`SlideRecord::matches`]).
#[async_trait]
pub trait SlideStore: Send + Sync {
    /// Count slides matching `filter`, independent of pagination.
    async fn count(&self, filter: &SlideFilter) -> Result<u64>;

    /// Fetch one page of slides matching `filter`.
    ///
    /// Slides are ordered by creation timestamp descending, tie-broken
    /// by id descending so pagination is stable. A range past the end of
    /// the data returns an empty page, never an error; errors mean a
    /// genuine transport or query failure.
    async fn fetch_page(
        &self,
        filter: &SlideFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<SlideRecord>>;

    /// Fetch a single slide by id.
    ///
    /// Returns a not-found service error if the slide does not exist.
    async fn fetch_record(&self, id: &SlideId) -> Result<SlideRecord>;

    /// Patch one field of a slide.
    ///
    /// The field is a raw column name (see [`crate::record::fields`]);
    /// a write against a column the deployed schema lacks must fail with
    /// a service error whose text identifies the missing column, so
    /// callers can classify it (see
    /// [`ServiceError::is_schema_absence`](crate::error::ServiceError::is_schema_absence)).
    async fn patch_attribute(&self, id: &SlideId, field: &str, value: Value) -> Result<()>;

    /// Resolve a storage path to a publicly fetchable URL.
    ///
    /// Pure URL construction, no network effects. Returns `None` when
    /// the store cannot serve the blob.
    fn resolve_public_url(&self, storage_path: &str) -> Option<String>;
}
