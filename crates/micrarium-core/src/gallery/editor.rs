//! Slide attribute editing.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::Error;
use crate::record::{fields, SlideRecord};
use crate::store::SlideStore;
use crate::types::{SlideId, BLEB_COLORS, COLOR_BEARING_CATEGORY, SITE_CATEGORIES};
use crate::Result;

/// Outcome of a category edit.
#[derive(Debug, Clone)]
pub struct TagOutcome {
    /// The slide as read back after the confirmed write.
    pub record: SlideRecord,
    /// True when the edit added a color-bearing category to a slide
    /// that has no colors yet. Advisory only: the write has already
    /// happened, but the caller should prompt for colors next.
    pub prompt_colors: bool,
}

/// Editor for a slide's taggable attributes.
///
/// Every taggable dimension is written twice, to the current
/// multi-valued column and to the legacy single-valued column, so
/// readers of either schema generation stay consistent. A write that
/// fails only because its column is absent from the deployed schema is
/// tolerated; any other write failure is fatal and nothing is mutated
/// locally.
#[derive(Clone)]
pub struct SlideEditor {
    store: Arc<dyn SlideStore>,
}

impl SlideEditor {
    /// Create an editor over `store`.
    pub fn new(store: Arc<dyn SlideStore>) -> Self {
        Self { store }
    }

    /// Replace the full category set of one slide.
    ///
    /// `labels` is the desired set, not a delta; duplicates collapse to
    /// their first occurrence. The legacy column receives the first
    /// label, or null when the set is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a label is outside the category vocabulary,
    /// the slide does not exist, or a write fails for any reason other
    /// than schema absence.
    #[instrument(skip(self, labels), fields(%id))]
    pub async fn set_categories(&self, id: &SlideId, labels: &[String]) -> Result<TagOutcome> {
        SITE_CATEGORIES.ensure_all(labels)?;
        let labels = dedup_labels(labels);
        let mut record = self.store.fetch_record(id).await?;

        let had_color_bearing = record
            .effective_categories()
            .iter()
            .any(|label| label == COLOR_BEARING_CATEGORY);

        debug!(?labels, "Writing category set");
        self.write_dual(id, fields::CATEGORIES, fields::CATEGORY, &labels)
            .await?;
        record.apply_categories(&labels);

        let gained_color_bearing = !had_color_bearing
            && labels.iter().any(|label| label == COLOR_BEARING_CATEGORY);
        let prompt_colors = gained_color_bearing && record.effective_colors().is_empty();

        Ok(TagOutcome {
            record,
            prompt_colors,
        })
    }

    /// Replace the full color set of one slide.
    ///
    /// An empty set clears all colors. Same set and dual-write
    /// discipline as [`set_categories`](Self::set_categories).
    ///
    /// # Errors
    ///
    /// Returns an error if a label is outside the color vocabulary,
    /// the slide does not exist, or a write fails for any reason other
    /// than schema absence.
    #[instrument(skip(self, labels), fields(%id))]
    pub async fn set_colors(&self, id: &SlideId, labels: &[String]) -> Result<SlideRecord> {
        BLEB_COLORS.ensure_all(labels)?;
        let labels = dedup_labels(labels);
        let mut record = self.store.fetch_record(id).await?;

        debug!(?labels, "Writing color set");
        self.write_dual(id, fields::COLORS, fields::COLOR, &labels)
            .await?;
        record.apply_colors(&labels);

        Ok(record)
    }

    /// Replace the free-text notes of one slide.
    ///
    /// # Errors
    ///
    /// Returns an error if the slide does not exist or the write fails.
    #[instrument(skip(self, notes), fields(%id))]
    pub async fn set_notes(&self, id: &SlideId, notes: Option<&str>) -> Result<SlideRecord> {
        let mut record = self.store.fetch_record(id).await?;

        let value = notes.map_or(Value::Null, |n| Value::from(n.to_owned()));
        self.store.patch_attribute(id, fields::NOTES, value).await?;
        record.notes = notes.map(str::to_owned);

        Ok(record)
    }

    /// Set or clear the landing-page feature flag of one slide.
    ///
    /// # Errors
    ///
    /// Returns an error if the slide does not exist or the write fails.
    #[instrument(skip(self), fields(%id))]
    pub async fn set_featured(&self, id: &SlideId, featured: bool) -> Result<SlideRecord> {
        let mut record = self.store.fetch_record(id).await?;

        self.store
            .patch_attribute(id, fields::FEATURED, Value::from(featured))
            .await?;
        record.featured = featured;

        Ok(record)
    }

    /// Fetch one slide without editing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the slide does not exist.
    pub async fn fetch(&self, id: &SlideId) -> Result<SlideRecord> {
        self.store.fetch_record(id).await
    }

    /// Write one label set to both of its columns.
    ///
    /// Both writes are always attempted, even when the first fails;
    /// the first fatal failure (multi-valued column first) decides the
    /// result.
    async fn write_dual(
        &self,
        id: &SlideId,
        multi_field: &str,
        legacy_field: &str,
        labels: &[String],
    ) -> Result<()> {
        let multi_write = self
            .store
            .patch_attribute(id, multi_field, Value::from(labels.to_vec()))
            .await;

        let legacy_value = labels
            .first()
            .map_or(Value::Null, |label| Value::from(label.clone()));
        let legacy_write = self
            .store
            .patch_attribute(id, legacy_field, legacy_value)
            .await;

        swallow_schema_absence(multi_field, multi_write)?;
        swallow_schema_absence(legacy_field, legacy_write)?;
        Ok(())
    }
}

/// Collapse duplicate labels, keeping the first occurrence of each.
fn dedup_labels(labels: &[String]) -> Vec<String> {
    let mut set: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        if !set.contains(label) {
            set.push(label.clone());
        }
    }
    set
}

/// Treat a schema-absence failure as a skipped write.
///
/// One of the two columns may be missing on deployments that predate or
/// postdate the schema migration; the dual-write strategy tolerates
/// exactly that case and nothing else.
fn swallow_schema_absence(field: &str, result: Result<()>) -> Result<()> {
    match result {
        Err(Error::Service(err)) if err.is_schema_absence() => {
            debug!(field, error = %err, "Column absent from schema; write skipped");
            Ok(())
        }
        other => other,
    }
}
