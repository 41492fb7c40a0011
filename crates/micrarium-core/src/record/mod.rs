//! Slide records and filters.
//!
//! A slide carries each taggable dimension in two representations: the
//! current multi-valued field (`categories`, `colors`) and a legacy
//! single-valued field (`category`, `color`) written by older clients.
//! The helpers here reconcile the two on read and keep them mirrored
//! on write, so nothing above this module sees the duality.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::SlideId;

/// Column names used for attribute patches.
pub mod fields {
    /// Multi-valued category field (current schema).
    pub const CATEGORIES: &str = "categories";
    /// Single-valued category field (legacy schema).
    pub const CATEGORY: &str = "category";
    /// Multi-valued color field (current schema).
    pub const COLORS: &str = "colors";
    /// Single-valued color field (legacy schema).
    pub const COLOR: &str = "color";
    /// Free-text notes field.
    pub const NOTES: &str = "notes";
    /// Landing-page feature flag.
    pub const FEATURED: &str = "featured";
}

/// A single uploaded slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideRecord {
    /// Server-assigned identifier.
    pub id: SlideId,

    /// Category labels (current multi-valued field).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,

    /// Category label (legacy single-valued field).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Color labels (current multi-valued field).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,

    /// Color label (legacy single-valued field).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Whether the slide is featured on the landing page.
    #[serde(default)]
    pub featured: bool,

    /// Path of the image blob within the storage bucket.
    pub storage_path: String,

    /// Creation timestamp (server-assigned).
    pub created_at: DateTime<Utc>,
}

impl SlideRecord {
    /// Returns the effective category set.
    ///
    /// The multi-valued field wins when present, even when empty; a
    /// record with no multi-valued field falls back to its legacy
    /// single-valued field. Duplicates are collapsed, keeping first
    /// occurrence order.
    pub fn effective_categories(&self) -> Vec<String> {
        effective_set(self.categories.as_deref(), self.category.as_deref())
    }

    /// Returns the effective color set, with the same precedence rule
    /// as [`effective_categories`](Self::effective_categories).
    pub fn effective_colors(&self) -> Vec<String> {
        effective_set(self.colors.as_deref(), self.color.as_deref())
    }

    /// Mirror a confirmed category write into both representations.
    pub fn apply_categories(&mut self, labels: &[String]) {
        self.categories = Some(labels.to_vec());
        self.category = labels.first().cloned();
    }

    /// Mirror a confirmed color write into both representations.
    pub fn apply_colors(&mut self, labels: &[String]) {
        self.colors = Some(labels.to_vec());
        self.color = labels.first().cloned();
    }

    /// Returns true if this slide matches `filter`.
    ///
    /// Each dimension matches when the label appears in the multi-valued
    /// field or equals the legacy single-valued field, so slides written
    /// before the multi-valued schema existed still turn up.
    pub fn matches(&self, filter: &SlideFilter) -> bool {
        if !has_label(
            self.categories.as_deref(),
            self.category.as_deref(),
            &filter.category,
        ) {
            return false;
        }
        match filter.color {
            Some(ref color) => has_label(self.colors.as_deref(), self.color.as_deref(), color),
            None => true,
        }
    }
}

fn has_label(multi: Option<&[String]>, legacy: Option<&str>, label: &str) -> bool {
    multi.is_some_and(|labels| labels.iter().any(|l| l == label))
        || legacy.is_some_and(|l| l == label)
}

fn effective_set(multi: Option<&[String]>, legacy: Option<&str>) -> Vec<String> {
    let mut labels: Vec<String> = match (multi, legacy) {
        (Some(labels), _) => labels.to_vec(),
        (None, Some(label)) => vec![label.to_string()],
        (None, None) => Vec::new(),
    };
    let mut seen = Vec::with_capacity(labels.len());
    labels.retain(|label| {
        if seen.contains(label) {
            false
        } else {
            seen.push(label.clone());
            true
        }
    });
    labels
}

/// The active query a gallery view is rendering.
///
/// The category is fixed per view; the color is the user-toggleable
/// secondary dimension, with `None` meaning "no restriction."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideFilter {
    /// Required category label.
    pub category: String,
    /// Optional color label.
    pub color: Option<String>,
}

impl SlideFilter {
    /// Create a filter over one category with no color restriction.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            color: None,
        }
    }

    /// Restrict the filter to one color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}
