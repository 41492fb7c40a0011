//! Fixed label vocabularies.

use crate::error::{Error, InvalidInputError};

/// A fixed, closed set of labels for one attribute dimension.
///
/// The site's taxonomy is deliberately small and curated; labels outside
/// the vocabulary are rejected at the edge rather than stored.
///
/// # Example
///
/// ```
/// use micrarium_core::SITE_CATEGORIES;
///
/// assert!(SITE_CATEGORIES.contains("Blebs"));
/// assert!(SITE_CATEGORIES.ensure("Sparkles").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vocabulary {
    name: &'static str,
    labels: &'static [&'static str],
}

/// The category labels recognized by the site.
pub const SITE_CATEGORIES: Vocabulary = Vocabulary {
    name: "category",
    labels: &["Blebs", "Fibers", "Crystals", "Hexagons", "Ribbons", "Specks"],
};

/// The color labels recognized for color-bearing slides.
pub const BLEB_COLORS: Vocabulary = Vocabulary {
    name: "color",
    labels: &["Clear", "Yellow", "Orange", "Red", "Brown"],
};

/// The one category whose slides carry color labels.
pub const COLOR_BEARING_CATEGORY: &str = "Blebs";

impl Vocabulary {
    /// Returns the dimension name ("category" or "color").
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns all labels in display order.
    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    /// Returns true if `label` belongs to this vocabulary.
    ///
    /// Matching is exact: vocabulary labels are capitalized and stored
    /// verbatim, so case is significant.
    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(&label)
    }

    /// Validate that `label` belongs to this vocabulary.
    ///
    /// # Errors
    ///
    /// Returns an error naming the dimension if the label is unknown.
    pub fn ensure(&self, label: &str) -> Result<(), Error> {
        if self.contains(label) {
            return Ok(());
        }
        Err(InvalidInputError::Label {
            vocabulary: self.name,
            value: label.to_string(),
            reason: format!("expected one of: {}", self.labels.join(", ")),
        }
        .into())
    }

    /// Validate every label in a set.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn ensure_all<I, S>(&self, labels: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for label in labels {
            self.ensure(label.as_ref())?;
        }
        Ok(())
    }
}
