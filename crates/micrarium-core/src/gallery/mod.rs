//! Filtered, paginated slide gallery.
//!
//! The gallery presents an append-only, filtered, paginated view over
//! the slides of one category. Pages accumulate as the viewer scrolls;
//! changing the color filter discards everything and starts over at
//! page zero. Responses are correlated to the filter that was active
//! when the request was issued, so a response that arrives after the
//! filter has moved on is dropped instead of merged.

use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::error::InvalidInputError;
use crate::record::{SlideFilter, SlideRecord};
use crate::store::SlideStore;
use crate::types::{SlideId, BLEB_COLORS, SITE_CATEGORIES};
use crate::Result;

mod editor;

pub use editor::{SlideEditor, TagOutcome};

#[cfg(test)]
mod tests;

/// Default number of slides per page, matching the site's gallery grid.
pub const DEFAULT_PAGE_SIZE: u64 = 12;

/// Gallery configuration, fixed at construction.
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    category: String,
    page_size: u64,
}

impl GalleryConfig {
    /// Create a configuration for one category view.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is not in the site vocabulary.
    pub fn new(category: impl Into<String>) -> Result<Self> {
        let category = category.into();
        SITE_CATEGORIES.ensure(&category)?;
        Ok(Self {
            category,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Override the page size.
    ///
    /// # Errors
    ///
    /// Returns an error if `page_size` is zero.
    pub fn with_page_size(mut self, page_size: u64) -> Result<Self> {
        if page_size == 0 {
            return Err(InvalidInputError::Other {
                message: "page size must be at least 1".to_string(),
            }
            .into());
        }
        self.page_size = page_size;
        Ok(self)
    }

    /// Returns the category this view renders.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Returns the page size.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }
}

/// User-visible gallery status.
///
/// The empty-looking states are deliberately distinct: a gallery that
/// failed to load and a gallery with no matching slides both render no
/// records, but callers must be able to tell them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryStatus {
    /// Nothing fetched yet.
    Idle,
    /// A page fetch is in flight.
    Loading,
    /// At least one page resolved and slides are shown.
    Loaded {
        /// Number of slides currently loaded.
        shown: usize,
        /// Total matching slides, once the count has resolved.
        total: Option<u64>,
    },
    /// A fetch resolved and nothing matched the filter.
    NoResults,
    /// The last fetch failed.
    Failed(String),
}

impl fmt::Display for GalleryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GalleryStatus::Idle => write!(f, "idle"),
            GalleryStatus::Loading => write!(f, "loading"),
            GalleryStatus::Loaded {
                shown,
                total: Some(total),
            } => write!(f, "showing {} of {}", shown, total),
            GalleryStatus::Loaded { shown, total: None } => write!(f, "showing {}", shown),
            GalleryStatus::NoResults => write!(f, "no results"),
            GalleryStatus::Failed(message) => write!(f, "failed to load: {}", message),
        }
    }
}

/// Outcome of a single page or filter operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLoad {
    /// Records were fetched and appended to the loaded sequence.
    Fetched {
        /// Number of records appended.
        added: usize,
        /// Whether another page may be available.
        more: bool,
    },
    /// Nothing was done: a fetch was already in flight, or the sequence
    /// is complete.
    Skipped,
    /// The response belonged to a superseded filter and was dropped.
    Discarded,
}

/// Point-in-time view of everything the presentation layer renders.
#[derive(Debug, Clone)]
pub struct GallerySnapshot {
    /// Records loaded so far for the active filter, newest first.
    pub records: Vec<SlideRecord>,
    /// Active color filter, if any.
    pub color: Option<String>,
    /// Total matching slides, once the count has resolved.
    pub total: Option<u64>,
    /// Whether a page fetch is in flight.
    pub loading: bool,
    /// Whether another page may be available.
    pub more: bool,
    /// User-visible status derived from the rest of the snapshot.
    pub status: GalleryStatus,
}

struct GalleryState {
    color: Option<String>,
    page: u64,
    more: bool,
    loaded: Vec<SlideRecord>,
    total: Option<u64>,
    in_flight: bool,
    error: Option<String>,
    generation: u64,
    fetched: bool,
}

impl GalleryState {
    fn new() -> Self {
        Self {
            color: None,
            page: 0,
            more: true,
            loaded: Vec::new(),
            total: None,
            in_flight: false,
            error: None,
            generation: 0,
            fetched: false,
        }
    }

    /// Reset pagination for a new filter generation. The color filter
    /// itself is left untouched; callers change it separately.
    fn reset(&mut self) {
        self.page = 0;
        self.more = true;
        self.loaded.clear();
        self.total = None;
        self.in_flight = false;
        self.error = None;
        self.generation += 1;
        self.fetched = false;
    }

    fn status(&self) -> GalleryStatus {
        if self.in_flight {
            return GalleryStatus::Loading;
        }
        if let Some(ref message) = self.error {
            return GalleryStatus::Failed(message.clone());
        }
        if !self.fetched {
            return GalleryStatus::Idle;
        }
        if self.loaded.is_empty() {
            return GalleryStatus::NoResults;
        }
        GalleryStatus::Loaded {
            shown: self.loaded.len(),
            total: self.total,
        }
    }
}

/// A filtered, paginated view over one category's slides.
///
/// # Thread Safety
///
/// Galleries are cheap to clone (they use internal `Arc`) and are safe
/// to share across tasks. At most one page fetch runs at a time per
/// gallery; redundant calls are skipped rather than queued.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use micrarium_core::{Gallery, GalleryConfig, SlideStore};
///
/// # async fn example(store: Arc<dyn SlideStore>) -> Result<(), micrarium_core::Error> {
/// let config = GalleryConfig::new("Blebs")?;
/// let gallery = Gallery::new(store, config);
///
/// gallery.refresh().await?;
/// while gallery.has_more().await {
///     gallery.load_next_page().await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Gallery {
    inner: Arc<GalleryInner>,
}

struct GalleryInner {
    store: Arc<dyn SlideStore>,
    config: GalleryConfig,
    editor: SlideEditor,
    state: RwLock<GalleryState>,
}

impl Gallery {
    /// Create a gallery over `store` for the configured category.
    ///
    /// The store is injected rather than reached for ambiently, so the
    /// same gallery drives hosted stores, local archives, and test
    /// fakes.
    pub fn new(store: Arc<dyn SlideStore>, config: GalleryConfig) -> Self {
        let editor = SlideEditor::new(Arc::clone(&store));
        Self {
            inner: Arc::new(GalleryInner {
                store,
                config,
                editor,
                state: RwLock::new(GalleryState::new()),
            }),
        }
    }

    /// Returns the gallery configuration.
    pub fn config(&self) -> &GalleryConfig {
        &self.inner.config
    }

    /// Returns the slide editor backing this gallery.
    pub fn editor(&self) -> &SlideEditor {
        &self.inner.editor
    }

    /// Replace the color filter and reload from page zero.
    ///
    /// All previously loaded slides are discarded before the first page
    /// of the new filter is fetched. A page fetch still in flight for
    /// the old filter cannot repopulate the sequence afterwards; its
    /// response is dropped on arrival.
    ///
    /// The count and the first page are fetched concurrently. The page
    /// result decides the return value; a count failure only leaves the
    /// total unresolved.
    ///
    /// # Errors
    ///
    /// Returns an error if the color is not in the vocabulary, or if
    /// the first page fetch fails.
    #[instrument(skip(self), fields(category = %self.inner.config.category))]
    pub async fn set_color_filter(&self, color: Option<&str>) -> Result<PageLoad> {
        if let Some(label) = color {
            BLEB_COLORS.ensure(label)?;
        }
        debug!(color = ?color, "Applying color filter");

        let generation = {
            let mut state = self.inner.state.write().await;
            state.reset();
            state.color = color.map(str::to_owned);
            state.generation
        };

        self.load_initial(generation).await
    }

    /// Discard everything and reload the current filter from page zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the first page fetch fails.
    #[instrument(skip(self), fields(category = %self.inner.config.category))]
    pub async fn refresh(&self) -> Result<PageLoad> {
        debug!("Reloading gallery");

        let generation = {
            let mut state = self.inner.state.write().await;
            state.reset();
            state.generation
        };

        self.load_initial(generation).await
    }

    /// Fetch the next page and append it to the loaded sequence.
    ///
    /// Skipped (not queued) when a fetch is already in flight or the
    /// sequence is complete, so repeated invocations after the last
    /// page are no-ops.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails. The loaded sequence is left
    /// unchanged and further pagination stops until the filter is
    /// reloaded.
    #[instrument(skip(self), fields(category = %self.inner.config.category))]
    pub async fn load_next_page(&self) -> Result<PageLoad> {
        let generation = self.inner.state.read().await.generation;
        self.fetch_next_page(generation).await
    }

    /// Re-issue the count query for the current filter.
    ///
    /// Independent of pagination; rendering "N slides" must not wait
    /// for all pages. Returns `Ok(None)` when the filter changed while
    /// the count was in flight and the result was dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the count query fails.
    #[instrument(skip(self), fields(category = %self.inner.config.category))]
    pub async fn refresh_count(&self) -> Result<Option<u64>> {
        let generation = self.inner.state.read().await.generation;
        self.fetch_count(generation).await
    }

    /// Returns a snapshot of the loaded slides, oldest page first.
    pub async fn records(&self) -> Vec<SlideRecord> {
        self.inner.state.read().await.loaded.clone()
    }

    /// Returns the total matching slides, if the count has resolved.
    pub async fn count(&self) -> Option<u64> {
        self.inner.state.read().await.total
    }

    /// Returns true if another page may be available.
    pub async fn has_more(&self) -> bool {
        self.inner.state.read().await.more
    }

    /// Returns the active color filter.
    pub async fn color_filter(&self) -> Option<String> {
        self.inner.state.read().await.color.clone()
    }

    /// Returns the current user-visible status.
    pub async fn status(&self) -> GalleryStatus {
        self.inner.state.read().await.status()
    }

    /// Returns a point-in-time snapshot of the gallery for rendering.
    pub async fn snapshot(&self) -> GallerySnapshot {
        let state = self.inner.state.read().await;
        GallerySnapshot {
            records: state.loaded.clone(),
            color: state.color.clone(),
            total: state.total,
            loading: state.in_flight,
            more: state.more,
            status: state.status(),
        }
    }

    /// Replace the full category set of one slide.
    ///
    /// Delegates to the [`SlideEditor`] and refreshes the loaded copy
    /// of the slide once the write is confirmed.
    ///
    /// # Errors
    ///
    /// Returns an error on validation failure or a fatal write failure.
    pub async fn set_categories(&self, id: &SlideId, labels: &[String]) -> Result<TagOutcome> {
        let outcome = self.inner.editor.set_categories(id, labels).await?;
        self.replace_loaded(&outcome.record).await;
        Ok(outcome)
    }

    /// Replace the full color set of one slide.
    ///
    /// # Errors
    ///
    /// Returns an error on validation failure or a fatal write failure.
    pub async fn set_colors(&self, id: &SlideId, labels: &[String]) -> Result<SlideRecord> {
        let record = self.inner.editor.set_colors(id, labels).await?;
        self.replace_loaded(&record).await;
        Ok(record)
    }

    /// Resolve a slide's storage path to a publicly fetchable URL.
    pub fn resolve_public_url(&self, storage_path: &str) -> Option<String> {
        self.inner.store.resolve_public_url(storage_path)
    }

    fn filter_at(&self, state: &GalleryState) -> SlideFilter {
        SlideFilter {
            category: self.inner.config.category.clone(),
            color: state.color.clone(),
        }
    }

    async fn load_initial(&self, generation: u64) -> Result<PageLoad> {
        // The page result decides the outcome; a count failure is
        // logged by fetch_count and leaves the total unresolved.
        let (_count, page) = tokio::join!(
            self.fetch_count(generation),
            self.fetch_next_page(generation),
        );
        page
    }

    async fn fetch_next_page(&self, generation: u64) -> Result<PageLoad> {
        let (filter, offset, limit) = {
            let mut state = self.inner.state.write().await;
            if state.generation != generation {
                return Ok(PageLoad::Discarded);
            }
            if state.in_flight || !state.more {
                return Ok(PageLoad::Skipped);
            }
            // An error implies more=false, so error is always clear here.
            state.in_flight = true;
            let limit = self.inner.config.page_size;
            (self.filter_at(&state), state.page * limit, limit)
        };

        let result = self.inner.store.fetch_page(&filter, offset, limit).await;

        let mut state = self.inner.state.write().await;
        if state.generation != generation {
            // A newer filter superseded this request while it was in
            // flight. Its in-flight flag died with the old generation.
            debug!("Dropping stale page response");
            return Ok(PageLoad::Discarded);
        }
        state.in_flight = false;
        match result {
            Ok(records) => {
                let added = records.len();
                let more = added as u64 >= limit;
                if added > 0 {
                    state.loaded.extend(records);
                    state.page += 1;
                }
                state.more = more;
                state.fetched = true;
                debug!(added, more, "Page loaded");
                Ok(PageLoad::Fetched { added, more })
            }
            Err(err) => {
                state.more = false;
                state.error = Some(err.to_string());
                warn!(error = %err, "Page fetch failed");
                Err(err)
            }
        }
    }

    async fn fetch_count(&self, generation: u64) -> Result<Option<u64>> {
        let filter = {
            let state = self.inner.state.read().await;
            if state.generation != generation {
                return Ok(None);
            }
            self.filter_at(&state)
        };

        match self.inner.store.count(&filter).await {
            Ok(total) => {
                let mut state = self.inner.state.write().await;
                if state.generation != generation {
                    debug!("Dropping stale count response");
                    return Ok(None);
                }
                state.total = Some(total);
                Ok(Some(total))
            }
            Err(err) => {
                // The count is advisory and races the page fetch, so a
                // failure here never stops pagination; the total simply
                // stays unresolved.
                warn!(error = %err, "Count query failed");
                Err(err)
            }
        }
    }

    async fn replace_loaded(&self, record: &SlideRecord) {
        let mut state = self.inner.state.write().await;
        if let Some(slot) = state.loaded.iter_mut().find(|r| r.id == record.id) {
            *slot = record.clone();
        }
    }
}

impl fmt::Debug for Gallery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gallery")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
