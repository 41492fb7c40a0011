//! micrarium-core - Core types and gallery logic for the micrarium toolkit.

pub mod error;
pub mod gallery;
pub mod record;
pub mod store;
pub mod types;

pub use error::Error;
pub use gallery::{
    Gallery, GalleryConfig, GallerySnapshot, GalleryStatus, PageLoad, SlideEditor, TagOutcome,
    DEFAULT_PAGE_SIZE,
};
pub use record::{fields, SlideFilter, SlideRecord};
pub use store::SlideStore;
pub use types::{
    SlideId, StoreUrl, Vocabulary, BLEB_COLORS, COLOR_BEARING_CATEGORY, SITE_CATEGORIES,
};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
