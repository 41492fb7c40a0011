//! Core micrarium types.
//!
//! These types enforce archive invariants at construction time,
//! ensuring invalid states are unrepresentable.

mod slide_id;
mod store_url;
mod vocabulary;

pub use slide_id::SlideId;
pub use store_url::StoreUrl;
pub use vocabulary::{Vocabulary, BLEB_COLORS, COLOR_BEARING_CATEGORY, SITE_CATEGORIES};
