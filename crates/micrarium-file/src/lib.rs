//! micrarium-file - Filesystem-backed slide store.

mod store;

pub use store::{FileStore, NewSlide};
