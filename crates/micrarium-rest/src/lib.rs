//! micrarium-rest - Hosted REST slide store.
//!
//! Speaks the PostgREST conventions of the hosted backend: table rows
//! under `/rest/v1/<table>`, exact counts via the `content-range`
//! header, and public media under `/storage/v1/object/public`.

mod client;
mod store;

pub use client::{RestAuth, RestClient};
pub use store::RestStore;
