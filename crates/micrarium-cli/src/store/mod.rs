//! Store selection and construction.

pub mod profile;

use std::sync::Arc;

use anyhow::{Context, Result};

use micrarium_core::{SlideStore, StoreUrl};
use micrarium_file::FileStore;
use micrarium_rest::{RestAuth, RestStore};

use profile::Profile;

/// Resolved connection settings for one invocation.
#[derive(Debug)]
pub struct Connection {
    pub store: StoreUrl,
    profile: Profile,
}

/// Resolve the store URL for this invocation: the `--store` flag wins,
/// then the `MICRARIUM_STORE` environment variable, then the saved
/// configuration.
pub fn connect(store_override: Option<&str>) -> Result<Connection> {
    let profile = profile::load()?.unwrap_or_default();

    let url = store_override
        .map(str::to_string)
        .or_else(|| std::env::var("MICRARIUM_STORE").ok())
        .or_else(|| profile.store.clone())
        .context("No store configured. Run 'micrarium config set --store <URL>' first.")?;

    let store = StoreUrl::new(&url).context("Invalid store URL")?;

    Ok(Connection { store, profile })
}

impl Connection {
    /// Open the backend the store URL points at.
    pub fn open(&self) -> Result<Arc<dyn SlideStore>> {
        if self.store.is_local() {
            let archive = FileStore::from_url(&self.store).context("Invalid archive URL")?;
            return Ok(Arc::new(archive));
        }

        let api_key = std::env::var("MICRARIUM_API_KEY")
            .ok()
            .or_else(|| self.profile.api_key.clone())
            .context("No API key configured. Run 'micrarium config set --api-key <KEY>' first.")?;

        let auth = match self.profile.access_token.clone() {
            Some(token) => RestAuth::bearer(api_key, token),
            None => RestAuth::anonymous(api_key),
        };

        let mut rest = RestStore::new(self.store.clone(), auth);
        if let Some(ref bucket) = self.profile.bucket {
            rest = rest.with_bucket(bucket);
        }

        Ok(Arc::new(rest))
    }
}
