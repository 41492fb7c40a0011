//! Show command implementation.

use anyhow::{Context, Result};
use clap::Args;

use micrarium_core::{SlideId, SlideStore as _};

use crate::output;
use crate::store;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Slide id
    pub id: String,

    /// Print the raw record as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(store_override: Option<&str>, args: ShowArgs) -> Result<()> {
    let id = SlideId::new(&args.id).context("Invalid slide id")?;

    let connection = store::connect(store_override)?;
    let backend = connection.open()?;

    let record = backend
        .fetch_record(&id)
        .await
        .context("Failed to fetch slide")?;

    if args.json {
        return output::json_pretty(&record);
    }

    output::field("id", record.id.as_str());
    output::field("categories", &record.effective_categories().join(", "));
    output::field("colors", &record.effective_colors().join(", "));
    output::field("notes", record.notes.as_deref().unwrap_or(""));
    output::field("featured", if record.featured { "yes" } else { "no" });
    output::field("created", &record.created_at.to_rfc3339());
    if let Some(url) = backend.resolve_public_url(&record.storage_path) {
        output::field("url", &url);
    }

    Ok(())
}
