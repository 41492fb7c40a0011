//! Import command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::Args;

use micrarium_file::{FileStore, NewSlide};

use crate::output;
use crate::store;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Image file to add to the archive
    pub image: PathBuf,

    /// Category label (repeatable)
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Color tag (repeatable)
    #[arg(long = "color")]
    pub colors: Vec<String>,

    /// Free-text notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Override the creation timestamp (RFC 3339)
    #[arg(long)]
    pub created_at: Option<String>,
}

pub async fn run(store_override: Option<&str>, args: ImportArgs) -> Result<()> {
    let connection = store::connect(store_override)?;

    if !connection.store.is_local() {
        bail!("Import writes to a local archive; uploads to the hosted service go through the site");
    }

    let created_at = match args.created_at {
        Some(ref raw) => Some(
            DateTime::parse_from_rfc3339(raw)
                .context("Invalid --created-at timestamp")?
                .with_timezone(&Utc),
        ),
        None => None,
    };

    let archive = FileStore::from_url(&connection.store).context("Invalid archive URL")?;

    let record = archive
        .insert(NewSlide {
            media: args.image,
            categories: args.categories,
            colors: args.colors,
            notes: args.notes,
            created_at,
        })
        .await
        .context("Failed to import slide")?;

    println!("{}", record.id);
    output::success(&format!("Imported {}", record.storage_path));

    Ok(())
}
