//! Browse command implementation.

use anyhow::{Context, Result};
use clap::Args;

use micrarium_core::{DEFAULT_PAGE_SIZE, Gallery, GalleryConfig, GalleryStatus, SlideRecord};

use crate::output;
use crate::store;

#[derive(Args, Debug)]
pub struct BrowseArgs {
    /// Category to browse (e.g. Blebs)
    pub category: String,

    /// Restrict to one color tag
    #[arg(long)]
    pub color: Option<String>,

    /// Records per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u64,

    /// Number of pages to load (0 loads until exhausted)
    #[arg(long, default_value_t = 1)]
    pub pages: u64,

    /// Print records as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Include public media URLs
    #[arg(long)]
    pub urls: bool,
}

pub async fn run(store_override: Option<&str>, args: BrowseArgs) -> Result<()> {
    let connection = store::connect(store_override)?;
    let backend = connection.open()?;

    let config = GalleryConfig::new(&args.category)
        .context("Invalid category")?
        .with_page_size(args.page_size)
        .context("Invalid page size")?;
    let gallery = Gallery::new(backend, config);

    if args.color.is_some() {
        gallery
            .set_color_filter(args.color.as_deref())
            .await
            .context("Failed to load gallery")?;
    } else {
        gallery.refresh().await.context("Failed to load gallery")?;
    }

    let mut loaded_pages = 1;
    while gallery.has_more().await && (args.pages == 0 || loaded_pages < args.pages) {
        gallery
            .load_next_page()
            .await
            .context("Failed to load page")?;
        loaded_pages += 1;
    }

    let snapshot = gallery.snapshot().await;

    if snapshot.status == GalleryStatus::NoResults {
        output::note("No results.");
        return Ok(());
    }

    for record in &snapshot.records {
        if args.json {
            output::json(record)?;
        } else {
            print_record(&gallery, record, args.urls);
            println!();
        }
    }

    output::note(&snapshot.status.to_string());

    Ok(())
}

fn print_record(gallery: &Gallery, record: &SlideRecord, urls: bool) {
    output::field("id", record.id.as_str());
    output::field("categories", &record.effective_categories().join(", "));
    let colors = record.effective_colors();
    if !colors.is_empty() {
        output::field("colors", &colors.join(", "));
    }
    if let Some(ref notes) = record.notes {
        output::field("notes", notes);
    }
    if record.featured {
        output::field("featured", "yes");
    }
    output::field("created", &record.created_at.to_rfc3339());
    if urls && let Some(url) = gallery.resolve_public_url(&record.storage_path) {
        output::field("url", &url);
    }
}
