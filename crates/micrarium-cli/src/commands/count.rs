//! Count command implementation.

use anyhow::{Context, Result};
use clap::Args;

use micrarium_core::{BLEB_COLORS, SITE_CATEGORIES, SlideFilter, SlideStore as _};

use crate::store;

#[derive(Args, Debug)]
pub struct CountArgs {
    /// Category to count (e.g. Blebs)
    pub category: String,

    /// Restrict to one color tag
    #[arg(long)]
    pub color: Option<String>,
}

pub async fn run(store_override: Option<&str>, args: CountArgs) -> Result<()> {
    SITE_CATEGORIES
        .ensure(&args.category)
        .context("Invalid category")?;

    let mut filter = SlideFilter::new(&args.category);
    if let Some(ref color) = args.color {
        BLEB_COLORS.ensure(color).context("Invalid color")?;
        filter = filter.with_color(color);
    }

    let connection = store::connect(store_override)?;
    let backend = connection.open()?;

    let total = backend
        .count(&filter)
        .await
        .context("Failed to count slides")?;

    println!("{}", total);

    Ok(())
}
