//! Feature command implementation.

use anyhow::{Context, Result};
use clap::Args;

use micrarium_core::{SlideEditor, SlideId};

use crate::output;
use crate::store;

#[derive(Args, Debug)]
pub struct FeatureArgs {
    /// Slide id
    pub id: String,

    /// Remove the slide from the landing page instead
    #[arg(long)]
    pub off: bool,
}

pub async fn run(store_override: Option<&str>, args: FeatureArgs) -> Result<()> {
    let id = SlideId::new(&args.id).context("Invalid slide id")?;

    let connection = store::connect(store_override)?;
    let editor = SlideEditor::new(connection.open()?);

    editor
        .set_featured(&id, !args.off)
        .await
        .context("Failed to update the feature flag")?;

    if args.off {
        output::success("Removed from the landing page");
    } else {
        output::success("Featured on the landing page");
    }

    Ok(())
}
