//! Tag command implementation.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use micrarium_core::{COLOR_BEARING_CATEGORY, SlideEditor, SlideId};

use crate::output;
use crate::store;

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// Replace a slide's full category set
    Categories(CategoriesArgs),

    /// Replace a slide's full color set (no values clears it)
    Colors(ColorsArgs),
}

#[derive(Args, Debug)]
pub struct CategoriesArgs {
    /// Slide id
    pub id: String,

    /// The complete desired category set
    pub labels: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ColorsArgs {
    /// Slide id
    pub id: String,

    /// The complete desired color set
    pub values: Vec<String>,
}

pub async fn run(store_override: Option<&str>, command: TagCommand) -> Result<()> {
    let connection = store::connect(store_override)?;
    let editor = SlideEditor::new(connection.open()?);

    match command {
        TagCommand::Categories(args) => {
            let id = SlideId::new(&args.id).context("Invalid slide id")?;
            let outcome = editor
                .set_categories(&id, &args.labels)
                .await
                .context("Failed to save categories")?;

            let categories = outcome.record.effective_categories();
            if categories.is_empty() {
                output::success("Cleared categories");
            } else {
                output::success(&format!("Saved categories: {}", categories.join(", ")));
            }

            if outcome.prompt_colors {
                output::note(&format!(
                    "Hint: {} slides carry a color tag; set one with 'micrarium tag colors'.",
                    COLOR_BEARING_CATEGORY
                ));
            }
        }
        TagCommand::Colors(args) => {
            let id = SlideId::new(&args.id).context("Invalid slide id")?;
            let record = editor
                .set_colors(&id, &args.values)
                .await
                .context("Failed to save colors")?;

            let colors = record.effective_colors();
            if colors.is_empty() {
                output::success("Cleared colors");
            } else {
                output::success(&format!("Saved colors: {}", colors.join(", ")));
            }
        }
    }

    Ok(())
}
