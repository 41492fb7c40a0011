//! Notes command implementation.

use anyhow::{Context, Result};
use clap::Args;

use micrarium_core::{SlideEditor, SlideId};

use crate::output;
use crate::store;

#[derive(Args, Debug)]
pub struct NotesArgs {
    /// Slide id
    pub id: String,

    /// New notes text
    pub text: Option<String>,

    /// Clear the notes instead
    #[arg(long, conflicts_with = "text")]
    pub clear: bool,
}

pub async fn run(store_override: Option<&str>, args: NotesArgs) -> Result<()> {
    let id = SlideId::new(&args.id).context("Invalid slide id")?;

    let notes = if args.clear {
        None
    } else {
        Some(
            args.text
                .as_deref()
                .context("Provide the new notes text, or pass --clear")?,
        )
    };

    let connection = store::connect(store_override)?;
    let editor = SlideEditor::new(connection.open()?);

    editor
        .set_notes(&id, notes)
        .await
        .context("Failed to save notes")?;

    match notes {
        Some(_) => output::success("Saved notes"),
        None => output::success("Cleared notes"),
    }

    Ok(())
}
