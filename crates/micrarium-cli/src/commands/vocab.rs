//! Vocab command implementation.

use anyhow::Result;
use clap::Args;

use micrarium_core::{BLEB_COLORS, SITE_CATEGORIES};

use crate::output;

#[derive(Args, Debug)]
pub struct VocabArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: VocabArgs) -> Result<()> {
    if args.json {
        let mut map = serde_json::Map::new();
        map.insert(
            SITE_CATEGORIES.name().to_string(),
            serde_json::json!(SITE_CATEGORIES.labels()),
        );
        map.insert(
            BLEB_COLORS.name().to_string(),
            serde_json::json!(BLEB_COLORS.labels()),
        );
        return output::json(&map);
    }

    output::field(
        SITE_CATEGORIES.name(),
        &SITE_CATEGORIES.labels().join(", "),
    );
    output::field(BLEB_COLORS.name(), &BLEB_COLORS.labels().join(", "));

    Ok(())
}
