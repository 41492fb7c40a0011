//! Config command implementation.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use micrarium_core::StoreUrl;

use crate::output;
use crate::store::profile;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Save connection settings
    Set(SetArgs),

    /// Print the saved configuration
    Show,

    /// Delete the saved configuration
    Clear,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Slide store URL (file:// or https://)
    #[arg(long)]
    pub store: Option<String>,

    /// Service API key
    #[arg(long)]
    pub api_key: Option<String>,

    /// Bearer access token for members-only slides
    #[arg(long)]
    pub access_token: Option<String>,

    /// Storage bucket serving slide media
    #[arg(long)]
    pub bucket: Option<String>,
}

pub fn run(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Set(args) => set(args),
        ConfigCommand::Show => show(),
        ConfigCommand::Clear => {
            profile::clear()?;
            output::success("Cleared configuration");
            Ok(())
        }
    }
}

fn set(args: SetArgs) -> Result<()> {
    let mut profile = profile::load()?.unwrap_or_default();

    if let Some(store) = args.store {
        StoreUrl::new(&store).context("Invalid store URL")?;
        profile.store = Some(store);
    }
    if let Some(api_key) = args.api_key {
        profile.api_key = Some(api_key);
    }
    if let Some(token) = args.access_token {
        profile.access_token = Some(token);
    }
    if let Some(bucket) = args.bucket {
        profile.bucket = Some(bucket);
    }

    profile::save(&profile)?;
    output::success("Saved configuration");

    Ok(())
}

fn show() -> Result<()> {
    let Some(profile) = profile::load()? else {
        output::note("No configuration saved.");
        return Ok(());
    };

    output::field("store", profile.store.as_deref().unwrap_or("(unset)"));
    output::field("api key", set_or_unset(profile.api_key.is_some()));
    output::field("access token", set_or_unset(profile.access_token.is_some()));
    output::field("bucket", profile.bucket.as_deref().unwrap_or("slides"));

    Ok(())
}

fn set_or_unset(set: bool) -> &'static str {
    if set { "(set)" } else { "(unset)" }
}
