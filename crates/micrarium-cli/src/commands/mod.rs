//! Command implementations.

mod browse;
mod config;
mod count;
mod feature;
mod import;
mod notes;
mod show;
mod tag;
mod vocab;

use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Browse a category's slides page by page
    Browse(browse::BrowseArgs),

    /// Count slides matching a filter
    Count(count::CountArgs),

    /// Show a single slide
    Show(show::ShowArgs),

    /// Replace a slide's category or color set
    #[command(subcommand)]
    Tag(tag::TagCommand),

    /// Edit a slide's free-text notes
    Notes(notes::NotesArgs),

    /// Feature a slide on the landing page
    Feature(feature::FeatureArgs),

    /// Add an image to a local archive
    Import(import::ImportArgs),

    /// Print the site vocabularies
    Vocab(vocab::VocabArgs),

    /// Manage the saved CLI configuration
    #[command(subcommand)]
    Config(config::ConfigCommand),
}

pub async fn handle(store_override: Option<&str>, command: Commands) -> Result<()> {
    match command {
        Commands::Browse(args) => browse::run(store_override, args).await,
        Commands::Count(args) => count::run(store_override, args).await,
        Commands::Show(args) => show::run(store_override, args).await,
        Commands::Tag(cmd) => tag::run(store_override, cmd).await,
        Commands::Notes(args) => notes::run(store_override, args).await,
        Commands::Feature(args) => feature::run(store_override, args).await,
        Commands::Import(args) => import::run(store_override, args).await,
        Commands::Vocab(args) => vocab::run(args),
        Commands::Config(cmd) => config::run(cmd),
    }
}
