//! wikilisten CLI - find the audio files wiki pages embed
//!
//! This is the main entry point for the wikilisten command-line interface.
//! Command implementations live in [`commands`].

use anyhow::Result;
use clap::Parser;
use wikilisten_core::{AssetResolver, TemplateQuery};

mod cli;
mod commands;
mod output;
mod utils;

use cli::{Cli, Commands};
use commands::Session;
use output::Printer;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    utils::logging::initialize_logging(&cli)?;

    execute_command(cli).await
}

async fn execute_command(cli: Cli) -> Result<()> {
    let mut printer = Printer::stdout(cli.output_format());

    match cli.command {
        Commands::Discover {
            limit,
            follow_links,
        } => {
            let session = Session::new(commands::load_config(cli.config.as_deref())?)?;
            commands::discover(&session, limit, follow_links, &mut printer).await?;
        },

        Commands::Links { title } => {
            let session = Session::new(commands::load_config(cli.config.as_deref())?)?;
            commands::links(&session, &title, &mut printer).await?;
        },

        Commands::Listens { title } => {
            let session = Session::new(commands::load_config(cli.config.as_deref())?)?;
            commands::listens(&session, &title, &mut printer).await?;
        },

        Commands::Resolve { filenames } => {
            let config = commands::load_config(cli.config.as_deref())?;
            let resolver = AssetResolver::new(config.assets.base_url);
            commands::resolve(&resolver, &filenames, &mut printer)?;
        },

        Commands::Seek { index, title } => {
            commands::seek(&index, &title, &mut printer)?;
        },

        Commands::DumpListens {
            dump,
            index,
            title,
            whole_stream,
        } => {
            let config = commands::load_config(cli.config.as_deref())?;
            let resolver = AssetResolver::new(config.assets.base_url.as_str());
            let query = TemplateQuery::from_config(&config.discovery);
            commands::dump_listens(
                &dump,
                &index,
                &title,
                whole_stream,
                &query,
                &resolver,
                &mut printer,
            )?;
        },
    }

    Ok(())
}
