pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "drinks-api")]
#[command(about = "Drinks catalog REST API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Serve the HTTP API (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides PORT")]
        port: Option<u16>,
    },

    #[command(about = "Drop and recreate the drinks table, then seed a sample drink")]
    InitDb {
        #[arg(long, help = "Confirm that every stored drink may be deleted")]
        yes: bool,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::serve::handle(port).await,
        Commands::InitDb { yes } => commands::init_db::handle(yes).await,
    }
}
