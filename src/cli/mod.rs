pub mod commands;
pub mod utils;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "apiary")]
#[command(about = "Apiary CLI - schema, accounts and demo data for the Apiary API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create the database tables (idempotent)")]
    Init,

    #[command(about = "Beekeeper account management")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Publish or revoke a beekeeper's public contact")]
    Contact {
        #[command(subcommand)]
        cmd: commands::contact::ContactCommands,
    },

    #[command(about = "Demo data")]
    Fixture {
        #[command(subcommand)]
        cmd: commands::fixture::FixtureCommands,
    },

    #[command(about = "Write a .env template with a fresh JWT secret")]
    Env(commands::env::EnvArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Init => commands::init::handle(output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, output_format).await,
        Commands::Contact { cmd } => commands::contact::handle(cmd, output_format).await,
        Commands::Fixture { cmd } => commands::fixture::handle(cmd, output_format).await,
        Commands::Env(args) => commands::env::handle(args, output_format),
    }
}

/// Pool for the configured `DATABASE_URL`; every database command needs one.
pub async fn connect() -> anyhow::Result<PgPool> {
    let config = AppConfig::from_env();
    if config.database.url.is_none() {
        anyhow::bail!("DATABASE_URL is not set (put it in the environment or a .env file)");
    }
    DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")
}
