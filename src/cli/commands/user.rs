use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::{connect, OutputFormat};
use crate::database::PgStore;
use crate::services::accounts::{self, RegisterInput};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a beekeeper account")]
    Add {
        #[arg(help = "Login name")]
        username: String,
        #[arg(long, help = "Password (at least 8 characters)")]
        password: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        email: String,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Add {
            username,
            password,
            first_name,
            last_name,
            email,
        } => {
            let store = PgStore::new(connect().await?);
            let input = RegisterInput {
                username: Some(username),
                password: Some(password),
                first_name,
                last_name,
                email,
            };
            let user = accounts::register(&store, input).await?;
            output_success(
                output_format,
                &format!("Created user {} (id {})", user.username, user.id),
                Some(json!({ "user": user })),
            )
        }
    }
}
