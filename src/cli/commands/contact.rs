use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::{connect, OutputFormat};
use crate::database::{ApiaryStore, PgStore};

#[derive(Subcommand)]
pub enum ContactCommands {
    #[command(about = "Show the keeper's name and email on the public API")]
    Publish {
        username: String,
    },

    #[command(about = "Redact the keeper's contact on the public API again")]
    Revoke {
        username: String,
    },
}

pub async fn handle(cmd: ContactCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = PgStore::new(connect().await?);

    match cmd {
        ContactCommands::Publish { username } => {
            let user = store
                .user_by_username(&username)
                .await?
                .with_context(|| format!("no user named {}", username))?;
            let contact = store.publish_contact(user.id).await?;
            output_success(
                output_format,
                &format!("Contact of {} is public", username),
                Some(json!({ "contact": contact })),
            )
        }
        ContactCommands::Revoke { username } => {
            let user = store
                .user_by_username(&username)
                .await?
                .with_context(|| format!("no user named {}", username))?;
            let message = if store.revoke_contact(user.id).await? {
                format!("Contact of {} is no longer public", username)
            } else {
                format!("Contact of {} was not public", username)
            };
            output_success(output_format, &message, None)
        }
    }
}
