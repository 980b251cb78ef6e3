use crate::cli::utils::output_success;
use crate::cli::{connect, OutputFormat};
use crate::database::schema;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = connect().await?;
    schema::apply(&pool).await?;
    output_success(output_format, "Database schema is up to date", None)
}
