use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Context;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use clap::Args;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct EnvArgs {
    #[arg(long, default_value = ".env", help = "File to write")]
    pub path: PathBuf,

    #[arg(long, help = "Overwrite an existing file")]
    pub force: bool,
}

pub fn handle(args: EnvArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    if args.path.exists() && !args.force {
        anyhow::bail!("{} already exists (use --force to overwrite)", args.path.display());
    }

    std::fs::write(&args.path, template(&generate_secret()))
        .with_context(|| format!("failed to write {}", args.path.display()))?;

    output_success(
        output_format,
        &format!("Wrote {}", args.path.display()),
        Some(json!({ "path": args.path.display().to_string() })),
    )
}

/// 32 random bytes, hex encoded.
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}

fn template(secret: &str) -> String {
    format!(
        "# Apiary API environment\n\
         APP_ENV=development\n\
         \n\
         # Leave empty to run on the in-memory store (not allowed in production)\n\
         DATABASE_URL=\n\
         DATABASE_MAX_CONNECTIONS=10\n\
         \n\
         APIARY_HOST=127.0.0.1\n\
         APIARY_PORT=8000\n\
         \n\
         JWT_SECRET={secret}\n\
         SECURITY_JWT_EXPIRY_HOURS=168\n\
         SECURITY_CORS_ORIGINS=\n\
         SECURITY_COOKIE_SECURE=false\n\
         \n\
         API_PAGE_SIZE=10\n\
         API_MAX_PAGE_SIZE=40\n\
         API_ENABLE_REQUEST_LOGGING=true\n\
         \n\
         RUST_LOG=apiary_api=info,tower_http=info\n"
    )
}
