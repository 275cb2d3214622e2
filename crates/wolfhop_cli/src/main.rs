//! `wolfhop` server binary.
//!
//! # Responsibility
//! - Load configuration, start logging, open the database, serve HTTP.
//! - `--ping` keeps a quick core linkage probe.

mod config;
mod server;

use anyhow::{anyhow, Context};
use clap::Parser;
use config::Args;
use log::info;
use wolfhop_api::Api;
use wolfhop_core::{default_log_level, open_db, JwtIdentityProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    if args.ping {
        println!("wolfhop_core ping={}", wolfhop_core::ping());
        println!("wolfhop_core version={}", wolfhop_core::core_version());
        return Ok(());
    }

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    match args.log_dir.as_deref() {
        Some(dir) => wolfhop_core::init_logging(&level, dir),
        None => wolfhop_core::init_stderr_logging(&level),
    }
    .map_err(|err| anyhow!("logging setup failed: {err}"))?;

    args.validate().map_err(|err| anyhow!("configuration error: {err}"))?;
    let secret = args.jwt_secret.as_deref().unwrap_or_default();
    let identity = JwtIdentityProvider::new(secret, args.jwt_expires_in)
        .context("invalid token configuration")?;

    let conn = open_db(&args.db_path)
        .with_context(|| format!("failed to open database {}", args.db_path.display()))?;
    info!(
        "event=db_open module=cli status=ok path={}",
        args.db_path.display()
    );

    let origins = args.allowed_origins();
    server::run(Api::new(conn, identity), args.listen, origins).await
}
