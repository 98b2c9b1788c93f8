//! WulfVault notify admin
//!
//! Operator tool for the email delivery subsystem: applies the schema,
//! stores provider configurations with encrypted secrets and sends test mail.

use clap::Parser;
use core_config::FromEnv;
use core_config::tracing::{init_tracing, install_color_eyre};
use eyre::{Result, WrapErr};
use sea_orm::Database;
use tracing::info;

mod cli;
mod commands;
mod config;

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!("Connecting to database...");
    let db = Database::connect(config.connect_options())
        .await
        .wrap_err("Database connection failed")?;

    commands::run(cli.command, db, config.notifications).await
}
