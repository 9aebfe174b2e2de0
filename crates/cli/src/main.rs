//! Meridian CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! meridian-cli migrate
//!
//! # Mark a business account as verified
//! meridian-cli account verify -e buyer@example.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `account verify` - Flip a business account to verified

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "meridian-cli")]
#[command(author, version, about = "Meridian CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage shopper accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Mark a business account as verified
    Verify {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Revoke a business account's verification
    Unverify {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Account { action } => match action {
            AccountAction::Verify { email } => {
                commands::account::set_verification(&email, true).await?;
            }
            AccountAction::Unverify { email } => {
                commands::account::set_verification(&email, false).await?;
            }
        },
    }
    Ok(())
}
