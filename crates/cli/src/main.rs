//! Copperleaf CLI - Database migrations and link minting.
//!
//! # Usage
//!
//! ```bash
//! # Run delivery database migrations
//! copperleaf-cli migrate
//!
//! # Mint a signed download link for an order
//! copperleaf-cli link --order 101 --product 10 --price-id 2 --file-key 0
//!
//! # Same, with a one-hour expiry instead of the configured default
//! copperleaf-cli link --order 101 --product 10 --file-key 0 --ttl-secs 3600
//!
//! # Check a pasted link's token without touching the database
//! copperleaf-cli verify "https://downloads.example.com/download?order=..."
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `link` - Mint a signed download URL for an existing order
//! - `verify` - Check a pasted download URL's token offline

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "copperleaf-cli")]
#[command(author, version, about = "Copperleaf CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run delivery database migrations
    Migrate,
    /// Mint a signed download link for an order
    Link {
        /// Order ID the link is bound to
        #[arg(short, long)]
        order: i32,

        /// Product ID to download
        #[arg(short, long)]
        product: i32,

        /// Price variant ID, for variant-scoped purchases
        #[arg(long)]
        price_id: Option<i32>,

        /// Zero-based position in the product's file list
        #[arg(short, long, default_value_t = 0)]
        file_key: u32,

        /// Link lifetime in seconds (defaults to DELIVERY_LINK_TTL_SECS)
        #[arg(long)]
        ttl_secs: Option<i64>,
    },
    /// Verify a signed download URL's token offline
    Verify {
        /// The full download URL to check
        url: String,
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
        Commands::Migrate => commands::migrate::delivery().await?,
        Commands::Link {
            order,
            product,
            price_id,
            file_key,
            ttl_secs,
        } => {
            commands::link::mint(order, product, price_id, file_key, ttl_secs).await?;
        }
        Commands::Verify { url } => commands::verify::check(&url)?,
    }
    Ok(())
}
