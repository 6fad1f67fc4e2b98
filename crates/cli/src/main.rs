//! Cartkeeper CLI - Database migrations and cart maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! cartkeeper-cli migrate
//!
//! # Update cart line quantities
//! cartkeeper-cli cart update --cart 7 --line 12=3 --line 13=1
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `cart update` - Apply quantity updates to a cart

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cartkeeper-cli")]
#[command(author, version, about = "Cartkeeper CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Maintain carts
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Update line quantities on a cart
    Update {
        /// Cart ID
        #[arg(long)]
        cart: i32,

        /// Customer acting on the cart. Omit to act as an anonymous shopper,
        /// which clears any customer association on the cart.
        #[arg(long)]
        customer: Option<i32>,

        /// Line update as `<line id>=<quantity>`; repeatable
        #[arg(long = "line", value_name = "ID=QTY", required = true)]
        lines: Vec<String>,
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
        Commands::Cart { action } => match action {
            CartAction::Update {
                cart,
                customer,
                lines,
            } => {
                let summary = commands::cart::update(cart, customer, &lines).await?;

                #[allow(clippy::print_stdout)]
                {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
            }
        },
    }
    Ok(())
}
