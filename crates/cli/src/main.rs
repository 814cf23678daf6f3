//! Cartwheel CLI - storefront client for the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password from the prompt-free env var or flag)
//! CARTWHEEL_PASSWORD=secret cw signin -e ada@example.com
//!
//! # Browse and fill the cart
//! cw products list
//! cw cart add 65f1c0ffee -q 2
//! cw cart show
//!
//! # Place the order and empty the cart
//! cw checkout
//!
//! # Admin
//! cw admin orders
//! cw admin order-status 65f1c0ffee shipped
//! ```
//!
//! # Commands
//!
//! - `signin`, `signup`, `signout`, `whoami` - Session management
//! - `products` - Browse, show and search the catalog
//! - `cart` - Show and change the cart
//! - `checkout` - Place an order for the cart, then empty it
//! - `reviews` - Read and write product reviews
//! - `admin` - Order, product, review and branding management
//!
//! Every command resumes the persisted session before running.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::path::PathBuf;

use cartwheel_client::{ClientConfig, Store};
use cartwheel_core::{OrderStatus, PaymentStatus};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use secrecy::SecretString;

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "cw")]
#[command(author, version, about = "Cartwheel storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Signin {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "CARTWHEEL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Signup {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "CARTWHEEL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the session
    Signout,
    /// Show the signed-in user
    Whoami,
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the cart, then empty it
    Checkout,
    /// Read and write product reviews
    Reviews {
        #[command(subcommand)]
        action: ReviewsAction,
    },
    /// Shop management (admin role required)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List every product
    List,
    /// Show one product with its reviews
    Show {
        /// Product ID
        id: String,

        /// Show every review instead of the first five
        #[arg(long)]
        all_reviews: bool,
    },
    /// Search products by keyword
    Search {
        /// Search keyword
        keyword: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart with prices and total
    Show,
    /// Add a product
    Add {
        /// Product ID
        product: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
    },
    /// Increase a product's quantity by one
    Inc {
        /// Product ID
        product: String,
    },
    /// Decrease a product's quantity by one
    Dec {
        /// Product ID
        product: String,
    },
    /// Remove a product
    Remove {
        /// Product ID
        product: String,
    },
    /// Remove every product
    Empty,
}

#[derive(Subcommand)]
enum ReviewsAction {
    /// List reviews for a product
    List {
        /// Product ID
        product: String,

        /// Show every review instead of the first five
        #[arg(long)]
        all: bool,
    },
    /// Review a product you bought
    Create {
        /// Product ID
        product: String,

        /// Star rating
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,

        /// Review text
        #[arg(short, long, default_value = "")]
        comment: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List every order
    Orders,
    /// Change an order's status (placed, shipped, delivered, cancelled)
    OrderStatus {
        /// Order ID
        order: String,

        /// New status
        status: OrderStatus,
    },
    /// Change an order's payment status (pending, paid)
    PaymentStatus {
        /// Order ID
        order: String,

        /// New payment status
        payment: PaymentStatus,
    },
    /// Add a product to the catalog
    CreateProduct {
        /// Product name
        #[arg(short, long)]
        name: String,

        /// Product description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Unit price, e.g. 19.99
        #[arg(short, long)]
        price: Decimal,

        /// Product category
        #[arg(short, long, default_value = "")]
        category: String,

        /// Image URL (repeatable)
        #[arg(short, long = "image")]
        images: Vec<String>,
    },
    /// Remove a product from the catalog
    DeleteProduct {
        /// Product ID
        id: String,
    },
    /// List every review
    Reviews,
    /// Delete a review
    DeleteReview {
        /// Review ID
        id: String,
    },
    /// Upload a new shop logo
    UploadLogo {
        /// Image file
        file: PathBuf,
    },
    /// Download the shop logo
    Logo {
        /// Where to write the image
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Upload banner images
    UploadBanners {
        /// Image files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show the banner image listing
    Banners,
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cartwheel_client=info,cartwheel_cli=info".into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::debug!(error = ?e, "Command failed");
        let _ = writeln!(std::io::stderr(), "Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let config = ClientConfig::from_env()?;
    let store = Store::from_config(&config)?;
    store.initialize().await;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Signin { email, password } => {
            commands::auth::sign_in(&store, &mut out, &email, SecretString::from(password)).await
        }
        Commands::Signup {
            name,
            email,
            password,
        } => {
            commands::auth::sign_up(&store, &mut out, &name, &email, SecretString::from(password))
                .await
        }
        Commands::Signout => commands::auth::sign_out(&store, &mut out).await,
        Commands::Whoami => commands::auth::whoami(&store, &mut out).await,
        Commands::Products { action } => match action {
            ProductsAction::List => commands::catalog::list(&store, &mut out).await,
            ProductsAction::Show { id, all_reviews } => {
                commands::catalog::show(&store, &mut out, &id.into(), all_reviews).await
            }
            ProductsAction::Search { keyword } => {
                commands::catalog::search(&store, &mut out, &keyword).await
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&store, &mut out).await,
            CartAction::Add { product, quantity } => {
                commands::cart::add(&store, &mut out, &product.into(), quantity).await
            }
            CartAction::Inc { product } => {
                commands::cart::increase(&store, &mut out, &product.into()).await
            }
            CartAction::Dec { product } => {
                commands::cart::decrease(&store, &mut out, &product.into()).await
            }
            CartAction::Remove { product } => {
                commands::cart::remove(&store, &mut out, &product.into()).await
            }
            CartAction::Empty => commands::cart::empty(&store, &mut out).await,
        },
        Commands::Checkout => commands::cart::checkout(&store, &mut out).await,
        Commands::Reviews { action } => match action {
            ReviewsAction::List { product, all } => {
                commands::catalog::reviews(&store, &mut out, &product.into(), all).await
            }
            ReviewsAction::Create {
                product,
                rating,
                comment,
            } => {
                commands::catalog::create_review(&store, &mut out, &product.into(), rating, &comment)
                    .await
            }
        },
        Commands::Admin { action } => {
            commands::admin::require_admin(&store).await?;
            run_admin(&store, &mut out, action).await
        }
    }
}

async fn run_admin(
    store: &Store,
    out: &mut impl Write,
    action: AdminAction,
) -> Result<(), CommandError> {
    match action {
        AdminAction::Orders => commands::admin::orders(store, out).await,
        AdminAction::OrderStatus { order, status } => {
            commands::admin::order_status(store, out, &order.into(), status).await
        }
        AdminAction::PaymentStatus { order, payment } => {
            commands::admin::payment_status(store, out, &order.into(), payment).await
        }
        AdminAction::CreateProduct {
            name,
            description,
            price,
            category,
            images,
        } => {
            let product = cartwheel_core::NewProduct {
                name,
                description,
                price: price.into(),
                category,
                images,
            };
            commands::admin::create_product(store, out, &product).await
        }
        AdminAction::DeleteProduct { id } => {
            commands::admin::delete_product(store, out, &id.into()).await
        }
        AdminAction::Reviews => commands::admin::reviews(store, out).await,
        AdminAction::DeleteReview { id } => {
            commands::admin::delete_review(store, out, &id.into()).await
        }
        AdminAction::UploadLogo { file } => commands::admin::upload_logo(store, out, &file).await,
        AdminAction::Logo { output } => commands::admin::logo(store, out, &output).await,
        AdminAction::UploadBanners { files } => {
            commands::admin::upload_banners(store, out, &files).await
        }
        AdminAction::Banners => commands::admin::banners(store, out).await,
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_rating_outside_stars_is_rejected() {
        let parsed = Cli::try_parse_from(["cw", "reviews", "create", "p1", "--rating", "6"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_order_status_parses_backend_names() {
        let cli = Cli::try_parse_from(["cw", "admin", "order-status", "o1", "shipped"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Admin {
                action: AdminAction::OrderStatus {
                    status: OrderStatus::Shipped,
                    ..
                }
            })
        ));
    }
}
