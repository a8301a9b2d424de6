//! Pizza Café CLI - migrations, menu seeding and the ordering flows.
//!
//! # Usage
//!
//! ```bash
//! # Create the tables
//! pizza-cli migrate
//!
//! # Load the menu
//! pizza-cli seed menu crates/cli/menu.example.yaml
//!
//! # Create an account (password from PIZZA_PASSWORD)
//! PIZZA_PASSWORD=secret pizza-cli --email mario@example.com register
//!
//! # Order
//! pizza-cli --email mario@example.com menu
//! pizza-cli --email mario@example.com cart add margherita
//! pizza-cli --email mario@example.com order
//! pizza-cli --email mario@example.com pay
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed menu` - Upsert menu items from a YAML file
//! - `register` - Create an account
//! - `menu`, `cart`, `order`, `orders`, `pay`, `status` - Customer flows

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pizza_cafe_app::config::AppConfig;

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "pizza-cli")]
#[command(author, version, about = "Pizza Café CLI tools")]
struct Cli {
    /// Account email for customer commands
    #[arg(short, long, global = true)]
    email: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load data from files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Create an account
    Register,
    /// List the menu
    Menu,
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Place an order for everything in the cart
    Order,
    /// List past orders, newest first
    Orders,
    /// Pay the most recent order
    Pay,
    /// Show the most recent order and its payment status
    Status,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert menu items from a YAML file
    Menu {
        /// Path to the YAML file
        file: std::path::PathBuf,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart and its total
    Show,
    /// Add one unit of a menu item
    Add {
        /// Menu item id
        item: String,
    },
    /// Increase a line's quantity by one
    Inc {
        /// Menu item id
        item: String,
    },
    /// Decrease a line's quantity by one, removing it at zero
    Dec {
        /// Menu item id
        item: String,
    },
    /// Remove a line
    Remove {
        /// Menu item id
        item: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &AppConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry
                .environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry.sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Failed to load configuration: {e}");
            }
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pizza_cafe_app=info,pizza_cafe_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: AppConfig) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run(&config).await,
        Commands::Seed {
            target: SeedTarget::Menu { file },
        } => commands::seed::menu(config, &file).await,
        command => {
            let email = cli.email.ok_or(CliError::MissingEmail)?;
            let password = commands::password_from_env()?;
            let ctx = pizza_cafe_app::AppContext::connect(config).await?;
            let customer = commands::customer::Customer::new(ctx);

            if matches!(command, Commands::Register) {
                return customer.register(&email, &password).await;
            }

            customer.sign_in(&email, &password).await?;
            match command {
                Commands::Menu => customer.menu().await,
                Commands::Cart { action } => match action.unwrap_or(CartAction::Show) {
                    CartAction::Show => customer.cart_show().await,
                    CartAction::Add { item } => customer.cart_add(&item).await,
                    CartAction::Inc { item } => customer.cart_change(&item, 1).await,
                    CartAction::Dec { item } => customer.cart_change(&item, -1).await,
                    CartAction::Remove { item } => customer.cart_remove(&item).await,
                },
                Commands::Order => customer.order().await,
                Commands::Orders => customer.orders().await,
                Commands::Pay => customer.pay().await,
                Commands::Status => customer.status().await,
                Commands::Migrate | Commands::Seed { .. } | Commands::Register => Ok(()),
            }
        }
    }
}
