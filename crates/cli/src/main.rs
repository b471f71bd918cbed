//! Kago CLI - inspect and edit the local cart.
//!
//! # Usage
//!
//! ```bash
//! # Add two of a product configuration at ¥1,000 each
//! kago add -p P1 --price 1000 -s M -c red -q 2
//!
//! # Set a line's quantity (0 removes it)
//! kago update -p P1 -s M -c red -q 5
//!
//! # Remove a line
//! kago remove -p P1 -s M -c red
//!
//! # Empty the cart
//! kago clear
//!
//! # Print lines and totals
//! kago show
//! ```
//!
//! Configuration comes from the environment (see [`config`]).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use kago_core::{CartAction, ColorId, LineKey, Price, Product, ProductId, SizeId};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "kago")]
#[command(author, version, about = "Kago cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add units of a product configuration
    Add {
        #[command(flatten)]
        line: LineArgs,

        /// Unit price in yen
        #[arg(long)]
        price: Price,

        /// Units to add
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        qty: i64,
    },
    /// Remove a line
    Remove {
        #[command(flatten)]
        line: LineArgs,
    },
    /// Set a line's quantity (0 or less removes it)
    Update {
        #[command(flatten)]
        line: LineArgs,

        /// New quantity
        #[arg(short, long, allow_negative_numbers = true)]
        qty: i64,
    },
    /// Remove every line
    Clear,
    /// Print lines and totals
    Show,
}

/// Identifies one line of the cart.
#[derive(Args)]
struct LineArgs {
    /// Product ID
    #[arg(short, long)]
    product: String,

    /// Size selector
    #[arg(short, long)]
    size: String,

    /// Color selector
    #[arg(short, long)]
    color: String,
}

impl LineArgs {
    fn key(self) -> LineKey {
        LineKey::new(
            ProductId::new(self.product),
            SizeId::new(self.size),
            ColorId::new(self.color),
        )
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CliConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
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

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Configuration errors are reported after tracing is up
    let config = CliConfig::from_env();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kago=info,kago_cart=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let action = match cli.command {
        Commands::Add { line, price, qty } => {
            let product = Product::new(ProductId::new(line.product), price);
            CartAction::Add {
                product,
                size_id: SizeId::new(line.size),
                color_id: ColorId::new(line.color),
                quantity: qty,
            }
        }
        Commands::Remove { line } => CartAction::Remove { key: line.key() },
        Commands::Update { line, qty } => CartAction::Update {
            key: line.key(),
            quantity: qty,
        },
        Commands::Clear => CartAction::Clear,
        Commands::Show => return commands::cart::show(config),
    };

    commands::cart::apply(config, action).await
}
