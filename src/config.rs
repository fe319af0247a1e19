//! Configuration
//!
//! Command line arguments with environment fallbacks. A `.env` file in the working
//! directory is loaded first when present.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    cart::DEFAULT_WHATSAPP_NUMBER,
    catalog::{FilterDimension, SortKey, window::DEFAULT_BATCH_SIZE},
};

/// Belle Parfumerie storefront CLI
#[derive(Debug, Parser)]
#[command(name = "belle", about = "Belle Parfumerie storefront", long_about = None)]
pub struct Config {
    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Storefront settings.
    #[command(flatten)]
    pub store: StoreConfig,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Storefront settings.
#[derive(Debug, Args)]
pub struct StoreConfig {
    /// Phone number receiving orders, digits only with country code
    #[arg(long, env = "BELLE_WHATSAPP_NUMBER", default_value = DEFAULT_WHATSAPP_NUMBER)]
    pub whatsapp_number: String,

    /// File the cart is persisted to
    #[arg(long, env = "BELLE_CART_FILE", default_value = "belle-cart.json")]
    pub cart_file: PathBuf,

    /// Product snapshot (YAML or JSON)
    #[arg(long, env = "BELLE_PRODUCTS", default_value = "fixtures/products.yml")]
    pub products: PathBuf,

    /// Catalog results revealed per batch
    #[arg(long, env = "BELLE_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the catalog
    Catalog(CatalogArgs),

    /// List products on offer
    Offers,

    /// Inspect or change the cart
    Cart(CartCommand),
}

/// Catalog listing arguments.
#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Free-text search over name, brand, concentration, notes and description
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Filters as `dimension=value`, e.g. `genero=Unisex`
    #[arg(short, long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(FilterDimension, String)>,

    /// Ordering
    #[arg(long, value_enum, default_value_t = SortKey::Relevance)]
    pub sort: SortKey,

    /// Batches to reveal
    #[arg(long, default_value_t = 1)]
    pub pages: usize,

    /// List the filter options instead of products
    #[arg(long)]
    pub options: bool,
}

/// Cart commands.
#[derive(Debug, Args)]
pub struct CartCommand {
    /// Cart action.
    #[command(subcommand)]
    pub action: CartAction,
}

/// Cart actions.
#[derive(Debug, Subcommand)]
pub enum CartAction {
    /// Show the cart
    Show,

    /// Add full bottles
    Add(AddArgs),

    /// Add 5ml decants
    AddDecant(AddArgs),

    /// Remove a line
    Remove(LineArgs),

    /// Set the quantity of a line; zero or less removes it
    SetQty {
        /// Line to change.
        #[command(flatten)]
        line: LineArgs,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        qty: i64,
    },

    /// Print the wa.me order link
    Checkout,
}

/// Arguments adding a product.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Product id
    pub id: String,

    /// Units to add
    #[arg(short = 'n', long, default_value_t = 1)]
    pub qty: u32,

    /// Use the promotional prices when the product has an active offer
    #[arg(long)]
    pub offer: bool,
}

/// Arguments naming a cart line.
#[derive(Debug, Args)]
pub struct LineArgs {
    /// Product id
    pub id: String,

    /// Target the decant line instead of the full bottle line
    #[arg(long)]
    pub decant: bool,
}

fn parse_filter(raw: &str) -> Result<(FilterDimension, String), String> {
    let (dimension, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected dimension=value, got `{raw}`"))?;

    let dimension = <FilterDimension as clap::ValueEnum>::from_str(dimension.trim(), true)?;

    Ok((dimension, value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn defaults() -> TestResult {
        let config = Config::try_parse_from(["belle", "offers"])?;

        assert_eq!(config.store.whatsapp_number, "5491112345678");
        assert_eq!(config.store.batch_size, 12);
        assert!(matches!(config.command, Command::Offers));

        Ok(())
    }

    #[test]
    fn catalog_filters_parse() -> TestResult {
        let config = Config::try_parse_from([
            "belle",
            "catalog",
            "--filter",
            "genero=Unisex",
            "-f",
            "temporada = Verano",
            "--sort",
            "price-asc",
        ])?;

        let Command::Catalog(args) = config.command else {
            return Err("expected catalog command".into());
        };

        assert_eq!(
            args.filters,
            vec![
                (FilterDimension::Genero, "Unisex".to_string()),
                (FilterDimension::Temporada, "Verano".to_string()),
            ]
        );
        assert_eq!(args.sort, SortKey::PriceAsc);

        Ok(())
    }

    #[test]
    fn unknown_dimension_is_rejected() {
        assert!(Config::try_parse_from(["belle", "catalog", "-f", "color=rojo"]).is_err());
    }

    #[test]
    fn set_qty_accepts_negative_quantities() -> TestResult {
        let config = Config::try_parse_from(["belle", "cart", "set-qty", "p1", "--decant", "-1"])?;

        let Command::Cart(CartCommand {
            action: CartAction::SetQty { line, qty },
        }) = config.command
        else {
            return Err("expected set-qty".into());
        };

        assert_eq!(line.id, "p1");
        assert!(line.decant);
        assert_eq!(qty, -1);

        Ok(())
    }
}
