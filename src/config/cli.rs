use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "freight-quote")]
#[command(about = "Freight (LTL) shipping estimates for carts and single products")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "quote-config.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit JSON log lines instead of the compact format
    #[arg(long)]
    pub json_logs: bool,

    /// Print the outbound request without contacting the rate provider
    #[arg(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Quote a whole cart loaded from a CSV file
    Cart(CartArgs),
    /// Quote a single product at a given quantity
    Product(ProductArgs),
}

#[derive(Debug, Clone, Args)]
pub struct DestinationArgs {
    /// Destination ZIP / postal code
    #[arg(long)]
    pub zip: String,

    /// Request liftgate delivery
    #[arg(long)]
    pub liftgate: bool,

    /// Pick the Nth listed option (0 = cheapest) instead of the auto-selection
    #[arg(long)]
    pub select: Option<usize>,
}

#[derive(Debug, Clone, Args)]
pub struct CartArgs {
    /// Cart CSV: name,quantity,weight_lbs,height_in,width_in,depth_in,description,min_order_quantity
    #[arg(long)]
    pub cart: String,

    #[command(flatten)]
    pub destination: DestinationArgs,
}

#[derive(Debug, Clone, Args)]
pub struct ProductArgs {
    #[arg(long)]
    pub name: String,

    /// Per-unit weight in pounds
    #[arg(long)]
    pub weight_lbs: Option<f64>,

    #[arg(long)]
    pub height_in: Option<f64>,

    #[arg(long)]
    pub width_in: Option<f64>,

    #[arg(long)]
    pub length_in: Option<f64>,

    /// Free-text description scanned for Height:/Width:/Depth:/Shipping: labels
    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub min_order: Option<u32>,

    /// Defaults to the minimum order quantity
    #[arg(long)]
    pub quantity: Option<u32>,

    #[command(flatten)]
    pub destination: DestinationArgs,
}
